pub mod classifier;
pub mod codec;
pub mod decoder;
pub mod endpoint;
pub mod err;
pub mod event;
pub mod session;
pub mod statement;
pub mod wire;

pub use classifier::EventClassifier;
pub use decoder::Decoder;
pub use event::{Event, EventKind, OrderKind};
