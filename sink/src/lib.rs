use decoder::event::Event;

pub mod file_sink;
pub mod http_sink;
pub mod worker;

pub use file_sink::FileSink;
pub use http_sink::HttpSink;
pub use worker::{SinkMessage, SinkWorker};

/// Boundary the decoder/classifier hand finished events across. Sinks never
/// run on the decoder thread; `SinkWorker` drives them from a dedicated one.
pub trait EventSink: Send {
    fn name(&self) -> &'static str;
    fn handle(&mut self, event: &Event);
    fn flush(&mut self) {}
}
