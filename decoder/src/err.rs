use thiserror::Error;

/// Per-value decode failure. Every byte access in [`crate::codec`] and
/// [`crate::wire`] is bounds-checked; this is the typed result of a
/// bounds-check failing. It never unwinds past the decoder state machine —
/// every call site turns it into a sentinel value or drops the packet.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("not enough bytes remaining in packet")]
    NotEnoughData,

    #[error("invalid utf-8 in string payload")]
    InvalidUtf8,
}

pub type DResult<T> = Result<T, DecodeError>;
