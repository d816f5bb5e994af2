use std::fmt::Display;
use std::{fmt, io};
use std::num::ParseIntError;
use std::str::Utf8Error;
use std::string::FromUtf8Error;

/// Top-level error type for everything outside the byte-level decode path:
/// config loading, capture adapter failures, sink I/O.
///
/// The decode path itself never returns `ReError` — see
/// `decoder::err::DecodeError`, the per-value error produced when a
/// bounds-checked byte access in the wire codec fails.
#[derive(Debug)]
pub enum ReError {
    /// 一定不会出现的异常。如果出现，一定是BUG
    BUG(String),
    /// The parser had an error (recoverable)
    Error(String),

    IoError(io::Error),
    Utf8Error(Utf8Error),
    FromUtf8Error(FromUtf8Error),
    ParseIntError(ParseIntError),

    ConfigFileParseErr(String),
    ConnectionError(String),
    CaptureError(String),
    SinkError(String),

    String(String),
}

impl Display for ReError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> fmt::Result {
        match self {
            ReError::BUG(s)
            | ReError::Error(s)
            | ReError::ConfigFileParseErr(s)
            | ReError::ConnectionError(s)
            | ReError::CaptureError(s)
            | ReError::SinkError(s)
            | ReError::String(s) => {
                write!(f, "{}", s)
            }
            ReError::IoError(err) => {
                write!(f, "{}", err.to_string())
            }
            ReError::Utf8Error(err) => {
                write!(f, "{}", err.to_string())
            }
            ReError::FromUtf8Error(err) => {
                write!(f, "{}", err.to_string())
            }
            ReError::ParseIntError(err) => {
                write!(f, "{}", err.to_string())
            }
        }
    }
}

impl std::error::Error for ReError {}

impl From<io::Error> for ReError {
    fn from(error: io::Error) -> Self {
        ReError::IoError(error)
    }
}

impl From<Utf8Error> for ReError {
    fn from(error: Utf8Error) -> Self {
        ReError::Utf8Error(error)
    }
}

impl From<FromUtf8Error> for ReError {
    fn from(error: FromUtf8Error) -> Self {
        ReError::FromUtf8Error(error)
    }
}

impl From<ParseIntError> for ReError {
    fn from(error: ParseIntError) -> Self {
        ReError::ParseIntError(error)
    }
}

#[cfg(test)]
mod test {
    use super::ReError;

    #[test]
    fn displays_inner_message() {
        let e = ReError::ConfigFileParseErr("bad toml".to_string());
        assert_eq!(e.to_string(), "bad toml");
    }
}