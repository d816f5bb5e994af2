use serde::Serialize;

use common::config::load_style::Format;

/// Echoed back to the operator at startup; not part of `DecoderConfig`.
#[derive(Debug, Clone, Serialize)]
pub struct CliOptions {
    debug: bool,
    format: Format,
}

impl CliOptions {
    pub fn new(debug: bool, format: Format) -> Self {
        CliOptions { debug, format }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn get_format(&self) -> Format {
        self.format.clone()
    }
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions::new(false, Format::None)
    }
}
