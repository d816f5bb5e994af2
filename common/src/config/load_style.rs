use serde::{Deserialize, Serialize};

/// Output format used when the CLI echoes config/args back to the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Format {
    Json,
    Yaml,
    None,
}

impl Format {
    pub fn format(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Format::Json,
            "yaml" | "yml" => Format::Yaml,
            _ => Format::None,
        }
    }
}
