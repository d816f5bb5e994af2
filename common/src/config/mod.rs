pub mod load_style;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::err::decode_error::ReError;

/// Top-level configuration surface: capture, sinks, classifier, and base flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    pub capture: CaptureConfig,
    pub sink: SinkConfig,
    pub classifier: ClassifierConfig,
    pub base: BaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Capture adapter name. `None` ⇒ auto-discover by substring match
    /// against known loopback descriptors.
    pub interface: Option<String>,

    /// MySQL port: both the BPF filter and the decode trigger.
    pub port: u16,

    /// Max sessions retained in the SessionTable before LRU eviction.
    pub session_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Root directory for the JSONL sink files.
    pub log_dir: String,

    /// HTTP endpoint that ORDER events are POSTed to. `None` disables the
    /// HTTP sink.
    pub http_url: Option<String>,

    /// Per-POST deadline in milliseconds.
    pub http_timeout_ms: u64,
}

/// Business-parameter-index conventions: contracts with the upstream
/// application, not the MySQL wire protocol, so they must be configurable
/// rather than hardcoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub seat_no_index: usize,
    pub total_price_index: usize,
    pub order_time_index: usize,

    pub order_table_tokens: Vec<String>,
    pub suborder_table_tokens: Vec<String>,
    pub verb_tokens: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseConfig {
    /// Debug-level logging / pretty console tracing.
    pub debug: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            capture: CaptureConfig::default(),
            sink: SinkConfig::default(),
            classifier: ClassifierConfig::default(),
            base: BaseConfig::default(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            interface: None,
            port: 3306,
            session_cap: 10_000,
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig {
            log_dir: "./log".to_string(),
            http_url: None,
            http_timeout_ms: 500,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            seat_no_index: 9,
            total_price_index: 7,
            order_time_index: 16,
            order_table_tokens: vec!["order".into(), "toll".into(), "billing".into()],
            suborder_table_tokens: vec!["suborder".into()],
            verb_tokens: vec!["insert".into(), "update".into()],
        }
    }
}

impl Default for BaseConfig {
    fn default() -> Self {
        BaseConfig { debug: false }
    }
}

/// 读取指定路径下的配制文件信息
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<DecoderConfig, ReError> {
    let mut file = File::open(path.as_ref())?;
    let mut s = String::new();
    file.read_to_string(&mut s)?;

    toml::from_str(s.as_str()).map_err(|e| ReError::ConfigFileParseErr(e.to_string()))
}
