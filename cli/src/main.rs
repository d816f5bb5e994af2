mod cli_options;

use std::env::current_dir;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;

use capture::CaptureHandle;
use common::config::load_style::Format;
use common::config::{read_config, DecoderConfig};
use common::err::decode_error::ReError;
use common::log::tracing_factory::{OutputType, TracingFactory, TracingFactoryOptions};
use common::pretty_util::to_string_pretty;
use decoder::classifier::EventClassifier;
use decoder::decoder::Decoder;
use sink::worker::{SinkMessage, SinkWorker};
use sink::{EventSink, FileSink, HttpSink};

use crate::cli_options::CliOptions;

#[derive(Parser, Serialize, Debug, Clone)]
#[command(name = "mysql-sniffer")]
#[command(version = "0.0.1")]
#[command(author = "rust-us")]
#[command(about = "Passive MySQL wire-protocol decoder and order-event sniffer")]
#[command(long_about = None)]
pub(crate) struct CliArgs {
    /// Capture adapter name; auto-discovered by loopback substring match if omitted.
    pub interface: Option<String>,

    #[arg(short, long, help = "Path to a TOML configuration file", value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long = "port", help = "MySQL port to filter and decode", value_name = "port")]
    pub port: Option<u16>,

    #[arg(long = "sink-url", help = "HTTP endpoint for ORDER events", value_name = "url")]
    pub sink_url: Option<String>,

    #[arg(long = "log-dir", help = "root directory for JSONL logs", value_name = "dir")]
    pub log_dir: Option<String>,

    #[arg(long = "session-cap", help = "max sessions retained before LRU eviction", value_name = "n")]
    pub session_cap: Option<usize>,

    #[arg(long = "sink-timeout-ms", help = "HTTP sink per-POST deadline", value_name = "ms")]
    pub sink_timeout_ms: Option<u64>,

    #[arg(short, long, help = "enable debug-level logging", default_value_t = false)]
    pub debug: bool,

    #[arg(short, long, help = "output format for the startup echo: [yaml | json]", default_value = "yaml")]
    pub format: String,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let format = Format::format(&args.format);
    eprintln!("args: \n{}", to_string_pretty(&format, &args));

    let mut config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::from(2);
        }
    };
    merge(&mut config, &args);
    eprintln!("final config: \n{}", to_string_pretty(&format, &config));

    let log_opt = TracingFactoryOptions::new(
        args.debug,
        OutputType::LOG,
        Some(config.sink.log_dir.clone()),
    );
    let _log_factory = TracingFactory::init_log_with_options(log_opt);
    let _cli_options = CliOptions::new(args.debug, format);
    eprintln!();
    eprintln!("╔╦╗╔═╗ ╔═╗╔╦╗╦  ");
    eprintln!(" ║ ╠═╣ ║   ║ ║  ");
    eprintln!(" ╩ ╩ ╩ ╚═╝ ╩ ╩═╝ MySQL order sniffer");
    eprintln!();

    run(config)
}

fn run(config: DecoderConfig) -> ExitCode {
    let mut capture = match CaptureHandle::open(config.capture.interface.as_deref(), config.capture.port) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("capture adapter open failed: {e}");
            return ExitCode::from(1);
        }
    };

    let mut sinks: Vec<Box<dyn EventSink>> = Vec::new();
    match FileSink::open(&config.sink.log_dir) {
        Ok(file_sink) => sinks.push(Box::new(file_sink)),
        Err(e) => tracing::warn!("file sink unavailable: {e}"),
    }
    if let Some(url) = config.sink.http_url.clone() {
        sinks.push(Box::new(HttpSink::new(
            url,
            Duration::from_millis(config.sink.http_timeout_ms),
        )));
    }
    let worker = SinkWorker::spawn(sinks);

    let decoder = Decoder::new(config.capture.session_cap, config.capture.port);
    let classifier = EventClassifier::new(config.classifier.clone());

    loop {
        match capture.next_segment() {
            Ok(Some(segment)) => {
                let events = decoder.decode_payload(segment.src, segment.dst, &segment.payload);
                for event in events {
                    if let Some(tagged) = classifier.classify(&event) {
                        let _ = worker.sender().send(SinkMessage::Event(tagged));
                    }
                    let _ = worker.sender().send(SinkMessage::Event(event));
                }
            }
            Ok(None) => continue,
            Err(e) => {
                tracing::error!("capture read failed: {e}");
                worker.shutdown();
                return ExitCode::from(1);
            }
        }
    }
}

fn load_config(args: &CliArgs) -> Result<DecoderConfig, ReError> {
    match config_path(args) {
        Some(path) if path.exists() => read_config(path),
        _ => Ok(DecoderConfig::default()),
    }
}

fn config_path(args: &CliArgs) -> Option<PathBuf> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }
    let mut pwd = current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    pwd.push("conf");
    pwd.push("mysql-sniffer");
    pwd.set_extension("toml");
    Some(pwd)
}

fn merge(config: &mut DecoderConfig, args: &CliArgs) {
    if let Some(interface) = &args.interface {
        config.capture.interface = Some(interface.clone());
    }
    if let Some(port) = args.port {
        config.capture.port = port;
    }
    if let Some(cap) = args.session_cap {
        config.capture.session_cap = cap;
    }
    if let Some(url) = &args.sink_url {
        config.sink.http_url = Some(url.clone());
    }
    if let Some(dir) = &args.log_dir {
        config.sink.log_dir = dir.clone();
    }
    if let Some(timeout) = args.sink_timeout_ms {
        config.sink.http_timeout_ms = timeout;
    }
    if args.debug {
        config.base.debug = true;
    }
}
