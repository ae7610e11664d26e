//! Logging setup for plib programs
//!
//! The library crates only emit `tracing` events; this module installs a
//! `tracing-subscriber` formatter that writes them to stderr.
//!
//! # Environment Variables
//!
//! - `PLIB_LOG_LEVEL=<level>` - off/error/warn/info/debug/trace or 0-5
//! - `RUST_LOG` - full `EnvFilter` directives, used when `PLIB_LOG_LEVEL`
//!   is not set
//!
//! # Usage
//!
//! ```ignore
//! plib::logging::init();
//! tracing::info!(workers = 4, "pool ready");
//! ```

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tracing_subscriber::EnvFilter;

/// Log levels (matches common conventions)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Parse a name or digit; `None` for anything else
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "1" => Some(LogLevel::Error),
            "warn" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    /// `EnvFilter` directive for this level
    pub fn directive(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// No programmatic override
const UNSET: u8 = u8::MAX;

static LEVEL_OVERRIDE: AtomicU8 = AtomicU8::new(UNSET);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Set the level programmatically; takes precedence over the environment
///
/// Only effective before [`init`].
pub fn set_log_level(level: LogLevel) {
    LEVEL_OVERRIDE.store(level as u8, Ordering::Relaxed);
}

/// Level requested by override or `PLIB_LOG_LEVEL`, if any
pub fn requested_level() -> Option<LogLevel> {
    match LEVEL_OVERRIDE.load(Ordering::Relaxed) {
        UNSET => std::env::var("PLIB_LOG_LEVEL")
            .ok()
            .and_then(|v| LogLevel::parse(&v)),
        v => Some(LogLevel::from_u8(v)),
    }
}

fn build_filter() -> EnvFilter {
    match requested_level() {
        Some(level) => EnvFilter::new(level.directive()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

/// Install the stderr subscriber
///
/// Idempotent. Returns `false` if this call did not install it, either
/// because `init` already ran or another global subscriber exists.
pub fn init() -> bool {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return false;
    }

    tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
