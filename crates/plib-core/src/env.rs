//! Environment variable utilities
//!
//! Typed lookups with defaults, plus key composition for per-instance
//! settings (`PLIB_POOL_<NAME>_MAX_THREADS`).
//!
//! # Usage
//!
//! ```ignore
//! use plib_core::env::{env_get, env_get_bool, instance_key};
//!
//! let max: usize = env_get("PLIB_POOL_MAX_THREADS", 8);
//! let verbose = env_get_bool("PLIB_VERBOSE", false);
//! let key = instance_key("PLIB_POOL", "io", "MAX_THREADS"); // PLIB_POOL_IO_MAX_THREADS
//! ```

use std::str::FromStr;

/// Get environment variable parsed as type T, or return default
///
/// Unset and unparsable values both fall back to `default`.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(key).unwrap_or(default)
}

/// Get environment variable as boolean
///
/// Accepts "1", "true", "yes", "on" (case-insensitive) as true. Anything
/// else that is set counts as false; unset returns `default`.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// Get environment variable as optional value
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Get environment variable as string, or return default
#[inline]
pub fn env_get_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Check if environment variable is set (regardless of value)
#[inline]
pub fn env_is_set(key: &str) -> bool {
    std::env::var(key).is_ok()
}

/// Build `<PREFIX>_<INSTANCE>_<SETTING>` with the instance name upper-cased
/// and every non-alphanumeric character mapped to `_`
pub fn instance_key(prefix: &str, instance: &str, setting: &str) -> String {
    let instance: String = instance
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}_{}", prefix, instance, setting)
}

/// Look up a per-instance setting, falling back to the shared key
///
/// `PLIB_POOL_IO_MAX_THREADS` wins over `PLIB_POOL_MAX_THREADS`, which wins
/// over `default`.
pub fn env_get_instance<T>(prefix: &str, instance: &str, setting: &str, default: T) -> T
where
    T: FromStr,
{
    env_get_opt(&instance_key(prefix, instance, setting))
        .or_else(|| env_get_opt(&format!("{}_{}", prefix, setting)))
        .unwrap_or(default)
}
