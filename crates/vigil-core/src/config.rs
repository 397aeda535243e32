//! Helpers for reading service configuration from environment variables.

use std::str::FromStr;

use anyhow::{Context as _, anyhow};

/// Read a required variable. Fails if it is unset or empty.
pub fn required(name: &str) -> anyhow::Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        Ok(_) => Err(anyhow!("{name} is empty")),
        Err(e) => Err(e).with_context(|| format!("{name} is not set")),
    }
}

/// Read an optional variable and parse it, falling back to `default` when unset.
///
/// A value that is present but unparsable is an error rather than a silent default.
pub fn parsed_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(v) => v
            .parse()
            .with_context(|| format!("{name} has an invalid value: {v:?}")),
        Err(_) => Ok(default),
    }
}

/// Read an optional string variable, falling back to `default` when unset.
pub fn string_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}
