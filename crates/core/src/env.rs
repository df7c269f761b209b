use std::fmt::Display;
use std::str::FromStr;

use crate::{AppError, AppResult};

/// Reads configuration values through an injectable lookup so loaders can be
/// tested without touching the process environment.
///
/// Values are trimmed; a blank value counts as absent.
pub struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    /// Wraps a lookup such as `|name| std::env::var(name).ok()`.
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Returns the trimmed value, or `None` when unset or blank.
    pub fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    /// Returns the value or a validation error naming the variable.
    pub fn required(&self, name: &str) -> AppResult<String> {
        self.optional(name)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    /// Returns the optional value or `default`.
    pub fn or_default(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_owned())
    }

    /// Parses the value, falling back to `default` only when unset.
    /// A malformed value is an error.
    pub fn parsed_or<T>(&self, name: &str, default: T) -> AppResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(name) {
            Some(value) => value
                .parse::<T>()
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
            None => Ok(default),
        }
    }
}
