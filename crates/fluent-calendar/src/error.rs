//! Error types for fluent-calendar operations.

use std::fmt;

use thiserror::Error;

use crate::moment::Field;

/// Messages the date engine produced while rejecting a formatted string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseErrors {
    pub errors: Vec<String>,
}

impl ParseErrors {
    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.errors.join(", "))
    }
}

/// Errors raised while building, parsing or configuring moments.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid argument: cannot parse '{text}' with format '{format}': {errors}")]
    InvalidFormat {
        format: String,
        text: String,
        errors: ParseErrors,
    },

    #[error("Invalid date: {field} : {value} is not a valid value")]
    InvalidDate { field: Field, value: i64 },
}

impl CalendarError {
    /// True for every failure caused by a malformed argument, including
    /// format parse failures.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            CalendarError::InvalidArgument(_) | CalendarError::InvalidFormat { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CalendarError>;
