// Field Validators - Reusable validation components
use std::fmt::Display;

use once_cell::sync::Lazy;

/// Trait for field validators
pub trait FieldValidator<T: ?Sized> {
    /// Validate a field value
    fn validate(&self, value: &T) -> Result<(), String>;
}

/// Range validator for numeric types
#[derive(Debug, Clone)]
pub struct RangeValidator<T> {
    min: Option<T>,
    max: Option<T>,
    exclusive_min: bool,
}

impl<T> Default for RangeValidator<T>
where
    T: PartialOrd + Display + Clone,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> RangeValidator<T>
where
    T: PartialOrd + Display + Clone,
{
    /// Create a validator without bounds
    pub fn empty() -> Self {
        Self { min: None, max: None, exclusive_min: false }
    }

    /// Inclusive lower bound
    pub fn min(mut self, min: T) -> Self {
        self.min = Some(min);
        self.exclusive_min = false;
        self
    }

    /// Exclusive lower bound
    pub fn greater_than(mut self, min: T) -> Self {
        self.min = Some(min);
        self.exclusive_min = true;
        self
    }

    /// Inclusive upper bound
    pub fn max(mut self, max: T) -> Self {
        self.max = Some(max);
        self
    }
}

impl<T> FieldValidator<T> for RangeValidator<T>
where
    T: PartialOrd + Display + Clone,
{
    fn validate(&self, value: &T) -> Result<(), String> {
        if let Some(ref min) = self.min {
            if self.exclusive_min && value <= min {
                return Err(format!("Value must be greater than {min}"));
            }
            if !self.exclusive_min && value < min {
                return Err(format!("Value must be at least {min}"));
            }
        }

        if let Some(ref max) = self.max {
            if value > max {
                return Err(format!("Value must not exceed {max}"));
            }
        }

        Ok(())
    }
}

/// String validator with length constraints
#[derive(Debug, Clone)]
pub struct StringValidator {
    max_length: Option<usize>,
    not_empty: bool,
}

impl Default for StringValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl StringValidator {
    /// Create a new string validator
    pub fn new() -> Self {
        Self { max_length: None, not_empty: false }
    }

    /// Require a value that is non-empty after trimming
    pub fn not_empty(mut self) -> Self {
        self.not_empty = true;
        self
    }

    /// Set maximum length in characters
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

impl FieldValidator<str> for StringValidator {
    fn validate(&self, value: &str) -> Result<(), String> {
        let val = value.trim();

        if self.not_empty && val.is_empty() {
            return Err("Value cannot be empty".to_string());
        }

        if let Some(max) = self.max_length {
            if val.chars().count() > max {
                return Err(format!("Length must not exceed {max} characters"));
            }
        }

        Ok(())
    }
}

/// Email regex compiled once at first use
static EMAIL_REGEX: Lazy<Option<regex::Regex>> =
    Lazy::new(|| regex::Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok());

/// Email validator
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailValidator;

impl EmailValidator {
    /// Create a new email validator
    pub fn new() -> Self {
        Self
    }
}

impl FieldValidator<str> for EmailValidator {
    fn validate(&self, value: &str) -> Result<(), String> {
        let matches = EMAIL_REGEX.as_ref().is_some_and(|regex| regex.is_match(value.trim()));
        if !matches {
            return Err("Invalid email format".to_string());
        }

        Ok(())
    }
}

/// Canonical form used for email comparison and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
