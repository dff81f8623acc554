//! Utility functions for common operations.
//!
//! - **URL validation**: allowlist checks for URLs the relay forwards to
//! - **Text processing**: Unicode-aware width handling for terminal tables

mod text;
mod url_validator;

pub use text::{fit_to_width, single_line, truncate_to_width};
pub use url_validator::{validate_target_url, UrlValidationError};
