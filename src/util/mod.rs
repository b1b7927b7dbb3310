//! Utility functions shared by configuration and the CLI listing.
//!
//! - **URL validation**: sanity checks for the configured backend root
//! - **Text processing**: Unicode-aware width calculation and truncation

mod text;
mod url_validator;

pub use text::{display_width, fit_to_width, sanitize_line, truncate_to_width};
pub use url_validator::{validate_base_url, UrlValidationError};
