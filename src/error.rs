//! Structured error types for report generation.
//!
//! Setup problems (fonts, page geometry, option values) and output failures
//! are errors. Malformed table data is not: it surfaces as a
//! [`LayoutWarning`](crate::layout::LayoutWarning) and the render carries on.

use thiserror::Error;

/// The unified error type returned by the public API.
#[derive(Debug, Error)]
pub enum ExportError {
    /// JSON input failed to parse as a report job, style or table.
    #[error("Failed to parse input: {source}{}", render_hint(hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// A font could not be loaded, parsed, or embedded.
    #[error("Font error: {0}")]
    Font(String),
    /// An image could not be read or decoded.
    #[error("Image error: {0}")]
    Image(String),
    /// Page geometry or layout options are unusable.
    #[error("Configuration error: {0}")]
    Config(String),
    /// The document could not be serialized.
    #[error("Render error: {0}")]
    Render(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Excel(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, ExportError>;

fn render_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ExportError::Parse { source: e, hint }
    }
}
