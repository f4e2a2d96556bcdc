use thiserror::Error;

use crate::upload::MAX_UPLOAD_MB;

/// Outcome of a `/recognize` request that did not produce annotations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecognitionError {
    /// The request never produced a usable reply.
    #[error("Client Error: {0}. Check network or console.")]
    Transport(String),

    /// Non-2xx status.
    #[error("Error {status}: {}", http_detail(.status, .message))]
    Http { status: u16, message: Option<String> },

    /// 2xx reply carrying an `error` field.
    #[error("Processing Error: {message}")]
    Application {
        message: String,
        original_filename: Option<String>,
        image_url: Option<String>,
    },
}

fn http_detail(status: &u16, message: &Option<String>) -> String {
    if *status == 413 {
        return format!("File too large (max {}MB).", MAX_UPLOAD_MB);
    }
    match message.as_deref() {
        Some(text) if !text.is_empty() => text.to_owned(),
        _ => "An unknown server error occurred.".to_owned(),
    }
}

impl RecognitionError {
    /// Image the server processed before failing, if any.
    pub fn image_url(&self) -> Option<&str> {
        match self {
            RecognitionError::Application { image_url, .. } => image_url.as_deref(),
            _ => None,
        }
    }

    pub fn original_filename(&self) -> Option<&str> {
        match self {
            RecognitionError::Application { original_filename, .. } => original_filename.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Error: Could not get image dimensions for scaling annotations.")]
    DimensionUnavailable { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a recognition request is already in flight")]
    RequestInFlight,

    #[error("Please choose an image first.")]
    NoFileSelected,

    #[error("File is too large ({:.2}MB). Maximum size is {}MB.", megabytes(.size), MAX_UPLOAD_MB)]
    FileTooLarge { size: u64 },

    #[error("controls are disabled while a request is pending")]
    ControlsDisabled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn megabytes(size: &u64) -> f64 {
    *size as f64 / (1024.0 * 1024.0)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid endpoint url {url:?}: {reason}")]
    Endpoint { url: String, reason: String },
}
