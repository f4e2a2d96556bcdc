pub mod annotation;
pub mod client;
pub mod config;
pub mod error;
pub mod params;
pub mod protocol;
pub mod render;
pub mod session;
pub mod upload;

pub use annotation::{FaceBox, RecognitionResult, UNKNOWN_NAME};
pub use client::{HttpRecognitionClient, RecognitionService};
pub use config::Settings;
pub use error::{ConfigError, RecognitionError, RenderError, SessionError};
pub use params::RecognitionParams;
pub use protocol::{classify, RecognitionSuccess, RecognizeReply, ServiceReply};
pub use render::{
    render, DisplayLayout, DisplayTransform, EntryHandle, HoverTarget, ImageDimensions, ListEntry,
    OverlayBox, OverlayHandle, RenderedAnnotations,
};
pub use session::{PanelStatus, RecognitionSession, RequestKind, RequestTicket, ViewState};
pub use upload::{SelectedFile, MAX_UPLOAD_BYTES, MAX_UPLOAD_MB};

use tracing_subscriber::EnvFilter;

/// Logs to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `photo.jpg` -> `photo_annotated.png`
pub fn annotated_file_name(original: &str) -> String {
    let stem = std::path::Path::new(original)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());
    format!("{stem}_annotated.png")
}
