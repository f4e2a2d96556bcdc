use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::error::SessionError;

pub const MAX_UPLOAD_MB: u64 = 5;
pub const MAX_UPLOAD_BYTES: u64 = MAX_UPLOAD_MB * 1024 * 1024;

/// An image chosen by the user, kept around so it can be re-submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    name: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> SelectedFile {
        SelectedFile { name: name.into(), bytes: bytes.into() }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<SelectedFile, SessionError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => path.to_string_lossy().into_owned(),
        };
        debug!("read {} ({} bytes)", name, bytes.len());
        Ok(SelectedFile::from_bytes(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Client-side ceiling, checked before anything is sent.
    pub fn check_size(&self) -> Result<(), SessionError> {
        if self.size() > MAX_UPLOAD_BYTES {
            return Err(SessionError::FileTooLarge { size: self.size() });
        }
        Ok(())
    }
}
