use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::annotation::RecognitionResult;
use crate::error::RecognitionError;

/// Raw HTTP reply from the recognition service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReply {
    pub status: u16,
    pub body: String,
}

impl ServiceReply {
    pub fn new(status: u16, body: impl Into<String>) -> ServiceReply {
        ServiceReply { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// JSON body of a `/recognize` reply. Success and error replies share one shape.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RecognizeReply {
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub annotations: Vec<RecognitionResult>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionSuccess {
    pub original_filename: String,
    pub image_url: Option<String>,
    pub annotations: Vec<RecognitionResult>,
    pub message: Option<String>,
}

impl RecognizeReply {
    /// Sorts a parsed 2xx body into success or an application-level failure.
    pub fn into_outcome(self, fallback_filename: &str) -> Result<RecognitionSuccess, RecognitionError> {
        if let Some(message) = self.error {
            return Err(RecognitionError::Application {
                message,
                original_filename: self.original_filename,
                image_url: self.image_url,
            });
        }
        Ok(RecognitionSuccess {
            original_filename: self.original_filename.unwrap_or_else(|| fallback_filename.to_owned()),
            image_url: self.image_url,
            annotations: self.annotations,
            message: self.message,
        })
    }
}

/// Classifies a reply as success, HTTP failure or application failure.
pub fn classify(reply: ServiceReply, fallback_filename: &str) -> Result<RecognitionSuccess, RecognitionError> {
    let parsed = serde_json::from_str::<RecognizeReply>(&reply.body);

    if !reply.is_success() {
        let message = match parsed {
            Ok(body) => body.error,
            Err(err) => {
                debug!("status {} body is not json: {}", reply.status, err);
                None
            }
        };
        warn!("recognize failed with status {}", reply.status);
        return Err(RecognitionError::Http { status: reply.status, message });
    }

    match parsed {
        Ok(body) => body.into_outcome(fallback_filename),
        Err(err) => {
            warn!("unreadable reply body: {}", err);
            Err(RecognitionError::Transport(format!("invalid JSON in response: {err}")))
        }
    }
}
