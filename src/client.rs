use std::time::{Duration, Instant};

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tracing::{debug, info};

use crate::error::RecognitionError;
use crate::params::RecognitionParams;
use crate::protocol::ServiceReply;
use crate::upload::SelectedFile;

/// The external recognition service.
///
/// Any failure to obtain a reply is reported as [`RecognitionError::Transport`];
/// status codes and bodies are left for [`crate::protocol::classify`].
#[allow(async_fn_in_trait)]
pub trait RecognitionService {
    async fn recognize(
        &self,
        file: &SelectedFile,
        params: &RecognitionParams,
    ) -> Result<ServiceReply, RecognitionError>;

    /// Downloads the processed image referenced by a reply's `image_url`.
    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, RecognitionError>;
}

fn transport(err: impl std::fmt::Display) -> RecognitionError {
    RecognitionError::Transport(err.to_string())
}

/// `POST /recognize` over HTTP with a multipart body.
#[derive(Debug, Clone)]
pub struct HttpRecognitionClient {
    client: Client,
    endpoint: Url,
}

impl HttpRecognitionClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<HttpRecognitionClient, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpRecognitionClient { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Resolves a path from a reply against the service endpoint.
    pub fn resolve(&self, path: &str) -> Result<Url, RecognitionError> {
        self.endpoint.join(path).map_err(transport)
    }

    fn form(file: &SelectedFile, params: &RecognitionParams) -> Form {
        let part = Part::bytes(file.bytes().to_vec()).file_name(file.name().to_owned());
        params
            .form_fields()
            .into_iter()
            .fold(Form::new().part("file", part), |form, (key, value)| form.text(key, value))
    }
}

impl RecognitionService for HttpRecognitionClient {
    async fn recognize(
        &self,
        file: &SelectedFile,
        params: &RecognitionParams,
    ) -> Result<ServiceReply, RecognitionError> {
        let url = self.resolve("recognize")?;
        info!("POST {} ({}, {} bytes)", url, file.name(), file.size());
        let started = Instant::now();

        let response = self
            .client
            .post(url)
            .multipart(Self::form(file, params))
            .send()
            .await
            .map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;

        debug!("status {} after {:?}", status, started.elapsed());
        Ok(ServiceReply { status, body })
    }

    async fn fetch_image(&self, image_url: &str) -> Result<Vec<u8>, RecognitionError> {
        let url = self.resolve(image_url)?;
        debug!("GET {}", url);
        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(transport)?
            .bytes()
            .await
            .map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> HttpRecognitionClient {
        HttpRecognitionClient::new(Url::parse(endpoint).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn recognize_path_is_relative_to_endpoint() {
        assert_eq!(
            client("http://127.0.0.1:5000/").resolve("recognize").unwrap().as_str(),
            "http://127.0.0.1:5000/recognize"
        );
        assert_eq!(
            client("http://faces.local/threadfinder/").resolve("recognize").unwrap().as_str(),
            "http://faces.local/threadfinder/recognize"
        );
    }

    #[test]
    fn image_urls_resolve_like_a_browser() {
        let client = client("http://faces.local/threadfinder/");
        assert_eq!(
            client.resolve("/uploads/abc.jpg").unwrap().as_str(),
            "http://faces.local/uploads/abc.jpg"
        );
        assert_eq!(
            client.resolve("https://cdn.example/abc.jpg").unwrap().as_str(),
            "https://cdn.example/abc.jpg"
        );
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        // port 9 (discard) on localhost is closed in test environments
        let client = client("http://127.0.0.1:9/");
        let file = SelectedFile::from_bytes("a.png", vec![1u8, 2, 3]);
        let err = client.recognize(&file, &RecognitionParams::default()).await.unwrap_err();
        assert!(matches!(err, RecognitionError::Transport(_)));
    }
}
