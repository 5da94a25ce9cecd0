//! Echo backend - echoes the request text back.

use async_trait::async_trait;
use vet_core::{AssistantBackend, BackendError, BackendRequest, MediaRef};

/// A backend that echoes the request text back.
///
/// Useful for testing the turn flow without any AI processing.
#[derive(Debug, Clone, Default)]
pub struct EchoBackend {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoBackend {
    /// Create a new EchoBackend with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoBackend with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_backend::EchoBackend;
    ///
    /// let backend = EchoBackend::with_prefix("Echo: ");
    /// // Will respond with "Echo: <request text>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn echo(&self, request: &BackendRequest, media: Option<&MediaRef>) -> String {
        let mut text = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, request.text),
            None => request.text.clone(),
        };
        if let Some(media) = media {
            text.push_str(&format!(" [{}]", media.id));
        }
        text
    }
}

#[async_trait]
impl AssistantBackend for EchoBackend {
    async fn send_text(&self, request: &BackendRequest) -> Result<String, BackendError> {
        Ok(self.echo(request, None))
    }

    async fn send_image(&self, request: &BackendRequest, image: &MediaRef) -> Result<String, BackendError> {
        Ok(self.echo(request, Some(image)))
    }

    async fn send_video(&self, request: &BackendRequest, video: &MediaRef) -> Result<String, BackendError> {
        Ok(self.echo(request, Some(video)))
    }

    async fn send_audio(&self, request: &BackendRequest, audio: &MediaRef) -> Result<String, BackendError> {
        Ok(self.echo(request, Some(audio)))
    }

    fn name(&self) -> &str {
        "EchoBackend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vet_core::Language;

    #[tokio::test]
    async fn test_echo_no_prefix() {
        let backend = EchoBackend::new();
        let request = BackendRequest::new("Hello!", Language::En);

        let reply = backend.send_text(&request).await.unwrap();
        assert_eq!(reply, "Hello!");
    }

    #[tokio::test]
    async fn test_echo_with_prefix() {
        let backend = EchoBackend::with_prefix("Echo: ");
        let request = BackendRequest::new("Hola", Language::Es);

        let reply = backend.send_text(&request).await.unwrap();
        assert_eq!(reply, "Echo: Hola");
    }

    #[tokio::test]
    async fn test_echo_notes_media() {
        let backend = EchoBackend::new();
        let request = BackendRequest::new("look", Language::En);

        let reply = backend
            .send_image(&request, &MediaRef::image("img-7"))
            .await
            .unwrap();
        assert_eq!(reply, "look [img-7]");
    }

    #[tokio::test]
    async fn test_backend_name_and_ready() {
        let backend = EchoBackend::new();
        assert_eq!(backend.name(), "EchoBackend");
        assert!(backend.is_ready().await);
    }
}
