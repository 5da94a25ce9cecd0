//! Delayed backend - wraps another backend with artificial delay.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use vet_core::{AssistantBackend, BackendError, BackendRequest, MediaRef};

/// A backend that wraps another backend and adds artificial delay.
///
/// Useful for testing deadline handling and simulating AI latency.
pub struct DelayedBackend<B: AssistantBackend> {
    inner: B,
    delay: Duration,
}

impl<B: AssistantBackend> DelayedBackend<B> {
    /// Create a new DelayedBackend wrapping the given backend with the specified delay.
    pub fn new(inner: B, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a backend with a delay in milliseconds.
    pub fn with_millis(inner: B, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Create a backend with a delay in seconds.
    pub fn with_secs(inner: B, secs: u64) -> Self {
        Self::new(inner, Duration::from_secs(secs))
    }

    /// Get the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: AssistantBackend> AssistantBackend for DelayedBackend<B> {
    async fn send_text(&self, request: &BackendRequest) -> Result<String, BackendError> {
        sleep(self.delay).await;
        self.inner.send_text(request).await
    }

    async fn send_image(&self, request: &BackendRequest, image: &MediaRef) -> Result<String, BackendError> {
        sleep(self.delay).await;
        self.inner.send_image(request, image).await
    }

    async fn send_video(&self, request: &BackendRequest, video: &MediaRef) -> Result<String, BackendError> {
        sleep(self.delay).await;
        self.inner.send_video(request, video).await
    }

    async fn send_audio(&self, request: &BackendRequest, audio: &MediaRef) -> Result<String, BackendError> {
        sleep(self.delay).await;
        self.inner.send_audio(request, audio).await
    }

    fn name(&self) -> &str {
        "DelayedBackend"
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }
}
