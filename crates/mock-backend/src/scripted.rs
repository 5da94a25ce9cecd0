//! Scripted backend - replays queued replies and records every call.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;
use vet_core::{AssistantBackend, BackendError, BackendRequest, MediaRef};

/// Which backend entry point a call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Text,
    Image,
    Video,
    Audio,
}

/// A call captured by [`ScriptedBackend`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub channel: Channel,
    pub request: BackendRequest,
    pub media: Option<MediaRef>,
}

/// A backend that answers from a queue of scripted replies.
///
/// Once the queue is empty it echoes the request text. Every call is
/// recorded so tests can assert on what the orchestrator delegated.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    /// Create a backend with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply (builder style).
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.replies.get_mut().push_back(Ok(reply.into()));
        self
    }

    /// Queue an error (builder style).
    pub fn with_error(mut self, error: BackendError) -> Self {
        self.replies.get_mut().push_back(Err(error));
        self
    }

    /// Queue a successful reply.
    pub async fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().await.push_back(Ok(reply.into()));
    }

    /// All calls received so far, oldest first.
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// The most recent call, if any.
    pub async fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().await.last().cloned()
    }

    async fn answer(
        &self,
        channel: Channel,
        request: &BackendRequest,
        media: Option<&MediaRef>,
    ) -> Result<String, BackendError> {
        self.calls.lock().await.push(RecordedCall {
            channel,
            request: request.clone(),
            media: media.cloned(),
        });

        match self.replies.lock().await.pop_front() {
            Some(reply) => reply,
            None => Ok(request.text.clone()),
        }
    }
}

#[async_trait]
impl AssistantBackend for ScriptedBackend {
    async fn send_text(&self, request: &BackendRequest) -> Result<String, BackendError> {
        self.answer(Channel::Text, request, None).await
    }

    async fn send_image(&self, request: &BackendRequest, image: &MediaRef) -> Result<String, BackendError> {
        self.answer(Channel::Image, request, Some(image)).await
    }

    async fn send_video(&self, request: &BackendRequest, video: &MediaRef) -> Result<String, BackendError> {
        self.answer(Channel::Video, request, Some(video)).await
    }

    async fn send_audio(&self, request: &BackendRequest, audio: &MediaRef) -> Result<String, BackendError> {
        self.answer(Channel::Audio, request, Some(audio)).await
    }

    fn name(&self) -> &str {
        "ScriptedBackend"
    }
}
