//! Failing backend - every call returns an error.

use async_trait::async_trait;
use vet_core::{
    AnalysisRequest, AnalysisService, AssistantBackend, BackendError, BackendRequest, MediaRef,
};

/// Which error a [`FailingBackend`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureKind {
    #[default]
    Unavailable,
    QuotaExceeded,
    Timeout,
}

impl FailureKind {
    fn to_error(self) -> BackendError {
        match self {
            Self::Unavailable => BackendError::Unavailable("connection refused".to_string()),
            Self::QuotaExceeded => BackendError::QuotaExceeded("daily limit reached".to_string()),
            Self::Timeout => BackendError::Timeout,
        }
    }
}

/// A backend (and analysis service) whose every call fails.
#[derive(Debug, Clone, Default)]
pub struct FailingBackend {
    kind: FailureKind,
}

impl FailingBackend {
    pub fn new(kind: FailureKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl AssistantBackend for FailingBackend {
    async fn send_text(&self, _request: &BackendRequest) -> Result<String, BackendError> {
        Err(self.kind.to_error())
    }

    async fn send_image(&self, _request: &BackendRequest, _image: &MediaRef) -> Result<String, BackendError> {
        Err(self.kind.to_error())
    }

    async fn send_video(&self, _request: &BackendRequest, _video: &MediaRef) -> Result<String, BackendError> {
        Err(self.kind.to_error())
    }

    async fn send_audio(&self, _request: &BackendRequest, _audio: &MediaRef) -> Result<String, BackendError> {
        Err(self.kind.to_error())
    }

    fn name(&self) -> &str {
        "FailingBackend"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}

#[async_trait]
impl AnalysisService for FailingBackend {
    async fn analyze(&self, _request: &AnalysisRequest) -> Result<String, BackendError> {
        Err(self.kind.to_error())
    }

    fn name(&self) -> &str {
        "FailingBackend"
    }
}
