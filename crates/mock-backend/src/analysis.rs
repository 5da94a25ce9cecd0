//! Fixed analysis service - returns canned structured results.

use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use vet_core::{AnalysisRequest, AnalysisService, BackendError};

/// An analysis service returning canned raw results.
///
/// Queued results are returned first; afterwards every call returns the
/// default result. All requests are recorded.
#[derive(Debug)]
pub struct FixedAnalysis {
    default_result: String,
    queued: Mutex<VecDeque<Result<String, BackendError>>>,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl Default for FixedAnalysis {
    fn default() -> Self {
        Self::new(
            json!({
                "condition": "benign finding",
                "confidence": 0.82,
                "severity": "low",
                "recommendations": ["Monitor for changes over the next two weeks"]
            })
            .to_string(),
        )
    }
}

impl FixedAnalysis {
    /// Create a service that always returns `raw`.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            default_result: raw.into(),
            queued: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue an error for the next call (builder style).
    pub fn with_error(mut self, error: BackendError) -> Self {
        self.queued.get_mut().push_back(Err(error));
        self
    }

    /// Queue a raw result for the next call (builder style).
    pub fn with_result(mut self, raw: impl Into<String>) -> Self {
        self.queued.get_mut().push_back(Ok(raw.into()));
        self
    }

    /// All requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl AnalysisService for FixedAnalysis {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, BackendError> {
        self.requests.lock().await.push(request.clone());
        match self.queued.lock().await.pop_front() {
            Some(result) => result,
            None => Ok(self.default_result.clone()),
        }
    }

    fn name(&self) -> &str {
        "FixedAnalysis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vet_core::{AnalysisKind, Language, MediaRef};

    #[tokio::test]
    async fn test_queued_then_default() {
        let service = FixedAnalysis::new("{}").with_result("first");
        let request = AnalysisRequest::new(
            AnalysisKind::Ocular,
            vec![MediaRef::image("eye-1")],
            "",
            Language::En,
        );

        assert_eq!(service.analyze(&request).await.unwrap(), "first");
        assert_eq!(service.analyze(&request).await.unwrap(), "{}");
        assert_eq!(service.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_default_result_is_json() {
        let service = FixedAnalysis::default();
        let request = AnalysisRequest::new(AnalysisKind::Skin, vec![], "", Language::Es);
        let raw = service.analyze(&request).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["severity"], "low");
    }
}
