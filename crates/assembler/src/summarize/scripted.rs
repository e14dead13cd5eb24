//! Scripted: deterministic [`Summarizer`] for tests.
//!
//! Replies come from a queue filled by the test; once it is empty every call
//! succeeds with a numbered placeholder. Every request is recorded.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::Mutex;

use super::{SummaryRequest, Summarizer};
use crate::error::SummarizeError;

#[derive(Default)]
struct Inner {
    replies: VecDeque<Result<String, String>>,
    requests: Vec<SummaryRequest>,
}

#[derive(Default)]
pub struct ScriptedSummarizer {
    inner: Mutex<Inner>,
    delay: Option<Duration>,
}

impl ScriptedSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn push_reply(&self, text: impl Into<String>) {
        self.inner.lock().await.replies.push_back(Ok(text.into()));
    }

    pub async fn push_failure(&self, message: impl Into<String>) {
        self.inner.lock().await.replies.push_back(Err(message.into()));
    }

    pub async fn requests(&self) -> Vec<SummaryRequest> {
        self.inner.lock().await.requests.clone()
    }
}

impl Summarizer for ScriptedSummarizer {
    fn summarize(
        &self,
        request: SummaryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, SummarizeError>> + Send + '_>> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let mut inner = self.inner.lock().await;
            inner.requests.push(request);
            let call = inner.requests.len();
            match inner.replies.pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(SummarizeError::Collaborator(message)),
                None => Ok(format!("summary #{}", call)),
            }
        })
    }
}
