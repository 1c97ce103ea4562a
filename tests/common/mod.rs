#![allow(dead_code)]

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use travel_content::config::{self, Config};
use travel_content::repository::{ContentRepository, RepositoryRequest};
use travel_content::RepositoryError;

type Handler = dyn Fn(&RepositoryRequest) -> Result<Value, RepositoryError> + Send + Sync;
type Delay = dyn Fn(&RepositoryRequest) -> Duration + Send + Sync;

/// Fake repository that records every request. Answers come from a
/// per-request handler when set, otherwise from a queue of canned responses.
#[derive(Clone, Default)]
pub struct RecordingRepository {
    responses: Arc<Mutex<VecDeque<Result<Value, RepositoryError>>>>,
    handler: Option<Arc<Handler>>,
    delay: Option<Arc<Delay>>,
    calls: Arc<Mutex<Vec<RepositoryRequest>>>,
    completed: Arc<Mutex<Vec<RepositoryRequest>>>,
}

impl RecordingRepository {
    pub fn with_responses(responses: Vec<Result<Value, RepositoryError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Default::default()
        }
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&RepositoryRequest) -> Result<Value, RepositoryError> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Arc::new(handler)),
            ..Default::default()
        }
    }

    /// Hold each answer back for `delay(request)` before returning it.
    pub fn delayed<F>(mut self, delay: F) -> Self
    where
        F: Fn(&RepositoryRequest) -> Duration + Send + Sync + 'static,
    {
        self.delay = Some(Arc::new(delay));
        self
    }

    /// Requests whose answer has been returned, in completion order.
    pub async fn completed(&self) -> Vec<RepositoryRequest> {
        self.completed.lock().await.clone()
    }

    pub async fn calls(&self) -> Vec<RepositoryRequest> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait::async_trait]
impl ContentRepository for RecordingRepository {
    async fn query(&self, request: &RepositoryRequest) -> Result<Value, RepositoryError> {
        self.calls.lock().await.push(request.clone());
        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(request)).await;
        }
        let answer = match &self.handler {
            Some(handler) => handler(request),
            None => self
                .responses
                .lock()
                .await
                .pop_front()
                .unwrap_or(Ok(Value::Null)),
        };
        self.completed.lock().await.push(request.clone());
        answer
    }
}

pub fn example_config() -> Config {
    serde_yaml::from_str(config::example()).unwrap()
}
