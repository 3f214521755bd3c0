use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use linkogenei_agent::submit::{
    endpoint::SaveEndpoint,
    error::SaveError,
    request::{SaveRequest, SaveResponse},
};

/// Replies with a fixed result and records every call.
pub struct MockEndpoint {
    reply: Result<SaveResponse, SaveError>,
    calls: Mutex<Vec<(SaveRequest, String)>>,
}

impl MockEndpoint {
    pub fn ok() -> Self {
        Self::replying(Ok(SaveResponse::ok()))
    }

    pub fn replying(reply: Result<SaveResponse, SaveError>) -> Self {
        Self {
            reply,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(SaveRequest, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SaveEndpoint for MockEndpoint {
    async fn save(&self, request: &SaveRequest, token: &str) -> Result<SaveResponse, SaveError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.clone(), token.to_string()));
        self.reply.clone()
    }
}

/// Holds every call until the test releases it.
pub struct GatedEndpoint {
    gate: Semaphore,
    calls: Mutex<Vec<SaveRequest>>,
}

impl GatedEndpoint {
    pub fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SaveEndpoint for GatedEndpoint {
    async fn save(&self, request: &SaveRequest, _token: &str) -> Result<SaveResponse, SaveError> {
        self.calls.lock().unwrap().push(request.clone());
        let permit = self.gate.acquire().await.unwrap();
        permit.forget();
        Ok(SaveResponse::ok())
    }
}

/// Never answers.
pub struct HangingEndpoint;

#[async_trait]
impl SaveEndpoint for HangingEndpoint {
    async fn save(&self, _request: &SaveRequest, _token: &str) -> Result<SaveResponse, SaveError> {
        std::future::pending().await
    }
}
