//! Transport double shared by the gateway and endpoint tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use super::transport::{ApiResponse, OutboundRequest, Transport};
use super::ApiError;

enum Scripted {
    Respond(u16, String),
    Fail(String),
}

/// Records every request. Requests whose URL ends with a routed suffix get
/// that route's answer; the rest replay scripted outcomes in order, then
/// `200 {}` once the script runs out.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<OutboundRequest>>,
    script: Mutex<VecDeque<Scripted>>,
    routes: Mutex<Vec<(String, u16, String)>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Respond(status, body.to_string()));
    }

    pub fn route(&self, url_suffix: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .push((url_suffix.to_string(), status, body.to_string()));
    }

    pub fn fail(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Fail(message.to_string()));
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse, ApiError> {
        let routed = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(suffix, _, _)| request.url.ends_with(suffix.as_str()))
            .map(|(_, status, body)| Scripted::Respond(*status, body.clone()));
        self.requests.lock().unwrap().push(request);
        let next = routed.or_else(|| self.script.lock().unwrap().pop_front());
        match next {
            Some(Scripted::Respond(status, body)) => Ok(ApiResponse::new(
                StatusCode::from_u16(status).unwrap(),
                HeaderMap::new(),
                body.into_bytes(),
            )),
            Some(Scripted::Fail(message)) => Err(ApiError::Network(message.into())),
            None => Ok(ApiResponse::new(StatusCode::OK, HeaderMap::new(), b"{}".to_vec())),
        }
    }
}
