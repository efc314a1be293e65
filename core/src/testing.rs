//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::client::ApiClient;
use crate::credentials::NoCredentials;
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse, Transport};

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

enum Step {
    Ready(Result<HttpResponse, TransportError>),
    Gated(oneshot::Receiver<()>, Result<HttpResponse, TransportError>),
}

/// Replays queued responses in order, falling back to a handler when the
/// queue is empty, and records every request it sees.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::default()
        }
    }

    pub(crate) fn push_response(&self, status: u16, body: &str) {
        self.steps.lock().unwrap().push_back(Step::Ready(Ok(response(status, body))));
    }

    pub(crate) fn push_failure(&self, cause: &str) {
        self.steps
            .lock()
            .unwrap()
            .push_back(Step::Ready(Err(TransportError::new(cause))));
    }

    /// Queue a response that is only delivered once the returned sender fires.
    pub(crate) fn push_gated(&self, status: u16, body: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.steps
            .lock()
            .unwrap()
            .push_back(Step::Gated(rx, Ok(response(status, body))));
        tx
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Ready(result)) => result,
            Some(Step::Gated(gate, result)) => {
                let _ = gate.await;
                result
            }
            None => match &self.handler {
                Some(handler) => Ok(handler(&request)),
                None => Err(TransportError::new("no scripted response left")),
            },
        }
    }
}

pub(crate) fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

pub(crate) fn scripted_client() -> (ApiClient, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new());
    let client = ApiClient::new("http://hr.test", transport.clone(), Arc::new(NoCredentials));
    (client, transport)
}
