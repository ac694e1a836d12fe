//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use futures_util::future::BoxFuture;
use reqwest::StatusCode;

use crate::http::request::{redacted_host, HttpRequest};
use crate::http::response::HttpResponse;
use crate::http::transport::{Transport, TransportError, TransportErrorKind};

/// What the transport does for one call.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Status(u16, &'static str),
    Fail(TransportErrorKind, &'static str),
    /// Never completes; only a deadline or cancellation ends it.
    Hang,
}

/// Replays a queue of steps, or a fixed step per host.
pub(crate) struct ScriptedTransport {
    queue: Mutex<VecDeque<Step>>,
    repeat: Option<Step>,
    hosts: HashMap<String, Step>,
    calls: AtomicUsize,
    last: Mutex<Option<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            queue: Mutex::new(steps.into()),
            repeat: None,
            hosts: HashMap::new(),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub(crate) fn repeating(step: Step) -> Self {
        Self {
            repeat: Some(step),
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn per_host(hosts: Vec<(&str, Step)>) -> Self {
        Self {
            hosts: hosts
                .into_iter()
                .map(|(host, step)| (host.to_string(), step))
                .collect(),
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<HttpRequest> {
        self.last.lock().unwrap().clone()
    }

    fn next_step(&self, request: &HttpRequest) -> Step {
        if let Some(step) = self.hosts.get(&redacted_host(&request.url)) {
            return step.clone();
        }
        if let Some(step) = self.queue.lock().unwrap().pop_front() {
            return step;
        }
        self.repeat
            .clone()
            .unwrap_or(Step::Fail(TransportErrorKind::Other, "script exhausted"))
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.next_step(&request);
            *self.last.lock().unwrap() = Some(request);

            match step {
                Step::Status(code, body) => Ok(HttpResponse::new(
                    StatusCode::from_u16(code).unwrap(),
                    body,
                )),
                Step::Fail(kind, message) => Err(TransportError::new(kind, message)),
                Step::Hang => std::future::pending().await,
            }
        })
    }
}
