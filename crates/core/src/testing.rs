//! Recording transport for tests. Enabled inside this crate's tests and for
//! dependents through the `test-support` feature.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::TransportError;
use crate::transport::{HttpTransport, OutboundRequest, OutboundResponse};

type Responder = dyn Fn(&OutboundRequest) -> Result<OutboundResponse, TransportError> + Send + Sync;

pub struct MockTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl MockTransport {
    pub fn new(
        responder: impl Fn(&OutboundRequest) -> Result<OutboundResponse, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self { responder: Box::new(responder), requests: Mutex::new(Vec::new()) }
    }

    /// Answers every request with the same status and body.
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(move |_| Ok(OutboundResponse { status, body: body.clone() }))
    }

    /// Answers with `{"result": <input>}` where input is the JSON body, or the
    /// decoded `input` query parameter for body-less calls.
    pub fn echo() -> Self {
        Self::new(|request| {
            let input = match (&request.body, request.query_param("input")) {
                (Some(body), _) => body.clone(),
                (None, Some(raw)) => serde_json::from_str(raw).unwrap_or(Value::Null),
                (None, None) => Value::Null,
            };
            Ok(OutboundResponse { status: 200, body: json!({ "result": input }) })
        })
    }

    /// Fails every request as if the host refused the connection.
    pub fn unreachable() -> Self {
        Self::new(|request| {
            Err(TransportError::Connect {
                url: request.url.clone(),
                message: "connection refused".to_owned(),
            })
        })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last_request(&self) -> Option<OutboundRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport").field("calls", &self.call_count()).finish()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse, TransportError> {
        let response = (self.responder)(&request);
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request);
        response
    }
}
