//! # Server Calls
//!
//! [`Io`] is the network client handed to collaborators. It stamps every
//! request with the page's context id and passes it to a [`Transport`],
//! which owns delivery, retries and failure reporting.
//!
//! Calls are asynchronous: `send` returns a [`RequestId`] and the host later
//! reports the parsed response with
//! [`ForumArticle::complete_request`](crate::ForumArticle::complete_request).

use crate::errors::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Ticket identifying an in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request as handed to the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRequest {
    #[serde(rename = "contextid")]
    pub context_id: u64,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ServerRequest {
    /// The `action` field of the payload
    pub fn action(&self) -> Option<&str> {
        self.payload.get("action").and_then(Value::as_str)
    }
}

/// Payload for deleting a post or discussion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletePostRequest<'a> {
    #[serde(rename = "postid")]
    pub post_id: u64,
    pub sesskey: &'a str,
    pub action: &'static str,
}

impl<'a> DeletePostRequest<'a> {
    pub const ACTION: &'static str = "delete_post";

    pub fn new(post_id: u64, sesskey: &'a str) -> Self {
        Self {
            post_id,
            sesskey,
            action: Self::ACTION,
        }
    }
}

/// Delivers requests to the server
pub trait Transport {
    fn send(&self, request: ServerRequest) -> Result<RequestId, TransportError>;
}

/// Network client bound to one context
pub struct Io {
    context_id: u64,
    transport: Box<dyn Transport>,
}

impl Io {
    pub fn new(context_id: u64, transport: Box<dyn Transport>) -> Self {
        Self {
            context_id,
            transport,
        }
    }

    pub fn context_id(&self) -> u64 {
        self.context_id
    }

    /// Send `payload` with the context id attached
    pub fn send<P: Serialize>(&self, payload: &P) -> Result<RequestId, TransportError> {
        let Value::Object(payload) = serde_json::to_value(payload)? else {
            return Err(TransportError::InvalidPayload);
        };

        let request = ServerRequest {
            context_id: self.context_id,
            payload,
        };
        tracing::debug!(
            context_id = self.context_id,
            action = request.action().unwrap_or("<none>"),
            "sending request"
        );
        self.transport.send(request)
    }
}

impl fmt::Debug for Io {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Io")
            .field("context_id", &self.context_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Outbox(Rc<RefCell<Vec<ServerRequest>>>);

    impl Transport for Outbox {
        fn send(&self, request: ServerRequest) -> Result<RequestId, TransportError> {
            let mut sent = self.0.borrow_mut();
            sent.push(request);
            Ok(RequestId(sent.len() as u64))
        }
    }

    #[test]
    fn test_send_attaches_context_id() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let io = Io::new(42, Box::new(Outbox(sent.clone())));

        let id = io.send(&DeletePostRequest::new(9, "key")).unwrap();
        assert_eq!(id, RequestId(1));

        let sent = sent.borrow();
        let json = serde_json::to_value(&sent[0]).unwrap();
        assert_eq!(json["contextid"], 42);
        assert_eq!(json["postid"], 9);
        assert_eq!(json["sesskey"], "key");
        assert_eq!(json["action"], "delete_post");
        assert_eq!(sent[0].action(), Some("delete_post"));
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let io = Io::new(1, Box::new(Outbox(Rc::new(RefCell::new(Vec::new())))));
        assert!(matches!(io.send(&5), Err(TransportError::InvalidPayload)));
    }
}
