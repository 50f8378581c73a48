//! One-shot response writer.
//!
//! The sink forwards the single reply to the transport over a oneshot
//! channel. If the transport has gone away (client disconnect), the write is
//! dropped silently. A second write is a [`DispatchViolation`].

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::pipeline::failure::DispatchViolation;

/// The status + JSON body pair sent to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Debug)]
pub struct ResponseSink {
    tx: Option<oneshot::Sender<Reply>>,
    written: Option<StatusCode>,
    discarded: bool,
    violations: Vec<DispatchViolation>,
}

impl ResponseSink {
    /// Create a sink and the receiver the transport waits on.
    pub fn channel() -> (Self, oneshot::Receiver<Reply>) {
        let (tx, rx) = oneshot::channel();
        let sink = Self {
            tx: Some(tx),
            written: None,
            discarded: false,
            violations: Vec::new(),
        };
        (sink, rx)
    }

    /// Write the response. Only the first call has any effect.
    pub fn write(&mut self, status: StatusCode, body: Value) -> Result<(), DispatchViolation> {
        if let Some(first) = self.written {
            let violation = DispatchViolation::DoubleWrite {
                first,
                attempted: status,
            };
            self.violations.push(violation.clone());
            return Err(violation);
        }

        self.written = Some(status);
        if let Some(tx) = self.tx.take() {
            if tx.send(Reply { status, body }).is_err() {
                self.discarded = true;
                tracing::debug!(status = %status, "Transport closed, response discarded");
            }
        }
        Ok(())
    }

    /// Serialize `value` and write it. Encoding failures become a 500.
    pub fn write_json<T: Serialize>(
        &mut self,
        status: StatusCode,
        value: &T,
    ) -> Result<(), DispatchViolation> {
        match serde_json::to_value(value) {
            Ok(body) => self.write(status, body),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode response body");
                self.write(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "failed to encode response" }),
                )
            }
        }
    }

    pub fn is_written(&self) -> bool {
        self.written.is_some()
    }

    /// Status of the first write, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.written
    }

    /// True once the receiving side of the transport is gone.
    pub fn is_closed(&self) -> bool {
        match &self.tx {
            Some(tx) => tx.is_closed(),
            None => self.discarded,
        }
    }

    pub(crate) fn take_violations(&mut self) -> Vec<DispatchViolation> {
        std::mem::take(&mut self.violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_write_wins() {
        let (mut sink, rx) = ResponseSink::channel();
        assert!(!sink.is_written());

        sink.write(StatusCode::OK, json!({ "ok": true })).unwrap();
        let second = sink.write(StatusCode::INTERNAL_SERVER_ERROR, json!({}));

        assert_eq!(
            second,
            Err(DispatchViolation::DoubleWrite {
                first: StatusCode::OK,
                attempted: StatusCode::INTERNAL_SERVER_ERROR,
            })
        );
        assert_eq!(sink.status(), Some(StatusCode::OK));
        assert_eq!(sink.take_violations().len(), 1);

        let reply = rx.await.unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, json!({ "ok": true }));
    }

    #[test]
    fn test_write_after_close_is_noop() {
        let (mut sink, rx) = ResponseSink::channel();
        drop(rx);
        assert!(sink.is_closed());

        assert!(sink.write(StatusCode::OK, json!([])).is_ok());
        assert!(sink.is_written());
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn test_write_json() {
        #[derive(Serialize)]
        struct Hub {
            id: u64,
        }

        let (mut sink, rx) = ResponseSink::channel();
        sink.write_json(StatusCode::CREATED, &Hub { id: 7 }).unwrap();
        let reply = rx.await.unwrap();
        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(reply.body, json!({ "id": 7 }));
    }
}
