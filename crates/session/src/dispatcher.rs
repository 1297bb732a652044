//! Request dispatcher: sends a composed payload to the hosted model.

use docpair_core::error::ServiceError;
use docpair_core::prompt::RequestPayload;
use docpair_core::service::DocumentService;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sends one request per cycle and returns the reply text.
pub struct RequestDispatcher {
    service: Arc<dyn DocumentService>,
}

impl RequestDispatcher {
    pub fn new(service: Arc<dyn DocumentService>) -> Self {
        Self { service }
    }

    pub async fn send(&self, payload: &RequestPayload) -> Result<String, ServiceError> {
        debug!(
            service = %self.service.name(),
            documents = payload.documents.len(),
            instruction_chars = payload.instruction.len(),
            "Dispatching request"
        );

        let started = Instant::now();
        match self
            .service
            .generate(&payload.instruction, &payload.documents)
            .await
        {
            Ok(reply) => {
                info!(
                    service = %self.service.name(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    reply_chars = reply.len(),
                    "Reply received"
                );
                Ok(reply)
            }
            Err(e) => {
                warn!(service = %self.service.name(), error = %e, "Request failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockService;

    fn payload() -> RequestPayload {
        RequestPayload {
            instruction: "QUESTION: coupon?".into(),
            documents: vec![],
        }
    }

    #[tokio::test]
    async fn send_returns_reply() {
        let service = Arc::new(MockService::new());
        let dispatcher = RequestDispatcher::new(service.clone());

        let reply = dispatcher.send(&payload()).await.unwrap();
        assert_eq!(reply, "answer using 0 document(s)");
        assert_eq!(service.last_instruction().as_deref(), Some("QUESTION: coupon?"));
    }

    #[tokio::test]
    async fn send_surfaces_service_error() {
        let service = Arc::new(MockService::new());
        service.set_fail_generate(true);
        let dispatcher = RequestDispatcher::new(service);

        match dispatcher.send(&payload()).await {
            Err(ServiceError::ApiError { status_code, .. }) => assert_eq!(status_code, 500),
            other => panic!("Expected ApiError, got: {other:?}"),
        }
    }
}
