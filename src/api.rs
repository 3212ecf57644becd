//! HTTP client for the single webhook endpoint.
//!
//! Both request shapes are a fire-and-forget POST; whatever text the server
//! returns is the reply, verbatim. Every failure mode (network, non-2xx,
//! unreadable body, timeout) maps to an [`ApiError`] so the conversation can
//! pick its fallback deterministically.

use futures_util::future::{Either, select};
use futures_util::pin_mut;
use gloo_net::http::Request;
use gloo_timers::future::TimeoutFuture;
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{InitRequest, MessageRequest};

/// A server that never answers must still resolve to the failure path
/// rather than leaving the conversation pending forever.
const REQUEST_TIMEOUT_MS: u32 = 20_000;

#[derive(Clone, Debug)]
pub struct WebhookClient {
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Announce a new session and return the greeting text.
    pub async fn init_session(&self, session_id: &str) -> Result<String, ApiError> {
        self.post(&InitRequest::new(session_id)).await
    }

    /// Send one user message and return the reply text.
    pub async fn send_message(&self, session_id: &str, message: &str) -> Result<String, ApiError> {
        self.post(&MessageRequest {
            message,
            session_id,
        })
        .await
    }

    async fn post<B: Serialize>(&self, body: &B) -> Result<String, ApiError> {
        let request = Request::post(&self.url)
            .json(body)
            .map_err(|err| ApiError::Network(err.to_string()))?;

        let round_trip = async {
            let response = request
                .send()
                .await
                .map_err(|err| ApiError::Network(err.to_string()))?;
            if !response.ok() {
                return Err(ApiError::Status(response.status()));
            }
            response
                .text()
                .await
                .map_err(|err| ApiError::Body(err.to_string()))
        };
        let timeout = TimeoutFuture::new(REQUEST_TIMEOUT_MS);
        pin_mut!(round_trip);
        pin_mut!(timeout);

        match select(round_trip, timeout).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(ApiError::Timeout(REQUEST_TIMEOUT_MS)),
        }
    }
}
