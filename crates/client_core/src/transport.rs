use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::{DeserializeOwned, IgnoredAny};
use shared::{
    domain::{EventId, Registration, RegistrationId},
    error::ErrorCode,
    protocol::{
        attendee_route, attendees_route, register_route, ApiResponse, RegisterRequest,
        RegistrationReceipt,
    },
};
use tracing::{debug, warn};

use crate::{ApiFailure, RegistrationApi};

/// `RegistrationApi` over HTTP. Failure envelopes are decoded whatever the status code.
#[derive(Clone)]
pub struct HttpRegistrationApi {
    http: Client,
    server_url: String,
}

impl HttpRegistrationApi {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(server_url, Client::new())
    }

    /// Uses a caller-configured client, e.g. one with proxies or timeouts set.
    pub fn with_client(server_url: impl Into<String>, http: Client) -> Self {
        let server_url: String = server_url.into();
        Self {
            http,
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn exchange<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ApiFailure> {
        let response = request.send().await.map_err(|err| {
            warn!(error = %err, "registration api unreachable");
            ApiFailure::Network(err.to_string())
        })?;
        let status = response.status();
        let body: ApiResponse<T> = response.json().await.map_err(|err| {
            warn!(%status, error = %err, "undecodable registration api response");
            ApiFailure::Network(format!("undecodable response ({status}): {err}"))
        })?;
        debug!(%status, success = body.success, "registration api response");

        if body.success {
            Ok(body.data)
        } else {
            Err(ApiFailure::Rejected(body.error.unwrap_or(ErrorCode::Unknown)))
        }
    }
}

#[async_trait]
impl RegistrationApi for HttpRegistrationApi {
    async fn register(
        &self,
        event_id: &EventId,
        request: &RegisterRequest,
    ) -> Result<RegistrationReceipt, ApiFailure> {
        let url = format!("{}{}", self.server_url, register_route(event_id));
        self.exchange(self.http.post(url).json(request))
            .await?
            .ok_or_else(|| ApiFailure::Network("registration response without receipt".into()))
    }

    async fn list_attendees(&self, event_id: &EventId) -> Result<Vec<Registration>, ApiFailure> {
        let url = format!("{}{}", self.server_url, attendees_route(event_id));
        self.exchange(self.http.get(url))
            .await?
            .ok_or_else(|| ApiFailure::Network("attendee response without data".into()))
    }

    async fn delete_attendee(
        &self,
        event_id: &EventId,
        registration_id: RegistrationId,
    ) -> Result<(), ApiFailure> {
        let url = format!(
            "{}{}",
            self.server_url,
            attendee_route(event_id, registration_id)
        );
        self.exchange::<IgnoredAny>(self.http.delete(url))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
