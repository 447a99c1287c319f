use async_trait::async_trait;
use shared::{
    domain::{EventId, Registration, RegistrationId},
    error::ErrorCode,
    protocol::{RegisterRequest, RegistrationReceipt},
};
use thiserror::Error;

pub mod admin;
pub mod form;
pub mod messages;
pub mod transport;

pub use admin::{AdminPanelController, AdminPrompter, AdminState, DeleteOutcome, LoadTicket};
pub use form::{FormFields, FormState, RegistrationFormController, SubmissionTicket};
pub use transport::HttpRegistrationApi;

/// Why a call to the registration API did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    /// The server answered with a structured failure envelope.
    #[error("request rejected: {0}")]
    Rejected(ErrorCode),
    /// No usable response: connection failure or an undecodable body.
    #[error("network failure: {0}")]
    Network(String),
}

impl ApiFailure {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Rejected(code) => *code,
            Self::Network(_) => ErrorCode::NetworkError,
        }
    }
}

#[async_trait]
pub trait RegistrationApi: Send + Sync {
    async fn register(
        &self,
        event_id: &EventId,
        request: &RegisterRequest,
    ) -> Result<RegistrationReceipt, ApiFailure>;

    async fn list_attendees(&self, event_id: &EventId) -> Result<Vec<Registration>, ApiFailure>;

    async fn delete_attendee(
        &self,
        event_id: &EventId,
        registration_id: RegistrationId,
    ) -> Result<(), ApiFailure>;
}
