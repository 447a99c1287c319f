use serde::{Deserialize, Serialize};

use crate::{
    domain::{EventId, RegistrationId, RegistrationStatus},
    error::ErrorCode,
};

pub const API_PREFIX: &str = "/api/v1";

pub fn register_route(event_id: &EventId) -> String {
    format!("{API_PREFIX}/events/{event_id}/register")
}

pub fn attendees_route(event_id: &EventId) -> String {
    format!("{API_PREFIX}/events/{event_id}/attendees")
}

pub fn attendee_route(event_id: &EventId, registration_id: RegistrationId) -> String {
    format!("{API_PREFIX}/events/{event_id}/attendees/{registration_id}")
}

/// Envelope shared by every JSON endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub error: Option<ErrorCode>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(code: ErrorCode) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(code),
        }
    }
}

impl ApiResponse<()> {
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

/// Raw form submission. Fields stay optional so a missing field is reported as
/// `INVALID_DATA` rather than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
}

impl RegisterRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        college: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            college: Some(college.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    pub registration_id: RegistrationId,
    pub status: RegistrationStatus,
}
