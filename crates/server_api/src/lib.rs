use std::sync::Arc;

use shared::{
    domain::{Event, EventId, Registrant, Registration, RegistrationId},
    error::{ApiError, ErrorCode},
    protocol::{RegisterRequest, RegistrationReceipt},
};
use storage::{Admission, AttendeeStore};
use tracing::{error, info};

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn AttendeeStore>,
}

impl ApiContext {
    pub fn new(store: impl AttendeeStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Admits one registrant for `event_id`.
///
/// Checks run in a fixed order and the first failure wins: field validation
/// (`INVALID_DATA`, before the store is touched), event lookup (`EVENT_NOT_FOUND`), then
/// the duplicate-email (`ALREADY_REGISTERED`) and capacity (`EVENT_FULL`) checks, which
/// the store evaluates and commits as a single atomic step.
pub async fn register(
    ctx: &ApiContext,
    event_id: &EventId,
    request: RegisterRequest,
) -> Result<RegistrationReceipt, ApiError> {
    let registrant = validate_registrant(request)?;
    let event = ctx
        .store
        .event(event_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| event_not_found(event_id))?;

    let email = registrant.email.clone();
    let capacity = event.capacity;
    let check = move |live: &[Registration]| admission_check(&email, capacity, live);

    match ctx
        .store
        .try_admit(event_id, &check, registrant)
        .await
        .map_err(internal)?
    {
        Admission::Admitted(registration) => {
            info!(
                %event_id,
                registration_id = %registration.registration_id,
                capacity,
                "registration admitted"
            );
            Ok(RegistrationReceipt {
                registration_id: registration.registration_id,
                status: registration.status,
            })
        }
        Admission::Rejected(code) => {
            info!(%event_id, %code, "registration rejected");
            Err(ApiError::new(code, format!("registration rejected for event {event_id}")))
        }
    }
}

pub async fn list_attendees(
    ctx: &ApiContext,
    event_id: &EventId,
) -> Result<Vec<Registration>, ApiError> {
    ctx.store
        .event(event_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| event_not_found(event_id))?;
    ctx.store.get_all(event_id).await.map_err(internal)
}

pub async fn remove_attendee(
    ctx: &ApiContext,
    event_id: &EventId,
    registration_id: RegistrationId,
) -> Result<(), ApiError> {
    let removed = ctx
        .store
        .remove(event_id, registration_id)
        .await
        .map_err(internal)?;
    if !removed {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            format!("registration {registration_id} not found for event {event_id}"),
        ));
    }
    info!(%event_id, %registration_id, "registration removed");
    Ok(())
}

/// Creates the event when missing; an existing event keeps its stored capacity.
pub async fn ensure_event(
    ctx: &ApiContext,
    event_id: &EventId,
    capacity: u32,
) -> Result<Event, ApiError> {
    if event_id.as_str().trim().is_empty() || capacity == 0 {
        return Err(ApiError::new(
            ErrorCode::InvalidData,
            "events need a non-empty id and a positive capacity",
        ));
    }
    let event = ctx
        .store
        .create_event(event_id, capacity)
        .await
        .map_err(internal)?;
    if event.capacity != capacity {
        info!(
            %event_id,
            stored = event.capacity,
            requested = capacity,
            "event already exists; keeping stored capacity"
        );
    }
    Ok(event)
}

/// Every field must be present and non-empty. Values are kept exactly as submitted,
/// so duplicate detection compares emails as sent.
pub fn validate_registrant(request: RegisterRequest) -> Result<Registrant, ApiError> {
    Ok(Registrant {
        name: required_field("name", request.name)?,
        email: required_field("email", request.email)?,
        college: required_field("college", request.college)?,
    })
}

fn required_field(field: &str, value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::new(
            ErrorCode::InvalidData,
            format!("{field} is required"),
        )),
    }
}

fn admission_check(email: &str, capacity: u32, live: &[Registration]) -> Result<(), ErrorCode> {
    if live.iter().any(|registration| registration.email == email) {
        return Err(ErrorCode::AlreadyRegistered);
    }
    if live.len() >= capacity as usize {
        return Err(ErrorCode::EventFull);
    }
    Ok(())
}

fn event_not_found(event_id: &EventId) -> ApiError {
    ApiError::new(ErrorCode::EventNotFound, format!("event {event_id} not found"))
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %err, "attendee store failure");
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
