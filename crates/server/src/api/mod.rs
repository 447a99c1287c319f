use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use server_api::{list_attendees, register, remove_attendee};
use shared::{
    domain::{EventId, Registration, RegistrationId},
    error::{ApiError, ErrorCode},
    protocol::{ApiResponse, RegisterRequest, RegistrationReceipt},
};
use tracing::warn;

use crate::app_state::AppState;

pub(crate) type Failure = (StatusCode, Json<ApiResponse<()>>);

pub(crate) async fn http_register(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RegistrationReceipt>>, Failure> {
    let Json(request) = body.map_err(|rejection| {
        warn!(%event_id, error = %rejection.body_text(), "unreadable registration body");
        let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            StatusCode::PAYLOAD_TOO_LARGE
        } else {
            StatusCode::BAD_REQUEST
        };
        (status, Json(ApiResponse::<()>::failure(ErrorCode::InvalidData)))
    })?;

    let receipt = register(&state.api, &EventId::new(event_id), request)
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::ok(receipt)))
}

pub(crate) async fn http_list_attendees(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Registration>>>, Failure> {
    let attendees = list_attendees(&state.api, &EventId::new(event_id))
        .await
        .map_err(reject)?;
    Ok(Json(ApiResponse::ok(attendees)))
}

pub(crate) async fn http_remove_attendee(
    State(state): State<Arc<AppState>>,
    Path((event_id, registration_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>, Failure> {
    let Ok(registration_id) = registration_id.parse::<i64>() else {
        warn!(%event_id, %registration_id, "malformed registration id");
        return Err(failure(ErrorCode::NotFound));
    };
    remove_attendee(
        &state.api,
        &EventId::new(event_id),
        RegistrationId(registration_id),
    )
    .await
    .map_err(reject)?;
    Ok(Json(ApiResponse::empty()))
}

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidData => StatusCode::BAD_REQUEST,
        ErrorCode::AlreadyRegistered | ErrorCode::EventFull => StatusCode::CONFLICT,
        ErrorCode::EventNotFound | ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal | ErrorCode::NetworkError | ErrorCode::Unknown => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn failure(code: ErrorCode) -> Failure {
    (status_for(code), Json(ApiResponse::failure(code)))
}

fn reject(err: ApiError) -> Failure {
    failure(err.code)
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
