use super::*;
use server_api::{ensure_event, ApiContext};
use storage::MemoryStore;

async fn state_with_event(capacity: u32) -> Arc<AppState> {
    let api = ApiContext::new(MemoryStore::new());
    ensure_event(&api, &EventId::new("123"), capacity)
        .await
        .expect("event");
    Arc::new(AppState {
        api,
        max_body_bytes: 1024,
    })
}

fn form(name: &str, email: &str) -> Result<Json<RegisterRequest>, JsonRejection> {
    Ok(Json(RegisterRequest::new(name, email, "State University")))
}

#[test]
fn error_codes_map_to_http_statuses() {
    assert_eq!(status_for(ErrorCode::InvalidData), StatusCode::BAD_REQUEST);
    assert_eq!(status_for(ErrorCode::AlreadyRegistered), StatusCode::CONFLICT);
    assert_eq!(status_for(ErrorCode::EventFull), StatusCode::CONFLICT);
    assert_eq!(status_for(ErrorCode::EventNotFound), StatusCode::NOT_FOUND);
    assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(
        status_for(ErrorCode::Internal),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn register_returns_receipt_in_envelope() {
    let state = state_with_event(3).await;
    let Json(body) = http_register(State(state), Path("123".into()), form("Ada", "ada@x.com"))
        .await
        .expect("registered");
    assert!(body.success);
    assert!(body.error.is_none());
    let receipt = body.data.expect("receipt");
    assert_eq!(receipt.status, shared::domain::RegistrationStatus::Registered);
}

#[tokio::test]
async fn full_event_is_a_conflict() {
    let state = state_with_event(1).await;
    let Json(first) = http_register(
        State(state.clone()),
        Path("123".into()),
        form("Ada", "ada@x.com"),
    )
    .await
    .expect("first");
    assert!(first.success);
    let (status, Json(body)) = http_register(
        State(state),
        Path("123".into()),
        form("Bob", "bob@x.com"),
    )
    .await
    .expect_err("full");
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(!body.success);
    assert_eq!(body.error, Some(ErrorCode::EventFull));
}

#[tokio::test]
async fn list_for_unknown_event_is_not_found() {
    let state = state_with_event(3).await;
    let (status, Json(body)) = http_list_attendees(State(state), Path("nope".into()))
        .await
        .expect_err("unknown event");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.error, Some(ErrorCode::EventNotFound));
}

#[tokio::test]
async fn malformed_registration_id_is_not_found() {
    let state = state_with_event(3).await;
    let (status, Json(body)) =
        http_remove_attendee(State(state), Path(("123".into(), "abc".into())))
            .await
            .expect_err("malformed id");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.error, Some(ErrorCode::NotFound));
}

#[tokio::test]
async fn remove_then_remove_again() {
    let state = state_with_event(3).await;
    let Json(body) = http_register(
        State(state.clone()),
        Path("123".into()),
        form("Ada", "ada@x.com"),
    )
    .await
    .expect("registered");
    let id = body.data.expect("receipt").registration_id.to_string();

    let Json(removed) =
        http_remove_attendee(State(state.clone()), Path(("123".into(), id.clone())))
            .await
            .expect("removed");
    assert!(removed.success);

    let (status, _) = http_remove_attendee(State(state.clone()), Path(("123".into(), id)))
        .await
        .expect_err("already removed");
    assert_eq!(status, StatusCode::NOT_FOUND);

    let Json(listed) = http_list_attendees(State(state), Path("123".into()))
        .await
        .expect("list");
    assert_eq!(listed.data.expect("attendees"), Vec::<Registration>::new());
}
