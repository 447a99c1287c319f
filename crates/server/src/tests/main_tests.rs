use super::*;
use axum::{
    body::{self, Body},
    http::{header, Request, Response},
};
use serde_json::{json, Value};
use shared::{
    domain::RegistrationId,
    protocol::{attendee_route, attendees_route, register_route},
};
use storage::MemoryStore;
use tower::ServiceExt;

async fn test_app(capacity: u32) -> Router {
    let api = ApiContext::new(MemoryStore::new());
    seed_events(
        &api,
        &[EventSettings {
            id: "123".into(),
            capacity,
        }],
    )
    .await
    .expect("seed");
    build_router(Arc::new(AppState {
        api,
        max_body_bytes: 1024,
    }))
}

fn register_request(body: Value) -> Request<Body> {
    Request::post(register_route(&EventId::new("123")))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let app = test_app(3).await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn register_list_and_delete_over_http() {
    let app = test_app(3).await;

    let response = app
        .clone()
        .oneshot(register_request(
            json!({ "name": "Ada", "email": "ada@x.com", "college": "State University" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["data"]["status"], json!("registered"));
    let id = body["data"]["registration_id"].as_i64().expect("id");

    let response = app
        .clone()
        .oneshot(
            Request::get(attendees_route(&EventId::new("123")))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let attendees = body["data"].as_array().expect("attendees");
    assert_eq!(attendees.len(), 1);
    assert_eq!(attendees[0]["registration_id"], json!(id));
    assert_eq!(attendees[0]["email"], json!("ada@x.com"));
    assert_eq!(attendees[0]["event_id"], json!("123"));

    let delete = |id: i64| {
        Request::delete(attendee_route(&EventId::new("123"), RegistrationId(id)))
            .body(Body::empty())
            .expect("request")
    };
    let response = app.clone().oneshot(delete(id)).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "success": true, "error": null })
    );

    let response = app.oneshot(delete(id)).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({ "success": false, "error": "NOT_FOUND" })
    );
}

#[tokio::test]
async fn duplicate_and_full_are_conflicts() {
    let app = test_app(1).await;
    let ada = json!({ "name": "Ada", "email": "ada@x.com", "college": "U" });

    let response = app
        .clone()
        .oneshot(register_request(ada.clone()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(register_request(ada))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], json!("ALREADY_REGISTERED"));

    let response = app
        .oneshot(register_request(
            json!({ "name": "Bob", "email": "bob@x.com", "college": "U" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], json!("EVENT_FULL"));
}

#[tokio::test]
async fn malformed_or_incomplete_bodies_are_invalid_data() {
    let app = test_app(3).await;

    let response = app
        .clone()
        .oneshot(
            Request::post(register_route(&EventId::new("123")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "success": false, "error": "INVALID_DATA" })
    );

    let response = app
        .clone()
        .oneshot(register_request(json!({ "name": "Ada", "email": 7 })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], json!("INVALID_DATA"));

    let response = app
        .oneshot(register_request(json!({ "name": "Ada", "email": "" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], json!("INVALID_DATA"));
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let app = test_app(3).await;
    let response = app
        .oneshot(
            Request::post(register_route(&EventId::new("999")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "name": "Ada", "email": "ada@x.com", "college": "U" }).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], json!("EVENT_NOT_FOUND"));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = test_app(3).await;
    let padding = "x".repeat(4096);
    let payload = json!({ "name": padding, "email": "ada@x.com", "college": "U" }).to_string();
    let response = app
        .oneshot(
            Request::post(register_route(&EventId::new("123")))
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, payload.len())
                .body(Body::from(payload))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn seeding_keeps_existing_capacity() {
    let api = ApiContext::new(MemoryStore::new());
    let events = [EventSettings {
        id: "123".into(),
        capacity: 3,
    }];
    seed_events(&api, &events).await.expect("seed");
    seed_events(
        &api,
        &[EventSettings {
            id: "123".into(),
            capacity: 10,
        }],
    )
    .await
    .expect("reseed");
    let stored = api
        .store
        .event(&EventId::new("123"))
        .await
        .expect("lookup")
        .expect("event");
    assert_eq!(stored.capacity, 3);

    let invalid = [EventSettings {
        id: "zero".into(),
        capacity: 0,
    }];
    assert!(seed_events(&api, &invalid).await.is_err());
}
