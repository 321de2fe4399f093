use fypmatch::api;
use fypmatch::application_impl::{FakeTokenVerifier, fake_user_id};
use fypmatch::domain_model::*;
use fypmatch::server::*;
use serde_json::{Value, json};
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;

struct Harness {
    services: Services,
    server: Arc<Server>,
}

impl Harness {
    async fn new() -> Self {
        let services = Services::in_memory(GroupPolicy::default());
        let students = ["ayesha", "bilal", "chen"]
            .into_iter()
            .map(|username| SeedStudent {
                username: username.to_string(),
                name: username.to_string(),
                semester: 6,
                availability: Availability::Available,
                account_status: AccountStatus::Active,
            })
            .collect();
        seed_students(&services, students).await.unwrap();

        let server = Arc::new(Server::from_services(
            services.clone(),
            Arc::new(FakeTokenVerifier::new()),
        ));
        Harness { services, server }
    }

    async fn student(&self, username: &str) -> StudentId {
        self.services
            .identity_service
            .resolve(fake_user_id(username))
            .await
            .unwrap()
    }

    async fn call(&self, method: &str, path: &str, as_user: &str, body: Option<Value>) -> (StatusCode, Value) {
        let filter = warp::path("api")
            .and(warp::path("v1"))
            .and(api::v1::routes(self.server.clone()))
            .recover(api::v1::recover_error);

        let mut request = warp::test::request()
            .method(method)
            .path(path)
            .header(
                "authorization",
                format!("Bearer {}", FakeTokenVerifier::token_for(as_user)),
            );
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.reply(&filter).await;
        let body: Value = serde_json::from_slice(response.body()).unwrap();
        (response.status(), body)
    }
}

#[tokio::test]
async fn partner_flow_over_http() {
    let h = Harness::new().await;
    let bilal = h.student("bilal").await;

    let (status, body) = h
        .call(
            "POST",
            "/api/v1/requests/send",
            "ayesha",
            Some(json!({ "kind": "PARTNER", "to": bilal })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "PENDING");
    let request_id = body["data"]["request_id"].clone();

    // only the recipient can accept
    let (status, body) = h
        .call(
            "POST",
            "/api/v1/requests/accept",
            "ayesha",
            Some(json!({ "request_id": request_id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "Forbidden");

    let (status, _) = h
        .call(
            "POST",
            "/api/v1/requests/accept",
            "bilal",
            Some(json!({ "request_id": request_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h.call("GET", "/api/v1/group", "ayesha", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 2);

    let (status, body) = h
        .call(
            "GET",
            &format!("/api/v1/can_message?other={}", bilal),
            "ayesha",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["can_message"], true);
}

#[tokio::test]
async fn errors_map_to_statuses() {
    let h = Harness::new().await;
    let chen = h.student("chen").await;

    let (status, body) = h
        .call(
            "POST",
            "/api/v1/messages/send",
            "ayesha",
            Some(json!({
                "to": chen,
                "message_id": uuid::Uuid::new_v4(),
                "content": "hello",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = h.call("POST", "/api/v1/group/lock", "ayesha", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // an unknown account has no student profile
    let (status, _) = h.call("GET", "/api/v1/group", "mallory", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = h
        .call(
            "GET",
            "/api/v1/requests/sent?before=not-a-cursor",
            "ayesha",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "InvalidRequest");
}

#[tokio::test]
async fn bad_token_is_unauthorized() {
    let h = Harness::new().await;
    let filter = api::v1::routes(h.server.clone()).recover(api::v1::recover_error);

    let response = warp::test::request()
        .method("GET")
        .path("/group")
        .header("authorization", "Bearer not-a-token")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn discovery_pages_carry_a_cursor() {
    let h = Harness::new().await;

    let (status, body) = h
        .call("GET", "/api/v1/students/discover?page_size=1", "ayesha", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["items"][0]["name"], "bilal");
    let cursor = body["data"]["next_cursor"].as_str().unwrap().to_string();

    let (_, body) = h
        .call(
            "GET",
            &format!("/api/v1/students/discover?page_size=1&after={}", cursor),
            "ayesha",
            None,
        )
        .await;
    assert_eq!(body["data"]["items"][0]["name"], "chen");
}
