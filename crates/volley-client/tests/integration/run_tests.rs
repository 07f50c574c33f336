use std::time::Duration;

use serde_json::json;
use volley_client::XrpcEndpoints;
use volley_core::{AppError, FailurePolicy, RunConfig, RunService, TracingAggregateReporter};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::integration::common::{
    CREATE_SESSION_PATH, UNREACHABLE, clients, credentials, session_body,
};

async fn mount_session(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(CREATE_SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn token_reaches_every_parallel_fetch() {
    let server = MockServer::start().await;
    mount_session(&server, json!({"accessToken": "abc123", "handle": "alice.test"})).await;
    for resource in [
        "/xrpc/app.bsky.actor.getProfile",
        "/xrpc/app.bsky.feed.getActorFeeds",
    ] {
        Mock::given(method("GET"))
            .and(path(resource))
            .and(header("authorization", "Bearer abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"path": resource})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let endpoints = XrpcEndpoints::new(&server.uri()).unwrap();
    let (authenticator, fetcher) = clients();
    let service = RunService::new(authenticator, fetcher, RunConfig::default());

    let report = service
        .run(
            &endpoints.create_session(),
            &credentials(),
            &endpoints.default_targets("alice.test"),
            &TracingAggregateReporter,
        )
        .await
        .unwrap();

    assert_eq!(report.session.access_token, "abc123");
    assert_eq!(report.aggregate.len(), 2);
    assert!(report.aggregate.is_success());
}

#[tokio::test]
async fn malformed_session_launches_no_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CREATE_SESSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let endpoints = XrpcEndpoints::new(&server.uri()).unwrap();
    let (authenticator, fetcher) = clients();
    let service = RunService::new(authenticator, fetcher, RunConfig::default());

    let err = service
        .run(
            &endpoints.create_session(),
            &credentials(),
            &endpoints.default_targets("alice.test"),
            &TracingAggregateReporter,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DecodeError { .. }));
}

#[tokio::test]
async fn success_and_unreachable_both_reported() {
    let server = MockServer::start().await;
    mount_session(&server, session_body("abc123")).await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"a":1}"#))
        .expect(1)
        .mount(&server)
        .await;

    let endpoints = XrpcEndpoints::new(&server.uri()).unwrap();
    let (authenticator, fetcher) = clients();
    let service = RunService::new(
        authenticator,
        fetcher,
        RunConfig::default().with_failure_policy(FailurePolicy::DrainAll),
    );
    let urls = vec![format!("{}/ok", server.uri()), UNREACHABLE.to_string()];

    let report = service
        .run(
            &endpoints.create_session(),
            &credentials(),
            &urls,
            &TracingAggregateReporter,
        )
        .await
        .unwrap();

    let aggregate = report.aggregate;
    assert_eq!(aggregate.len(), 2);
    assert_eq!(aggregate.success_count(), 1);
    assert_eq!(aggregate.failure_count(), 1);

    let success = aggregate.outcomes().iter().find(|o| o.is_success()).unwrap();
    assert_eq!(success.body(), Some(&br#"{"a":1}"#[..]));
    let failure = aggregate.first_failure().unwrap();
    assert_eq!(failure.url(), UNREACHABLE);
    assert!(matches!(
        failure.error(),
        Some(AppError::TransportError { .. })
    ));
}

#[tokio::test]
async fn deadline_bounds_the_whole_run() {
    let server = MockServer::start().await;
    mount_session(&server, session_body("abc123")).await;
    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let endpoints = XrpcEndpoints::new(&server.uri()).unwrap();
    let (authenticator, fetcher) = clients();
    let service = RunService::new(
        authenticator,
        fetcher,
        RunConfig::default().with_timeout(Duration::from_millis(500)),
    );
    let urls = vec![
        format!("{}/fast", server.uri()),
        format!("{}/slow", server.uri()),
    ];

    let started = std::time::Instant::now();
    let report = service
        .run(
            &endpoints.create_session(),
            &credentials(),
            &urls,
            &TracingAggregateReporter,
        )
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.aggregate.len(), 2);
    let failure = report.aggregate.first_failure().unwrap();
    assert!(failure.url().ends_with("/slow"));
    assert!(failure.error().unwrap().is_cancellation());
}
