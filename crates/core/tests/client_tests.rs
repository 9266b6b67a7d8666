//! Analytics client integration tests
//!
//! Endpoint shape and session bookkeeping are checked against a mockito
//! server; request sequencing and the unload path use a recording transport.

use mockito::Matcher;
use omnilytics_core::{
    AnalyticsClient, AnalyticsSession, ClickEvent, CookieStore, CustomEvent, EventCommon,
    EventResponse, OmnilyticsError, SearchEvent, SessionIds, TopQueriesParams, VISITOR_COOKIE,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

mod common;

use common::{client_with, config_for, http_client, RecordingTransport};

fn search_event(query: &str) -> SearchEvent {
    SearchEvent {
        common: EventCommon::new("searchboxSubmit", "search box"),
        search_query_uid: "q-1".to_string(),
        query_text: query.to_string(),
        number_of_results: 12,
        response_time: 40,
        ..Default::default()
    }
}

fn click_event() -> ClickEvent {
    ClickEvent {
        common: EventCommon::new("documentOpen", "document"),
        search_query_uid: "q-1".to_string(),
        document_uri: "file://doc".to_string(),
        document_uri_hash: "hash".to_string(),
        document_url: "https://docs.example.com/doc".to_string(),
        document_position: 1,
        source_name: "Docs".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_back_to_back_sends_never_overlap() {
    let transport = Arc::new(
        RecordingTransport::new()
            .with_first_delay(Duration::from_millis(80))
            .with_response_body(r#"{"visitId":"v","visitorId":"w"}"#),
    );
    let (client, _) = client_with(config_for("https://analytics.example.com"), transport.clone());

    let first_event = CustomEvent::new("first", "test");
    let second_event = CustomEvent::new("second", "test");
    let (first, second) = tokio::join!(
        client.send_custom_event(&first_event),
        client.send_custom_event(&second_event),
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(transport.log(), vec!["start:1", "end:1", "start:2", "end:2"]);
    assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_clients_sharing_a_session_share_the_queue() {
    let transport = Arc::new(
        RecordingTransport::new()
            .with_first_delay(Duration::from_millis(50))
            .with_response_body("{}"),
    );
    let session = AnalyticsSession::in_memory().unwrap();
    let config = config_for("https://analytics.example.com");
    let a = AnalyticsClient::new(config.clone(), session.clone(), transport.clone());
    let b = AnalyticsClient::new(config, session, transport.clone());

    let event = CustomEvent::new("shared", "test");
    let (ra, rb) = tokio::join!(a.send_custom_event(&event), b.send_custom_event(&event));

    assert!(ra.is_ok() && rb.is_ok());
    assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_search_batch_makes_no_call() {
    let transport = Arc::new(RecordingTransport::new());
    let (client, _) = client_with(config_for("https://analytics.example.com"), transport.clone());

    let result = client.send_search_events(&[]).await.unwrap();

    assert!(result.is_none());
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_response_ids_update_session() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v15/analytics/custom")
        .match_query(Matcher::UrlEncoded("org".into(), "acme".into()))
        .match_header("authorization", "Bearer secret")
        .with_status(200)
        .with_body(r#"{"visitId":"visit-42","visitorId":"visitor-7"}"#)
        .create_async()
        .await;

    let config = config_for(&server.url())
        .with_organization("acme")
        .with_token("secret");
    let (client, cookies) = http_client(config);
    assert!(client.current_visit_id().is_none());

    let response = client
        .send_custom_event(&CustomEvent::new("omniboxAnalytics", "omnibox"))
        .await
        .unwrap();

    assert!(matches!(response, EventResponse::Single(_)));
    assert_eq!(client.current_visit_id().as_deref(), Some("visit-42"));
    assert_eq!(cookies.get(VISITOR_COOKIE).as_deref(), Some("visitor-7"));
    mock.assert_async().await;

    // Cached: no visit endpoint call is made
    assert_eq!(client.visit_id().await.unwrap(), "visit-42");
}

#[tokio::test]
async fn test_accepted_event_with_plain_text_body() {
    let transport = Arc::new(RecordingTransport::new().with_response_body("OK"));
    let (client, cookies) = client_with(config_for("https://ua.example.com"), transport.clone());

    let response = client
        .send_custom_event(&CustomEvent::new("omniboxAnalytics", "omnibox"))
        .await
        .unwrap();

    assert_eq!(response, EventResponse::Single(SessionIds::default()));
    assert_eq!(transport.request_count(), 1);
    assert!(client.current_visit_id().is_none());
    assert!(cookies.get(VISITOR_COOKIE).is_none());
}

#[tokio::test]
async fn test_malformed_visitor_keeps_visit_id() {
    let transport =
        Arc::new(RecordingTransport::new().with_response_body(r#"{"visitId":"v","visitorId":42}"#));
    let (client, cookies) = client_with(config_for("https://ua.example.com"), transport);

    client
        .send_custom_event(&CustomEvent::new("omniboxAnalytics", "omnibox"))
        .await
        .unwrap();

    assert_eq!(client.current_visit_id().as_deref(), Some("v"));
    assert!(cookies.get(VISITOR_COOKIE).is_none());
}

#[tokio::test]
async fn test_next_request_carries_updated_visitor() {
    let mut server = mockito::Server::new_async().await;
    let first = server
        .mock("POST", "/rest/v15/analytics/searches")
        .with_status(200)
        .with_body(
            r#"{"searchEventResponses":[{"visitId":"v1","visitorId":"first-visitor"},{"visitId":"v2","visitorId":"ignored"}]}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("POST", "/rest/v15/analytics/custom")
        .match_query(Matcher::UrlEncoded(
            "visitor".into(),
            "first-visitor".into(),
        ))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let (client, _) = http_client(config_for(&server.url()));

    let event = CustomEvent::new("after", "search");
    let batch = [search_event("rust"), search_event("rust async")];
    let (searches, custom) = tokio::join!(
        client.send_search_events(&batch),
        client.send_custom_event(&event),
    );

    assert!(matches!(searches.unwrap(), Some(EventResponse::Batch(ref r)) if r.len() == 2));
    assert!(custom.is_ok());
    assert_eq!(client.current_visit_id().as_deref(), Some("v1"));
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_search_events_body_is_json_array() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v15/analytics/searches")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Regex(
            r#"^\[\{.*"actionCause":"searchboxSubmit".*"queryText":"rust".*\}\]$"#.to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"searchEventResponses":[]}"#)
        .create_async()
        .await;

    let (client, _) = http_client(config_for(&server.url()));
    client
        .send_search_events(&[search_event("rust")])
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_visit_id_is_fetched_once() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v15/analytics/visit")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("org".into(), "acme".into()),
            Matcher::UrlEncoded("access_token".into(), "secret".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"id":"fresh-visit"}"#)
        .expect(1)
        .create_async()
        .await;

    let config = config_for(&server.url())
        .with_organization("acme")
        .with_token("secret");
    let (client, _) = http_client(config);

    assert_eq!(client.visit_id().await.unwrap(), "fresh-visit");
    assert_eq!(client.visit_id().await.unwrap(), "fresh-visit");
    assert_eq!(client.current_visit_id().as_deref(), Some("fresh-visit"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_visit_id_failure_propagates() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/rest/v15/analytics/visit")
        .with_status(500)
        .with_body("down")
        .create_async()
        .await;

    let (client, _) = http_client(config_for(&server.url()));
    let err = client.visit_id().await.unwrap_err();

    assert!(matches!(err, OmnilyticsError::Endpoint(ref r) if r.status == 500 && r.data == "down"));
    assert!(client.current_visit_id().is_none());
}

#[tokio::test]
async fn test_top_queries_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v15/stats/topQueries")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("org".into(), "acme".into()),
            Matcher::UrlEncoded("access_token".into(), "secret".into()),
            Matcher::UrlEncoded("pageSize".into(), "3".into()),
            Matcher::UrlEncoded("queryText".into(), "ru st".into()),
        ]))
        .with_status(200)
        .with_body(r#"["rust","rust async","rustup"]"#)
        .create_async()
        .await;

    let config = config_for(&server.url())
        .with_organization("acme")
        .with_token("secret");
    let (client, _) = http_client(config);

    let queries = client
        .top_queries(&TopQueriesParams::new(3, "ru st"))
        .await
        .unwrap();

    assert_eq!(queries, vec!["rust", "rust async", "rustup"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_failed_send_releases_queue() {
    let mut server = mockito::Server::new_async().await;
    let failing = server
        .mock("POST", "/rest/v15/analytics/custom")
        .with_status(503)
        .with_body("busy")
        .expect(1)
        .create_async()
        .await;

    let (client, _) = http_client(config_for(&server.url()));
    let err = client
        .send_custom_event(&CustomEvent::new("a", "b"))
        .await
        .unwrap_err();
    assert_eq!(err.error_response().map(|r| r.status), Some(503));
    failing.assert_async().await;

    failing.remove_async().await;
    let ok = server
        .mock("POST", "/rest/v15/analytics/custom")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    assert!(client
        .send_custom_event(&CustomEvent::new("a", "b"))
        .await
        .is_ok());
    ok.assert_async().await;
}

#[tokio::test]
async fn test_document_view_uses_beacon() {
    let transport = Arc::new(RecordingTransport::new().with_beacon_support());
    let config = config_for("https://analytics.example.com")
        .with_organization("acme")
        .with_token("secret");
    let (client, cookies) = client_with(config, transport.clone());
    cookies.set(VISITOR_COOKIE, "known", chrono::Duration::days(1));

    let result = client.send_document_view_event(&click_event()).await.unwrap();

    assert!(result.is_none());
    assert_eq!(transport.request_count(), 0);

    let beacons = transport.beacons.lock();
    assert_eq!(beacons.len(), 1);
    assert_eq!(beacons[0].url.path(), "/rest/v15/analytics/click");
    assert_eq!(
        beacons[0].url.query(),
        Some("org=acme&visitor=known&access_token=secret")
    );
    assert!(beacons[0].body.starts_with("clickEvent=%7B"));
}

#[tokio::test]
async fn test_document_view_skips_the_queue() {
    let transport = Arc::new(
        RecordingTransport::new()
            .with_first_delay(Duration::from_millis(80))
            .with_response_body("{}")
            .with_beacon_support(),
    );
    let (client, _) = client_with(config_for("https://analytics.example.com"), transport.clone());

    let slow_event = CustomEvent::new("slow", "test");
    let click = click_event();
    let (custom, view) = tokio::join!(
        client.send_custom_event(&slow_event),
        client.send_document_view_event(&click),
    );

    assert!(custom.is_ok());
    assert!(view.unwrap().is_none());

    let log = transport.log();
    let beacon_at = log.iter().position(|entry| entry == "beacon").unwrap();
    let slow_end_at = log.iter().position(|entry| entry == "end:1").unwrap();
    assert!(beacon_at < slow_end_at, "beacon waited for the queue: {:?}", log);
}

#[tokio::test]
async fn test_document_view_falls_back_to_request() {
    let transport = Arc::new(
        RecordingTransport::new().with_response_body(r#"{"visitId":"from-click"}"#),
    );
    let (client, _) = client_with(
        config_for("https://analytics.example.com").with_token("secret"),
        transport.clone(),
    );

    let response = client
        .send_document_view_event(&click_event())
        .await
        .unwrap();

    assert!(matches!(response, Some(EventResponse::Single(_))));
    assert_eq!(client.current_visit_id().as_deref(), Some("from-click"));

    let requests = transport.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/rest/v15/analytics/click");
    assert_eq!(requests[0].bearer_token.as_deref(), Some("secret"));
    assert!(requests[0].url.query().is_none());
}
