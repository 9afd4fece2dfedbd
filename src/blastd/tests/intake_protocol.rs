mod common;

use blastd::daemon::server::MAX_LINE_BYTES;
use blastd::daemon::structs::{ActivityData, Request, Response};
use blastd::storage::DEFAULT_EDITOR;
use common::{TestDaemon, MACHINE};
use rstest::rstest;
use serde_json::json;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

const UNUSED_SERVER: &str = "http://127.0.0.1:9";

fn activity(editor: &str) -> ActivityData {
    ActivityData {
        project: "blast".into(),
        started_at: "2025-03-01T09:00:00Z".into(),
        ended_at: "2025-03-01T09:05:00Z".into(),
        filetype: "rust".into(),
        editor: editor.into(),
        ..ActivityData::default()
    }
}

#[tokio::test]
async fn test_ping() {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;

    let response = daemon.client().send_ping_request().await.unwrap();

    assert_eq!(response, Response::ok());
    daemon.stop().await;
}

#[tokio::test]
async fn test_malformed_line_keeps_connection_open() {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;
    let mut connection = daemon.client().connect().await.unwrap();

    let response = connection.send_line("not json").await.unwrap();
    assert_eq!(response, Response::error("invalid json"));

    let response = connection.request(&Request::new("ping")).await.unwrap();
    assert_eq!(response, Response::ok());

    drop(connection);
    daemon.stop().await;
}

#[rstest]
#[case::empty("")]
#[case::whitespace("  \t ")]
#[tokio::test]
async fn test_blank_line_gets_an_error_response(#[case] line: &str) {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;
    let mut connection = daemon.client().connect().await.unwrap();

    let response = tokio::time::timeout(Duration::from_secs(5), connection.send_line(line))
        .await
        .expect("daemon should answer a blank line")
        .unwrap();
    assert_eq!(response, Response::error("invalid json"));

    let response = connection.request(&Request::new("ping")).await.unwrap();
    assert_eq!(response, Response::ok());

    drop(connection);
    daemon.stop().await;
}

#[tokio::test]
async fn test_oversized_line_is_refused_and_closes_connection() {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;
    let mut connection = daemon.client().connect().await.unwrap();

    let line = "x".repeat(MAX_LINE_BYTES + 4096);
    let response = tokio::time::timeout(Duration::from_secs(5), connection.send_line(&line))
        .await
        .expect("daemon should answer an oversized line")
        .unwrap();
    assert_eq!(response, Response::error("invalid json"));
    assert!(connection.request(&Request::new("ping")).await.is_err());

    let response = daemon.client().send_ping_request().await.unwrap();
    assert_eq!(response, Response::ok());

    drop(connection);
    daemon.stop().await;
}

#[tokio::test]
async fn test_line_at_size_limit_is_accepted() {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;
    let mut connection = daemon.client().connect().await.unwrap();

    let ping = r#"{"type":"ping","pad":""}"#;
    let line = format!(
        r#"{{"type":"ping","pad":"{}"}}"#,
        "x".repeat(MAX_LINE_BYTES - ping.len())
    );
    assert_eq!(line.len(), MAX_LINE_BYTES);

    let response = connection.send_line(&line).await.unwrap();
    assert_eq!(response, Response::ok());

    drop(connection);
    daemon.stop().await;
}

#[tokio::test]
async fn test_unknown_type_keeps_connection_open() {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;
    let mut connection = daemon.client().connect().await.unwrap();

    let response = connection.request(&Request::new("status")).await.unwrap();
    assert_eq!(response, Response::error("unknown request type"));

    let response = connection.request(&Request::new("ping")).await.unwrap();
    assert!(response.ok);

    drop(connection);
    daemon.stop().await;
}

#[tokio::test]
async fn test_activity_is_buffered_with_editor_default() {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;
    let client = daemon.client();

    assert!(client.send_activity_request(&activity("")).await.unwrap().ok);
    assert!(client.send_activity_request(&activity("x")).await.unwrap().ok);

    let stored = daemon.buffer().await.unconsumed(10).await.unwrap();
    let editors: Vec<&str> = stored.iter().map(|a| a.editor.as_str()).collect();
    assert_eq!(editors, vec![DEFAULT_EDITOR, "x"]);
    daemon.stop().await;
}

#[tokio::test]
async fn test_machine_is_set_by_daemon() {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;
    let mut connection = daemon.client().connect().await.unwrap();

    let response = connection
        .send_line(
            &json!({
                "type": "activity",
                "data": {
                    "started_at": "2025-03-01T09:00:00Z",
                    "ended_at": "2025-03-01T08:59:00Z",
                    "machine": "spoofed",
                    "client_id": "plugin-token-1",
                },
            })
            .to_string(),
        )
        .await
        .unwrap();
    assert!(response.ok, "{response:?}");

    let stored = daemon.buffer().await.unconsumed(10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].machine, MACHINE);
    assert_eq!(stored[0].client_id, "plugin-token-1");
    assert!(stored[0].ended_at < stored[0].started_at);

    drop(connection);
    daemon.stop().await;
}

#[tokio::test]
async fn test_invalid_timestamps_are_rejected() {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;
    let mut connection = daemon.client().connect().await.unwrap();

    let bad_start = ActivityData {
        started_at: "2025-03-01 09:00".into(),
        ..activity("x")
    };
    let response = connection
        .request(&Request::with_data(
            "activity",
            serde_json::to_value(&bad_start).unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(response, Response::error("invalid started_at"));

    let bad_end = ActivityData {
        ended_at: String::new(),
        ..activity("x")
    };
    let response = connection
        .request(&Request::with_data(
            "activity",
            serde_json::to_value(&bad_end).unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(response, Response::error("invalid ended_at"));

    let response = connection.request(&Request::new("activity")).await.unwrap();
    assert_eq!(response, Response::error("invalid activity data"));

    assert_eq!(daemon.buffer().await.count_unconsumed().await.unwrap(), 0);
    drop(connection);
    daemon.stop().await;
}

#[tokio::test]
async fn test_duplicate_token_is_reported_to_client() {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;
    let client = daemon.client();
    let data = ActivityData {
        client_id: Some("same-token".into()),
        ..activity("x")
    };

    assert!(client.send_activity_request(&data).await.unwrap().ok);
    let response = client.send_activity_request(&data).await.unwrap();

    assert!(!response.ok);
    assert!(response.error.is_some());
    assert_eq!(daemon.buffer().await.count_unconsumed().await.unwrap(), 1);
    daemon.stop().await;
}

#[tokio::test]
async fn test_sync_without_token_is_refused() {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;

    let response = daemon.client().send_sync_request().await.unwrap();

    assert_eq!(response, Response::error("no API token configured"));
    daemon.stop().await;
}

#[tokio::test]
async fn test_socket_lifecycle() {
    let daemon = TestDaemon::start(UNUSED_SERVER, "").await;
    let socket_path = daemon.config.socket_path.clone();

    let mode = std::fs::metadata(&socket_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    let (_dir, _config) = daemon.stop().await;
    assert!(!socket_path.exists());
}

#[tokio::test]
async fn test_stale_socket_is_replaced() {
    let first = TestDaemon::start(UNUSED_SERVER, "").await;
    let (dir, config) = first.stop().await;
    std::fs::write(&config.socket_path, b"stale").unwrap();

    let cancellation_token = tokio_util::sync::CancellationToken::new();
    let handle = tokio::spawn({
        let config = config.clone();
        let cancellation_token = cancellation_token.clone();
        async move { blastd::daemon::daemon_run::serve(&config, cancellation_token).await }
    });

    let client = blastd::daemon::DaemonClient::new(&config.socket_path);
    let mut response = None;
    for _ in 0..250 {
        if let Ok(ping) = client.send_ping_request().await {
            response = Some(ping);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(response, Some(Response::ok()));

    cancellation_token.cancel();
    handle.await.unwrap().unwrap();
    drop(dir);
}
