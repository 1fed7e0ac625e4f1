//! Tests for the scoring client against a loopback HTTP stub

use std::time::Duration;

use credit_dash::config::{PipelineConfig, ScoringConfig};
use credit_dash::report::{Decision, ScoreBand};
use credit_dash::{DashboardError, ScoringClient, Session};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::utils::{reference_rows, to_batch};

/// A request as seen by the stub: lowercased head and raw body
struct CapturedRequest {
    head: String,
    body: String,
}

/// Serve a single canned response, after `delay`, on a loopback port
async fn serve_once(
    status: &'static str,
    body: &'static str,
    delay: Duration,
) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/predictions", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        tokio::time::sleep(delay).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        request
    });

    (url, handle)
}

async fn read_request(socket: &mut TcpStream) -> CapturedRequest {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = socket.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);

        let Some(end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buffer[..end]).to_lowercase();
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buffer.len() >= end + 4 + length {
            let body = String::from_utf8_lossy(&buffer[end + 4..end + 4 + length]).into_owned();
            return CapturedRequest { head, body };
        }
    }
    CapturedRequest {
        head: String::from_utf8_lossy(&buffer).to_lowercase(),
        body: String::new(),
    }
}

fn client(url: &str, timeout: Duration) -> ScoringClient {
    ScoringClient::new(&ScoringConfig {
        endpoint: url.to_string(),
        timeout,
    })
    .unwrap()
}

#[tokio::test]
async fn prediction_is_decoded_and_request_is_a_single_row() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"problemes_remboursement": false, "score_remboursement_client": 0.82}"#,
        Duration::ZERO,
    )
    .await;

    let prediction = client(&url, Duration::from_secs(5))
        .predict(&[0.5, f64::NAN, -1.25])
        .await
        .unwrap();

    assert!(!prediction.repayment_issues);
    assert_eq!(prediction.repayment_score, 0.82);
    assert_eq!(Decision::from_prediction(&prediction), Decision::Accepted);
    assert_eq!(ScoreBand::from_score(prediction.repayment_score), ScoreBand::Safe);

    let request = server.await.unwrap();
    assert!(request.head.starts_with("post /predictions"));
    assert!(request.head.contains("content-type: application/json"));
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "std_donnees_client": [[0.5, null, -1.25]] })
    );
}

#[tokio::test]
async fn session_vector_is_sent_in_schema_order() {
    let session = Session::from_raw(to_batch(&reference_rows()), &PipelineConfig::default()).unwrap();
    let vector = session.client_vector(100_005).unwrap();

    let (url, server) = serve_once(
        "200 OK",
        r#"{"problemes_remboursement": true, "score_remboursement_client": 0.12}"#,
        Duration::ZERO,
    )
    .await;
    let prediction = client(&url, Duration::from_secs(5)).predict(&vector).await.unwrap();
    assert_eq!(Decision::from_prediction(&prediction).to_string(), "Credit application refused");

    let request = server.await.unwrap();
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    let sent = body["std_donnees_client"][0].as_array().unwrap();
    assert_eq!(sent.len(), session.vector_names().len());
    assert_eq!(sent[0].as_f64().unwrap(), vector[0]);
}

#[tokio::test]
async fn non_200_status_is_a_scoring_error() {
    let (url, _server) = serve_once(
        "500 Internal Server Error",
        r#"{"error": "model not loaded"}"#,
        Duration::ZERO,
    )
    .await;

    let err = client(&url, Duration::from_secs(5))
        .predict(&[1.0])
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::ScoringService(_)));
    assert!(err.is_recoverable());
    let message = err.to_string();
    assert!(message.contains("500"));
    assert!(message.contains("model not loaded"));
}

#[tokio::test]
async fn malformed_bodies_are_scoring_errors() {
    for body in [
        r#"{"score": 0.5}"#,
        "not json at all",
        r#"{"problemes_remboursement": false, "score_remboursement_client": 1.7}"#,
    ] {
        let (url, _server) = serve_once("200 OK", body, Duration::ZERO).await;
        let err = client(&url, Duration::from_secs(5))
            .predict(&[1.0])
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::ScoringService(_)), "body {body}");
        assert!(err.to_string().contains("malformed response"), "body {body}");
    }
}

#[tokio::test]
async fn slow_service_times_out() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"problemes_remboursement": false, "score_remboursement_client": 0.5}"#,
        Duration::from_secs(5),
    )
    .await;

    let err = client(&url, Duration::from_millis(200))
        .predict(&[1.0])
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::ScoringService(_)));
    assert!(err.to_string().contains("timed out"));
    server.abort();
}

#[tokio::test]
async fn unreachable_service_is_a_scoring_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/predictions", listener.local_addr().unwrap());
    drop(listener);

    let err = client(&url, Duration::from_secs(2))
        .predict(&[1.0])
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::ScoringService(_)));
}
