//! HTTP client tests against a wiremock Vault.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vaultkeeper::vault::{ClusterApiError, HttpVaultClient, InitRequest, SealStatus, VaultApi};

fn client(server: &MockServer) -> HttpVaultClient {
    HttpVaultClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

fn seal_status_body(sealed: bool, progress: u32) -> serde_json::Value {
    json!({
        "type": "shamir",
        "initialized": true,
        "sealed": sealed,
        "t": 3,
        "n": 5,
        "progress": progress,
        "nonce": "",
        "version": "1.15.2",
        "build_date": "2023-11-06T11:33:28Z",
        "migration": false,
        "recovery_seal": false,
        "storage_type": "raft"
    })
}

#[tokio::test]
async fn init_status_reads_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"initialized": false})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!client(&server).init_status().await.unwrap());
}

#[tokio::test]
async fn init_sends_shares_and_threshold() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/init"))
        .and(body_json(json!({"secret_shares": 5, "secret_threshold": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keys": ["6e1a", "7f2b", "8a3c", "9b4d", "ac5e"],
            "keys_base64": ["bho=", "fys=", "ijw=", "m00=", "rF4="],
            "root_token": "hvs.abc123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client(&server)
        .init(InitRequest {
            secret_shares: 5,
            secret_threshold: 3,
        })
        .await
        .unwrap();

    assert_eq!(resp.keys, vec!["bho=", "fys=", "ijw=", "m00=", "rF4="]);
    assert_eq!(resp.root_token, "hvs.abc123");
}

#[tokio::test]
async fn init_falls_back_to_hex_keys() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keys": ["6e1a", "7f2b"],
            "root_token": "hvs.abc123"
        })))
        .mount(&server)
        .await;

    let resp = client(&server)
        .init(InitRequest {
            secret_shares: 2,
            secret_threshold: 2,
        })
        .await
        .unwrap();

    assert_eq!(resp.keys, vec!["6e1a", "7f2b"]);
}

#[tokio::test]
async fn init_without_shares_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keys": [],
            "root_token": "hvs.abc123"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .init(InitRequest {
            secret_shares: 1,
            secret_threshold: 1,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ClusterApiError::Decode { operation: "init", .. }));
}

#[tokio::test]
async fn already_initialized_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/init"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"errors": ["Vault is already initialized"]})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .init(InitRequest {
            secret_shares: 5,
            secret_threshold: 3,
        })
        .await
        .unwrap_err();

    match err {
        ClusterApiError::Status {
            operation,
            status,
            message,
        } => {
            assert_eq!(operation, "init");
            assert_eq!(status, 400);
            assert_eq!(message, "Vault is already initialized");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn seal_status_parses_vault_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/seal-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(seal_status_body(true, 2)))
        .mount(&server)
        .await;

    let status = client(&server).seal_status().await.unwrap();

    assert_eq!(
        status,
        SealStatus {
            initialized: true,
            sealed: true,
            progress: 2,
            threshold: 3,
            shares: 5,
        }
    );
}

#[tokio::test]
async fn unseal_submits_key() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/unseal"))
        .and(body_json(json!({"key": "bho="})))
        .respond_with(ResponseTemplate::new(200).set_body_json(seal_status_body(true, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let status = client(&server).unseal("bho=").await.unwrap();

    assert!(status.sealed);
    assert_eq!(status.progress, 1);
}

#[tokio::test]
async fn slow_cluster_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/seal-status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(seal_status_body(true, 0))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = HttpVaultClient::new(&server.uri(), Duration::from_millis(200)).unwrap();
    let err = client.seal_status().await.unwrap_err();

    assert!(matches!(
        err,
        ClusterApiError::Timeout {
            operation: "seal-status"
        }
    ));
}

#[tokio::test]
async fn garbage_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/init"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = client(&server).init_status().await.unwrap_err();

    assert!(matches!(
        err,
        ClusterApiError::Decode {
            operation: "init-status",
            ..
        }
    ));
}

#[tokio::test]
async fn unreachable_cluster_is_transport_error() {
    // Nothing listens on the tcpmux port.
    let client = HttpVaultClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let err = client.init_status().await.unwrap_err();

    assert!(matches!(err, ClusterApiError::Transport { .. }));
}
