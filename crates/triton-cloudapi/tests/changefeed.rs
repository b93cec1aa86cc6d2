//! Change-feed websocket against the scripted feed server.

use serde_json::json;
use triton_auth::KeyPair;
use triton_cloudapi::types::ChangeFeedSubscription;
use triton_cloudapi::{ClientConfig, CloudApi, Profile};
use triton_test_server::FeedServer;

fn key() -> KeyPair {
    KeyPair::from_ed25519(
        &ed25519_dalek::SigningKey::from_bytes(&[9u8; 32]),
        String::new(),
    )
    .expect("key")
}

#[tokio::test]
async fn test_changefeed_subscribes_and_receives_events() {
    let server = FeedServer::start(vec![json!({
        "published": "1700000000000",
        "changeKind": {"resource": "vm", "subResources": ["state"]},
        "resourceState": "stopped",
        "changedResourceId": "b4f0b46c-1111-4222-8333-444444444444"
    })])
    .await
    .expect("feed server");

    let key = key();
    let profile = Profile {
        url: server.url(),
        account: "alice".to_string(),
        key_id: key.fingerprint().to_string(),
        ..Profile::default()
    };
    let api = CloudApi::new(&profile, &ClientConfig::for_cli(), key).expect("client");
    let sub = ChangeFeedSubscription::new(vec!["state".to_string()], None).expect("sub");
    let mut feed = api.changefeed(&sub).await.expect("connect");

    let event = feed.next_event().await.expect("event").expect("some event");
    assert_eq!(event.changed_resource_id, "b4f0b46c-1111-4222-8333-444444444444");
    assert_eq!(event.change_kind.sub_resources, vec!["state".to_string()]);
    assert!(feed.next_event().await.expect("close").is_none());
    feed.close().await.expect("close");

    assert_eq!(
        server.subscriptions(),
        vec![json!({"resource": "vm", "subResources": ["state"]})]
    );
    let upgrades = server.upgrades();
    assert_eq!(upgrades.len(), 1);
    assert_eq!(upgrades[0].route(), "GET /alice/changefeed");
    assert!(
        upgrades[0]
            .header("authorization")
            .is_some_and(|a| a.starts_with("Signature keyId=\"/alice/keys/"))
    );
    server.shutdown().await;
}
