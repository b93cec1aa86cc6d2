//! Signing through an in-process ssh-agent listening on a Unix socket.

#![cfg(unix)]

use std::path::PathBuf;

use ed25519_dalek::Verifier;
use ssh_key::LineEnding;
use ssh_key::private::{Ed25519Keypair, KeypairData};
use tokio::net::{UnixListener, UnixStream};
use triton_auth::{AgentClient, AuthError, KeyPair, RequestSigner, SignatureAlgorithm};

/// Starts russh's agent server on a fresh socket and loads `seed` into it.
async fn spawn_agent(seed: [u8; 32]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("agent.sock");
    let listener = UnixListener::bind(&path).expect("bind");
    let incoming = Box::pin(futures::stream::unfold(listener, |listener| async move {
        let accepted = listener.accept().await.map(|(stream, _)| stream);
        Some((accepted, listener))
    }));
    tokio::spawn(russh::keys::agent::server::serve(incoming, ()));

    let openssh = ssh_key::PrivateKey::new(
        KeypairData::from(Ed25519Keypair::from_seed(&seed)),
        "agent-key",
    )
    .expect("key")
    .to_openssh(LineEnding::LF)
    .expect("encode");
    let key = russh::keys::decode_secret_key(&openssh, None).expect("decode");
    let stream = UnixStream::connect(&path).await.expect("connect");
    russh::keys::agent::client::AgentClient::connect(stream)
        .add_identity(&key, &[])
        .await
        .expect("add identity");
    (dir, path)
}

#[tokio::test]
async fn agent_key_signs_verifiable_headers() {
    let key = ed25519_dalek::SigningKey::from_bytes(&[42u8; 32]);
    let verifying = key.verifying_key();
    let local = KeyPair::from_ed25519(&key, String::new()).expect("key");
    let (_dir, socket) = spawn_agent([42u8; 32]).await;

    let agent = AgentClient::new(&socket);
    let identities = agent.identities().await.expect("identities");
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].blob, local.public_blob());

    let pair = KeyPair::from_agent(agent, local.fingerprint())
        .await
        .expect("find key");
    assert!(pair.is_agent());
    assert_eq!(pair.algorithm(), SignatureAlgorithm::Ed25519Sha512);
    assert_eq!(pair.fingerprint(), local.fingerprint());

    let signer = RequestSigner::new("alice", pair);
    let headers = signer.sign().await.expect("sign");
    let b64 = headers
        .authorization
        .rsplit("signature=\"")
        .next()
        .and_then(|s| s.strip_suffix('"'))
        .expect("signature");
    use base64::Engine;
    let raw = base64::engine::general_purpose::STANDARD
        .decode(b64)
        .expect("base64");
    let sig = ed25519_dalek::Signature::from_slice(&raw).expect("sig");
    assert!(verifying
        .verify(format!("date: {}", headers.date).as_bytes(), &sig)
        .is_ok());
}

#[tokio::test]
async fn unknown_key_id_is_not_found() {
    let (_dir, socket) = spawn_agent([8u8; 32]).await;

    let err = KeyPair::from_agent(AgentClient::new(&socket), "00:11:22:33")
        .await
        .expect_err("should not match");
    assert!(matches!(err, AuthError::KeyNotFound { .. }));
}

#[test]
fn key_file_loads_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("id_ed25519");
    let key = ssh_key::PrivateKey::new(
        KeypairData::from(Ed25519Keypair::from_seed(&[4u8; 32])),
        "",
    )
    .expect("key");
    std::fs::write(&path, key.to_openssh(LineEnding::LF).expect("encode").as_bytes())
        .expect("write");

    let pair = KeyPair::from_file(&path).expect("load");
    assert_eq!(pair.comment(), path.display().to_string());
    assert_eq!(pair.algorithm(), SignatureAlgorithm::Ed25519Sha512);
}
