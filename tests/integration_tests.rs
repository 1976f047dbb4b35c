//! Integration tests for cross-crate interactions.
//!
//! Exercises the session state machine against the real codec, framer, and
//! crypto engine, then the full async peer driver over an in-memory link
//! pair. Wire-format assertions parse the actual JSON lines so a peer
//! written against the schema alone would interoperate.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::time::Duration;
use tokio::time::timeout;

use earshot_core::{
    ChatBody, DECRYPTION_FAILED, Message, MessageKind, Origin, Packet, Peer, PeerConfig,
    PeerEvent, Role, SessionOutput, SessionState,
};
use earshot_integration_tests::{
    deliver, establish_pair, init_tracing, logged_messages, sent_payloads, session,
};
use earshot_link::MemoryLink;

// ============================================================================
// Handshake and Wire Format
// ============================================================================

/// The happy-path handshake costs exactly one round trip: hs out, hs_ack
/// back, and silence after that.
#[test]
fn test_handshake_is_one_round_trip() {
    let mut host = session("alice", Role::Host);
    let mut joiner = session("bob", Role::Joiner);

    let hs = joiner.send_handshake(false).unwrap();
    assert_eq!(sent_payloads(&hs).len(), 1);

    let ack = deliver(&hs, &mut host);
    assert_eq!(sent_payloads(&ack).len(), 1);
    assert_eq!(host.state(), SessionState::ConnectedEncrypted);

    let silence = deliver(&ack, &mut joiner);
    assert!(sent_payloads(&silence).is_empty());
    assert_eq!(joiner.state(), SessionState::ConnectedEncrypted);
}

/// The handshake line carries `t`, `u`, and a base64 65-byte uncompressed
/// SEC1 point under `pub`.
#[test]
fn test_handshake_wire_schema() {
    let joiner = session("bob", Role::Joiner);
    let line = &sent_payloads(&joiner.send_handshake(false).unwrap())[0];

    let value: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(value["t"], "hs");
    assert_eq!(value["u"], "bob");

    let key = BASE64.decode(value["pub"].as_str().unwrap()).unwrap();
    assert_eq!(key.len(), 65);
    assert_eq!(key[0], 0x04);
}

/// Both sides independently derive the same key from exchanged public keys,
/// demonstrated by traffic flowing in both directions.
#[test]
fn test_chat_flows_both_directions() {
    let (mut host, mut joiner) = establish_pair("alice", "bob");

    let to_joiner = host.send_message("from host").unwrap();
    let got = logged_messages(&deliver(&to_joiner, &mut joiner));
    assert_eq!(got[0].text, "from host");
    assert!(got[0].encrypted);

    let to_host = joiner.send_message("from joiner").unwrap();
    let got = logged_messages(&deliver(&to_host, &mut host));
    assert_eq!(got[0].text, "from joiner");
    assert!(got[0].encrypted);
}

/// Each session start mints a fresh ephemeral pair, so fingerprints differ
/// across sessions and hold the documented display shape.
#[test]
fn test_fingerprint_shape_and_freshness() {
    let first = session("alice", Role::Host);
    let second = session("alice", Role::Host);

    let fp = first.fingerprint().unwrap();
    assert_eq!(fp.len(), 39);
    assert_eq!(fp.split(' ').count(), 8);
    assert!(
        fp.chars()
            .all(|c| c == ' ' || (c.is_ascii_hexdigit() && !c.is_ascii_lowercase()))
    );

    assert_ne!(fp, second.fingerprint().unwrap());
}

// ============================================================================
// Chat Scenarios
// ============================================================================

/// Without a shared key the chat body goes out as plaintext `txt` with a
/// UUID message id, and the local echo is flagged unencrypted.
#[test]
fn test_unkeyed_chat_wire_schema() {
    let joiner = session("bob", Role::Joiner);

    let outputs = joiner.send_message("hi").unwrap();
    let echo = &logged_messages(&outputs)[0];
    assert!(!echo.encrypted);
    assert_eq!(echo.origin, Origin::Local);

    let value: serde_json::Value = serde_json::from_str(&sent_payloads(&outputs)[0]).unwrap();
    assert_eq!(value["t"], "chat");
    assert_eq!(value["u"], "bob");
    assert_eq!(value["txt"], "hi");
    assert!(value.get("enc").is_none());

    // Hyphenated UUID: 36 chars, 4 separators.
    let id = value["id"].as_str().unwrap();
    assert_eq!(id.len(), 36);
    assert_eq!(id.chars().filter(|&c| c == '-').count(), 4);
    assert_eq!(id, echo.id);
}

/// With a key, the wire carries an `enc` envelope with a 12-byte IV and no
/// trace of the plaintext.
#[test]
fn test_keyed_chat_wire_schema() {
    let (host, _joiner) = establish_pair("alice", "bob");

    let outputs = host.send_message("attack at dawn").unwrap();
    let line = &sent_payloads(&outputs)[0];
    assert!(!line.contains("attack at dawn"));

    let value: serde_json::Value = serde_json::from_str(line).unwrap();
    assert!(value.get("txt").is_none());
    let iv = BASE64.decode(value["enc"]["iv"].as_str().unwrap()).unwrap();
    assert_eq!(iv.len(), 12);
    let ct = BASE64.decode(value["enc"]["ct"].as_str().unwrap()).unwrap();
    assert_eq!(ct.len(), "attack at dawn".len() + 16);
}

/// Flipping one ciphertext byte on the wire yields the sentinel text as a
/// visible chat entry, never silence and never corrupted plaintext.
#[test]
fn test_wire_tampering_shows_sentinel() {
    let (host, mut joiner) = establish_pair("alice", "bob");

    let outputs = host.send_message("secret").unwrap();
    let mut value: serde_json::Value =
        serde_json::from_str(&sent_payloads(&outputs)[0]).unwrap();

    let mut ct = BASE64.decode(value["enc"]["ct"].as_str().unwrap()).unwrap();
    ct[0] ^= 0x01;
    value["enc"]["ct"] = serde_json::Value::String(BASE64.encode(&ct));
    let tampered = serde_json::to_string(&value).unwrap();

    let got = logged_messages(&joiner.on_chunk(format!("{tampered}\n").as_bytes()));
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].text, DECRYPTION_FAILED);
    assert!(!got[0].encrypted);
    assert_eq!(got[0].kind, MessageKind::Chat);
}

/// A plaintext packet is accepted mid-encrypted-session, marked unencrypted;
/// the next sealed packet still opens fine.
#[test]
fn test_plaintext_interleaved_with_encrypted() {
    let (host, mut joiner) = establish_pair("alice", "bob");

    let sealed = host.send_message("first").unwrap();
    deliver(&sealed, &mut joiner);

    let downgraded = Packet::Chat {
        sender: "alice".to_string(),
        id: "plain-1".to_string(),
        body: ChatBody::Plaintext("psst".to_string()),
    }
    .encode();
    let got = logged_messages(&joiner.on_chunk(format!("{downgraded}\n").as_bytes()));
    assert_eq!(got[0].text, "psst");
    assert!(!got[0].encrypted);
    assert_eq!(joiner.state(), SessionState::ConnectedEncrypted);

    let sealed = host.send_message("second").unwrap();
    let got = logged_messages(&deliver(&sealed, &mut joiner));
    assert_eq!(got[0].text, "second");
    assert!(got[0].encrypted);
}

/// Unknown packet types and junk lines between valid packets are dropped
/// without disturbing the session.
#[test]
fn test_foreign_dialect_ignored() {
    let (host, mut joiner) = establish_pair("alice", "bob");

    let noise = "{\"t\":\"typing\",\"u\":\"alice\"}\ngarbage{{{\n";
    assert!(joiner.on_chunk(noise.as_bytes()).is_empty());

    let sealed = host.send_message("still here").unwrap();
    let got = logged_messages(&deliver(&sealed, &mut joiner));
    assert_eq!(got[0].text, "still here");
}

// ============================================================================
// Framing and Fragmentation
// ============================================================================

/// Feed `lines` to `session` in `chunk_size` pieces, collecting log
/// messages into `inbox` and returning the wire lines produced.
fn feed_lines(
    session: &mut earshot_core::Session,
    lines: &[String],
    chunk_size: usize,
    inbox: &mut Vec<Message>,
) -> Vec<String> {
    let mut produced = Vec::new();
    for line in lines {
        let framed = format!("{line}\n");
        for chunk in framed.as_bytes().chunks(chunk_size) {
            let outputs = session.on_chunk(chunk);
            inbox.extend(logged_messages(&outputs));
            produced.extend(sent_payloads(&outputs));
        }
    }
    produced
}

/// A whole conversation survives any chunk size, down to one byte per
/// chunk: framing is invariant to link-level boundaries.
#[test]
fn test_conversation_survives_any_chunk_size() {
    for chunk_size in [1, 2, 3, 7, 20, 64] {
        let mut host = session("alice", Role::Host);
        let mut joiner = session("bob", Role::Joiner);

        let mut host_inbox: Vec<Message> = Vec::new();
        let mut joiner_inbox: Vec<Message> = Vec::new();

        // Joiner initiates; every wire line crosses in `chunk_size` pieces.
        let hs = sent_payloads(&joiner.send_handshake(false).unwrap());
        let ack = feed_lines(&mut host, &hs, chunk_size, &mut host_inbox);
        let silence = feed_lines(&mut joiner, &ack, chunk_size, &mut joiner_inbox);
        assert!(silence.is_empty(), "chunk size {chunk_size}");

        let chat = sent_payloads(&host.send_message("über-fragmented ✓").unwrap());
        feed_lines(&mut joiner, &chat, chunk_size, &mut joiner_inbox);

        assert_eq!(joiner_inbox.len(), 1, "chunk size {chunk_size}");
        assert_eq!(joiner_inbox[0].text, "über-fragmented ✓");
        assert!(joiner_inbox[0].encrypted);
    }
}

/// Two packets arriving glued together in one chunk are processed as two.
#[test]
fn test_coalesced_packets_in_one_chunk() {
    let (host, mut joiner) = establish_pair("alice", "bob");

    let first = sent_payloads(&host.send_message("one").unwrap());
    let second = sent_payloads(&host.send_message("two").unwrap());
    let coalesced = format!("{}\n{}\n", first[0], second[0]);

    let got = logged_messages(&joiner.on_chunk(coalesced.as_bytes()));
    assert_eq!(got.len(), 2);
    assert_eq!(got[0].text, "one");
    assert_eq!(got[1].text, "two");
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Ping keeps the session warm: status text out, no state disturbance, no
/// reply traffic.
#[test]
fn test_ping_is_status_only() {
    let (mut host, joiner) = establish_pair("alice", "bob");

    let ping = joiner.send_ping().unwrap();
    let outputs = deliver(&ping, &mut host);

    assert_eq!(
        outputs,
        vec![SessionOutput::Status("ping from bob".to_string())]
    );
    assert_eq!(host.state(), SessionState::ConnectedEncrypted);
}

/// Disconnect tears everything down; a rerun of init builds a new identity
/// that the old peer's key material cannot talk to silently.
#[test]
fn test_reconnect_is_a_fresh_identity() {
    let (mut host, mut joiner) = establish_pair("alice", "bob");
    let old_fingerprint = host.fingerprint().unwrap();

    host.disconnect();
    assert_eq!(host.state(), SessionState::Idle);
    assert!(host.fingerprint().is_none());

    host.init("alice", Role::Host).unwrap();
    assert_ne!(host.fingerprint().unwrap(), old_fingerprint);

    // A message sealed under the old shared key no longer opens.
    let stale = joiner.send_message("stale").unwrap();
    let hs = joiner.send_handshake(false).unwrap();
    deliver(&hs, &mut host);
    let got = logged_messages(&deliver(&stale, &mut host));
    assert_eq!(got[0].text, DECRYPTION_FAILED);
}

// ============================================================================
// Async Peer Scenarios
// ============================================================================

const TICK: Duration = Duration::from_secs(2);

fn peer_config(name: &str, role: Role) -> PeerConfig {
    PeerConfig {
        name: name.to_string(),
        role,
        chunk_delay: Duration::from_millis(1),
    }
}

async fn next_message(peer: &mut Peer) -> Message {
    loop {
        match timeout(TICK, peer.next_event()).await.expect("event timeout") {
            Some(PeerEvent::Message(message)) => return message,
            Some(_) => {}
            None => panic!("event channel closed"),
        }
    }
}

async fn wait_status(peer: &mut Peer, needle: &str) -> String {
    loop {
        match timeout(TICK, peer.next_event()).await.expect("event timeout") {
            Some(PeerEvent::Status(status)) if status.contains(needle) => return status,
            Some(_) => {}
            None => panic!("event channel closed"),
        }
    }
}

async fn wait_stopped(peer: &mut Peer) {
    loop {
        match timeout(TICK, peer.next_event()).await.expect("event timeout") {
            Some(PeerEvent::Stopped) => return,
            Some(_) => {}
            None => panic!("stopped event never arrived"),
        }
    }
}

/// Full conversation over a 20-byte-MTU in-memory link: handshake, chat in
/// both directions, histories persisted on both sides.
#[tokio::test]
async fn test_peer_conversation_over_memory_link() {
    init_tracing();

    let ((host_link, host_rx), (joiner_link, joiner_rx)) = MemoryLink::pair(20);
    let mut host = Peer::spawn(
        host_link,
        host_rx,
        earshot_core::MemoryStore::new(),
        peer_config("alice", Role::Host),
    )
    .unwrap();
    let mut joiner = Peer::spawn(
        joiner_link,
        joiner_rx,
        earshot_core::MemoryStore::new(),
        peer_config("bob", Role::Joiner),
    )
    .unwrap();

    joiner.send_handshake().await.unwrap();
    wait_status(&mut host, "encryption established with bob").await;
    wait_status(&mut joiner, "encryption established with alice").await;

    host.send_message("hello bob").await.unwrap();
    assert_eq!(next_message(&mut host).await.origin, Origin::Local);
    let got = next_message(&mut joiner).await;
    assert_eq!(got.text, "hello bob");
    assert!(got.encrypted);

    joiner.send_message("hello alice").await.unwrap();
    assert_eq!(next_message(&mut joiner).await.origin, Origin::Local);
    let got = next_message(&mut host).await;
    assert_eq!(got.text, "hello alice");
    assert!(got.encrypted);

    let host_history: Vec<String> = host.messages().iter().map(|m| m.text.clone()).collect();
    assert_eq!(host_history, vec!["hello bob", "hello alice"]);
    let joiner_history: Vec<String> =
        joiner.messages().iter().map(|m| m.text.clone()).collect();
    assert_eq!(joiner_history, vec!["hello bob", "hello alice"]);

    host.shutdown().await;
    joiner.shutdown().await;
}

/// Ping crosses the link and surfaces as a status event on the other side.
#[tokio::test]
async fn test_peer_ping_crosses_link() {
    init_tracing();

    let ((host_link, host_rx), (joiner_link, joiner_rx)) = MemoryLink::pair(20);
    let mut host = Peer::spawn(
        host_link,
        host_rx,
        earshot_core::MemoryStore::new(),
        peer_config("alice", Role::Host),
    )
    .unwrap();
    let joiner = Peer::spawn(
        joiner_link,
        joiner_rx,
        earshot_core::MemoryStore::new(),
        peer_config("bob", Role::Joiner),
    )
    .unwrap();

    joiner.send_ping().await.unwrap();
    wait_status(&mut host, "ping from bob").await;

    host.shutdown().await;
    joiner.shutdown().await;
}

/// Link-level status notifications pass through to the peer's event stream.
#[tokio::test]
async fn test_peer_surfaces_link_status() {
    init_tracing();

    let ((host_link, host_rx), _joiner_half) = MemoryLink::pair(20);
    let status_handle = host_link.clone();
    let mut host = Peer::spawn(
        host_link,
        host_rx,
        earshot_core::MemoryStore::new(),
        peer_config("alice", Role::Host),
    )
    .unwrap();

    status_handle.notify_status("subscribed").await.unwrap();
    let status = wait_status(&mut host, "subscribed").await;
    assert_eq!(status, "subscribed");

    host.shutdown().await;
}

/// One side disconnecting closes the shared link and stops the other side
/// too, leaving a "disconnected" notice in both histories.
#[tokio::test]
async fn test_peer_disconnect_cascades() {
    init_tracing();

    let ((host_link, host_rx), (joiner_link, joiner_rx)) = MemoryLink::pair(20);
    let mut host = Peer::spawn(
        host_link,
        host_rx,
        earshot_core::MemoryStore::new(),
        peer_config("alice", Role::Host),
    )
    .unwrap();
    let mut joiner = Peer::spawn(
        joiner_link,
        joiner_rx,
        earshot_core::MemoryStore::new(),
        peer_config("bob", Role::Joiner),
    )
    .unwrap();

    host.disconnect().await.unwrap();
    wait_stopped(&mut host).await;
    wait_stopped(&mut joiner).await;

    for peer in [&host, &joiner] {
        let texts: Vec<String> = peer.messages().iter().map(|m| m.text.clone()).collect();
        assert!(texts.contains(&"disconnected".to_string()), "{texts:?}");
    }
}
