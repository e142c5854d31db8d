//! §8 "Reliability suppression" property, rounded out across the linger
//! timers not already exercised by the per-transaction scenario tests:
//! on a reliable transport, Timer D/I/K collapse to 0 (fire as soon as their
//! state is entered) while the retransmit timers A/E/G never arm at all.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{destination, settle, Event, MockTransport, RecordingTu, TestEncoder};
use sip_tsx_core::config::TimerConfig;
use sip_tsx_core::manager::TransactionManager;
use sip_tsx_types::testing::{TestMessage, TestMessageFactory};
use sip_tsx_types::{Code, Method};

fn manager(tu: Arc<RecordingTu>) -> TransactionManager<TestMessage> {
    common::init_tracing();
    TransactionManager::new(
        Arc::new(TestMessageFactory),
        Arc::new(TestEncoder),
        tu,
        TimerConfig::default(),
    )
}

/// Client-INVITE, reliable transport, non-2xx final: Timer D collapses to 0,
/// so the transaction terminates right after the core-built ACK is sent
/// without needing to wait anywhere near the 32s unreliable floor.
#[tokio::test(start_paused = true)]
async fn client_invite_timer_d_collapses_on_reliable_transport() {
    let transport = MockTransport::new(true);
    let tu = Arc::new(RecordingTu::default());
    let manager = manager(tu.clone());

    let invite = TestMessage::request(Method::INVITE, "z9hG4bK-rd1", "TCP");
    manager
        .begin_client_tx(invite.clone(), destination(&transport), tu.clone())
        .unwrap();
    settle().await;

    manager.receive_message(invite.response(Code::NOT_FOUND), destination(&transport));
    settle().await;

    assert_eq!(tu.count(&Event::Terminated), 1, "Timer D=0 should terminate right away");
    assert!(transport.descriptions().iter().any(|d| d.starts_with("REQ ACK")));
}

/// Server-INVITE, reliable transport: a non-2xx final is sent without Timer
/// G ever arming (no retransmit possible on a reliable wire); once the ACK
/// arrives, Timer I=0 terminates immediately.
#[tokio::test(start_paused = true)]
async fn server_invite_timer_i_collapses_on_reliable_transport() {
    let transport = MockTransport::new(true);
    let tu = Arc::new(RecordingTu::default());
    let manager = manager(tu.clone());

    let invite = TestMessage::request(Method::INVITE, "z9hG4bK-rd2", "TCP");
    manager.receive_message(invite.clone(), destination(&transport));
    settle().await;
    let handle = tu.last_server_handle().unwrap();

    manager.post_response(&handle, invite.response(Code::FORBIDDEN));
    settle().await;
    assert_eq!(transport.descriptions().len(), 2); // 100, 403

    // No Timer G on a reliable transport: waiting does not produce retransmits.
    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(transport.descriptions().len(), 2);

    let mut ack = invite.clone();
    ack.method = Method::ACK;
    ack.cseq_method = Method::ACK;
    manager.receive_message(ack, destination(&transport));
    settle().await;

    assert_eq!(tu.count(&Event::Terminated), 1, "Timer I=0 should terminate right after the ACK");
}

/// Client non-INVITE, reliable transport: Timer E never arms (no
/// retransmits of the request), and Timer K=0 terminates immediately after
/// the final response.
#[tokio::test(start_paused = true)]
async fn client_non_invite_timer_e_never_arms_on_reliable_transport() {
    let transport = MockTransport::new(true);
    let tu = Arc::new(RecordingTu::default());
    let manager = manager(tu.clone());

    let bye = TestMessage::request(Method::BYE, "z9hG4bK-rd3", "TCP");
    manager
        .begin_client_tx(bye.clone(), destination(&transport), tu.clone())
        .unwrap();
    settle().await;
    assert_eq!(transport.descriptions().len(), 1);

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(transport.descriptions().len(), 1, "Timer E must never arm on a reliable transport");

    manager.receive_message(bye.response(Code::OK), destination(&transport));
    settle().await;

    assert_eq!(tu.count(&Event::Final(200)), 1);
    assert_eq!(tu.count(&Event::Terminated), 1, "Timer K=0 should terminate right after the final");
}
