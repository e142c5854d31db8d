//! Client non-INVITE transaction scenario (spec.md §4.E.4, §8 scenario 6)
//! plus the Timer monotonicity property.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{destination, settle, Event, MockTransport, RecordingTu, TestEncoder};
use sip_tsx_core::config::TimerConfig;
use sip_tsx_core::manager::TransactionManager;
use sip_tsx_types::testing::{TestMessage, TestMessageFactory};
use sip_tsx_types::Method;

fn manager(tu: Arc<RecordingTu>) -> TransactionManager<TestMessage> {
    common::init_tracing();
    TransactionManager::new(
        Arc::new(TestMessageFactory),
        Arc::new(TestEncoder),
        tu,
        TimerConfig::default(),
    )
}

/// Scenario 6: no response ever arrives. Timer E retransmits with the
/// doubling-then-capped schedule (500, 1000, 2000, 4000, 4000, ...) until
/// Timer F (64·T1) fires and the TU gets `timeout`.
#[tokio::test(start_paused = true)]
async fn timeout_on_udp_follows_the_rfc_retransmit_schedule() {
    let transport = MockTransport::new(false);
    let tu = Arc::new(RecordingTu::default());
    let manager = manager(tu.clone());
    let timers = TimerConfig::default();

    let register = TestMessage::request(Method::REGISTER, "z9hG4bK-cni1", "UDP");
    manager
        .begin_client_tx(register, destination(&transport), tu.clone())
        .unwrap();
    settle().await;
    assert_eq!(transport.descriptions().len(), 1);

    let mut elapsed = Duration::ZERO;
    while elapsed < timers.timer_f() + Duration::from_millis(500) {
        tokio::time::advance(Duration::from_millis(250)).await;
        settle().await;
        elapsed += Duration::from_millis(250);
    }

    assert_eq!(tu.count(&Event::Timeout), 1);
    assert_eq!(tu.count(&Event::Terminated), 1);

    // 1 initial + retransmits at 500,1500,3500,7500,11500,15500,19500,23500,27500,31500 = 11
    assert_eq!(transport.descriptions().len(), 11);
}

/// A 1xx keeps Timer E alive (at the T2-capped interval) without notifying
/// `timeout`; the eventual final response still completes the transaction
/// exactly once.
#[tokio::test(start_paused = true)]
async fn provisional_keeps_transaction_alive_until_the_final_arrives() {
    let transport = MockTransport::new(false);
    let tu = Arc::new(RecordingTu::default());
    let manager = manager(tu.clone());

    let options = TestMessage::request(Method::OPTIONS, "z9hG4bK-cni2", "UDP");
    manager
        .begin_client_tx(options.clone(), destination(&transport), tu.clone())
        .unwrap();
    settle().await;

    tokio::time::advance(Duration::from_millis(200)).await;
    settle().await;
    manager.receive_message(options.response(sip_tsx_types::Code::TRYING), destination(&transport));
    settle().await;
    assert_eq!(tu.count(&Event::Provisional(100)), 1);

    manager.receive_message(options.response(sip_tsx_types::Code::OK), destination(&transport));
    settle().await;

    assert_eq!(tu.count(&Event::Final(200)), 1);
    assert_eq!(tu.count(&Event::Timeout), 0, "final arrived before Timer F, no timeout");
}
