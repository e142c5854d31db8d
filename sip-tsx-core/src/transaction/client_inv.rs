use std::sync::Arc;

use sip_tsx_types::{CodeKind, MessageFactory, MessageView};
use tokio::sync::mpsc;

use crate::config::TimerConfig;
use crate::timer::Timer;
use crate::transport::{Destination, Encoder};

use super::registration::{TransactionTable, TsxRegistration};
use super::{ClientTxHandle, TransactionCallback, TsxEvent, TsxKey};

enum State {
    Calling,
    Proceeding,
    Completed,
    Terminated,
}

/// Spawn a client INVITE transaction actor (§4.E.3).
///
/// On entry: send the request; if the transport is unreliable arm Timer A
/// (retransmit) and Timer B (give up). Non-2xx final responses get a
/// deterministically-built ACK (RFC 3261 §17.1.1.3); 2xx ACKs are left to the
/// dialog layer above, out of scope here.
pub fn spawn_client_invite<M>(
    request: M,
    destination: Destination,
    factory: Arc<dyn MessageFactory<M>>,
    encoder: Arc<dyn Encoder<M>>,
    callback: Arc<dyn TransactionCallback<M>>,
    table: TransactionTable<M>,
    key: TsxKey,
    timers: TimerConfig,
) -> ClientTxHandle
where
    M: MessageView,
{
    let (sender, receiver) = mpsc::unbounded_channel();
    let handle = ClientTxHandle::new(key.clone());
    let registration = TsxRegistration::new(table, key, sender);

    tokio::spawn(run(
        registration,
        receiver,
        request,
        destination,
        factory,
        encoder,
        callback,
        timers,
    ));

    handle
}

async fn run<M>(
    registration: TsxRegistration<M>,
    mut receiver: mpsc::UnboundedReceiver<TsxEvent<M>>,
    request: M,
    destination: Destination,
    factory: Arc<dyn MessageFactory<M>>,
    encoder: Arc<dyn Encoder<M>>,
    callback: Arc<dyn TransactionCallback<M>>,
    timers: TimerConfig,
) where
    M: MessageView,
{
    let key = registration.key().clone();
    let reliable = destination.reliable();

    let mut state = State::Calling;
    let mut timer_a = Timer::new();
    let mut timer_b = Timer::new();
    let mut timer_d = Timer::new();
    let mut a_interval = timers.timer_a0();
    let mut ack: Option<M> = None;

    if !send(&destination, &*encoder, &request, &key).await {
        callback.on_transport_failure();
        state = State::Terminated;
    } else if !reliable {
        timer_a.arm(a_interval);
        timer_b.arm(timers.timer_b());
    } else {
        timer_b.arm(timers.timer_b());
    }

    while !matches!(state, State::Terminated) {
        tokio::select! {
            event = receiver.recv() => {
                let Some(event) = event else { break };
                match event {
                    TsxEvent::Message(response) if response.is_response() => {
                        match state {
                            State::Calling | State::Proceeding => {
                                match response.status_code().expect("response carries a status").kind() {
                                    CodeKind::Provisional => {
                                        timer_a.cancel();
                                        callback.on_provisional(response);
                                        state = State::Proceeding;
                                    }
                                    CodeKind::Success => {
                                        callback.on_final(response);
                                        state = State::Terminated;
                                    }
                                    _ => {
                                        let built = factory.create_ack(&request, &response);
                                        let ok = send(&destination, &*encoder, &built, &key).await;
                                        ack = Some(built);
                                        callback.on_final(response);
                                        if !ok {
                                            callback.on_transport_failure();
                                            state = State::Terminated;
                                        } else {
                                            timer_a.cancel();
                                            timer_b.cancel();
                                            timer_d.arm(timers.timer_d(reliable));
                                            state = State::Completed;
                                        }
                                    }
                                }
                            }
                            State::Completed => {
                                // Retransmission of the same non-2xx final: resend the
                                // previously-built ACK, do not notify the TU again.
                                if let Some(built) = ack.clone() {
                                    let _ = send(&destination, &*encoder, &built, &key).await;
                                }
                            }
                            State::Terminated => {}
                        }
                    }
                    TsxEvent::Message(_) => {}
                    TsxEvent::Send(_) => {}
                    TsxEvent::TransportError => {
                        callback.on_transport_failure();
                        state = State::Terminated;
                    }
                }
            }
            _ = timer_a.fires() => {
                if !send(&destination, &*encoder, &request, &key).await {
                    callback.on_transport_failure();
                    state = State::Terminated;
                } else {
                    a_interval *= 2;
                    timer_a.arm(a_interval);
                }
            }
            _ = timer_b.fires() => {
                callback.on_timeout();
                state = State::Terminated;
            }
            _ = timer_d.fires() => {
                state = State::Terminated;
            }
        }
    }

    callback.on_terminated();
}

async fn send<M: MessageView>(
    destination: &Destination,
    encoder: &dyn Encoder<M>,
    msg: &M,
    key: &TsxKey,
) -> bool {
    let bytes = encoder.encode(msg);
    match destination.send(&bytes).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(%key, %err, "client-invite send failed");
            false
        }
    }
}
