use std::sync::Arc;

use sip_tsx_types::{Code, CodeKind, MessageFactory, MessageView};
use tokio::sync::mpsc;

use crate::config::TimerConfig;
use crate::timer::Timer;
use crate::transport::{Destination, Encoder};

use super::registration::{TransactionTable, TsxRegistration};
use super::{ServerTxHandle, TransactionCallback, TsxEvent, TsxKey};

enum State {
    Proceeding,
    Completed,
    Confirmed,
    Terminated,
}

/// Spawn a server-INVITE transaction actor (§4.E.1).
///
/// The RFC's `Trying` state is skipped: the actor's very first action,
/// before it ever polls its mailbox, is to send `100 Trying` — this is the
/// "permissible simplification" the design notes call out, and it is also
/// what guarantees the 100 always precedes any response the TU posts
/// through the returned handle, however quickly it does so.
pub fn spawn_server_invite<M>(
    request: M,
    destination: Destination,
    factory: Arc<dyn MessageFactory<M>>,
    encoder: Arc<dyn Encoder<M>>,
    callback: Arc<dyn TransactionCallback<M>>,
    table: TransactionTable<M>,
    key: TsxKey,
    timers: TimerConfig,
) -> ServerTxHandle<M>
where
    M: MessageView,
{
    let (sender, receiver) = mpsc::unbounded_channel();
    let handle = ServerTxHandle::new(key.clone(), sender.clone());
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

    let trying = factory.create_response(&request, Code::TRYING, None);
    let mut state = State::Proceeding;

    if !send(&destination, &*encoder, &trying, &key).await {
        callback.on_transport_failure();
        state = State::Terminated;
    }

    let mut final_response: Option<M> = None;
    let mut timer_g = Timer::new();
    let mut timer_h = Timer::new();
    let mut timer_i = Timer::new();
    let mut g_interval = timers.timer_g0();

    while !matches!(state, State::Terminated) {
        tokio::select! {
            event = receiver.recv() => {
                let Some(event) = event else { break };
                match event {
                    TsxEvent::Send(response) => {
                        if let State::Proceeding = state {
                            let kind = response.status_code().expect("response carries a status").kind();
                            let ok = send(&destination, &*encoder, &response, &key).await;
                            if !ok {
                                callback.on_transport_failure();
                                state = State::Terminated;
                            } else {
                                match kind {
                                    CodeKind::Provisional => {}
                                    CodeKind::Success => {
                                        state = State::Terminated;
                                    }
                                    _ => {
                                        final_response = Some(response);
                                        if !reliable {
                                            g_interval = timers.timer_g0();
                                            timer_g.arm(g_interval);
                                        }
                                        timer_h.arm(timers.timer_h());
                                        state = State::Completed;
                                    }
                                }
                            }
                        }
                        // §4.E.1: Send of a final while Completed/Terminated is
                        // silently discarded, the TU has already been told.
                    }
                    TsxEvent::Message(msg) => {
                        match state {
                            State::Proceeding if msg.is_request() => {
                                if !send(&destination, &*encoder, &trying, &key).await {
                                    callback.on_transport_failure();
                                    state = State::Terminated;
                                }
                            }
                            State::Completed if msg.is_request() && msg.method().is_invite() => {
                                if let Some(resp) = final_response.clone() {
                                    if !send(&destination, &*encoder, &resp, &key).await {
                                        callback.on_transport_failure();
                                        state = State::Terminated;
                                    }
                                }
                            }
                            State::Completed if msg.is_request() && msg.method().is_ack() => {
                                timer_g.cancel();
                                timer_i.arm(timers.timer_i(reliable));
                                state = State::Confirmed;
                            }
                            _ => {}
                        }
                    }
                    TsxEvent::TransportError => {
                        callback.on_transport_failure();
                        state = State::Terminated;
                    }
                }
            }
            _ = timer_g.fires() => {
                if let Some(resp) = final_response.clone() {
                    if !send(&destination, &*encoder, &resp, &key).await {
                        callback.on_transport_failure();
                        state = State::Terminated;
                    } else {
                        g_interval = timers.backoff(g_interval);
                        timer_g.arm(g_interval);
                    }
                }
            }
            _ = timer_h.fires() => {
                callback.on_timeout();
                state = State::Terminated;
            }
            _ = timer_i.fires() => {
                state = State::Terminated;
            }
        }
    }

    callback.on_terminated();
}

/// Encode and send a message, logging and returning `false` on failure.
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
            tracing::warn!(%key, %err, "server-invite send failed");
            false
        }
    }
}
