use std::sync::Arc;

use sip_tsx_types::{CodeKind, MessageView};
use tokio::sync::mpsc;

use crate::config::TimerConfig;
use crate::timer::Timer;
use crate::transport::{Destination, Encoder};

use super::registration::{TransactionTable, TsxRegistration};
use super::{ServerTxHandle, TransactionCallback, TsxEvent, TsxKey};

enum State {
    Trying,
    Proceeding,
    Completed,
    Terminated,
}

/// Spawn a server non-INVITE transaction actor (§4.E.2).
pub fn spawn_server_non_invite<M>(
    destination: Destination,
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

    tokio::spawn(run(registration, receiver, destination, encoder, callback, timers));

    handle
}

async fn run<M>(
    registration: TsxRegistration<M>,
    mut receiver: mpsc::UnboundedReceiver<TsxEvent<M>>,
    destination: Destination,
    encoder: Arc<dyn Encoder<M>>,
    callback: Arc<dyn TransactionCallback<M>>,
    timers: TimerConfig,
) where
    M: MessageView,
{
    let key = registration.key().clone();
    let reliable = destination.reliable();

    let mut state = State::Trying;
    let mut last_provisional: Option<M> = None;
    let mut final_response: Option<M> = None;
    let mut timer_j = Timer::new();

    while !matches!(state, State::Terminated) {
        tokio::select! {
            event = receiver.recv() => {
                let Some(event) = event else { break };
                match event {
                    TsxEvent::Send(response) => {
                        match state {
                            State::Trying | State::Proceeding => {
                                let kind = response.status_code().expect("response carries a status").kind();
                                let ok = send(&destination, &*encoder, &response, &key).await;
                                if !ok {
                                    callback.on_transport_failure();
                                    state = State::Terminated;
                                } else if let CodeKind::Provisional = kind {
                                    last_provisional = Some(response);
                                    state = State::Proceeding;
                                } else {
                                    final_response = Some(response);
                                    timer_j.arm(timers.timer_j(reliable));
                                    state = State::Completed;
                                }
                            }
                            State::Completed | State::Terminated => {}
                        }
                    }
                    TsxEvent::Message(msg) if msg.is_request() => {
                        match state {
                            State::Proceeding => {
                                if let Some(resp) = last_provisional.clone() {
                                    if !send(&destination, &*encoder, &resp, &key).await {
                                        callback.on_transport_failure();
                                        state = State::Terminated;
                                    }
                                }
                            }
                            State::Completed => {
                                if let Some(resp) = final_response.clone() {
                                    if !send(&destination, &*encoder, &resp, &key).await {
                                        callback.on_transport_failure();
                                        state = State::Terminated;
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                    TsxEvent::Message(_) => {}
                    TsxEvent::TransportError => {
                        callback.on_transport_failure();
                        state = State::Terminated;
                    }
                }
            }
            _ = timer_j.fires() => {
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
            tracing::warn!(%key, %err, "server-non-invite send failed");
            false
        }
    }
}
