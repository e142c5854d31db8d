use std::sync::Arc;

use sip_tsx_types::{CodeKind, MessageView};
use tokio::sync::mpsc;

use crate::config::TimerConfig;
use crate::timer::Timer;
use crate::transport::{Destination, Encoder};

use super::registration::{TransactionTable, TsxRegistration};
use super::{ClientTxHandle, TransactionCallback, TsxEvent, TsxKey};

enum State {
    Trying,
    Proceeding,
    Completed,
    Terminated,
}

/// Spawn a client non-INVITE transaction actor (§4.E.4).
pub fn spawn_client_non_invite<M>(
    request: M,
    destination: Destination,
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

    tokio::spawn(run(registration, receiver, request, destination, encoder, callback, timers));

    handle
}

async fn run<M>(
    registration: TsxRegistration<M>,
    mut receiver: mpsc::UnboundedReceiver<TsxEvent<M>>,
    request: M,
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
    let mut timer_e = Timer::new();
    let mut timer_f = Timer::new();
    let mut timer_k = Timer::new();
    let mut e_interval = timers.timer_e0();

    if !send(&destination, &*encoder, &request, &key).await {
        callback.on_transport_failure();
        state = State::Terminated;
    } else {
        if !reliable {
            timer_e.arm(e_interval);
        }
        timer_f.arm(timers.timer_f());
    }

    while !matches!(state, State::Terminated) {
        tokio::select! {
            event = receiver.recv() => {
                let Some(event) = event else { break };
                match event {
                    TsxEvent::Message(response) if response.is_response() => {
                        match state {
                            State::Trying | State::Proceeding => {
                                match response.status_code().expect("response carries a status").kind() {
                                    CodeKind::Provisional => {
                                        // Timer E keeps running, rearm interval becomes T2 (§4.E.4).
                                        e_interval = timers.t2;
                                        callback.on_provisional(response);
                                        state = State::Proceeding;
                                    }
                                    _ => {
                                        timer_e.cancel();
                                        timer_f.cancel();
                                        callback.on_final(response);
                                        timer_k.arm(timers.timer_k(reliable));
                                        state = State::Completed;
                                    }
                                }
                            }
                            State::Completed | State::Terminated => {}
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
            _ = timer_e.fires() => {
                if !send(&destination, &*encoder, &request, &key).await {
                    callback.on_transport_failure();
                    state = State::Terminated;
                } else {
                    e_interval = timers.backoff(e_interval);
                    timer_e.arm(e_interval);
                }
            }
            _ = timer_f.fires() => {
                callback.on_timeout();
                state = State::Terminated;
            }
            _ = timer_k.fires() => {
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
            tracing::warn!(%key, %err, "client-non-invite send failed");
            false
        }
    }
}
