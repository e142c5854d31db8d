use std::sync::Arc;

use sip_tsx_types::{MessageFactory, MessageView};

use crate::config::TimerConfig;
use crate::error::{Error, Result};
use crate::transaction::key::TsxKey;
use crate::transaction::{
    spawn_client_invite, spawn_client_non_invite, spawn_server_invite, spawn_server_non_invite,
    ClientTxHandle, IncomingRequestHandler, ServerTxHandle, TransactionCallback, TsxEvent,
};
use crate::transport::{Destination, Encoder};

pub(crate) use crate::transaction::registration::TransactionTable;

/// Owns the table of live transactions and exposes the TU-facing API (§4.F).
///
/// Grounded in the teacher's `Endpoint`/`Transactions` split, narrowed to
/// just the transaction concern (no transport selection, resolver, dialog
/// layer — those stay out of scope, §1).
pub struct TransactionManager<M: MessageView> {
    table: TransactionTable<M>,
    factory: Arc<dyn MessageFactory<M>>,
    encoder: Arc<dyn Encoder<M>>,
    handler: Arc<dyn IncomingRequestHandler<M>>,
    timers: TimerConfig,
}

/// Adapts the manager-wide `IncomingRequestHandler` ("the TU") down to the
/// plain `TransactionCallback` surface server transactions need for their
/// own terminal-event notifications.
struct HandlerAsCallback<M>(Arc<dyn IncomingRequestHandler<M>>);

impl<M: MessageView> TransactionCallback<M> for HandlerAsCallback<M> {
    fn on_provisional(&self, response: M) {
        self.0.on_provisional(response)
    }

    fn on_final(&self, response: M) {
        self.0.on_final(response)
    }

    fn on_timeout(&self) {
        self.0.on_timeout()
    }

    fn on_transport_failure(&self) {
        self.0.on_transport_failure()
    }

    fn on_terminated(&self) {
        self.0.on_terminated()
    }
}

impl<M: MessageView> TransactionManager<M> {
    pub fn new(
        factory: Arc<dyn MessageFactory<M>>,
        encoder: Arc<dyn Encoder<M>>,
        handler: Arc<dyn IncomingRequestHandler<M>>,
        timers: TimerConfig,
    ) -> Self {
        TransactionManager {
            table: TransactionTable::new(),
            factory,
            encoder,
            handler,
            timers,
        }
    }

    /// Originate a client transaction for `request`, dispatching to the
    /// INVITE or non-INVITE state machine by method (§6: one
    /// `begin_client_tx` entry point; dispatch on `method.is_invite()` is an
    /// implementation detail, not a second public constructor).
    #[tracing::instrument(skip_all, fields(method = %request.method()))]
    pub fn begin_client_tx(
        &self,
        request: M,
        destination: Destination,
        callback: Arc<dyn TransactionCallback<M>>,
    ) -> Result<ClientTxHandle> {
        if request.method().is_ack() {
            return Err(Error::ContractViolation(
                "ACK cannot open its own client transaction",
            ));
        }

        let key = TsxKey::client(&request);
        tracing::debug!(%key, "starting client transaction");

        let handle = if request.method().is_invite() {
            spawn_client_invite(
                request,
                destination,
                self.factory.clone(),
                self.encoder(),
                callback,
                self.table.clone(),
                key,
                self.timers,
            )
        } else {
            spawn_client_non_invite(
                request,
                destination,
                self.encoder(),
                callback,
                self.table.clone(),
                key,
                self.timers,
            )
        };

        Ok(handle)
    }

    /// Post a response into a live server transaction (§6:
    /// `send_response(server-tx-handle, response)`).
    pub fn post_response(&self, handle: &ServerTxHandle<M>, response: M) {
        handle.send_response(response);
    }

    /// Route an inbound message from the transport (§4.D, §4.F): compute its
    /// key, look it up, and either forward it to the matching transaction's
    /// mailbox or, for an unmatched non-ACK request, spawn a new server
    /// transaction and hand it to the TU as `incoming_request` (§6). An
    /// unmatched response or ACK is dropped silently (§7.5).
    #[tracing::instrument(skip_all)]
    pub fn receive_message(&self, msg: M, destination: Destination) {
        let key = TsxKey::from_message(&msg);

        if let Some(sender) = self.table.lookup(&key) {
            let _ = sender.send(TsxEvent::Message(msg));
            return;
        }

        if msg.is_request() && !msg.method().is_ack() {
            tracing::debug!(%key, "no matching transaction, treating as new server transaction");
            self.spawn_server_tx(msg, destination, key);
        } else {
            tracing::trace!(%key, "dropping unmatched message");
        }
    }

    fn spawn_server_tx(&self, request: M, destination: Destination, key: TsxKey) {
        let remote = destination.remote;
        let callback: Arc<dyn TransactionCallback<M>> =
            Arc::new(HandlerAsCallback(self.handler.clone()));

        let handle = if request.method().is_invite() {
            spawn_server_invite(
                request.clone(),
                destination,
                self.factory.clone(),
                self.encoder(),
                callback,
                self.table.clone(),
                key,
                self.timers,
            )
        } else {
            spawn_server_non_invite(
                destination,
                self.encoder(),
                callback,
                self.table.clone(),
                key,
                self.timers,
            )
        };

        self.handler.incoming_request(request, remote, handle);
    }

    fn encoder(&self) -> Arc<dyn crate::transport::Encoder<M>> {
        self.encoder.clone()
    }
}
