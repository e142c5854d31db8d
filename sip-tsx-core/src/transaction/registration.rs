use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use super::{TsxEvent, TsxKey};

/// Shared key -> mailbox table, the manager's "table of live transactions"
/// (§3, §4.F). Grounded in the teacher's `Transactions` struct; `parking_lot`
/// is the teacher's lock of choice for this table.
#[derive(Clone, Default)]
pub(crate) struct TransactionTable<M> {
    map: Arc<RwLock<HashMap<TsxKey, mpsc::UnboundedSender<TsxEvent<M>>>>>,
}

impl<M> TransactionTable<M> {
    pub fn new() -> Self {
        TransactionTable {
            map: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn lookup(&self, key: &TsxKey) -> Option<mpsc::UnboundedSender<TsxEvent<M>>> {
        self.map.read().get(key).cloned()
    }

    fn insert(&self, key: TsxKey, sender: mpsc::UnboundedSender<TsxEvent<M>>) {
        self.map.write().insert(key, sender);
    }

    fn remove(&self, key: &TsxKey) {
        self.map.write().remove(key);
    }
}

/// RAII registration: a transaction's actor owns one of these for its
/// lifetime. Registers the mailbox sender on construction, removes the key
/// on `Drop` — the only way a key leaves the table (§3: "destroyed exactly
/// once on entering Terminated").
pub(crate) struct TsxRegistration<M> {
    table: TransactionTable<M>,
    key: TsxKey,
}

impl<M> TsxRegistration<M> {
    pub fn new(
        table: TransactionTable<M>,
        key: TsxKey,
        sender: mpsc::UnboundedSender<TsxEvent<M>>,
    ) -> Self {
        table.insert(key.clone(), sender);
        TsxRegistration { table, key }
    }

    pub fn key(&self) -> &TsxKey {
        &self.key
    }
}

impl<M> Drop for TsxRegistration<M> {
    fn drop(&mut self) {
        self.table.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sip_tsx_types::testing::TestMessage;
    use sip_tsx_types::Method;

    #[test]
    fn registration_removes_key_on_drop() {
        let table: TransactionTable<()> = TransactionTable::new();
        let request = TestMessage::request(Method::BYE, "z9hG4bK-reg-drop", "UDP");
        let key = TsxKey::client(&request);
        let (tx, _rx) = mpsc::unbounded_channel();

        let registration = TsxRegistration::new(table.clone(), key.clone(), tx);
        assert!(table.lookup(&key).is_some());

        drop(registration);
        assert!(table.lookup(&key).is_none());
    }
}
