// ── Change notification ──
//
// Explicit observer registry: each event kind keeps its handlers in
// registration order and invokes them synchronously on the caller's
// thread of control.

use crate::model::DataItem;

type Signal = Box<dyn Fn() + Send + Sync>;
type ItemHandler = Box<dyn Fn(&DataItem) + Send + Sync>;

/// Handle returned by every `on_*` registration, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Event kinds a [`ChangeNotifier`] can fan out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    ProbeCompleted,
    DataItemChanged,
    DataItemsChanged,
}

/// Fan-out of probe-completed, per-item changed, and batch changed events.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: u64,
    probe_completed: Vec<(SubscriptionId, Signal)>,
    data_item_changed: Vec<(SubscriptionId, ItemHandler)>,
    data_items_changed: Vec<(SubscriptionId, Signal)>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once after a successful probe.
    pub fn on_probe_completed(
        &mut self,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.probe_completed.push((id, Box::new(handler)));
        id
    }

    /// Called for every applied update, with the item after the append.
    pub fn on_data_item_changed(
        &mut self,
        handler: impl Fn(&DataItem) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.data_item_changed.push((id, Box::new(handler)));
        id
    }

    /// Called once per applied batch, after all per-item notifications.
    pub fn on_data_items_changed(
        &mut self,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_id();
        self.data_items_changed.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.len();
        self.probe_completed.retain(|(sid, _)| *sid != id);
        self.data_item_changed.retain(|(sid, _)| *sid != id);
        self.data_items_changed.retain(|(sid, _)| *sid != id);
        self.len() != before
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::ProbeCompleted => self.probe_completed.len(),
            EventKind::DataItemChanged => self.data_item_changed.len(),
            EventKind::DataItemsChanged => self.data_items_changed.len(),
        }
    }

    pub(crate) fn probe_completed(&self) {
        for (_, handler) in &self.probe_completed {
            handler();
        }
    }

    pub(crate) fn data_item_changed(&self, item: &DataItem) {
        for (_, handler) in &self.data_item_changed {
            handler(item);
        }
    }

    pub(crate) fn data_items_changed(&self) {
        for (_, handler) in &self.data_items_changed {
            handler();
        }
    }

    fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    fn len(&self) -> usize {
        self.probe_completed.len() + self.data_item_changed.len() + self.data_items_changed.len()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("probe_completed", &self.probe_completed.len())
            .field("data_item_changed", &self.data_item_changed.len())
            .field("data_items_changed", &self.data_items_changed.len())
            .finish()
    }
}
