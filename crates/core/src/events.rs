use tokio::sync::broadcast;

/// Capacity of the store's change channel. Slow subscribers that fall
/// further behind than this observe `RecvError::Lagged`.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change notification published by the chat store after every mutation.
///
/// Events carry no payload beyond what changed; subscribers re-read the
/// store's query methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    MessagesChanged,
    GroupsChanged,
    TasksChanged,
    ConfigChanged,
    /// Visibility, filters, panels or selection changed.
    ViewChanged,
    /// An assistant reply started (`true`) or finished (`false`).
    LoadingChanged(bool),
}

pub(crate) fn channel() -> broadcast::Sender<StoreEvent> {
    let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    tx
}
