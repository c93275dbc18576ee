use crate::phase_protocol::PhaseUpdate;

/// Callbacks invoked by [`PhaseChannel::drain`](super::PhaseChannel::drain)
/// on the main thread, after `IntersectionState` has been updated for the
/// same event.
///
/// Every method defaults to a no-op, so implementors override only what they
/// observe.
pub trait PhaseHandlers: Send + Sync + 'static {
    fn on_open(&mut self) {}

    /// A validated update was applied. Discarded payloads never reach this.
    fn on_message(&mut self, _update: &PhaseUpdate) {}

    fn on_error(&mut self, _cause: &str) {}

    /// The socket closed. A reconnection attempt follows after the retry delay.
    fn on_close(&mut self, _code: u16, _reason: &str) {}
}

/// Handlers that ignore every event. State and logging still happen.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandlers;

impl PhaseHandlers for NoopHandlers {}
