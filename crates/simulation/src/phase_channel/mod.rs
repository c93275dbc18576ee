//! The connection to the remote signal controller.
//!
//! A [`PhaseChannel`] owns at most one session. A session is a worker thread
//! (see `worker`) holding the socket and its retry loop, plus the receiving
//! end of the event queue it fills. `drain_phase_channel` empties that queue
//! once per frame in [`SimulationUpdateSet::Network`], applying updates to
//! [`IntersectionState`] before any vehicle moves.
//!
//! Lifecycle as seen through `IntersectionState::connection_status`:
//!
//! ```text
//! Idle → Connecting → Connected → Disconnected ─(retry delay)→ Connecting …
//! ```
//!
//! `Error` is reported in between when the socket fails; the close that
//! follows is what schedules the retry.

mod handlers;
mod worker;

use std::fmt;
use std::thread::JoinHandle;
use std::time::Duration;

use bevy::log::{debug, error, info, warn};
use bevy::prelude::*;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tungstenite::client::IntoClientRequest;

use crate::config::{
    DEFAULT_CONTROLLER_ADDRESS, DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_DELAY,
};
use crate::intersection_state::{ConnectionStatus, IntersectionState};
use crate::phase_protocol::{decode_message, PayloadError};
use crate::SimulationUpdateSet;

pub use handlers::{NoopHandlers, PhaseHandlers};
pub use worker::{ABNORMAL_CLOSURE, NO_STATUS_RECEIVED};

use worker::{ChannelEvent, WorkerSettings};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Where and how to reach the controller.
///
/// When this resource is present and `auto_connect` is set, the channel is
/// opened at startup.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub address: String,
    /// Fixed wait between a close and the next connection attempt.
    pub retry_delay: Duration,
    /// Socket read timeout; bounds how long teardown takes to be noticed.
    pub poll_interval: Duration,
    pub auto_connect: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_CONTROLLER_ADDRESS.to_string(),
            retry_delay: DEFAULT_RETRY_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            auto_connect: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of `PhaseChannel::open` itself. Runtime socket failures are not
/// errors: they show up as connection status and are retried.
#[derive(Debug)]
pub enum ChannelError {
    InvalidAddress { address: String, reason: String },
    Spawn(std::io::Error),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::InvalidAddress { address, reason } => {
                write!(f, "invalid controller address '{address}': {reason}")
            }
            ChannelError::Spawn(e) => write!(f, "failed to start channel worker: {e}"),
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChannelError::Spawn(e) => Some(e),
            ChannelError::InvalidAddress { .. } => None,
        }
    }
}

impl From<std::io::Error> for ChannelError {
    fn from(e: std::io::Error) -> Self {
        ChannelError::Spawn(e)
    }
}

/// Check that `address` is a plain `ws://` URL the client can dial.
pub fn validate_address(address: &str) -> Result<(), ChannelError> {
    let invalid = |reason: String| ChannelError::InvalidAddress {
        address: address.to_string(),
        reason,
    };
    let request = address
        .into_client_request()
        .map_err(|e| invalid(e.to_string()))?;
    match request.uri().scheme_str() {
        Some("ws") => {}
        Some("wss") => return Err(invalid("TLS (wss://) is not supported".to_string())),
        Some(other) => return Err(invalid(format!("unsupported scheme '{other}'"))),
        None => return Err(invalid("missing scheme".to_string())),
    }
    if request.uri().host().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

struct Session {
    events: Receiver<ChannelEvent>,
    /// Never sent on. Dropping it tells the worker to shut down.
    _cancel: Sender<()>,
    worker: Option<JoinHandle<()>>,
    address: String,
}

/// The single connection to the controller.
#[derive(Resource)]
pub struct PhaseChannel {
    session: Option<Session>,
    handlers: Box<dyn PhaseHandlers>,
}

impl Default for PhaseChannel {
    fn default() -> Self {
        Self {
            session: None,
            handlers: Box::new(NoopHandlers),
        }
    }
}

impl PhaseChannel {
    /// Start connecting to `config.address`.
    ///
    /// While a session exists (connecting, connected, or waiting to retry)
    /// this is a no-op and `handlers` is dropped.
    pub fn open(
        &mut self,
        config: &ChannelConfig,
        handlers: impl PhaseHandlers,
    ) -> Result<(), ChannelError> {
        if let Some(session) = &self.session {
            debug!(
                "phase channel: already open to {}, ignoring open",
                session.address
            );
            return Ok(());
        }
        validate_address(&config.address)?;

        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded(0);
        let handle = worker::spawn(
            WorkerSettings {
                address: config.address.clone(),
                retry_delay: config.retry_delay,
                poll_interval: config.poll_interval,
            },
            event_tx,
            cancel_rx,
        )?;

        info!("phase channel: opening {}", config.address);
        self.handlers = Box::new(handlers);
        self.session = Some(Session {
            events: event_rx,
            _cancel: cancel_tx,
            worker: Some(handle),
            address: config.address.clone(),
        });
        Ok(())
    }

    /// Tear the session down: no further reconnection, no further events.
    pub fn close(&mut self, state: &mut IntersectionState) {
        let Some(session) = self.session.take() else {
            debug!("phase channel: nothing open, ignoring close");
            return;
        };
        info!("phase channel: closed {}", session.address);
        drop(session);
        self.handlers = Box::new(NoopHandlers);
        state.set_connection_status(ConnectionStatus::Idle);
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Whether events are waiting to be drained, or the worker has exited
    /// and its loss has yet to be reported.
    pub fn has_pending(&self) -> bool {
        self.session.as_ref().is_some_and(|session| {
            !session.events.is_empty()
                || session.worker.as_ref().is_some_and(JoinHandle::is_finished)
        })
    }

    /// Apply every queued event to `state` and the handlers, in arrival order.
    /// Returns the number of events processed.
    pub fn drain(&mut self, state: &mut IntersectionState) -> usize {
        let mut processed = 0;
        loop {
            let Some(session) = &self.session else {
                return processed;
            };
            match session.events.try_recv() {
                Ok(event) => {
                    self.handle(event, state);
                    processed += 1;
                }
                Err(TryRecvError::Empty) => return processed,
                Err(TryRecvError::Disconnected) => {
                    error!("phase channel: worker stopped unexpectedly");
                    self.session = None;
                    state.set_connection_status(ConnectionStatus::Error(
                        "channel worker stopped".to_string(),
                    ));
                    return processed;
                }
            }
        }
    }

    fn handle(&mut self, event: ChannelEvent, state: &mut IntersectionState) {
        match event {
            ChannelEvent::Connecting { attempt } => {
                if attempt > 1 {
                    info!("phase channel: reconnecting (attempt {attempt})");
                }
                state.set_connection_status(ConnectionStatus::Connecting);
            }
            ChannelEvent::Opened => {
                info!("phase channel: connected");
                state.set_connection_status(ConnectionStatus::Connected);
                self.handlers.on_open();
            }
            ChannelEvent::Message(text) => match decode_message(&text) {
                Ok(update) => {
                    state.apply_update(&update);
                    self.handlers.on_message(&update);
                }
                Err(PayloadError::ConflictingGreen) => {
                    warn!("phase channel: discarding payload with both groups green: {text}");
                }
                Err(e) => debug!("phase channel: discarding payload ({e}): {text}"),
            },
            ChannelEvent::Error(cause) => {
                warn!("phase channel: {cause}");
                state.set_connection_status(ConnectionStatus::Error(cause.clone()));
                self.handlers.on_error(&cause);
            }
            ChannelEvent::Closed { code, reason } => {
                warn!("phase channel: closed with code {code}, retrying after delay");
                state.set_connection_status(ConnectionStatus::Disconnected {
                    code,
                    reason: reason.clone(),
                });
                self.handlers.on_close(code, &reason);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Startup: open the channel if configured to.
pub fn open_phase_channel(config: Option<Res<ChannelConfig>>, mut channel: ResMut<PhaseChannel>) {
    let Some(config) = config else {
        return;
    };
    if !config.auto_connect {
        info!("phase channel: auto-connect disabled");
        return;
    }
    if let Err(e) = channel.open(&config, NoopHandlers) {
        error!("phase channel: {e}");
    }
}

pub fn drain_phase_channel(
    mut channel: ResMut<PhaseChannel>,
    mut state: ResMut<IntersectionState>,
) {
    if !channel.has_pending() {
        return;
    }
    channel.drain(&mut state);
}

pub struct PhaseChannelPlugin;

impl Plugin for PhaseChannelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PhaseChannel>()
            .add_systems(Startup, open_phase_channel)
            .add_systems(
                Update,
                drain_phase_channel.in_set(SimulationUpdateSet::Network),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase_protocol::PhaseMessage;
    use crate::traffic_phase::TrafficPhase;

    /// A channel whose event queue is fed by the test instead of a worker.
    fn fake_session(channel: &mut PhaseChannel) -> Sender<ChannelEvent> {
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let (cancel_tx, _cancel_rx) = crossbeam_channel::bounded(0);
        channel.session = Some(Session {
            events: event_rx,
            _cancel: cancel_tx,
            worker: None,
            address: "ws://test".to_string(),
        });
        event_tx
    }

    #[test]
    fn test_address_validation() {
        assert!(validate_address("ws://localhost:8765").is_ok());
        assert!(validate_address("ws://127.0.0.1:9000/phases").is_ok());
        for bad in ["", "not a url", "http://localhost:8765", "wss://example.com"] {
            assert!(
                matches!(
                    validate_address(bad),
                    Err(ChannelError::InvalidAddress { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_open_rejects_invalid_address() {
        let mut channel = PhaseChannel::default();
        let config = ChannelConfig {
            address: "ftp://controller".to_string(),
            ..Default::default()
        };
        assert!(channel.open(&config, NoopHandlers).is_err());
        assert!(!channel.is_open());
    }

    #[test]
    fn test_close_without_session_is_noop() {
        let mut channel = PhaseChannel::default();
        let mut state = IntersectionState::default();
        channel.close(&mut state);
        assert!(!channel.is_open());
        assert_eq!(*state.connection_status(), ConnectionStatus::Idle);
    }

    #[test]
    fn test_drain_applies_events_in_order() {
        let mut channel = PhaseChannel::default();
        let mut state = IntersectionState::default();
        let tx = fake_session(&mut channel);

        tx.send(ChannelEvent::Connecting { attempt: 1 }).unwrap();
        tx.send(ChannelEvent::Opened).unwrap();
        tx.send(ChannelEvent::Message(
            PhaseMessage::labels(TrafficPhase::Green, TrafficPhase::Red).to_json(),
        ))
        .unwrap();

        assert!(channel.has_pending());
        assert_eq!(channel.drain(&mut state), 3);
        assert!(!channel.has_pending());
        assert!(state.connection_status().is_connected());
        assert_eq!(state.primary_phase(), TrafficPhase::Green);
        assert_eq!(state.secondary_phase(), TrafficPhase::Red);
    }

    #[test]
    fn test_malformed_message_leaves_state_untouched() {
        let mut channel = PhaseChannel::default();
        let mut state = IntersectionState::default();
        let tx = fake_session(&mut channel);

        for text in [
            "{",
            "[]",
            r#"{"light1State":"blue","light2State":"red"}"#,
            r#"{"light1State":"green","light2State":"green"}"#,
            r#"{"current_light":7,"light_timer_seconds":3,"fast_speed":false}"#,
        ] {
            tx.send(ChannelEvent::Message(text.to_string())).unwrap();
        }
        channel.drain(&mut state);

        assert_eq!(state.updates_applied(), 0);
        assert_eq!(state.primary_phase(), TrafficPhase::Red);
        assert_eq!(state.secondary_phase(), TrafficPhase::Green);
    }

    #[test]
    fn test_close_event_records_code() {
        let mut channel = PhaseChannel::default();
        let mut state = IntersectionState::default();
        let tx = fake_session(&mut channel);

        tx.send(ChannelEvent::Error("connection refused".to_string()))
            .unwrap();
        channel.drain(&mut state);
        assert_eq!(
            *state.connection_status(),
            ConnectionStatus::Error("connection refused".to_string())
        );

        tx.send(ChannelEvent::Closed {
            code: ABNORMAL_CLOSURE,
            reason: String::new(),
        })
        .unwrap();
        channel.drain(&mut state);
        assert_eq!(
            *state.connection_status(),
            ConnectionStatus::Disconnected {
                code: 1006,
                reason: String::new()
            }
        );
        assert!(channel.is_open(), "a close keeps the session for the retry");
    }

    #[test]
    fn test_explicit_close_drops_pending_events() {
        let mut channel = PhaseChannel::default();
        let mut state = IntersectionState::default();
        let tx = fake_session(&mut channel);
        tx.send(ChannelEvent::Opened).unwrap();
        channel.drain(&mut state);

        tx.send(ChannelEvent::Message(
            PhaseMessage::labels(TrafficPhase::Green, TrafficPhase::Red).to_json(),
        ))
        .ok();
        channel.close(&mut state);

        assert!(!channel.is_open());
        assert_eq!(channel.drain(&mut state), 0);
        assert_eq!(state.updates_applied(), 0);
        assert_eq!(*state.connection_status(), ConnectionStatus::Idle);
    }

    #[test]
    fn test_dead_worker_reported_as_error() {
        let mut channel = PhaseChannel::default();
        let mut state = IntersectionState::default();
        let tx = fake_session(&mut channel);
        drop(tx);

        channel.drain(&mut state);
        assert!(!channel.is_open());
        assert!(matches!(
            state.connection_status(),
            ConnectionStatus::Error(_)
        ));
    }
}
