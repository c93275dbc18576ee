//! Socket worker thread.
//!
//! One worker per open session. It owns the WebSocket and the retry timer, so
//! exactly one reconnection attempt follows each close and tearing the session
//! down stops both at once. The worker never touches ECS state: everything it
//! observes is forwarded as a [`ChannelEvent`] and applied on the main thread.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bevy::log::{debug, warn};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// Close code reported when the connection dropped without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;
/// Close code reported when a close frame carried no status.
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// What the worker saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ChannelEvent {
    Connecting { attempt: u64 },
    Opened,
    Message(String),
    Error(String),
    Closed { code: u16, reason: String },
}

#[derive(Debug, Clone)]
pub(crate) struct WorkerSettings {
    pub address: String,
    pub retry_delay: Duration,
    pub poll_interval: Duration,
}

enum SessionEnd {
    /// The socket closed; wait out the retry delay and reconnect.
    Closed,
    /// The session was torn down; exit without reconnecting.
    Cancelled,
}

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Spawn the worker. It runs until `cancel`'s sender is dropped or the event
/// receiver goes away.
pub(crate) fn spawn(
    settings: WorkerSettings,
    events: Sender<ChannelEvent>,
    cancel: Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("phase-channel".to_string())
        .spawn(move || run(settings, events, cancel))
}

fn run(settings: WorkerSettings, events: Sender<ChannelEvent>, cancel: Receiver<()>) {
    let mut attempt: u64 = 0;
    loop {
        if is_cancelled(&cancel) {
            return;
        }
        attempt += 1;
        if events.send(ChannelEvent::Connecting { attempt }).is_err() {
            return;
        }

        let end = match tungstenite::connect(settings.address.as_str()) {
            Ok((socket, _response)) => serve(socket, &settings, &events, &cancel),
            Err(err) => {
                let _ = events.send(ChannelEvent::Error(err.to_string()));
                let _ = events.send(ChannelEvent::Closed {
                    code: ABNORMAL_CLOSURE,
                    reason: String::new(),
                });
                SessionEnd::Closed
            }
        };

        if let SessionEnd::Cancelled = end {
            return;
        }

        // The retry timer. Dropping the cancel sender wakes this immediately.
        match cancel.recv_timeout(settings.retry_delay) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn serve(
    mut socket: Socket,
    settings: &WorkerSettings,
    events: &Sender<ChannelEvent>,
    cancel: &Receiver<()>,
) -> SessionEnd {
    if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
        if let Err(err) = stream.set_read_timeout(Some(settings.poll_interval)) {
            warn!("phase channel: could not set read timeout: {err}");
        }
    }

    if events.send(ChannelEvent::Opened).is_err() {
        shut_down(&mut socket);
        return SessionEnd::Cancelled;
    }

    let mut close_frame: Option<(u16, String)> = None;
    loop {
        if is_cancelled(cancel) {
            shut_down(&mut socket);
            return SessionEnd::Cancelled;
        }

        match socket.read() {
            Ok(Message::Text(text)) => {
                if events.send(ChannelEvent::Message(text)).is_err() {
                    shut_down(&mut socket);
                    return SessionEnd::Cancelled;
                }
            }
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => {
                    if events.send(ChannelEvent::Message(text)).is_err() {
                        shut_down(&mut socket);
                        return SessionEnd::Cancelled;
                    }
                }
                Err(_) => debug!("phase channel: discarding non-UTF-8 binary frame"),
            },
            Ok(Message::Close(frame)) => {
                close_frame = Some(match frame {
                    Some(frame) => (u16::from(frame.code), frame.reason.into_owned()),
                    None => (NO_STATUS_RECEIVED, String::new()),
                });
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                let (code, reason) = close_frame
                    .take()
                    .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                let _ = events.send(ChannelEvent::Closed { code, reason });
                return SessionEnd::Closed;
            }
            Err(err) => {
                let _ = events.send(ChannelEvent::Error(err.to_string()));
                let (code, reason) = close_frame
                    .take()
                    .unwrap_or((ABNORMAL_CLOSURE, String::new()));
                let _ = events.send(ChannelEvent::Closed { code, reason });
                return SessionEnd::Closed;
            }
        }
    }
}

fn is_cancelled(cancel: &Receiver<()>) -> bool {
    !matches!(cancel.try_recv(), Err(TryRecvError::Empty))
}

/// Best-effort close handshake on teardown.
fn shut_down(socket: &mut Socket) {
    if socket.close(None).is_ok() {
        let _ = socket.flush();
    }
}
