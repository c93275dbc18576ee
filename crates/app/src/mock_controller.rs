//! Headless `--mock-controller` mode: a local WebSocket server that plays the
//! part of the hardware controller so the simulation can be driven without it.
//!
//! Label mode alternates "road X" (light 1 green, light 2 red) and "road Y"
//! (the reverse) every five seconds. Numeric mode runs a green/yellow/red plan
//! for light 1 and reports the seconds left every second.

use std::io;
use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use tungstenite::{Message, WebSocket};

use simulation::phase_protocol::PhaseMessage;
use simulation::traffic_phase::TrafficPhase;

pub const BIND_ADDRESS: &str = "127.0.0.1:8765";

const LABEL_HOLD_SECONDS: u32 = 5;
const NUMERIC_PLAN: [(TrafficPhase, u32); 3] = [
    (TrafficPhase::Green, 5),
    (TrafficPhase::Yellow, 2),
    (TrafficPhase::Red, 7),
];
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    Labels,
    Numeric,
}

/// Position in the mock signal plan, advanced one second at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseCycle {
    mode: MockMode,
    step: usize,
    remaining: u32,
}

impl PhaseCycle {
    pub fn new(mode: MockMode) -> Self {
        let remaining = match mode {
            MockMode::Labels => LABEL_HOLD_SECONDS,
            MockMode::Numeric => NUMERIC_PLAN[0].1,
        };
        Self {
            mode,
            step: 0,
            remaining,
        }
    }

    pub fn current(&self) -> PhaseMessage {
        match self.mode {
            MockMode::Labels if self.step == 0 => {
                PhaseMessage::labels(TrafficPhase::Green, TrafficPhase::Red)
            }
            MockMode::Labels => PhaseMessage::labels(TrafficPhase::Red, TrafficPhase::Green),
            MockMode::Numeric => {
                PhaseMessage::numeric(NUMERIC_PLAN[self.step].0, self.remaining, false)
            }
        }
    }

    /// Advance one second. Returns the message to broadcast, if any.
    pub fn tick_second(&mut self) -> Option<PhaseMessage> {
        self.remaining = self.remaining.saturating_sub(1);
        let switched = self.remaining == 0;
        if switched {
            match self.mode {
                MockMode::Labels => {
                    self.step = 1 - self.step;
                    self.remaining = LABEL_HOLD_SECONDS;
                }
                MockMode::Numeric => {
                    self.step = (self.step + 1) % NUMERIC_PLAN.len();
                    self.remaining = NUMERIC_PLAN[self.step].1;
                }
            }
        }
        match self.mode {
            MockMode::Labels if !switched => None,
            _ => Some(self.current()),
        }
    }
}

#[derive(Resource)]
struct MockServer {
    listener: TcpListener,
    clients: Vec<WebSocket<TcpStream>>,
    cycle: PhaseCycle,
    timer: Timer,
}

pub fn run(mode: MockMode, address: &str) -> io::Result<()> {
    let listener = TcpListener::bind(address)?;
    listener.set_nonblocking(true)?;

    let banner = format!("Mock controller ({mode:?}) listening on ws://{address}");

    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(50))),
    )
    .add_plugins(LogPlugin::default())
    .insert_resource(MockServer {
        listener,
        clients: Vec::new(),
        cycle: PhaseCycle::new(mode),
        timer: Timer::from_seconds(1.0, TimerMode::Repeating),
    })
    .add_systems(Startup, move || info!("{banner}"))
    .add_systems(
        Update,
        (accept_clients, drop_closed_clients, drive_cycle).chain(),
    );
    app.run();
    Ok(())
}

fn handshake(stream: TcpStream) -> Result<WebSocket<TcpStream>, String> {
    stream.set_nonblocking(false).map_err(|e| e.to_string())?;
    stream
        .set_read_timeout(Some(HANDSHAKE_TIMEOUT))
        .map_err(|e| e.to_string())?;
    let socket = tungstenite::accept(stream).map_err(|e| e.to_string())?;
    socket
        .get_ref()
        .set_nonblocking(true)
        .map_err(|e| e.to_string())?;
    Ok(socket)
}

fn accept_clients(mut server: ResMut<MockServer>) {
    loop {
        let stream = match server.listener.accept() {
            Ok((stream, peer)) => {
                info!("Controller client connected from {peer}");
                stream
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
            Err(e) => {
                warn!("Accept failed: {e}");
                return;
            }
        };
        match handshake(stream) {
            Ok(mut socket) => {
                let greeting = server.cycle.current().to_json();
                if socket.send(Message::text(greeting)).is_ok() {
                    server.clients.push(socket);
                }
            }
            Err(e) => warn!("WebSocket handshake failed: {e}"),
        }
    }
}

/// Reads pending frames so close handshakes complete, and forgets dead sockets.
fn drop_closed_clients(mut server: ResMut<MockServer>) {
    server.clients.retain_mut(|socket| loop {
        match socket.read() {
            Ok(Message::Close(_)) => {
                info!("Controller client closed the connection");
                // Flush our echo of the close frame; the socket is gone either way.
                let _ = socket.flush();
                break false;
            }
            Ok(_) => continue,
            Err(tungstenite::Error::Io(e)) if e.kind() == io::ErrorKind::WouldBlock => {
                break true;
            }
            Err(e) => {
                debug!("Dropping controller client: {e}");
                break false;
            }
        }
    });
}

fn drive_cycle(time: Res<Time>, mut server: ResMut<MockServer>) {
    server.timer.tick(time.delta());
    for _ in 0..server.timer.times_finished_this_tick() {
        let Some(message) = server.cycle.tick_second() else {
            continue;
        };
        let payload = message.to_json();
        debug!("Broadcasting {payload} to {} client(s)", server.clients.len());
        server.clients.retain_mut(|socket| {
            match socket.send(Message::text(payload.clone())) {
                Ok(()) => true,
                Err(tungstenite::Error::Io(e)) if e.kind() == io::ErrorKind::WouldBlock => true,
                Err(e) => {
                    debug!("Dropping controller client: {e}");
                    false
                }
            }
        });
    }
}
