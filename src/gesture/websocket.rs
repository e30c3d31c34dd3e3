//! WebSocket link to a live classifier.
//!
//! One worker thread owns the socket. It dials the endpoint, then alternates
//! between flushing queued frames and reading pose messages with a short read
//! timeout, so a disconnect is noticed within one poll interval. Failures
//! become `LinkEvent::Error` followed by `LinkEvent::Closed`; the link can be
//! connected again afterwards.

use super::link::{GestureLink, LinkEvent, forward_message};
use super::protocol::FrameMessage;
use crate::constants::LINK_POLL_INTERVAL_MS;
use crate::error::{LinkError, LinkResult};
use crate::settings::Settings;
use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

pub struct WebSocketLink {
    endpoint: String,
    poll_interval: Duration,
    open: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    outbound: Option<Sender<String>>,
    worker: Option<JoinHandle<()>>,
}

impl WebSocketLink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            poll_interval: Duration::from_millis(LINK_POLL_INTERVAL_MS),
            open: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(AtomicBool::new(false)),
            outbound: None,
            worker: None,
        }
    }

    /// Link to the endpoint configured in `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.link_endpoint.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("Gesture link thread panicked");
            }
        }
    }
}

impl GestureLink for WebSocketLink {
    fn connect(&mut self, events: Sender<LinkEvent>) -> LinkResult<()> {
        if self.worker.as_ref().is_some_and(|w| !w.is_finished()) {
            return Err(LinkError::AlreadyConnected);
        }
        self.join_worker();
        self.stop.store(false, Ordering::Release);

        let (tx, rx) = mpsc::channel();
        let worker = SocketWorker {
            endpoint: self.endpoint.clone(),
            poll_interval: self.poll_interval,
            open: Arc::clone(&self.open),
            stop: Arc::clone(&self.stop),
            events,
            outbound: rx,
        };
        self.worker = Some(
            thread::Builder::new()
                .name("gesture-link".into())
                .spawn(move || worker.run())?,
        );
        self.outbound = Some(tx);

        info!(endpoint = %self.endpoint, "Dialing gesture classifier");
        Ok(())
    }

    fn disconnect(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.outbound = None;
        self.join_worker();
        self.open.store(false, Ordering::Release);
    }

    fn send_frame(&mut self, frame: &FrameMessage) -> LinkResult<()> {
        if !self.is_open() {
            return Err(LinkError::NotConnected);
        }
        let json = frame.to_json()?;
        self.outbound
            .as_ref()
            .ok_or(LinkError::NotConnected)?
            .send(json)
            .map_err(|_| LinkError::Closed)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

impl Drop for WebSocketLink {
    fn drop(&mut self) {
        self.disconnect();
    }
}

struct SocketWorker {
    endpoint: String,
    poll_interval: Duration,
    open: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    events: Sender<LinkEvent>,
    outbound: Receiver<String>,
}

impl SocketWorker {
    fn run(self) {
        let mut socket = match tungstenite::connect(self.endpoint.as_str()) {
            Ok((socket, _response)) => socket,
            Err(e) => {
                error!(endpoint = %self.endpoint, error = %e, "Failed to reach gesture classifier");
                let _ = self.events.send(LinkEvent::Error(e.to_string()));
                let _ = self.events.send(LinkEvent::Closed);
                return;
            }
        };

        if let MaybeTlsStream::Plain(stream) = socket.get_ref() {
            if let Err(e) = stream.set_read_timeout(Some(self.poll_interval)) {
                warn!(error = %e, "Failed to set socket read timeout");
            }
        }

        self.open.store(true, Ordering::Release);
        let outcome = if self.events.send(LinkEvent::Opened).is_ok() {
            self.pump(&mut socket)
        } else {
            Ok(())
        };
        self.open.store(false, Ordering::Release);

        if let Err(message) = outcome {
            error!(%message, "Gesture link failed");
            let _ = self.events.send(LinkEvent::Error(message));
        }
        let _ = socket.close(None);
        let _ = socket.flush();
        let _ = self.events.send(LinkEvent::Closed);
        debug!(endpoint = %self.endpoint, "Gesture link thread finished");
    }

    /// Runs until asked to stop, the peer closes, or the socket fails.
    fn pump(&self, socket: &mut Socket) -> Result<(), String> {
        loop {
            if self.stop.load(Ordering::Acquire) {
                return Ok(());
            }

            while let Ok(json) = self.outbound.try_recv() {
                socket
                    .send(Message::Text(json.into()))
                    .map_err(|e| e.to_string())?;
            }

            match socket.read() {
                Ok(Message::Text(text)) => {
                    if !forward_message(&self.events, &text) {
                        return Ok(());
                    }
                }
                Ok(Message::Close(_)) => return Ok(()),
                Ok(_) => {}
                Err(tungstenite::Error::Io(e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    return Ok(());
                }
                Err(e) => return Err(e.to_string()),
            }
        }
    }
}
