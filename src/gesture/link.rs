//! Transport to the hand-pose classifier.
//!
//! A `GestureLink` pushes `LinkEvent`s into an `mpsc` channel handed to it on
//! `connect` and accepts outbound frames. The session owns the link and its
//! lifecycle; nothing here is global, so tests can substitute their own link.

use super::protocol::{FrameMessage, GestureSample, decode_pose_message};
use crate::error::{LinkError, LinkResult};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Something that happened on the link, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkEvent {
    Opened,
    Sample(GestureSample),
    /// Transport failure; the link may be reconnected afterwards
    Error(String),
    Closed,
}

pub trait GestureLink: Send {
    /// Start delivering events to `events`. Fails if already connected.
    fn connect(&mut self, events: Sender<LinkEvent>) -> LinkResult<()>;

    /// Stop delivering events. Safe to call when not connected.
    fn disconnect(&mut self);

    /// Send one frame. Fails unless the link is open.
    fn send_frame(&mut self, frame: &FrameMessage) -> LinkResult<()>;

    fn is_open(&self) -> bool;
}

/// Decode one raw message and forward it as a sample.
///
/// Malformed messages are logged and dropped, as are messages without a
/// wrist position. Returns `false` once the receiver has gone away.
pub fn forward_message(events: &Sender<LinkEvent>, text: &str) -> bool {
    match decode_pose_message(text) {
        Ok(Some(sample)) => events.send(LinkEvent::Sample(sample)).is_ok(),
        Ok(None) => true,
        Err(e) => {
            warn!(error = %e, "Failed to parse pose message");
            true
        }
    }
}

// ============================================================================
// ReplayLink
// ============================================================================

/// Replays recorded pose messages (one JSON message per line) on its own
/// thread.
pub struct ReplayLink {
    lines: Arc<Vec<String>>,
    interval: Duration,
    open: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    frames_sent: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl ReplayLink {
    pub fn from_lines<I, S>(lines: I, interval: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Arc::new(lines.into_iter().map(Into::into).collect()),
            interval,
            open: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(AtomicBool::new(false)),
            frames_sent: Arc::new(AtomicU64::new(0)),
            worker: None,
        }
    }

    /// Load a JSON-lines recording. Blank lines are skipped.
    pub fn from_path(path: &Path, interval: Duration) -> LinkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        info!(path = %path.display(), messages = lines.len(), "Loaded pose recording");
        Ok(Self::from_lines(lines, interval))
    }

    pub fn message_count(&self) -> usize {
        self.lines.len()
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("Replay thread panicked");
            }
        }
    }
}

impl GestureLink for ReplayLink {
    fn connect(&mut self, events: Sender<LinkEvent>) -> LinkResult<()> {
        if self.open.load(Ordering::Acquire) {
            return Err(LinkError::AlreadyConnected);
        }
        // A previous replay that ran to completion.
        self.join_worker();

        self.stop.store(false, Ordering::Release);
        self.open.store(true, Ordering::Release);

        let lines = Arc::clone(&self.lines);
        let interval = self.interval;
        let open = Arc::clone(&self.open);
        let stop = Arc::clone(&self.stop);

        self.worker = Some(thread::spawn(move || {
            if events.send(LinkEvent::Opened).is_err() {
                open.store(false, Ordering::Release);
                return;
            }
            for line in lines.iter() {
                if stop.load(Ordering::Acquire) {
                    break;
                }
                if !forward_message(&events, line) {
                    break;
                }
                if !interval.is_zero() {
                    thread::sleep(interval);
                }
            }
            open.store(false, Ordering::Release);
            let _ = events.send(LinkEvent::Closed);
            debug!("Replay finished");
        }));

        info!(messages = self.lines.len(), "Replay link connected");
        Ok(())
    }

    fn disconnect(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.join_worker();
        self.open.store(false, Ordering::Release);
    }

    fn send_frame(&mut self, _frame: &FrameMessage) -> LinkResult<()> {
        if !self.is_open() {
            return Err(LinkError::NotConnected);
        }
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

impl Drop for ReplayLink {
    fn drop(&mut self) {
        self.disconnect();
    }
}
