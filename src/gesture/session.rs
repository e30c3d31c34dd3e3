//! Gesture input session: link lifecycle, event pump and frame timer.
//!
//! Inbound samples and outbound frames are independent one-way channels.
//! Samples are pulled from the link's channel by `pump` and dispatched in
//! arrival order; frames go out from `tick_frames` at a fixed interval
//! whenever the link is open.

use super::dispatcher::{GestureAction, GestureConfig, GestureCursor, GestureDispatcher, GestureView};
use super::link::{GestureLink, LinkEvent};
use super::protocol::FrameMessage;
use crate::diagram::DiagramController;
use crate::error::LinkResult;
use crate::notifications::Toast;
use crate::perf::DispatchMonitor;
use crate::types::NodeId;
use image::DynamicImage;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Supplies camera frames for the classifier.
pub trait FrameSource {
    /// The current frame, or `None` if none is available yet.
    fn capture(&mut self) -> Option<DynamicImage>;
}

pub struct GestureSession {
    link: Box<dyn GestureLink>,
    dispatcher: GestureDispatcher,
    events: Option<Receiver<LinkEvent>>,
    frame_interval: Duration,
    frame_quality: u8,
    last_frame_at: Option<Instant>,
    monitor: DispatchMonitor,
    outbox: Vec<Toast>,
}

impl GestureSession {
    pub fn new(
        link: Box<dyn GestureLink>,
        config: GestureConfig,
        screen_width: f64,
        screen_height: f64,
    ) -> Self {
        Self {
            link,
            frame_interval: Duration::from_millis(config.frame_interval_ms),
            frame_quality: config.frame_quality,
            dispatcher: GestureDispatcher::new(config, screen_width, screen_height),
            events: None,
            last_frame_at: None,
            monitor: DispatchMonitor::default(),
            outbox: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.events.is_some()
    }

    pub fn is_link_open(&self) -> bool {
        self.link.is_open()
    }

    /// Connect the link. Calling it while enabled does nothing.
    pub fn enable(&mut self) -> LinkResult<()> {
        if self.is_enabled() {
            return Ok(());
        }
        let (tx, rx) = mpsc::channel();
        if let Err(e) = self.link.connect(tx) {
            error!(error = %e, "Failed to connect gesture link");
            self.outbox.push(Toast::error(format!("Gesture connection failed: {e}")));
            return Err(e);
        }
        self.events = Some(rx);
        self.last_frame_at = None;
        info!("Gesture input enabled");
        Ok(())
    }

    /// Disconnect the link and stop sending frames. An armed connection
    /// handshake is left as it is.
    pub fn disable(&mut self) {
        if !self.is_enabled() {
            return;
        }
        self.link.disconnect();
        self.events = None;
        self.last_frame_at = None;
        self.dispatcher.hide_cursor();
        self.monitor.log_summary();
        info!("Gesture input disabled");
    }

    /// Process every event already waiting, in arrival order, all at `now`.
    pub fn pump(
        &mut self,
        controller: &mut DiagramController,
        view: &GestureView,
        now: Instant,
    ) -> Vec<GestureAction> {
        let mut actions = Vec::new();
        loop {
            let Some(rx) = &self.events else { break };
            let event = match rx.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.events = None;
                    break;
                }
            };
            if let Some(action) = self.handle_event(event, controller, view, now) {
                actions.push(action);
            }
        }
        actions
    }

    /// Block up to `timeout` for the next event.
    pub fn next_event(&mut self, timeout: Duration) -> Option<LinkEvent> {
        let rx = self.events.as_ref()?;
        match rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.events = None;
                None
            }
        }
    }

    /// Apply one link event. Returns the dispatcher's action for samples.
    pub fn handle_event(
        &mut self,
        event: LinkEvent,
        controller: &mut DiagramController,
        view: &GestureView,
        now: Instant,
    ) -> Option<GestureAction> {
        match event {
            LinkEvent::Opened => {
                info!("Gesture link open");
                self.outbox.push(Toast::success("Gesture control connected"));
                None
            }
            LinkEvent::Sample(sample) => {
                let started = Instant::now();
                let action = self.dispatcher.handle_sample(&sample, view, controller, now);
                self.monitor.record_sample(started.elapsed());
                Some(action)
            }
            LinkEvent::Error(message) => {
                error!(%message, "Gesture link error");
                self.outbox.push(Toast::error(format!("Gesture connection error: {message}")));
                None
            }
            LinkEvent::Closed => {
                info!("Gesture link closed");
                None
            }
        }
    }

    /// Send a frame if the interval has elapsed. Returns whether one was sent.
    pub fn tick_frames(&mut self, now: Instant, source: &mut dyn FrameSource) -> bool {
        if !self.is_enabled() || !self.link.is_open() {
            return false;
        }
        if let Some(last) = self.last_frame_at {
            if now.saturating_duration_since(last) < self.frame_interval {
                return false;
            }
        }
        let Some(image) = source.capture() else {
            return false;
        };
        self.last_frame_at = Some(now);

        let frame = match FrameMessage::encode(&image, self.frame_quality) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to encode frame");
                return false;
            }
        };
        match self.link.send_frame(&frame) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to send frame");
                false
            }
        }
    }

    /// Notifications raised since the last call.
    pub fn drain_notifications(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.outbox)
    }

    pub fn cursor(&self) -> Option<&GestureCursor> {
        self.dispatcher.cursor()
    }

    pub fn hovered_node_id(&self) -> Option<&NodeId> {
        self.dispatcher.hovered_node_id()
    }

    pub fn pending_target(&self) -> Option<&NodeId> {
        self.dispatcher.pending_target()
    }

    pub fn dispatcher(&self) -> &GestureDispatcher {
        &self.dispatcher
    }

    pub fn monitor(&self) -> &DispatchMonitor {
        &self.monitor
    }
}

impl Drop for GestureSession {
    fn drop(&mut self) {
        self.link.disconnect();
    }
}
