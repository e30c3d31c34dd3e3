//! Gesture session lifecycle over a scripted link.

use crate::helpers::{FakeLinkHandle, SCREEN_H, SCREEN_W, TestDiagramBuilder, identity_view, ms, node_id, sample_at};
use gestureflow::diagram::DiagramController;
use gestureflow::gesture::{
    FrameSource, GestureAction, GestureConfig, GestureSample, GestureSession, LinkEvent, Pose,
};
use gestureflow::notifications::ToastVariant;
use image::DynamicImage;
use std::time::Instant;

fn session(handle: &FakeLinkHandle) -> GestureSession {
    let config = GestureConfig {
        smoothing: 1.0,
        ..GestureConfig::default()
    };
    GestureSession::new(handle.link(), config, SCREEN_W, SCREEN_H)
}

struct SolidFrames {
    captured: usize,
}

impl FrameSource for SolidFrames {
    fn capture(&mut self) -> Option<DynamicImage> {
        self.captured += 1;
        Some(DynamicImage::new_rgb8(32, 24))
    }
}

struct NoCamera;

impl FrameSource for NoCamera {
    fn capture(&mut self) -> Option<DynamicImage> {
        None
    }
}

#[test]
fn test_enable_connects_once() {
    let handle = FakeLinkHandle::new();
    let mut session = session(&handle);
    assert!(!session.is_enabled());

    session.enable().unwrap();
    session.enable().unwrap();
    assert!(session.is_enabled());
    assert_eq!(handle.connects(), 1);
    assert!(!session.is_link_open());

    handle.open();
    assert!(session.is_link_open());
}

#[test]
fn test_open_and_error_become_toasts() {
    let handle = FakeLinkHandle::new();
    let mut session = session(&handle);
    let mut ctl = DiagramController::new();
    session.enable().unwrap();

    handle.open();
    handle.emit(LinkEvent::Error("socket reset".into()));
    let actions = session.pump(&mut ctl, &identity_view(), Instant::now());
    assert!(actions.is_empty());

    let toasts = session.drain_notifications();
    assert_eq!(toasts.len(), 2);
    assert_eq!(toasts[0].variant, ToastVariant::Success);
    assert_eq!(toasts[0].message, "Gesture control connected");
    assert_eq!(toasts[1].variant, ToastVariant::Error);
    assert_eq!(toasts[1].message, "Gesture connection error: socket reset");
    assert!(session.drain_notifications().is_empty());

    // An error event does not stop the stream.
    assert!(session.is_enabled());
    handle.emit_sample(sample_at(Pose::Create, 160.0, 130.0));
    let actions = session.pump(&mut ctl, &identity_view(), Instant::now());
    assert!(matches!(actions.as_slice(), [GestureAction::Created(_)]));
}

#[test]
fn test_pump_dispatches_in_arrival_order() {
    let handle = FakeLinkHandle::new();
    let mut session = session(&handle);
    let mut ctl = DiagramController::new();
    session.enable().unwrap();
    handle.open();

    handle.emit_sample(sample_at(Pose::Create, 160.0, 130.0));
    handle.emit_sample(sample_at(Pose::Create, 400.0, 130.0));
    handle.emit_sample(GestureSample::no_hand());

    let actions = session.pump(&mut ctl, &identity_view(), Instant::now());
    assert_eq!(actions.len(), 3);
    assert!(matches!(actions[0], GestureAction::Created(_)));
    assert_eq!(actions[1], GestureAction::CoolingDown);
    assert_eq!(actions[2], GestureAction::HandLost);
    assert_eq!(ctl.model().nodes().len(), 1);
    assert!(session.cursor().is_none());
    assert_eq!(session.monitor().total_samples(), 3);
}

#[test]
fn test_raw_messages_are_decoded_or_dropped() {
    let handle = FakeLinkHandle::new();
    let mut session = session(&handle);
    let mut ctl = DiagramController::new();
    session.enable().unwrap();

    handle.emit_raw("garbage");
    handle.emit_raw(r#"{"gesture":"add"}"#);
    handle.emit_raw(r#"{"gesture":"thumbs_up","wrist":{"x":320,"y":240}}"#);
    handle.emit_raw(r#"{"gesture":"no_hand"}"#);

    let actions = session.pump(&mut ctl, &identity_view(), Instant::now());
    assert_eq!(actions.len(), 2);
    assert!(matches!(actions[0], GestureAction::Created(_)));
    assert_eq!(actions[1], GestureAction::HandLost);
}

#[test]
fn test_connect_failure_reports_and_allows_retry() {
    let handle = FakeLinkHandle::new();
    let mut session = session(&handle);
    handle.fail_next_connect();

    assert!(session.enable().is_err());
    assert!(!session.is_enabled());
    let toasts = session.drain_notifications();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].variant, ToastVariant::Error);
    assert!(toasts[0].message.starts_with("Gesture connection failed"));

    session.enable().unwrap();
    assert!(session.is_enabled());
    assert_eq!(handle.connects(), 1);
}

#[test]
fn test_disable_keeps_armed_handshake() {
    let handle = FakeLinkHandle::new();
    let mut session = session(&handle);
    let mut ctl = TestDiagramBuilder::new().with_node("a", 0.0, 0.0).build();
    session.enable().unwrap();
    handle.open();

    handle.emit_sample(sample_at(Pose::Connect, 60.0, 30.0));
    let actions = session.pump(&mut ctl, &identity_view(), Instant::now());
    assert_eq!(actions, vec![GestureAction::Armed(node_id("a"))]);
    assert!(session.cursor().is_some());

    session.disable();
    assert!(!session.is_enabled());
    assert!(session.cursor().is_none());
    assert_eq!(handle.disconnects(), 1);
    assert!(!handle.is_connected());
    assert_eq!(ctl.model().pending_connection_start_id(), Some(&node_id("a")));

    // Nothing is processed after disabling.
    assert!(session.pump(&mut ctl, &identity_view(), Instant::now()).is_empty());

    session.disable();
    assert_eq!(handle.disconnects(), 1);
}

#[test]
fn test_frames_follow_the_interval() {
    let handle = FakeLinkHandle::new();
    let mut session = session(&handle);
    let mut camera = SolidFrames { captured: 0 };
    let t0 = Instant::now();

    assert!(!session.tick_frames(t0, &mut camera));
    session.enable().unwrap();
    assert!(!session.tick_frames(t0, &mut camera), "link not open yet");

    handle.open();
    assert!(session.tick_frames(t0, &mut camera));
    assert!(!session.tick_frames(ms(t0, 50), &mut camera));
    assert!(session.tick_frames(ms(t0, 100), &mut camera));
    assert!(!session.tick_frames(ms(t0, 150), &mut camera));
    assert!(session.tick_frames(ms(t0, 230), &mut camera));

    assert_eq!(handle.frames_sent(), 3);
    assert_eq!(camera.captured, 3);

    session.disable();
    assert!(!session.tick_frames(ms(t0, 1000), &mut camera));
    assert_eq!(handle.frames_sent(), 3);
}

#[test]
fn test_no_frame_without_camera_image() {
    let handle = FakeLinkHandle::new();
    let mut session = session(&handle);
    session.enable().unwrap();
    handle.open();

    assert!(!session.tick_frames(Instant::now(), &mut NoCamera));
    assert_eq!(handle.frames_sent(), 0);
}

#[test]
fn test_dropping_session_disconnects() {
    let handle = FakeLinkHandle::new();
    {
        let mut session = session(&handle);
        session.enable().unwrap();
        assert!(handle.is_connected());
    }
    assert!(!handle.is_connected());
    assert_eq!(handle.disconnects(), 1);
}
