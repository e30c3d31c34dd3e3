//! Property tests: invariants under arbitrary command sequences, and
//! viewport geometry.

use crate::helpers::{SCREEN_H, SCREEN_W};
use gestureflow::diagram::DiagramController;
use gestureflow::gesture::{
    GestureConfig, GestureDispatcher, GestureSample, GestureView, NormalizedPoint, Pose, decode_pose_message,
};
use gestureflow::types::{ConnectionId, DiagramConnection, DiagramNode, NodeId, ScreenPoint};
use gestureflow::viewport::{SurfaceRect, ViewportTransform};
use proptest::prelude::*;
use std::time::{Duration, Instant};

// ===================
// Strategies
// ===================

/// A controller command; `usize` fields pick an existing id by index, wrapping
/// around, or an unknown id when there is nothing to pick.
#[derive(Clone, Debug)]
enum Op {
    Add(f64, f64),
    DeleteNode(usize),
    Move(usize, f64, f64),
    Label(usize),
    Start(usize),
    Complete(usize),
    SelectNode(Option<usize>),
    SelectConnection(Option<usize>),
    DeleteConnection(usize),
    Clear,
}

fn coord_strategy() -> impl Strategy<Value = f64> {
    -2000.0f64..2000.0
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (coord_strategy(), coord_strategy()).prop_map(|(x, y)| Op::Add(x, y)),
        1 => any::<usize>().prop_map(Op::DeleteNode),
        2 => (any::<usize>(), coord_strategy(), coord_strategy()).prop_map(|(i, x, y)| Op::Move(i, x, y)),
        1 => any::<usize>().prop_map(Op::Label),
        3 => any::<usize>().prop_map(Op::Start),
        3 => any::<usize>().prop_map(Op::Complete),
        2 => proptest::option::of(any::<usize>()).prop_map(Op::SelectNode),
        1 => proptest::option::of(any::<usize>()).prop_map(Op::SelectConnection),
        1 => any::<usize>().prop_map(Op::DeleteConnection),
        1 => Just(Op::Clear),
    ]
}

fn tag_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("add".to_string()),
        Just("delete".to_string()),
        Just("connecting".to_string()),
        Just("grabbing".to_string()),
        Just("select".to_string()),
        Just("hover".to_string()),
        Just("no_hand".to_string()),
        "[a-z]{0,6}",
    ]
}

/// Wrist coordinates in capture units: mostly around the frame, sometimes
/// anything at all, including huge, infinite and NaN values.
fn wrist_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => -100.0f64..740.0,
        1 => proptest::num::f64::ANY,
    ]
}

/// A sample either decoded from a wire message or built directly, so both
/// the decoder and the dispatcher see out-of-range positions. `None` when the
/// decoder drops the message.
fn sample_strategy() -> impl Strategy<Value = (Option<GestureSample>, u64)> {
    (tag_strategy(), wrist_strategy(), wrist_strategy(), any::<bool>(), 0u64..400).prop_map(
        |(tag, x, y, from_wire, gap)| {
            let sample = if from_wire {
                let message = serde_json::json!({ "gesture": tag, "wrist": { "x": x, "y": y } });
                decode_pose_message(&message.to_string()).ok().flatten()
            } else {
                match Pose::from_tag(&tag) {
                    Pose::NoHand => Some(GestureSample::no_hand()),
                    pose => Some(GestureSample::new(pose, NormalizedPoint { x: x / 640.0, y: y / 480.0 })),
                }
            };
            (sample, gap)
        },
    )
}

fn viewport_strategy() -> impl Strategy<Value = ViewportTransform> {
    (-500.0f64..500.0, -500.0f64..500.0, 0.1f64..5.0)
        .prop_map(|(x, y, scale)| ViewportTransform::new(x, y, scale))
}

fn surface_strategy() -> impl Strategy<Value = SurfaceRect> {
    (0.0f64..300.0, 0.0f64..300.0).prop_map(|(left, top)| SurfaceRect::new(left, top, 800.0, 600.0))
}

fn graph_strategy() -> impl Strategy<Value = (Vec<DiagramNode>, Vec<DiagramConnection>)> {
    proptest::collection::vec((coord_strategy(), coord_strategy()), 1..12).prop_flat_map(|coords| {
        let count = coords.len();
        let nodes: Vec<DiagramNode> = coords
            .into_iter()
            .enumerate()
            .map(|(i, (x, y))| DiagramNode::new(format!("n{i}"), x, y, format!("Node {i}")))
            .collect();
        let pairs = proptest::collection::vec((0..count, 0..count), 0..20);
        (Just(nodes), pairs).prop_map(|(nodes, pairs)| {
            let mut connections: Vec<DiagramConnection> = Vec::new();
            for (a, b) in pairs {
                let (from, to) = (NodeId::from(format!("n{a}")), NodeId::from(format!("n{b}")));
                if a != b && !connections.iter().any(|c| c.links(&from, &to)) {
                    connections.push(DiagramConnection::new(format!("c{a}-{b}"), from, to));
                }
            }
            (nodes, connections)
        })
    })
}

// ===================
// Property Test Functions
// ===================

fn pick_node(ctl: &DiagramController, index: usize) -> NodeId {
    let nodes = ctl.model().nodes();
    if nodes.is_empty() {
        NodeId::from("ghost")
    } else {
        nodes[index % nodes.len()].id.clone()
    }
}

fn pick_connection(ctl: &DiagramController, index: usize) -> ConnectionId {
    let connections = ctl.model().connections();
    if connections.is_empty() {
        ConnectionId::from("ghost")
    } else {
        connections[index % connections.len()].id.clone()
    }
}

fn apply(ctl: &mut DiagramController, op: &Op) {
    match *op {
        Op::Add(x, y) => {
            ctl.add_node(x, y);
        }
        Op::DeleteNode(i) => {
            let id = pick_node(ctl, i);
            ctl.delete_node(&id);
        }
        Op::Move(i, x, y) => {
            let id = pick_node(ctl, i);
            ctl.update_node_position(&id, x, y);
        }
        Op::Label(i) => {
            let id = pick_node(ctl, i);
            ctl.update_node_label(&id, format!("label {i}"));
        }
        Op::Start(i) => {
            let id = pick_node(ctl, i);
            ctl.start_connection(&id);
        }
        Op::Complete(i) => {
            let id = pick_node(ctl, i);
            ctl.complete_connection(&id);
        }
        Op::SelectNode(i) => {
            let id = i.map(|i| pick_node(ctl, i));
            ctl.select_node(id.as_ref());
        }
        Op::SelectConnection(i) => {
            let id = i.map(|i| pick_connection(ctl, i));
            ctl.select_connection(id.as_ref());
        }
        Op::DeleteConnection(i) => {
            let id = pick_connection(ctl, i);
            ctl.delete_connection(&id);
        }
        Op::Clear => ctl.clear_diagram(),
    }
}

fn check_state_is_consistent(ctl: &DiagramController) -> Result<(), TestCaseError> {
    if let Err(violation) = ctl.model().check_invariants() {
        return Err(TestCaseError::fail(violation));
    }
    let state = ctl.get_state();
    prop_assert!(!(state.selected_node_id.is_some() && state.selected_connection_id.is_some()));
    if let Some(id) = &state.selected_node_id {
        prop_assert!(state.node(id).is_some());
    }
    if let Some(id) = &state.selected_connection_id {
        prop_assert!(state.connection(id).is_some());
    }
    if let Some(id) = &state.pending_connection_start_id {
        prop_assert!(state.node(id).is_some());
    }
    Ok(())
}

/// Every command sequence leaves the diagram consistent after each step.
fn check_commands_preserve_invariants(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut ctl = DiagramController::new();
    for op in &ops {
        apply(&mut ctl, op);
        check_state_is_consistent(&ctl)?;
    }
    Ok(())
}

/// A completed handshake adds at most one edge and always clears the armed
/// start.
fn check_complete_adds_at_most_one_edge(ops: Vec<Op>, target: usize) -> Result<(), TestCaseError> {
    let mut ctl = DiagramController::new();
    for op in &ops {
        apply(&mut ctl, op);
    }
    let before = ctl.model().connections().len();
    let target = pick_node(&ctl, target);
    let created = ctl.complete_connection(&target);

    let after = ctl.model().connections().len();
    prop_assert_eq!(after, before + usize::from(created.is_some()));
    prop_assert!(ctl.model().pending_connection_start_id().is_none());
    Ok(())
}

/// Arbitrary pose streams never break the diagram, and time only moves
/// forward.
fn check_samples_preserve_invariants(samples: Vec<(Option<GestureSample>, u64)>) -> Result<(), TestCaseError> {
    let config = GestureConfig::default();
    let mut dispatcher = GestureDispatcher::new(config, SCREEN_W, SCREEN_H);
    let mut ctl = DiagramController::new();
    let view = GestureView::full_screen(SCREEN_W, SCREEN_H, ViewportTransform::default());
    let mut now = Instant::now();

    for (sample, gap) in &samples {
        now += Duration::from_millis(*gap);
        let Some(sample) = sample else {
            continue;
        };
        dispatcher.handle_sample(sample, &view, &mut ctl, now);
        check_state_is_consistent(&ctl)?;
        prop_assert_eq!(
            dispatcher.pending_target(),
            ctl.model().pending_connection_start_id()
        );
        if let Some(cursor) = dispatcher.cursor() {
            prop_assert!(cursor.position.x.is_finite() && cursor.position.y.is_finite());
        }
    }
    Ok(())
}

/// Load followed by a snapshot yields the same nodes and connections.
fn check_load_round_trip(nodes: Vec<DiagramNode>, connections: Vec<DiagramConnection>) -> Result<(), TestCaseError> {
    let mut ctl = DiagramController::new();
    ctl.load_diagram(nodes.clone(), connections.clone());
    let state = ctl.get_state();
    prop_assert_eq!(state.nodes, nodes);
    prop_assert_eq!(state.connections, connections);
    prop_assert!(state.selected_node_id.is_none());
    prop_assert!(state.pending_connection_start_id.is_none());
    Ok(())
}

/// The world point under the cursor does not move when zooming.
fn check_zoom_keeps_anchor(
    viewport: ViewportTransform,
    surface: SurfaceRect,
    x: f64,
    y: f64,
    delta: f64,
) -> Result<(), TestCaseError> {
    let screen = ScreenPoint::new(x, y);
    let mut vp = viewport;
    let before = vp.screen_to_world(&surface, screen);
    vp.zoom_at(&surface, screen, delta);
    let after = vp.screen_to_world(&surface, screen);

    let tolerance = 1e-9 * (1.0 + before.x.abs().max(before.y.abs()));
    prop_assert!((before.x - after.x).abs() <= tolerance, "x drifted: {} -> {}", before.x, after.x);
    prop_assert!((before.y - after.y).abs() <= tolerance, "y drifted: {} -> {}", before.y, after.y);
    prop_assert!(vp.scale >= 0.1 && vp.scale <= 5.0);
    Ok(())
}

/// Screen to world and back is the identity.
fn check_screen_world_round_trip(
    viewport: ViewportTransform,
    surface: SurfaceRect,
    x: f64,
    y: f64,
) -> Result<(), TestCaseError> {
    let screen = ScreenPoint::new(x, y);
    let back = viewport.world_to_screen(&surface, viewport.screen_to_world(&surface, screen));
    prop_assert!((back.x - x).abs() < 1e-6);
    prop_assert!((back.y - y).abs() < 1e-6);
    Ok(())
}

// ===================
// Property Tests
// ===================

proptest! {
    #[test]
    fn commands_preserve_invariants(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        check_commands_preserve_invariants(ops)?;
    }

    #[test]
    fn complete_adds_at_most_one_edge(
        ops in proptest::collection::vec(op_strategy(), 0..40),
        target in any::<usize>(),
    ) {
        check_complete_adds_at_most_one_edge(ops, target)?;
    }

    #[test]
    fn samples_preserve_invariants(samples in proptest::collection::vec(sample_strategy(), 0..80)) {
        check_samples_preserve_invariants(samples)?;
    }

    #[test]
    fn load_round_trip((nodes, connections) in graph_strategy()) {
        check_load_round_trip(nodes, connections)?;
    }

    #[test]
    fn zoom_keeps_anchor(
        viewport in viewport_strategy(),
        surface in surface_strategy(),
        x in 0.0f64..1200.0,
        y in 0.0f64..900.0,
        delta in -5.0f64..5.0,
    ) {
        check_zoom_keeps_anchor(viewport, surface, x, y, delta)?;
    }

    #[test]
    fn screen_world_round_trip(
        viewport in viewport_strategy(),
        surface in surface_strategy(),
        x in -2000.0f64..2000.0,
        y in -2000.0f64..2000.0,
    ) {
        check_screen_world_round_trip(viewport, surface, x, y)?;
    }
}
