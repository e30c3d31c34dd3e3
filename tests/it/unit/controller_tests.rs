//! Unit tests for the diagram controller.

use crate::helpers::{TestDiagramBuilder, node_id};
use gestureflow::diagram::DiagramController;
use gestureflow::types::{ConnectionHandshake, ConnectionId, DiagramConnection, DiagramNode, Selection};

#[test]
fn test_add_connect_delete_scenario() {
    let mut ctl = DiagramController::new();

    let n1 = ctl.add_node(10.0, 10.0);
    let state = ctl.get_state();
    assert_eq!(state.nodes.len(), 1);
    assert_eq!((state.nodes[0].x, state.nodes[0].y), (10.0, 10.0));
    assert_eq!(state.nodes[0].label, "New Node");
    assert_eq!(state.selected_node_id, Some(n1.clone()));

    let n2 = ctl.add_node(200.0, 10.0);
    let state = ctl.get_state();
    assert_eq!(state.nodes.len(), 2);
    assert_eq!(state.selected_node_id, Some(n2.clone()));

    ctl.start_connection(&n1);
    assert!(ctl.complete_connection(&n2).is_some());
    let state = ctl.get_state();
    assert_eq!(state.connections.len(), 1);
    assert!(state.connections[0].links(&n1, &n2));
    assert_eq!(state.pending_connection_start_id, None);

    ctl.delete_node(&n1);
    let state = ctl.get_state();
    assert_eq!(state.nodes.len(), 1);
    assert!(state.connections.is_empty());
    assert_eq!(state.selected_node_id, None);
    assert_eq!(state.selected_connection_id, None);
}

#[test]
fn test_delete_node_removes_every_incident_connection() {
    let mut ctl = TestDiagramBuilder::new()
        .with_row(4)
        .with_edge("n0", "n1")
        .with_edge("n2", "n0")
        .with_edge("n0", "n3")
        .with_edge("n1", "n2")
        .build();

    ctl.delete_node(&node_id("n0"));

    let state = ctl.get_state();
    assert_eq!(state.connections.len(), 1);
    assert!(state.connections.iter().all(|c| !c.touches(&node_id("n0"))));
    assert!(ctl.model().check_invariants().is_ok());
}

#[test]
fn test_delete_node_keeps_other_selection() {
    let mut ctl = TestDiagramBuilder::new().with_row(2).build();
    ctl.select_node(Some(&node_id("n1")));

    ctl.delete_node(&node_id("n0"));
    assert_eq!(ctl.model().selected_node_id(), Some(&node_id("n1")));
}

#[test]
fn test_delete_armed_node_disarms() {
    let mut ctl = TestDiagramBuilder::new().with_row(2).build();
    ctl.start_connection(&node_id("n0"));
    ctl.select_node(Some(&node_id("n1")));

    ctl.delete_node(&node_id("n0"));
    assert_eq!(ctl.model().handshake(), &ConnectionHandshake::Idle);
    assert_eq!(ctl.model().selected_node_id(), Some(&node_id("n1")));
}

#[test]
fn test_duplicate_edges_rejected_in_both_directions() {
    let mut ctl = TestDiagramBuilder::new().with_row(2).build();
    let a = node_id("n0");
    let b = node_id("n1");

    ctl.start_connection(&a);
    assert!(ctl.complete_connection(&b).is_some());

    ctl.start_connection(&a);
    assert!(ctl.complete_connection(&b).is_none());
    ctl.start_connection(&b);
    assert!(ctl.complete_connection(&a).is_none());

    assert_eq!(ctl.model().connections().len(), 1);
    assert_eq!(ctl.model().pending_connection_start_id(), None);
}

#[test]
fn test_self_connection_clears_handshake() {
    let mut ctl = TestDiagramBuilder::new().with_row(1).build();
    let a = node_id("n0");

    ctl.start_connection(&a);
    assert_eq!(ctl.model().pending_connection_start_id(), Some(&a));
    assert_eq!(ctl.model().selected_node_id(), Some(&a));

    assert!(ctl.complete_connection(&a).is_none());
    assert_eq!(ctl.model().pending_connection_start_id(), None);
    assert!(ctl.model().connections().is_empty());
}

#[test]
fn test_complete_without_armed_start_is_noop() {
    let mut ctl = TestDiagramBuilder::new().with_row(2).build();
    assert!(ctl.complete_connection(&node_id("n1")).is_none());
    assert!(ctl.model().connections().is_empty());
}

#[test]
fn test_start_connection_is_idempotent() {
    let mut ctl = TestDiagramBuilder::new().with_row(2).build();
    ctl.start_connection(&node_id("n0"));
    ctl.start_connection(&node_id("n0"));
    assert_eq!(
        ctl.model().handshake(),
        &ConnectionHandshake::Armed(node_id("n0"))
    );
}

#[test]
fn test_cancellation_paths() {
    let mut ctl = TestDiagramBuilder::new()
        .with_row(3)
        .with_edge("n1", "n2")
        .build();

    ctl.start_connection(&node_id("n0"));
    ctl.select_node(None);
    assert!(!ctl.model().handshake().is_armed());
    assert!(ctl.model().selection().is_none());

    ctl.start_connection(&node_id("n0"));
    ctl.select_connection(Some(&ConnectionId::from("n1-n2")));
    assert!(!ctl.model().handshake().is_armed());
    assert_eq!(
        ctl.model().selection(),
        &Selection::Connection(ConnectionId::from("n1-n2"))
    );

    ctl.start_connection(&node_id("n0"));
    ctl.select_connection(None);
    assert!(!ctl.model().handshake().is_armed());
}

#[test]
fn test_selecting_a_node_keeps_the_handshake() {
    let mut ctl = TestDiagramBuilder::new().with_row(2).build();
    ctl.start_connection(&node_id("n0"));
    ctl.select_node(Some(&node_id("n1")));
    assert_eq!(ctl.model().pending_connection_start_id(), Some(&node_id("n0")));
}

#[test]
fn test_selection_kinds_are_exclusive() {
    let mut ctl = TestDiagramBuilder::new()
        .with_row(2)
        .with_edge("n0", "n1")
        .build();

    ctl.select_node(Some(&node_id("n0")));
    ctl.select_connection(Some(&ConnectionId::from("n0-n1")));
    let state = ctl.get_state();
    assert_eq!(state.selected_node_id, None);
    assert!(state.selected_connection_id.is_some());

    ctl.select_node(Some(&node_id("n1")));
    let state = ctl.get_state();
    assert_eq!(state.selected_node_id, Some(node_id("n1")));
    assert_eq!(state.selected_connection_id, None);
}

#[test]
fn test_unknown_ids_are_ignored() {
    let mut ctl = TestDiagramBuilder::new()
        .with_row(2)
        .with_edge("n0", "n1")
        .build();
    ctl.select_node(Some(&node_id("n0")));
    let before = ctl.get_state();

    let ghost = node_id("ghost");
    ctl.delete_node(&ghost);
    ctl.update_node_position(&ghost, 1.0, 1.0);
    ctl.update_node_label(&ghost, "boo");
    ctl.start_connection(&ghost);
    ctl.select_node(Some(&ghost));
    ctl.select_connection(Some(&ConnectionId::from("ghost")));
    ctl.delete_connection(&ConnectionId::from("ghost"));

    assert_eq!(ctl.get_state(), before);
}

#[test]
fn test_complete_on_deleted_target_clears_handshake() {
    let mut ctl = TestDiagramBuilder::new().with_row(2).build();
    ctl.start_connection(&node_id("n0"));
    assert!(ctl.complete_connection(&node_id("ghost")).is_none());
    assert!(!ctl.model().handshake().is_armed());
}

#[test]
fn test_delete_connection_clears_its_selection() {
    let mut ctl = TestDiagramBuilder::new()
        .with_row(2)
        .with_edge("n0", "n1")
        .build();
    let conn = ConnectionId::from("n0-n1");
    ctl.select_connection(Some(&conn));

    ctl.delete_connection(&conn);
    assert!(ctl.model().connections().is_empty());
    assert!(ctl.model().selection().is_none());
}

#[test]
fn test_update_position_and_label() {
    let mut ctl = TestDiagramBuilder::new().with_node("a", 0.0, 0.0).build();
    let a = node_id("a");

    ctl.update_node_position(&a, 12.5, -40.0);
    ctl.update_node_label(&a, "Renamed");
    let node = ctl.model().node(&a).unwrap();
    assert_eq!((node.x, node.y), (12.5, -40.0));
    assert_eq!(node.label, "Renamed");

    // The spatial index follows the node.
    assert!(ctl.model().node_at(gestureflow::types::WorldPoint::new(20.0, -30.0), 0.0).is_some());
    assert!(ctl.model().node_at(gestureflow::types::WorldPoint::new(5.0, 5.0), 0.0).is_none());
}

#[test]
fn test_non_finite_position_ignored() {
    let mut ctl = TestDiagramBuilder::new().with_node("a", 5.0, 5.0).build();
    ctl.update_node_position(&node_id("a"), f64::NAN, 1.0);
    ctl.update_node_position(&node_id("a"), 1.0, f64::INFINITY);
    let node = ctl.model().node(&node_id("a")).unwrap();
    assert_eq!((node.x, node.y), (5.0, 5.0));
}

#[test]
fn test_load_then_get_state_round_trips() {
    let nodes = vec![
        DiagramNode::new("a", 1.5, 2.5, "A"),
        DiagramNode::new("b", 300.0, 0.0, "B"),
        DiagramNode::new("c", 0.0, 300.0, "C"),
    ];
    let connections = vec![
        DiagramConnection::new("ab", "a", "b"),
        DiagramConnection::new("ca", "c", "a"),
    ];

    let mut ctl = DiagramController::new();
    ctl.add_node(9.0, 9.0);
    ctl.load_diagram(nodes.clone(), connections.clone());

    let state = ctl.get_state();
    assert_eq!(state.nodes, nodes);
    assert_eq!(state.connections, connections);
    assert_eq!(state.selected_node_id, None);
    assert_eq!(state.selected_connection_id, None);
    assert_eq!(state.pending_connection_start_id, None);
}

#[test]
fn test_load_drops_inconsistent_entries() {
    let nodes = vec![
        DiagramNode::new("a", 0.0, 0.0, "A"),
        DiagramNode::new("b", 200.0, 0.0, "B"),
        DiagramNode::new("a", 999.0, 999.0, "dup"),
    ];
    let connections = vec![
        DiagramConnection::new("ab", "a", "b"),
        DiagramConnection::new("ba", "b", "a"),
        DiagramConnection::new("aa", "a", "a"),
        DiagramConnection::new("ax", "a", "missing"),
    ];

    let ctl = {
        let mut ctl = DiagramController::new();
        ctl.load_diagram(nodes, connections);
        ctl
    };

    let state = ctl.get_state();
    assert_eq!(state.nodes.len(), 2);
    assert_eq!(state.nodes[0].x, 0.0);
    assert_eq!(state.connections.len(), 1);
    assert_eq!(state.connections[0].id, ConnectionId::from("ab"));
    assert!(ctl.model().check_invariants().is_ok());
}

#[test]
fn test_clear_diagram_resets_everything() {
    let mut ctl = TestDiagramBuilder::new()
        .with_row(2)
        .with_edge("n0", "n1")
        .build();
    ctl.start_connection(&node_id("n0"));

    ctl.clear_diagram();
    assert_eq!(ctl.get_state(), Default::default());
}

#[test]
fn test_snapshot_is_detached_from_model() {
    let mut ctl = TestDiagramBuilder::new().with_node("a", 0.0, 0.0).build();
    let mut snapshot = ctl.get_state();
    snapshot.nodes[0].x = 500.0;

    assert_eq!(ctl.model().node(&node_id("a")).unwrap().x, 0.0);
    ctl.update_node_position(&node_id("a"), 1.0, 1.0);
    assert_eq!(snapshot.nodes[0].x, 500.0);
}

#[test]
fn test_state_selection_helpers() {
    let mut ctl = TestDiagramBuilder::new().with_row(2).build();
    ctl.start_connection(&node_id("n1"));
    let state = ctl.get_state();
    assert_eq!(state.selection(), Selection::Node(node_id("n1")));
    assert_eq!(state.handshake(), ConnectionHandshake::Armed(node_id("n1")));
}

#[test]
fn test_load_drops_nodes_with_non_finite_positions() {
    let nodes = vec![
        DiagramNode::new("a", 0.0, 0.0, "A"),
        DiagramNode::new("b", f64::NAN, 0.0, "B"),
        DiagramNode::new("c", 0.0, f64::INFINITY, "C"),
    ];
    let connections = vec![DiagramConnection::new("ab", "a", "b")];

    let mut ctl = DiagramController::new();
    ctl.load_diagram(nodes, connections);

    let state = ctl.get_state();
    assert_eq!(state.nodes.len(), 1);
    assert!(state.connections.is_empty());
    assert!(ctl.model().check_invariants().is_ok());
}
