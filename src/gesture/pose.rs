//! Pose labels emitted by the hand-tracking classifier.
//!
//! The classifier has shipped two vocabularies (action names and hand-shape
//! names); both are accepted. Any tag that is not recognised maps to
//! `Pose::Unknown` and is handled exactly like a neutral pose.

use crate::constants::NO_HAND_TAG;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pose {
    /// Create a node under the cursor
    Create,
    /// Delete the selected node
    Delete,
    /// Arm or complete a connection on the node under the cursor
    Connect,
    /// Continuous grab: select under cursor, then drag the selection
    Move,
    /// Select the node under the cursor
    Select,
    /// Open hand: cursor only
    Hover,
    /// Hand visible but the pose was not recognised (empty tag)
    Unrecognized,
    /// Tag outside the known vocabulary
    Unknown(String),
    /// No hand in the frame
    NoHand,
}

/// How the dispatcher treats a pose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoseKind {
    /// Fires once per cooldown window
    Discrete,
    /// Acts on every sample
    Continuous,
    /// Moves the cursor only
    Neutral,
    /// Hides the cursor, no diagram effect
    Absent,
}

impl Pose {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "add" | "thumbs_up" => Self::Create,
            "delete" | "thumbs_down" => Self::Delete,
            "connecting" | "rock" => Self::Connect,
            "grabbing" | "fist" => Self::Move,
            "select" | "pointing" => Self::Select,
            "hover" | "palm_open" => Self::Hover,
            NO_HAND_TAG => Self::NoHand,
            "" => Self::Unrecognized,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn kind(&self) -> PoseKind {
        match self {
            Self::Create | Self::Delete | Self::Connect | Self::Select => PoseKind::Discrete,
            Self::Move => PoseKind::Continuous,
            Self::Hover | Self::Unrecognized | Self::Unknown(_) => PoseKind::Neutral,
            Self::NoHand => PoseKind::Absent,
        }
    }

    pub fn is_hand_visible(&self) -> bool {
        !matches!(self, Self::NoHand)
    }

    /// Short label for cursor overlays.
    pub fn label(&self) -> &str {
        match self {
            Self::Create => "ADD",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
            Self::Move => "GRAB",
            Self::Select => "SELECT",
            Self::Hover => "HOVER",
            Self::Unrecognized => "",
            Self::Unknown(tag) => tag,
            Self::NoHand => "NO HAND",
        }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
