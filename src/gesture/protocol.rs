//! Wire format shared with the remote hand-pose classifier.
//!
//! Inbound, one JSON message per sample:
//!
//! ```json
//! { "gesture": "<tag>", "wrist": { "x": 320.0, "y": 240.0 } }
//! ```
//!
//! Wrist coordinates are in the classifier's 640x480 capture space and are
//! normalised to `[0, 1]` here. Outbound, one message per captured frame:
//! `{ "frame": "data:image/jpeg;base64,..." }`, resized to 640x480 first.

use super::pose::Pose;
use crate::constants::{CAPTURE_HEIGHT, CAPTURE_WIDTH};
use crate::error::{ProtocolError, ProtocolResult};
use crate::types::ScreenPoint;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Wrist position normalised to the capture frame, `0..=1` on both axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    /// Normalise a position given in capture-frame units. Positions outside
    /// the frame are pinned to its edge.
    pub fn from_capture(x: f64, y: f64) -> Self {
        Self {
            x: (x / f64::from(CAPTURE_WIDTH)).clamp(0.0, 1.0),
            y: (y / f64::from(CAPTURE_HEIGHT)).clamp(0.0, 1.0),
        }
    }

    /// Map onto a screen of the given size. With `mirror_x` the horizontal
    /// axis is flipped so a front-facing camera moves the cursor with the
    /// hand instead of against it. The result stays on the screen.
    pub fn to_screen(self, screen_width: f64, screen_height: f64, mirror_x: bool) -> ScreenPoint {
        let x = self.x.clamp(0.0, 1.0);
        let nx = if mirror_x { 1.0 - x } else { x };
        ScreenPoint::new(nx * screen_width, self.y.clamp(0.0, 1.0) * screen_height)
    }
}

/// One decoded sample from the pose stream.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureSample {
    pub pose: Pose,
    /// Absent only for "no hand" samples.
    pub position: Option<NormalizedPoint>,
}

impl GestureSample {
    pub fn new(pose: Pose, position: NormalizedPoint) -> Self {
        Self {
            pose,
            position: Some(position),
        }
    }

    pub fn no_hand() -> Self {
        Self {
            pose: Pose::NoHand,
            position: None,
        }
    }
}

#[derive(Deserialize)]
struct RawPoseMessage {
    #[serde(default)]
    gesture: String,
    #[serde(default)]
    wrist: Option<Value>,
}

/// Decode one inbound message.
///
/// Returns `Ok(None)` for messages that are well-formed JSON but lack a
/// finite numeric wrist position; those are dropped. A `no_hand` message
/// needs no position.
pub fn decode_pose_message(text: &str) -> ProtocolResult<Option<GestureSample>> {
    let raw: RawPoseMessage = serde_json::from_str(text)?;
    let pose = Pose::from_tag(&raw.gesture);

    if pose == Pose::NoHand {
        return Ok(Some(GestureSample::no_hand()));
    }

    let coords = raw.wrist.as_ref().and_then(|w| {
        let x = w.get("x")?.as_f64()?;
        let y = w.get("y")?.as_f64()?;
        (x.is_finite() && y.is_finite()).then_some((x, y))
    });

    match coords {
        Some((x, y)) => Ok(Some(GestureSample::new(pose, NormalizedPoint::from_capture(x, y)))),
        None => {
            trace!(gesture = %raw.gesture, "dropping pose message without wrist position");
            Ok(None)
        }
    }
}

/// Outbound frame message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameMessage {
    pub frame: String,
}

impl FrameMessage {
    /// Resize `image` to the capture size and wrap it as a JPEG data URL.
    pub fn encode(image: &DynamicImage, quality: u8) -> ProtocolResult<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ProtocolError::EmptyFrame);
        }

        let resized = image
            .resize_exact(CAPTURE_WIDTH, CAPTURE_HEIGHT, FilterType::Triangle)
            .to_rgb8();

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100)).encode_image(&resized)?;

        Ok(Self {
            frame: format!("{JPEG_DATA_URL_PREFIX}{}", STANDARD.encode(&jpeg)),
        })
    }

    pub fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode the embedded image (used by replay tooling and tests).
    pub fn decode_image(&self) -> ProtocolResult<DynamicImage> {
        let payload = self
            .frame
            .strip_prefix(JPEG_DATA_URL_PREFIX)
            .ok_or_else(|| ProtocolError::InvalidFrame("missing JPEG data URL prefix".into()))?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| ProtocolError::InvalidFrame(e.to_string()))?;
        Ok(image::load_from_memory(&bytes)?)
    }
}
