/// Axis-aligned box in source-frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One labeled detection from a classifier call.
///
/// Ephemeral: produced per cycle, consumed by the render path, discarded.
#[derive(Clone, Debug)]
pub struct Detection {
    pub label: String,
    /// Confidence score in `0..=1`.
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}
