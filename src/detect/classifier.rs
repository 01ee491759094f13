use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

/// Object-classifier seam.
///
/// The model is an external collaborator: implementations return labeled
/// boxes with confidence scores in source-frame coordinates, and nothing
/// else crosses the boundary. A classifier may be called at most once per
/// detection cycle; the loop guarantees no two calls overlap.
pub trait Classifier: Send {
    /// Classifier identifier.
    fn name(&self) -> &'static str;

    /// Load model weights.
    ///
    /// Detection must not be enabled until this has returned Ok.
    fn load(&mut self) -> Result<()> {
        Ok(())
    }

    /// Run detection on one frame.
    ///
    /// The frame's pixel slice is read-only and must not be retained
    /// beyond the call.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}
