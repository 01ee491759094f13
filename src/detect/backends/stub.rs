use std::collections::VecDeque;

use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};

use crate::detect::classifier::Classifier;
use crate::detect::result::{BoundingBox, Detection};
use crate::frame::Frame;

/// Stub classifier for tests and synthetic runs.
///
/// Three modes: a scripted queue of per-call results, pixel hashing that
/// reports one centered "motion" detection whenever the scene changes, or
/// unconditional failure for error-path tests.
pub struct StubClassifier {
    mode: StubMode,
    loaded: bool,
    fail_load: bool,
    calls: u64,
}

enum StubMode {
    Scripted(VecDeque<Result<Vec<Detection>>>),
    Motion { last_hash: Option<[u8; 32]> },
}

impl StubClassifier {
    /// Returns the queued result lists in order, then empty results.
    pub fn scripted(results: Vec<Vec<Detection>>) -> Self {
        Self::scripted_results(results.into_iter().map(Ok).collect())
    }

    /// Like `scripted`, but individual calls may be scripted to fail.
    pub fn scripted_results(results: Vec<Result<Vec<Detection>>>) -> Self {
        Self {
            mode: StubMode::Scripted(results.into()),
            loaded: false,
            fail_load: false,
            calls: 0,
        }
    }

    /// Detects scene changes by pixel hashing, like a motion sensor.
    pub fn motion() -> Self {
        Self {
            mode: StubMode::Motion { last_hash: None },
            loaded: false,
            fail_load: false,
            calls: 0,
        }
    }

    /// A classifier whose `load` always fails.
    pub fn failing_load() -> Self {
        let mut stub = Self::scripted(vec![]);
        stub.fail_load = true;
        stub
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Classifier for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn load(&mut self) -> Result<()> {
        if self.fail_load {
            return Err(anyhow!("stub classifier: scripted load failure"));
        }
        self.loaded = true;
        Ok(())
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        if !self.loaded {
            return Err(anyhow!("stub classifier: detect before load"));
        }
        self.calls += 1;
        match &mut self.mode {
            StubMode::Scripted(queue) => queue.pop_front().unwrap_or_else(|| Ok(Vec::new())),
            StubMode::Motion { last_hash } => {
                let current: [u8; 32] = Sha256::digest(frame.pixels()).into();
                let changed = match last_hash {
                    Some(prev) => *prev != current,
                    None => false,
                };
                *last_hash = Some(current);
                if !changed {
                    return Ok(Vec::new());
                }
                let (w, h) = (frame.width as f32, frame.height as f32);
                Ok(vec![Detection::new(
                    "motion",
                    0.85,
                    BoundingBox {
                        x: w / 4.0,
                        y: h / 4.0,
                        width: w / 2.0,
                        height: h / 2.0,
                    },
                )])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(byte: u8) -> Frame {
        Frame::new(vec![byte; 64], 8, 8)
    }

    #[test]
    fn scripted_results_pop_in_order_then_empty() -> Result<()> {
        let cat = Detection::new(
            "cat",
            0.9,
            BoundingBox {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            },
        );
        let mut stub = StubClassifier::scripted(vec![vec![cat], vec![]]);
        stub.load()?;

        assert_eq!(stub.detect(&frame_with(0))?.len(), 1);
        assert_eq!(stub.detect(&frame_with(0))?.len(), 0);
        // Queue exhausted: further calls are clean, not errors.
        assert_eq!(stub.detect(&frame_with(0))?.len(), 0);
        assert_eq!(stub.calls(), 3);
        Ok(())
    }

    #[test]
    fn motion_mode_fires_only_on_scene_change() -> Result<()> {
        let mut stub = StubClassifier::motion();
        stub.load()?;

        assert!(stub.detect(&frame_with(1))?.is_empty());
        assert!(stub.detect(&frame_with(1))?.is_empty());

        let detections = stub.detect(&frame_with(2))?;
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "motion");
        Ok(())
    }

    #[test]
    fn detect_before_load_is_an_error() {
        let mut stub = StubClassifier::motion();
        assert!(stub.detect(&frame_with(0)).is_err());
    }

    #[test]
    fn failing_load_reports_error() {
        let mut stub = StubClassifier::failing_load();
        assert!(stub.load().is_err());
    }
}
