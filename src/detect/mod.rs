mod backends;
mod classifier;
mod result;

pub use backends::StubClassifier;
pub use classifier::Classifier;
pub use result::{BoundingBox, Detection};
