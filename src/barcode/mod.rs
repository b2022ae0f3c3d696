pub mod crop;
pub mod transform;

pub use crop::CropRange;

pub use transform::complement;
pub use transform::reverse_complement;
pub use transform::SequencePreprocessor;
pub use transform::SequenceTransformer;
