pub mod dedup;
pub mod partition;
pub mod stitch;

pub use dedup::Command as Dedup;
pub use partition::Command as Partition;
pub use stitch::Command as Stitch;
