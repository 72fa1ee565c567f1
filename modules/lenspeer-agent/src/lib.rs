pub mod outreach;
pub mod scorer;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use outreach::{CycleStats, OutreachAgent};
pub use scorer::{EngagementModel, HeuristicModel};
pub use traits::{MessageSender, ProfileSource};
