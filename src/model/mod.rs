mod link;
mod match_stats;

pub use link::*;
pub use match_stats::*;
