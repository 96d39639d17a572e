mod health;
mod threat;
mod verdict;

pub use health::*;
pub use threat::*;
pub use verdict::*;
