pub mod clock;
mod expense;
mod money;
mod partition;
mod period;

pub use expense::*;
pub use money::*;
pub use partition::*;
pub use period::*;
