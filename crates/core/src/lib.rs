pub mod budget;
pub mod clock;
pub mod config;
pub mod error;

pub use budget::{Budget, PeriodKey};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AlertConfig, Language};
pub use error::*;
