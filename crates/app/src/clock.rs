//! Clock

use jiff::{Timestamp, Zoned, civil::Date};
use mockall::automock;

/// Source of the current time.
#[automock]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Timestamp;

    /// Current local calendar date.
    fn today(&self) -> Date;
}

/// Wall clock in the system time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn today(&self) -> Date {
        Zoned::now().date()
    }
}
