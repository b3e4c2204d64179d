use chrono::{DateTime, Local};

/// Source of "now" for everything that compares or persists time.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

#[cfg(test)]
pub mod testing {
    use super::Clock;
    use chrono::{DateTime, Duration, Local, TimeZone};
    use std::cell::Cell;

    /// Clock that starts at a fixed instant and advances by `step` on every read.
    pub struct SteppingClock {
        current: Cell<DateTime<Local>>,
        step: Duration,
    }

    impl SteppingClock {
        pub fn fixed(at: DateTime<Local>) -> Self {
            Self::stepping(at, Duration::zero())
        }

        pub fn stepping(at: DateTime<Local>, step: Duration) -> Self {
            Self {
                current: Cell::new(at),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Local> {
            let now = self.current.get();
            self.current.set(now + self.step);
            now
        }
    }

    pub fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .earliest()
            .expect("valid local time")
    }
}
