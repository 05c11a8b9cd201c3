use chrono::{DateTime, Local, NaiveDate};

/// Represents an entity responsible for providing dates across application. This allows "today"
/// to be pinned during testing.
pub trait Clock: Sync + Send + 'static {
    fn now(&self) -> DateTime<Local>;

    /// Calendar day of [Clock::now]. Local time is used since a day log follows the user's day,
    /// not UTC.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

#[cfg(test)]
#[derive(Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

#[cfg(test)]
impl FixedClock {
    /// Noon of the given day, far enough from midnight to survive any DST shift.
    pub fn at(date: NaiveDate) -> Self {
        use chrono::TimeZone;

        let noon = date.and_hms_opt(12, 0, 0).unwrap();
        Self(Local.from_local_datetime(&noon).earliest().unwrap())
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
