#[cfg(test)]
use std::cell::Cell;
use std::fmt;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch; the snapshot's timestamp encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Timestamp(dt.timestamp_millis())
    }

    pub fn to_local(self) -> DateTime<Local> {
        Local
            .timestamp_millis_opt(self.0)
            .single()
            .unwrap_or_else(|| DateTime::<Utc>::default().with_timezone(&Local))
    }

    pub fn local_date(self) -> NaiveDate {
        self.to_local().date_naive()
    }

    pub fn plus(self, duration: Duration) -> Self {
        Timestamp(self.0 + duration.num_milliseconds())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_local().format("%Y-%m-%d %H:%M"))
    }
}

pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn timestamp(&self) -> Timestamp {
        Timestamp::from_datetime(&self.now())
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock pinned to a moment that tests can move forward.
#[cfg(test)]
pub struct FixedClock {
    now: Cell<DateTime<Local>>,
}

#[cfg(test)]
impl FixedClock {
    pub fn at(now: DateTime<Local>) -> Self {
        FixedClock { now: Cell::new(now) }
    }

    /// Noon local time on `date`, which keeps day arithmetic clear of DST edges.
    pub fn on(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        let now = Local
            .from_local_datetime(&noon)
            .earliest()
            .unwrap_or_else(Local::now);
        Self::at(now)
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_by_whole_days() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let clock = FixedClock::on(day);
        assert_eq!(clock.today(), day);
        clock.advance(Duration::days(1));
        assert_eq!(clock.today(), day.succ_opt().unwrap());
    }

    #[test]
    fn timestamp_is_plain_millis_on_the_wire() {
        let ts = Timestamp(1_700_000_000_123);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1700000000123");
        assert_eq!(ts.plus(Duration::hours(3)).0, 1_700_000_000_123 + 3 * 3_600_000);
    }
}
