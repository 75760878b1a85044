use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Source of "now" for audit timestamps and of "today" for date rules.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate;
}

/// Wall clock; "today" is the calendar date at the business offset.
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}

#[cfg(test)]
pub use fixed::FixedClock;


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn system_clock_today_follows_offset() {
        let offset = FixedOffset::east_opt(14 * 3600).unwrap();
        let clock = SystemClock::new(offset);
        let before = Utc::now().with_timezone(&offset).date_naive();
        let today = clock.today();
        let after = Utc::now().with_timezone(&offset).date_naive();
        assert!(today == before || today == after);
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        clock.advance_days(3);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 13).unwrap());
        assert_eq!(
            clock.now(),
            Utc.with_ymd_and_hms(2025, 3, 13, 9, 0, 0).unwrap()
        );
    }
}
