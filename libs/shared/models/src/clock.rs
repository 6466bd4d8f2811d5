use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Source of "now" for everything date-driven. Injected so that migration and
/// slot arithmetic never read the ambient system clock directly.
pub trait Clock: Send + Sync {
    /// Current instant in the clinic's offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Clinic-local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }

    fn offset(&self) -> FixedOffset {
        *self.now().offset()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}
