//! TTL classes producers pick from when writing to the cache.

use std::time::Duration;

/// Named durations for cached results, chosen by how volatile the result is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlClass {
    /// 1 minute: free-text search results
    Short,
    /// 5 minutes: paginated listings
    Medium,
    /// 1 hour: stable per-id lookups
    Long,
    /// 24 hours
    VeryLong,
}

impl TtlClass {
    pub const fn seconds(self) -> u64 {
        match self {
            TtlClass::Short => 60,
            TtlClass::Medium => 300,
            TtlClass::Long => 3_600,
            TtlClass::VeryLong => 86_400,
        }
    }

    pub const fn duration(self) -> Duration {
        Duration::from_secs(self.seconds())
    }
}

impl From<TtlClass> for Duration {
    fn from(class: TtlClass) -> Self {
        class.duration()
    }
}
