//! Common fixture values for ledger tests

use chrono::NaiveDate;

use core_kernel::PeriodId;
use domain_ledger::{Period, PeriodStatus};

/// Date fixtures
pub struct DateFixtures;

impl DateFixtures {
    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
    }

    /// A mid-January accrual date inside [`PeriodFixtures::january_2024`].
    pub fn january_5th() -> NaiveDate {
        Self::day(2024, 1, 5)
    }
}

/// Period fixtures
pub struct PeriodFixtures;

impl PeriodFixtures {
    /// Open period covering January 2024.
    pub fn january_2024() -> Period {
        Period::new(
            PeriodId::new(),
            "2024-01",
            DateFixtures::day(2024, 1, 1),
            DateFixtures::day(2024, 1, 31),
            None,
            PeriodStatus::Open,
            false,
        )
        .expect("valid fixture period")
    }

    /// A period that refuses postings.
    pub fn locked_january_2024() -> Period {
        let mut period = Self::january_2024();
        period.posting_locked = true;
        period
    }
}
