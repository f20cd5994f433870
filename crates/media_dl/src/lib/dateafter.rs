//! The `dateafter` filter, matching the date-range expressions yt-dlp
//! accepts: an absolute `YYYYMMDD`, or `(now|today)[+-]N(day|week|month|year)s`.

use std::{str::FromStr, sync::LazyLock};

use chrono::{Duration, Months, NaiveDate, Utc};
use regex::Regex;

use crate::error::Error;

static RELATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:now|today)(?:([+-])(\d+)(day|week|month|year)s?)?$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateAfter {
    pub start: NaiveDate,
}

impl Default for DateAfter {
    /// A year-1 start means unbounded: everything is in range.
    fn default() -> Self {
        DateAfter {
            start: NaiveDate::from_ymd_opt(1, 1, 1).unwrap(),
        }
    }
}

impl DateAfter {
    pub fn is_unbounded(&self) -> bool {
        self.start == NaiveDate::from_ymd_opt(1, 1, 1).unwrap()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= Utc::now().date_naive()
    }
}

impl FromStr for DateAfter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(start) = NaiveDate::parse_from_str(s, "%Y%m%d") {
            return Ok(DateAfter { start });
        }

        let captures = RELATIVE_RE
            .captures(s)
            .ok_or_else(|| Error::InvalidDateAfter(s.to_string()))?;

        let today = Utc::now().date_naive();
        let Some(sign) = captures.get(1) else {
            return Ok(DateAfter { start: today });
        };

        let amount: u32 = captures[2]
            .parse()
            .map_err(|_| Error::InvalidDateAfter(s.to_string()))?;
        let start = match (&captures[3], sign.as_str()) {
            ("day", "-") => today - Duration::days(amount as i64),
            ("day", _) => today + Duration::days(amount as i64),
            ("week", "-") => today - Duration::weeks(amount as i64),
            ("week", _) => today + Duration::weeks(amount as i64),
            ("month", "-") => today - Months::new(amount),
            ("month", _) => today + Months::new(amount),
            ("year", "-") => today - Months::new(amount * 12),
            ("year", _) => today + Months::new(amount * 12),
            _ => return Err(Error::InvalidDateAfter(s.to_string())),
        };

        Ok(DateAfter { start })
    }
}
