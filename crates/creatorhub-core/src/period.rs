use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A calendar month in UTC; the unit of task cycles and revenue shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BillingMonth {
    pub year: i32,
    pub month: u32,
}

impl BillingMonth {
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if `month` is outside `1..=12` or
    /// `year` is before 2000.
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::Validation(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        if !(2000..=9999).contains(&year) {
            return Err(CoreError::Validation(format!(
                "year must be between 2000 and 9999, got {year}"
            )));
        }
        Ok(Self { year, month })
    }

    #[must_use]
    pub fn of(ts: DateTime<Utc>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
        }
    }

    #[must_use]
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    #[must_use]
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Half-open `[start, end)` bounds of the month, for range queries.
    #[must_use]
    pub fn bounds(self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.start(), self.next().start())
    }

    #[must_use]
    pub fn contains(self, ts: DateTime<Utc>) -> bool {
        Self::of(ts) == self
    }

    /// Month number as stored in `SMALLINT` columns.
    #[must_use]
    pub fn month_i16(self) -> i16 {
        // month is validated to 1..=12
        i16::try_from(self.month).unwrap_or(1)
    }

    /// Rebuild from `(year, month)` columns.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for an out-of-range month or year.
    pub fn from_columns(year: i32, month: i16) -> Result<Self, CoreError> {
        let month = u32::try_from(month).map_err(|_| {
            CoreError::Validation(format!("month must be between 1 and 12, got {month}"))
        })?;
        Self::new(year, month)
    }

    fn start(self) -> DateTime<Utc> {
        let date = NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default();
        Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
    }
}

impl std::fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for BillingMonth {
    type Err = CoreError;

    /// Parse `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidValue {
            kind: "BillingMonth",
            value: s.to_string(),
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_month_out_of_range() {
        assert!(BillingMonth::new(2025, 0).is_err());
        assert!(BillingMonth::new(2025, 13).is_err());
        assert!(BillingMonth::new(1999, 5).is_err());
        assert!(BillingMonth::new(2025, 7).is_ok());
    }

    #[test]
    fn previous_wraps_year() {
        let jan = BillingMonth::new(2025, 1).unwrap();
        assert_eq!(jan.previous(), BillingMonth::new(2024, 12).unwrap());
        assert_eq!(jan.previous().next(), jan);
    }

    #[test]
    fn bounds_are_half_open() {
        let july = BillingMonth::new(2025, 7).unwrap();
        let (start, end) = july.bounds();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap());
        assert!(july.contains(start));
        assert!(!july.contains(end));
    }

    #[test]
    fn december_bounds_roll_into_next_year() {
        let dec = BillingMonth::new(2024, 12).unwrap();
        let (_, end) = dec.bounds();
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn displays_as_year_dash_month() {
        assert_eq!(BillingMonth::new(2025, 7).unwrap().to_string(), "2025-07");
    }

    #[test]
    fn parses_year_dash_month() {
        let parsed: BillingMonth = "2025-07".parse().unwrap();
        assert_eq!(parsed, BillingMonth::new(2025, 7).unwrap());
        assert!("2025-13".parse::<BillingMonth>().is_err());
        assert!("July".parse::<BillingMonth>().is_err());
    }

    #[test]
    fn from_columns_rejects_negative_month() {
        assert!(BillingMonth::from_columns(2025, -1).is_err());
        assert_eq!(
            BillingMonth::from_columns(2025, 7).unwrap(),
            BillingMonth::new(2025, 7).unwrap()
        );
    }
}
