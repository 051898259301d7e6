//! Common Types Module
//!
//! Small validated newtypes shared across routes and services.

use std::fmt;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Calendar month in `YYYY-MM` form.
///
/// All ledger rows key their period on this format, so it is validated once
/// at the boundary and treated as opaque afterwards. Lexicographic order of
/// the string form matches chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month(String);

impl Month {
    pub fn parse(s: &str) -> Result<Self, String> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("invalid month format: {s}"))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(format!("invalid month format: {s}"));
        }
        year.parse::<i32>()
            .map_err(|_| format!("invalid year in month: {s}"))?;
        let m: u32 = month
            .parse()
            .map_err(|_| format!("invalid month number in: {s}"))?;
        if !(1..=12).contains(&m) {
            return Err(format!("month number out of range: {s}"));
        }
        Ok(Self(s.to_string()))
    }

    /// The current UTC month.
    pub fn current() -> Self {
        let now = Utc::now();
        Self(format!("{:04}-{:02}", now.year(), now.month()))
    }

    pub fn from_parts(year: i32, month: u32) -> Self {
        Self(format!("{year:04}-{month:02}"))
    }

    pub fn year(&self) -> i32 {
        self.0[..4].parse().unwrap_or(0)
    }

    /// Month number, 1-12.
    pub fn number(&self) -> u32 {
        self.0[5..7].parse().unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Month {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Month::parse(&s)
    }
}

impl From<Month> for String {
    fn from(m: Month) -> Self {
        m.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_valid() {
        let m = Month::parse("2026-03").unwrap();
        assert_eq!(m.year(), 2026);
        assert_eq!(m.number(), 3);
        assert_eq!(m.as_str(), "2026-03");
    }

    #[test]
    fn test_month_invalid() {
        assert!(Month::parse("2026-13").is_err());
        assert!(Month::parse("2026-00").is_err());
        assert!(Month::parse("2026-3").is_err());
        assert!(Month::parse("26-03").is_err());
        assert!(Month::parse("garbage").is_err());
    }

    #[test]
    fn test_month_ordering_is_chronological() {
        let a = Month::parse("2025-12").unwrap();
        let b = Month::parse("2026-01").unwrap();
        assert!(a < b);
    }
}
