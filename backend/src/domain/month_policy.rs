//! Month range policy for the subscription ledger.
//!
//! Single source of truth for which months are billable and how month tokens
//! are parsed, validated and displayed. The billable window runs from the
//! fixed subscription start month through the current wall-clock month, so it
//! grows by one token whenever the calendar month advances. The wall clock is
//! injected through the `Clock` trait so tests can pin "now" and assert exact
//! outputs.

use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

/// First billable month of the subscription scheme
pub const SUBSCRIPTION_START_MONTH: &str = "2025-07";

const SUBSCRIPTION_START: (i32, u32) = (2025, 7);

/// Source of the current date, injectable for deterministic tests
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation used in production
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Clock pinned to a fixed date for tests
#[cfg(test)]
pub struct FixedClock(pub NaiveDate);

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Parse a YYYY-MM token into (year, month). Strict: four-digit year,
/// two-digit month, month in 1..=12.
pub fn parse_month_token(token: &str) -> Option<(i32, u32)> {
    let (year_str, month_str) = token.split_once('-')?;
    if year_str.len() != 4 || month_str.len() != 2 {
        return None;
    }
    if !year_str.bytes().all(|b| b.is_ascii_digit()) || !month_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year_str.parse().ok()?;
    let month: u32 = month_str.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

/// Render a month token as a human-readable "Month Year" string.
///
/// Purely presentational; falls back to the raw token if it does not parse.
pub fn format_month(token: &str) -> String {
    match parse_month_token(token).and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1)) {
        Some(date) => date.format("%B %Y").to_string(),
        None => token.to_string(),
    }
}

/// Policy over the active month window `[subscription start, current month]`
#[derive(Clone)]
pub struct MonthPolicy {
    clock: Arc<dyn Clock>,
}

impl MonthPolicy {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Policy driven by the system wall clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Month token for the current wall-clock date
    pub fn current_month(&self) -> String {
        let today = self.clock.today();
        format!("{:04}-{:02}", today.year(), today.month())
    }

    /// Ordered chronological month tokens from the subscription start through
    /// the current month inclusive. Empty when the clock is before the start.
    pub fn active_months(&self) -> Vec<String> {
        let today = self.clock.today();
        let (now_year, now_month) = (today.year(), today.month());
        let (mut year, mut month) = SUBSCRIPTION_START;

        let mut months = Vec::new();
        while (year, month) <= (now_year, now_month) {
            months.push(format!("{:04}-{:02}", year, month));
            month += 1;
            if month > 12 {
                month = 1;
                year += 1;
            }
        }
        months
    }

    /// True iff the token parses as YYYY-MM and lies within the active
    /// window. Validity depends on when the check runs: the window is
    /// real-time, so a future month becomes valid once the clock reaches it.
    pub fn is_valid_month(&self, token: &str) -> bool {
        let Some(parsed) = parse_month_token(token) else {
            return false;
        };
        let today = self.clock.today();
        parsed >= SUBSCRIPTION_START && parsed <= (today.year(), today.month())
    }

    pub fn is_current_month(&self, token: &str) -> bool {
        token == self.current_month()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_at(year: i32, month: u32, day: u32) -> MonthPolicy {
        let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid test date");
        MonthPolicy::new(Arc::new(FixedClock(date)))
    }

    #[test]
    fn test_parse_month_token() {
        assert_eq!(parse_month_token("2025-07"), Some((2025, 7)));
        assert_eq!(parse_month_token("2026-12"), Some((2026, 12)));
        assert_eq!(parse_month_token("2025-13"), None);
        assert_eq!(parse_month_token("2025-00"), None);
        assert_eq!(parse_month_token("2025-7"), None);
        assert_eq!(parse_month_token("25-07"), None);
        assert_eq!(parse_month_token("2025/07"), None);
        assert_eq!(parse_month_token("garbage"), None);
        assert_eq!(parse_month_token("2025-07-01"), None);
    }

    #[test]
    fn test_active_months_spanning_three_months() {
        let policy = policy_at(2025, 9, 15);
        assert_eq!(policy.active_months(), vec!["2025-07", "2025-08", "2025-09"]);
    }

    #[test]
    fn test_active_months_crosses_year_boundary() {
        let policy = policy_at(2026, 2, 1);
        let months = policy.active_months();
        assert_eq!(months.len(), 8);
        assert_eq!(months.first().map(String::as_str), Some("2025-07"));
        assert!(months.contains(&"2025-12".to_string()));
        assert!(months.contains(&"2026-01".to_string()));
        assert_eq!(months.last().map(String::as_str), Some("2026-02"));
    }

    #[test]
    fn test_active_months_empty_before_subscription_start() {
        let policy = policy_at(2025, 6, 30);
        assert!(policy.active_months().is_empty());
        assert!(!policy.is_valid_month("2025-07"));
        assert!(!policy.is_valid_month("2025-06"));
    }

    #[test]
    fn test_active_months_single_month_at_start() {
        let policy = policy_at(2025, 7, 1);
        assert_eq!(policy.active_months(), vec!["2025-07"]);
    }

    #[test]
    fn test_current_month() {
        let policy = policy_at(2025, 9, 15);
        assert_eq!(policy.current_month(), "2025-09");
        assert!(policy.is_current_month("2025-09"));
        assert!(!policy.is_current_month("2025-08"));
    }

    #[test]
    fn test_is_valid_month_window_bounds() {
        let policy = policy_at(2025, 9, 15);

        assert!(policy.is_valid_month("2025-07"));
        assert!(policy.is_valid_month("2025-08"));
        assert!(policy.is_valid_month("2025-09"));

        // Before the subscription start
        assert!(!policy.is_valid_month("2025-06"));
        assert!(!policy.is_valid_month("2024-12"));
        // In the future
        assert!(!policy.is_valid_month("2025-10"));
        assert!(!policy.is_valid_month("2026-01"));
        // Malformed
        assert!(!policy.is_valid_month("2025-9"));
        assert!(!policy.is_valid_month(""));
    }

    #[test]
    fn test_format_month() {
        assert_eq!(format_month("2025-07"), "July 2025");
        assert_eq!(format_month("2026-01"), "January 2026");
        // Presentation only; unparseable tokens pass through
        assert_eq!(format_month("not-a-month"), "not-a-month");
    }
}
