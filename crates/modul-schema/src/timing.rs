//! Time-allocation audit.
//!
//! The generator is asked to make activity durations add up to the form's
//! budget, but nothing guarantees it did. The audit parses every duration
//! string, compares per-meeting and overall sums with the budget, and
//! reports mismatches. It never rewrites the document.

use lazy_static::lazy_static;
use modul_core::{AdapterWarning, TimeBudget};
use regex::Regex;

lazy_static! {
    /// "2 x 45 menit", "2×45 menit"
    static ref PRODUCT: Regex = Regex::new(r"(?i)(\d+)\s*[x×]\s*(\d+)\s*(?:menit|mnt)").unwrap();

    /// "15 menit", "2 JP", "1 jam"
    static ref AMOUNT: Regex = Regex::new(r"(?i)(\d+)\s*(menit|mnt|jp|jam)\b").unwrap();

    static ref BARE_NUMBER: Regex = Regex::new(r"^\s*(\d+)\s*'?\s*$").unwrap();
}

/// Minutes stated in a duration string, if any.
///
/// JP converts with the budget's minutes per lesson hour; "jam" is a clock hour.
pub fn parse_minutes(text: &str, minutes_per_hour: u32) -> Option<u32> {
    if let Some(caps) = PRODUCT.captures(text) {
        let a: u32 = caps[1].parse().ok()?;
        let b: u32 = caps[2].parse().ok()?;
        return a.checked_mul(b);
    }

    let mut total: Option<u32> = None;
    for caps in AMOUNT.captures_iter(text) {
        let n: u32 = caps[1].parse().ok()?;
        let minutes = match caps[2].to_ascii_lowercase().as_str() {
            "jp" => n.checked_mul(minutes_per_hour)?,
            "jam" => n.checked_mul(60)?,
            _ => n,
        };
        total = Some(total.unwrap_or(0).checked_add(minutes)?);
    }
    if total.is_some() {
        return total;
    }

    BARE_NUMBER
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Compare meeting count and durations with the budget.
///
/// `meetings` holds the duration strings of each meeting in order.
pub fn audit(meetings: &[Vec<&str>], budget: &TimeBudget) -> Vec<AdapterWarning> {
    let mut warnings = Vec::new();

    if meetings.len() != budget.meetings as usize {
        warnings.push(AdapterWarning::MeetingCountMismatch {
            expected: budget.meetings,
            actual: meetings.len() as u32,
        });
    }

    let mut overall = 0u32;
    let mut any_parsed = false;
    for (i, durations) in meetings.iter().enumerate() {
        let parsed: Vec<u32> = durations
            .iter()
            .filter_map(|d| parse_minutes(d, budget.minutes_per_hour))
            .collect();
        if parsed.is_empty() {
            continue;
        }
        any_parsed = true;

        // absurd durations saturate and are reported as a mismatch
        let sum = parsed.iter().fold(0u32, |acc, m| acc.saturating_add(*m));
        overall = overall.saturating_add(sum);
        if sum != budget.minutes_per_meeting() {
            warnings.push(AdapterWarning::TimeAllocationMismatch {
                scope: format!("Pertemuan {}", i + 1),
                expected: budget.minutes_per_meeting(),
                actual: sum,
            });
        }
    }

    if any_parsed && overall != budget.total_minutes() {
        warnings.push(AdapterWarning::TimeAllocationMismatch {
            scope: "Total".to_string(),
            expected: budget.total_minutes(),
            actual: overall,
        });
    }

    warnings
}
