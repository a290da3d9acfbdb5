//! Domain constants shared by the engines.

use chrono::NaiveDate;

/// Sentinel `target_date` marking routine templates.
///
/// Template rows are never shown in any date-scoped view; they exist solely
/// as materialization sources.
pub const TEMPLATE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1000, 1, 1) {
    Some(d) => d,
    None => panic!("template sentinel date must be valid"),
};

/// XP awarded when a task transitions to done.
pub const XP_PER_COMPLETION: i64 = 10;

/// XP required per level: the threshold for level `n` is `n * XP_LEVEL_STEP`.
pub const XP_LEVEL_STEP: i64 = 100;

/// Maximum records scheduled on one date before promotion is refused.
pub const DAILY_CAPACITY: u64 = 15;

/// Maximum empty-text drafts allowed before further adds are refused.
pub const MAX_EMPTY_DRAFTS: usize = 3;

/// Minimum project name length (after trimming).
pub const PROJECT_NAME_MIN: usize = 3;

/// Maximum project name length.
pub const PROJECT_NAME_MAX: usize = 50;

/// Maximum backlog item text length.
pub const BACKLOG_TEXT_MAX: usize = 200;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_date_is_the_sentinel() {
        assert_eq!(TEMPLATE_DATE.to_string(), "1000-01-01");
    }

    #[test]
    fn template_date_precedes_any_real_date() {
        let earliest_real: NaiveDate = "1900-01-01".parse().unwrap();
        assert!(TEMPLATE_DATE < earliest_real);
    }
}
