//! Semi-monthly due dates: every installment falls on the 15th or on the last
//! calendar day of a month, alternating.

use chrono::{Datelike, Duration, NaiveDate};

/// the mid-month pay day
pub const MID_MONTH_DAY: u32 = 15;

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

/// last calendar day of the date's month
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let last = days_in_month(date.year(), date.month());
    date + Duration::days(i64::from(last) - i64::from(date.day()))
}

pub fn is_end_of_month(date: NaiveDate) -> bool {
    date.day() == days_in_month(date.year(), date.month())
}

/// whether the date is already one of the two pay days of its month
pub fn is_pay_day(date: NaiveDate) -> bool {
    date.day() == MID_MONTH_DAY || is_end_of_month(date)
}

/// snap to the 15th when on or before it, to month end otherwise
fn snap_to_pay_day(date: NaiveDate) -> NaiveDate {
    if date.day() <= MID_MONTH_DAY {
        date + Duration::days(i64::from(MID_MONTH_DAY) - i64::from(date.day()))
    } else {
        end_of_month(date)
    }
}

/// bring an arbitrary first due date onto the 15th/month-end pattern
pub fn normalize_start(date: NaiveDate) -> NaiveDate {
    if is_pay_day(date) {
        date
    } else {
        snap_to_pay_day(date)
    }
}

/// the pay day following `date`
///
/// 15th -> end of the same month, end of month -> 15th of the next month.
/// Dates off the pattern are snapped like [`normalize_start`].
pub fn next_due_date(date: NaiveDate) -> NaiveDate {
    if date.day() == MID_MONTH_DAY {
        end_of_month(date)
    } else if is_end_of_month(date) {
        // the day after month end is the 1st, so the 15th is fifteen days on
        date + Duration::days(i64::from(MID_MONTH_DAY))
    } else {
        snap_to_pay_day(date)
    }
}

/// finite iterator over consecutive due dates
#[derive(Debug, Clone)]
pub struct DueDates {
    next: NaiveDate,
    remaining: u32,
}

impl Iterator for DueDates {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.next = next_due_date(current);
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for DueDates {}

/// exactly `count` due dates starting at the normalized `start`
pub fn sequence(start: NaiveDate, count: u32) -> DueDates {
    DueDates {
        next: normalize_start(start),
        remaining: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_end_of_month_handles_leap_years() {
        assert_eq!(end_of_month(date(2024, 2, 3)), date(2024, 2, 29));
        assert_eq!(end_of_month(date(2023, 2, 3)), date(2023, 2, 28));
        assert_eq!(end_of_month(date(1900, 2, 1)), date(1900, 2, 28));
        assert_eq!(end_of_month(date(2000, 2, 1)), date(2000, 2, 29));
        assert_eq!(end_of_month(date(2024, 4, 30)), date(2024, 4, 30));
        assert_eq!(end_of_month(date(2024, 12, 16)), date(2024, 12, 31));
    }

    #[test]
    fn test_normalize_start() {
        assert_eq!(normalize_start(date(2024, 1, 10)), date(2024, 1, 15));
        assert_eq!(normalize_start(date(2024, 1, 1)), date(2024, 1, 15));
        assert_eq!(normalize_start(date(2024, 1, 15)), date(2024, 1, 15));
        assert_eq!(normalize_start(date(2024, 1, 16)), date(2024, 1, 31));
        assert_eq!(normalize_start(date(2024, 2, 29)), date(2024, 2, 29));
        assert_eq!(normalize_start(date(2023, 2, 28)), date(2023, 2, 28));
        assert_eq!(normalize_start(date(2024, 2, 28)), date(2024, 2, 29));
    }

    #[test]
    fn test_normalize_start_is_idempotent() {
        let mut d = date(2023, 1, 1);
        while d < date(2025, 1, 1) {
            let once = normalize_start(d);
            assert_eq!(normalize_start(once), once, "not idempotent for {}", d);
            assert!(is_pay_day(once));
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_next_due_date() {
        assert_eq!(next_due_date(date(2024, 1, 15)), date(2024, 1, 31));
        assert_eq!(next_due_date(date(2024, 1, 31)), date(2024, 2, 15));
        assert_eq!(next_due_date(date(2024, 2, 15)), date(2024, 2, 29));
        assert_eq!(next_due_date(date(2024, 2, 29)), date(2024, 3, 15));
        assert_eq!(next_due_date(date(2024, 12, 31)), date(2025, 1, 15));
        assert_eq!(next_due_date(date(2024, 4, 30)), date(2024, 5, 15));
    }

    #[test]
    fn test_next_due_date_snaps_off_pattern_dates() {
        assert_eq!(next_due_date(date(2024, 3, 3)), date(2024, 3, 15));
        assert_eq!(next_due_date(date(2024, 3, 20)), date(2024, 3, 31));
    }

    #[test]
    fn test_sequence_from_arbitrary_start() {
        let dates: Vec<_> = sequence(date(2024, 1, 10), 11).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 15),
                date(2024, 1, 31),
                date(2024, 2, 15),
                date(2024, 2, 29),
                date(2024, 3, 15),
                date(2024, 3, 31),
                date(2024, 4, 15),
                date(2024, 4, 30),
                date(2024, 5, 15),
                date(2024, 5, 31),
                date(2024, 6, 15),
            ]
        );
    }

    #[test]
    fn test_sequence_alternates_without_repeats() {
        let dates: Vec<_> = sequence(date(2024, 11, 15), 24).collect();
        assert_eq!(dates.len(), 24);

        for (i, d) in dates.iter().enumerate() {
            if i % 2 == 0 {
                assert_eq!(d.day(), MID_MONTH_DAY);
            } else {
                assert!(is_end_of_month(*d));
            }
        }
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(dates[3], date(2024, 12, 31));
        assert_eq!(dates[4], date(2025, 1, 15));
    }

    #[test]
    fn test_sequence_length() {
        assert_eq!(sequence(date(2024, 5, 31), 0).count(), 0);
        assert_eq!(sequence(date(2024, 5, 31), 1).collect::<Vec<_>>(), vec![date(2024, 5, 31)]);
        assert_eq!(sequence(date(2024, 5, 31), 7).len(), 7);
    }
}
