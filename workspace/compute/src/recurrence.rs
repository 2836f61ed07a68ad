use chrono::{Datelike, Duration, NaiveDate, Weekday};
use model::entities::recurring_pattern::{self, Frequency};

use crate::error::{ComputeError, Result};

/// Returns the number of days in the given month, or `None` outside chrono's range.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = shift_month(year, month, 1);
    let first_day_next_month = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    first_day_next_month.pred_opt().map(|last| last.day())
}

/// Builds `year-month-day`, rounding `day` down to the last day of the month.
fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last))
}

fn shift_month(year: i32, month: u32, months: u32) -> (i32, u32) {
    let index = i64::from(year) * 12 + i64::from(month) - 1 + i64::from(months);
    (index.div_euclid(12) as i32, index.rem_euclid(12) as u32 + 1)
}

/// Maps a 0-6 day index (0 = Sunday) to a weekday.
pub fn weekday_from_index(index: i32) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// A recurrence rule compiled from a pattern's frequency and anchor fields.
///
/// Quarterly and yearly schedules anchor on the pattern's start date, so a
/// date that was clamped once (Nov 30 -> Feb 28) returns to the anchor day
/// on the following occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Daily,
    Weekly(Weekday),
    Biweekly,
    Monthly { day: u32 },
    Quarterly { day: u32 },
    Yearly { month: u32, day: u32 },
}

impl Schedule {
    /// Validates the anchor fields against the frequency and builds the schedule.
    ///
    /// Weekly requires `day_of_week`, monthly requires `day_of_month`, every
    /// other frequency takes neither.
    pub fn new(
        frequency: Frequency,
        start_date: NaiveDate,
        day_of_month: Option<i32>,
        day_of_week: Option<i32>,
    ) -> Result<Self> {
        match frequency {
            Frequency::Weekly => {
                if day_of_month.is_some() {
                    return Err(ComputeError::Validation(
                        "day_of_month must not be set for WEEKLY patterns".to_string(),
                    ));
                }
                let index = day_of_week.ok_or_else(|| {
                    ComputeError::Validation(
                        "day_of_week is required for WEEKLY patterns".to_string(),
                    )
                })?;
                let weekday = weekday_from_index(index).ok_or_else(|| {
                    ComputeError::Validation(format!(
                        "day_of_week must be between 0 and 6, got {}",
                        index
                    ))
                })?;
                Ok(Schedule::Weekly(weekday))
            }
            Frequency::Monthly => {
                if day_of_week.is_some() {
                    return Err(ComputeError::Validation(
                        "day_of_week must not be set for MONTHLY patterns".to_string(),
                    ));
                }
                let day = day_of_month.ok_or_else(|| {
                    ComputeError::Validation(
                        "day_of_month is required for MONTHLY patterns".to_string(),
                    )
                })?;
                if !(1..=31).contains(&day) {
                    return Err(ComputeError::Validation(format!(
                        "day_of_month must be between 1 and 31, got {}",
                        day
                    )));
                }
                Ok(Schedule::Monthly { day: day as u32 })
            }
            Frequency::Daily => {
                ensure_no_anchor(frequency, day_of_month, day_of_week)?;
                Ok(Schedule::Daily)
            }
            Frequency::Biweekly => {
                ensure_no_anchor(frequency, day_of_month, day_of_week)?;
                Ok(Schedule::Biweekly)
            }
            Frequency::Quarterly => {
                ensure_no_anchor(frequency, day_of_month, day_of_week)?;
                Ok(Schedule::Quarterly {
                    day: start_date.day(),
                })
            }
            Frequency::Yearly => {
                ensure_no_anchor(frequency, day_of_month, day_of_week)?;
                Ok(Schedule::Yearly {
                    month: start_date.month(),
                    day: start_date.day(),
                })
            }
        }
    }

    /// Compiles the rule stored on a pattern row.
    pub fn from_pattern(pattern: &recurring_pattern::Model) -> Result<Self> {
        Self::new(
            pattern.frequency,
            pattern.start_date,
            pattern.day_of_month,
            pattern.day_of_week,
        )
    }

    /// The first qualifying date at or after `start_date`.
    pub fn first_occurrence(&self, start_date: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Schedule::Weekly(weekday) => {
                let offset = (7 + weekday.num_days_from_monday() as i64
                    - start_date.weekday().num_days_from_monday() as i64)
                    % 7;
                start_date.checked_add_signed(Duration::days(offset))
            }
            Schedule::Monthly { day } => {
                let candidate = clamped_date(start_date.year(), start_date.month(), day)?;
                if candidate >= start_date {
                    Some(candidate)
                } else {
                    self.next_occurrence(candidate)
                }
            }
            Schedule::Daily
            | Schedule::Biweekly
            | Schedule::Quarterly { .. }
            | Schedule::Yearly { .. } => Some(start_date),
        }
    }

    /// The first occurrence of a rule starting on `start_date` that falls at or after `from`.
    pub fn first_on_or_after(&self, start_date: NaiveDate, from: NaiveDate) -> Option<NaiveDate> {
        self.occurrences_from(self.first_occurrence(start_date)?)
            .find(|date| *date >= from)
    }

    /// The occurrence following `current`. `None` only when chrono's date range is exhausted.
    pub fn next_occurrence(&self, current: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Schedule::Daily => current.checked_add_signed(Duration::days(1)),
            Schedule::Weekly(_) => current.checked_add_signed(Duration::days(7)),
            Schedule::Biweekly => current.checked_add_signed(Duration::days(14)),
            Schedule::Monthly { day } => {
                let (year, month) = shift_month(current.year(), current.month(), 1);
                clamped_date(year, month, day)
            }
            Schedule::Quarterly { day } => {
                let (year, month) = shift_month(current.year(), current.month(), 3);
                clamped_date(year, month, day)
            }
            Schedule::Yearly { month, day } => clamped_date(current.year() + 1, month, day),
        }
    }

    /// Steps forward from `current` at least once, until the date is strictly after `as_of`.
    pub fn advance_past(&self, current: NaiveDate, as_of: NaiveDate) -> Option<NaiveDate> {
        let mut next = self.next_occurrence(current)?;
        while next <= as_of {
            next = self.next_occurrence(next)?;
        }
        Some(next)
    }

    /// Iterates occurrences starting with `first` itself.
    pub fn occurrences_from(&self, first: NaiveDate) -> Occurrences {
        Occurrences {
            schedule: *self,
            next: Some(first),
        }
    }

    /// Up to `count` occurrences starting at `from`, stopping after `end_date`.
    pub fn upcoming(
        &self,
        from: NaiveDate,
        end_date: Option<NaiveDate>,
        count: usize,
    ) -> Vec<NaiveDate> {
        self.occurrences_from(from)
            .take_while(|date| end_date.is_none_or(|end| *date <= end))
            .take(count)
            .collect()
    }
}

fn ensure_no_anchor(
    frequency: Frequency,
    day_of_month: Option<i32>,
    day_of_week: Option<i32>,
) -> Result<()> {
    if day_of_month.is_some() || day_of_week.is_some() {
        return Err(ComputeError::Validation(format!(
            "{} patterns take neither day_of_month nor day_of_week",
            frequency
        )));
    }
    Ok(())
}

/// Iterator over the occurrences of a schedule.
#[derive(Debug, Clone)]
pub struct Occurrences {
    schedule: Schedule,
    next: Option<NaiveDate>,
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = self.schedule.next_occurrence(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2023, 1), Some(31));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(1900, 2), Some(28));
        assert_eq!(days_in_month(2000, 2), Some(29));
        assert_eq!(days_in_month(2023, 4), Some(30));
        assert_eq!(days_in_month(2023, 12), Some(31));
    }

    #[test]
    fn test_monthly_day_31_clamps_in_february() {
        let schedule = Schedule::Monthly { day: 31 };
        for year in 1999..=2032 {
            let next = schedule.next_occurrence(date(year, 1, 31)).unwrap();
            assert_eq!(next.month(), 2, "year {}", year);
            assert_eq!(next.day(), days_in_month(year, 2).unwrap(), "year {}", year);
        }
    }

    #[test]
    fn test_monthly_returns_to_anchor_after_clamping() {
        let schedule = Schedule::Monthly { day: 31 };
        let dates: Vec<NaiveDate> = schedule.occurrences_from(date(2024, 1, 31)).take(5).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 31),
                date(2024, 2, 29),
                date(2024, 3, 31),
                date(2024, 4, 30),
                date(2024, 5, 31),
            ]
        );
    }

    #[test]
    fn test_monthly_crosses_year_boundary() {
        let schedule = Schedule::Monthly { day: 15 };
        assert_eq!(schedule.next_occurrence(date(2023, 12, 15)), Some(date(2024, 1, 15)));
    }

    #[test]
    fn test_weekly_monday_sequence() {
        let schedule = Schedule::new(Frequency::Weekly, date(2024, 1, 1), None, Some(1)).unwrap();
        let first = schedule.first_occurrence(date(2024, 1, 1)).unwrap();
        let dates: Vec<NaiveDate> = schedule.occurrences_from(first).take(5).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 8),
                date(2024, 1, 15),
                date(2024, 1, 22),
                date(2024, 1, 29),
            ]
        );
    }

    #[test]
    fn test_weekly_first_occurrence_moves_to_anchor_weekday() {
        // 2024-01-03 is a Wednesday; Sunday is index 0.
        let schedule = Schedule::new(Frequency::Weekly, date(2024, 1, 3), None, Some(0)).unwrap();
        assert_eq!(schedule.first_occurrence(date(2024, 1, 3)), Some(date(2024, 1, 7)));

        let friday = Schedule::new(Frequency::Weekly, date(2024, 1, 3), None, Some(5)).unwrap();
        assert_eq!(friday.first_occurrence(date(2024, 1, 3)), Some(date(2024, 1, 5)));
        assert_eq!(friday.next_occurrence(date(2024, 1, 5)).unwrap().weekday(), Weekday::Fri);
    }

    #[test]
    fn test_monthly_first_occurrence() {
        let schedule = Schedule::Monthly { day: 15 };
        assert_eq!(schedule.first_occurrence(date(2024, 1, 10)), Some(date(2024, 1, 15)));
        assert_eq!(schedule.first_occurrence(date(2024, 1, 15)), Some(date(2024, 1, 15)));
        assert_eq!(schedule.first_occurrence(date(2024, 1, 20)), Some(date(2024, 2, 15)));

        let end_of_month = Schedule::Monthly { day: 31 };
        assert_eq!(end_of_month.first_occurrence(date(2024, 2, 10)), Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_yearly_leap_day_clamps() {
        let schedule = Schedule::new(Frequency::Yearly, date(2024, 2, 29), None, None).unwrap();
        let dates: Vec<NaiveDate> = schedule.occurrences_from(date(2024, 2, 29)).take(5).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 2, 29),
                date(2025, 2, 28),
                date(2026, 2, 28),
                date(2027, 2, 28),
                date(2028, 2, 29),
            ]
        );
    }

    #[test]
    fn test_quarterly_keeps_start_day() {
        let schedule = Schedule::new(Frequency::Quarterly, date(2023, 11, 30), None, None).unwrap();
        let dates: Vec<NaiveDate> = schedule.occurrences_from(date(2023, 11, 30)).take(4).collect();
        assert_eq!(
            dates,
            vec![
                date(2023, 11, 30),
                date(2024, 2, 29),
                date(2024, 5, 30),
                date(2024, 8, 30),
            ]
        );
    }

    #[test]
    fn test_fixed_interval_schedules() {
        assert_eq!(Schedule::Daily.next_occurrence(date(2024, 2, 28)), Some(date(2024, 2, 29)));
        assert_eq!(Schedule::Biweekly.next_occurrence(date(2024, 12, 25)), Some(date(2025, 1, 8)));
        assert_eq!(
            Schedule::Weekly(Weekday::Tue).next_occurrence(date(2024, 12, 31)),
            Some(date(2025, 1, 7))
        );
    }

    #[test]
    fn test_occurrences_are_strictly_increasing() {
        let schedules = [
            Schedule::Daily,
            Schedule::Weekly(Weekday::Thu),
            Schedule::Biweekly,
            Schedule::Monthly { day: 31 },
            Schedule::Monthly { day: 29 },
            Schedule::Quarterly { day: 31 },
            Schedule::Yearly { month: 2, day: 29 },
        ];
        for schedule in schedules {
            let dates: Vec<NaiveDate> = schedule.occurrences_from(date(2023, 1, 31)).take(200).collect();
            assert_eq!(dates.len(), 200);
            for pair in dates.windows(2) {
                assert!(pair[0] < pair[1], "{:?}: {} !< {}", schedule, pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn test_advance_past_skips_missed_occurrences() {
        let schedule = Schedule::Monthly { day: 1 };
        assert_eq!(
            schedule.advance_past(date(2024, 1, 1), date(2024, 1, 1)),
            Some(date(2024, 2, 1))
        );
        assert_eq!(
            schedule.advance_past(date(2024, 1, 1), date(2024, 4, 15)),
            Some(date(2024, 5, 1))
        );
        // Not yet due: still advances exactly one period.
        assert_eq!(
            schedule.advance_past(date(2024, 6, 1), date(2024, 1, 1)),
            Some(date(2024, 7, 1))
        );
    }

    #[test]
    fn test_first_on_or_after() {
        let schedule = Schedule::new(Frequency::Quarterly, date(2024, 1, 31), None, None).unwrap();
        assert_eq!(
            schedule.first_on_or_after(date(2024, 1, 31), date(2024, 3, 1)),
            Some(date(2024, 4, 30))
        );
        assert_eq!(
            schedule.first_on_or_after(date(2024, 1, 31), date(2023, 1, 1)),
            Some(date(2024, 1, 31))
        );
    }

    #[test]
    fn test_upcoming_stops_at_end_date() {
        let schedule = Schedule::Biweekly;
        assert_eq!(
            schedule.upcoming(date(2024, 1, 1), Some(date(2024, 1, 29)), 10),
            vec![date(2024, 1, 1), date(2024, 1, 15), date(2024, 1, 29)]
        );
        assert_eq!(schedule.upcoming(date(2024, 1, 1), None, 2).len(), 2);
    }

    #[test]
    fn test_anchor_validation() {
        let start = date(2024, 1, 1);

        let err = Schedule::new(Frequency::Monthly, start, None, None).unwrap_err();
        assert!(err.to_string().contains("day_of_month is required"));

        let err = Schedule::new(Frequency::Weekly, start, None, None).unwrap_err();
        assert!(err.to_string().contains("day_of_week is required"));

        assert!(Schedule::new(Frequency::Weekly, start, Some(3), Some(1)).is_err());
        assert!(Schedule::new(Frequency::Monthly, start, Some(3), Some(1)).is_err());
        assert!(Schedule::new(Frequency::Daily, start, Some(3), None).is_err());
        assert!(Schedule::new(Frequency::Yearly, start, None, Some(2)).is_err());
        assert!(Schedule::new(Frequency::Weekly, start, None, Some(7)).is_err());
        assert!(Schedule::new(Frequency::Monthly, start, Some(0), None).is_err());
        assert!(Schedule::new(Frequency::Monthly, start, Some(32), None).is_err());

        assert_eq!(
            Schedule::new(Frequency::Monthly, start, Some(31), None).unwrap(),
            Schedule::Monthly { day: 31 }
        );
        assert_eq!(
            Schedule::new(Frequency::Weekly, start, None, Some(6)).unwrap(),
            Schedule::Weekly(Weekday::Sat)
        );
    }
}
