use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

/// saturday or sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// advance `days` business days; weekend days are skipped and not counted
///
/// `None` when the result falls outside the supported date range
pub fn add_business_days(start: NaiveDate, days: u32) -> Option<NaiveDate> {
    if days == 0 {
        return Some(start);
    }

    // from a weekend, counting starts as if from the friday before
    let mut current = match start.weekday() {
        Weekday::Sat => start.pred_opt()?,
        Weekday::Sun => start.pred_opt()?.pred_opt()?,
        _ => start,
    };

    // every five business days are exactly one calendar week
    current = current.checked_add_days(Days::new(u64::from(days / 5) * 7))?;

    let mut remaining = days % 5;
    while remaining > 0 {
        current = current.succ_opt()?;
        if !is_weekend(current) {
            remaining -= 1;
        }
    }
    Some(current)
}

/// first date strictly after `date` that falls on `weekday`
pub fn next_weekday_after(date: NaiveDate, weekday: Weekday) -> Option<NaiveDate> {
    let ahead = (weekday.num_days_from_monday() + 7 - date.weekday().num_days_from_monday()) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    date.checked_add_days(Days::new(u64::from(ahead)))
}

/// add calendar months, clamping to the last day of shorter months
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// add whole weeks
pub fn add_weeks(date: NaiveDate, weeks: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(weeks) * 7))
}

/// spanish display name
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Lunes",
        Weekday::Tue => "Martes",
        Weekday::Wed => "Miércoles",
        Weekday::Thu => "Jueves",
        Weekday::Fri => "Viernes",
        Weekday::Sat => "Sábado",
        Weekday::Sun => "Domingo",
    }
}

/// parse a weekday name in spanish or english; accents and case are ignored
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    let folded: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        })
        .collect();

    match folded.as_str() {
        "lunes" | "monday" | "mon" => Some(Weekday::Mon),
        "martes" | "tuesday" | "tue" => Some(Weekday::Tue),
        "miercoles" | "wednesday" | "wed" => Some(Weekday::Wed),
        "jueves" | "thursday" | "thu" => Some(Weekday::Thu),
        "viernes" | "friday" | "fri" => Some(Weekday::Fri),
        "sabado" | "saturday" | "sat" => Some(Weekday::Sat),
        "domingo" | "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_business_days_skip_weekend() {
        // saturday start, weekend does not count
        assert_eq!(add_business_days(date(2025, 1, 4), 4), Some(date(2025, 1, 9)));
        assert_eq!(add_business_days(date(2025, 1, 4), 5), Some(date(2025, 1, 10)));
        assert_eq!(add_business_days(date(2025, 1, 5), 1), Some(date(2025, 1, 6)));
        // friday + 1 lands on monday
        assert_eq!(add_business_days(date(2025, 1, 3), 1), Some(date(2025, 1, 6)));
        assert_eq!(add_business_days(date(2025, 1, 3), 0), Some(date(2025, 1, 3)));
        assert_eq!(add_business_days(date(2025, 1, 4), 0), Some(date(2025, 1, 4)));
        // two full weeks
        assert_eq!(add_business_days(date(2025, 1, 6), 10), Some(date(2025, 1, 20)));
        // wednesday + 7 crosses one weekend
        assert_eq!(add_business_days(date(2025, 1, 15), 7), Some(date(2025, 1, 24)));
    }

    #[test]
    fn test_business_days_match_day_by_day_count() {
        for start_day in 1..=14 {
            let start = date(2025, 3, start_day);
            let mut expected = start;
            for days in 0..=25 {
                assert_eq!(add_business_days(start, days), Some(expected), "{} + {}", start, days);
                expected = expected.succ_opt().unwrap();
                while is_weekend(expected) {
                    expected = expected.succ_opt().unwrap();
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_dates_are_none() {
        let start = date(2025, 1, 15);
        assert_eq!(add_business_days(start, u32::MAX), None);
        assert_eq!(add_weeks(start, 20_000_000), None);
        assert_eq!(add_months(start, u32::MAX), None);
        assert_eq!(next_weekday_after(NaiveDate::MAX, Weekday::Mon), None);
        assert_eq!(add_weeks(start, 2), Some(date(2025, 1, 29)));
    }

    #[test]
    fn test_next_weekday_is_strictly_after() {
        // 2025-01-15 is a wednesday
        assert_eq!(next_weekday_after(date(2025, 1, 15), Weekday::Wed), Some(date(2025, 1, 22)));
        assert_eq!(next_weekday_after(date(2025, 1, 15), Weekday::Thu), Some(date(2025, 1, 16)));
        assert_eq!(next_weekday_after(date(2025, 1, 15), Weekday::Mon), Some(date(2025, 1, 20)));
    }

    #[test]
    fn test_add_months_clamps() {
        assert_eq!(add_months(date(2025, 1, 31), 1), Some(date(2025, 2, 28)));
        assert_eq!(add_months(date(2024, 1, 31), 1), Some(date(2024, 2, 29)));
        assert_eq!(add_months(date(2025, 2, 15), 2), Some(date(2025, 4, 15)));
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(parse_weekday("Miércoles"), Some(Weekday::Wed));
        assert_eq!(parse_weekday("miercoles"), Some(Weekday::Wed));
        assert_eq!(parse_weekday("SÁBADO"), Some(Weekday::Sat));
        assert_eq!(parse_weekday("Friday"), Some(Weekday::Fri));
        assert_eq!(parse_weekday(""), None);

        for day in [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri, Weekday::Sat, Weekday::Sun] {
            assert_eq!(parse_weekday(weekday_label(day)), Some(day));
        }
    }
}
