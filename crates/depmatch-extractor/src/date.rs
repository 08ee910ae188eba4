//! Spanish long-form dates ("24 de junio de 1987")

use chrono::NaiveDate;

use depmatch_core::{DepmatchError, Result};

/// Month names in calendar order
pub const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Month number (1-12) for a Spanish month name, case-insensitive.
/// Accepts the archaic spelling "setiembre".
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    if name == "setiembre" {
        return Some(9);
    }

    SPANISH_MONTHS
        .iter()
        .position(|month| *month == name)
        .map(|position| position as u32 + 1)
}

/// Parse `<day> de <month> de <year>`.
///
/// Returns `Ok(None)` when the month name is not recognised, and an
/// `InvalidDate` error when the text does not have that shape, the numbers
/// do not parse, or the day does not exist in that month.
pub fn parse_spanish_date(text: &str) -> Result<Option<NaiveDate>> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let [day, de_1, month, de_2, year] = parts.as_slice() else {
        return Err(DepmatchError::InvalidDate(format!(
            "expected '<day> de <month> de <year>', got '{text}'"
        )));
    };

    if !de_1.eq_ignore_ascii_case("de") || !de_2.eq_ignore_ascii_case("de") {
        return Err(DepmatchError::InvalidDate(format!(
            "expected '<day> de <month> de <year>', got '{text}'"
        )));
    }

    let day: u32 = day
        .parse()
        .map_err(|_| DepmatchError::InvalidDate(format!("invalid day '{day}' in '{text}'")))?;
    let year: i32 = year
        .parse()
        .map_err(|_| DepmatchError::InvalidDate(format!("invalid year '{year}' in '{text}'")))?;

    let Some(month) = month_number(month) else {
        return Ok(None);
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or_else(|| DepmatchError::InvalidDate(format!("no such calendar date: '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use proptest::prelude::*;

    #[test]
    fn test_parse_full_date() {
        assert_eq!(
            parse_spanish_date("24 de junio de 1987").unwrap(),
            NaiveDate::from_ymd_opt(1987, 6, 24)
        );
    }

    #[test]
    fn test_archaic_september() {
        assert_eq!(
            parse_spanish_date("1 de setiembre de 1930").unwrap(),
            NaiveDate::from_ymd_opt(1930, 9, 1)
        );
        assert_eq!(month_number("Setiembre"), Some(9));
        assert_eq!(month_number("SEPTIEMBRE"), Some(9));
    }

    #[test]
    fn test_month_is_case_insensitive() {
        assert_eq!(
            parse_spanish_date("10 de Enero de 2011").unwrap(),
            NaiveDate::from_ymd_opt(2011, 1, 10)
        );
    }

    #[test]
    fn test_unknown_month_is_absent() {
        assert_eq!(parse_spanish_date("3 de brumario de 1799").unwrap(), None);
    }

    #[test]
    fn test_impossible_day_is_error() {
        assert!(matches!(
            parse_spanish_date("31 de febrero de 1990"),
            Err(DepmatchError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_malformed_shape_is_error() {
        assert!(parse_spanish_date("junio de 1987").is_err());
        assert!(parse_spanish_date("veinte de junio de 1987").is_err());
        assert!(parse_spanish_date("24 del junio de 1987").is_err());
    }

    proptest! {
        #[test]
        fn prop_valid_dates_parse(days in 0i64..100_000) {
            let date = NaiveDate::from_ymd_opt(1800, 1, 1).unwrap() + chrono::Duration::days(days);
            let text = format!(
                "{} de {} de {}",
                date.day(),
                SPANISH_MONTHS[date.month0() as usize],
                date.year()
            );
            prop_assert_eq!(parse_spanish_date(&text).unwrap(), Some(date));
        }
    }
}
