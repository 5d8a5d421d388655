//! Normalization of knowledge-service date claims into comparable,
//! human-readable forms.
//!
//! Claims arrive in one of three granularities: year (`YYYY`), year-month
//! (`YYYY-MM`) or full date (`YYYY-MM-DD`), possibly prefixed with an era
//! sign and possibly carrying a `T…` time suffix. Partial values use `00`
//! as a month/day sentinel.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::error::{ChronicleError, Result};

/// Day counts used when expanding partial dates into ranges.
const MONTH_LENGTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateGranularity {
    Year,
    YearMonth,
    Day,
}

/// A normalized date: a human-readable label plus the sortable ISO prefix
/// it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayDate {
    pub granularity: DateGranularity,
    pub label: String,
    pub sort_key: String,
}

/// One entry of the date-correction table.
///
/// The upstream knowledge source emits some event dates shifted by a
/// timezone-normalization defect; the original viewer compensated with a
/// hardcoded title heuristic. Corrections are a configurable policy here:
/// an entry applies when the entity title contains any `title_includes`
/// substring and none of the `title_excludes` substrings
/// (case-insensitive), and shifts the parsed date by `offset_hours`
/// before formatting.
#[derive(Debug, Clone)]
pub struct DateCorrection {
    pub title_includes: Vec<String>,
    pub title_excludes: Vec<String>,
    pub offset_hours: i64,
}

impl DateCorrection {
    pub fn applies_to(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.title_includes
            .iter()
            .any(|needle| title.contains(&needle.to_lowercase()))
            && !self
                .title_excludes
                .iter()
                .any(|needle| title.contains(&needle.to_lowercase()))
    }
}

/// The corrections shipped by default: the single known upstream defect,
/// where war-related event dates (but not "America…"-titled ones) come
/// back seven hours early. This compensates a bug in the upstream source,
/// it is not a general rule.
pub fn default_corrections() -> Vec<DateCorrection> {
    vec![DateCorrection {
        title_includes: vec!["war".to_string()],
        title_excludes: vec!["merica".to_string()],
        offset_hours: 7,
    }]
}

pub struct DateNormalizer {
    corrections: Vec<DateCorrection>,
}

impl DateNormalizer {
    pub fn new(corrections: Vec<DateCorrection>) -> Self {
        Self { corrections }
    }

    /// Normalizes a raw date claim for the named entity.
    ///
    /// The era sign is stripped before parsing. When chrono cannot parse
    /// the value, falls back to manual substring decomposition, omitting
    /// `00` month/day sentinels. Errors only when no usable year remains.
    pub fn parse(&self, raw: &str, entity_title: &str) -> Result<DisplayDate> {
        let stripped = raw.trim_start_matches(['+', '-']);
        let stripped = stripped.split('T').next().unwrap_or(stripped);

        match stripped.len() {
            4 => self.parse_year(raw, stripped),
            7 => self.parse_year_month(raw, stripped),
            10 => self.parse_full(raw, stripped, entity_title),
            _ => self.decompose(raw, stripped),
        }
    }

    fn parse_year(&self, raw: &str, s: &str) -> Result<DisplayDate> {
        let year: i32 = s
            .parse()
            .map_err(|_| ChronicleError::UnresolvableDate { raw: raw.to_string() })?;
        if year == 0 {
            return Err(ChronicleError::UnresolvableDate { raw: raw.to_string() });
        }
        Ok(DisplayDate {
            granularity: DateGranularity::Year,
            label: s.to_string(),
            sort_key: s.to_string(),
        })
    }

    fn parse_year_month(&self, raw: &str, s: &str) -> Result<DisplayDate> {
        let (Some(year), Some(month)) = (s.get(0..4), s.get(5..7)) else {
            return Err(ChronicleError::UnresolvableDate { raw: raw.to_string() });
        };
        if month == "00" {
            // Month sentinel: degrade to year granularity.
            return self.parse_year(raw, year);
        }
        let month_index: usize = month
            .parse()
            .map_err(|_| ChronicleError::UnresolvableDate { raw: raw.to_string() })?;
        if !(1..=12).contains(&month_index) {
            return Err(ChronicleError::UnresolvableDate { raw: raw.to_string() });
        }
        Ok(DisplayDate {
            granularity: DateGranularity::YearMonth,
            label: format!("{} {}", MONTH_NAMES[month_index - 1], year),
            sort_key: s.to_string(),
        })
    }

    fn parse_full(&self, raw: &str, s: &str, entity_title: &str) -> Result<DisplayDate> {
        let parsed = match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => return self.decompose(raw, s),
        };

        let mut moment: NaiveDateTime = parsed.and_hms_opt(0, 0, 0).expect("midnight is valid");
        for correction in &self.corrections {
            if correction.applies_to(entity_title) {
                moment += Duration::hours(correction.offset_hours);
            }
        }

        let date = moment.date();
        Ok(DisplayDate {
            granularity: DateGranularity::Day,
            label: format!(
                "{} {}, {}",
                MONTH_NAMES[date.month0() as usize],
                date.day(),
                date.year(),
            ),
            sort_key: date.format("%Y-%m-%d").to_string(),
        })
    }

    /// Manual fallback for values chrono rejects: keep whichever of
    /// year / month / day are present and not the `00` sentinel.
    fn decompose(&self, raw: &str, s: &str) -> Result<DisplayDate> {
        let Some(year) = s.get(0..4) else {
            return Err(ChronicleError::UnresolvableDate { raw: raw.to_string() });
        };
        if year == "0000" || year.parse::<u32>().is_err() {
            return Err(ChronicleError::UnresolvableDate { raw: raw.to_string() });
        }

        let month = s.get(5..7).unwrap_or("00");
        let day = s.get(8..10).unwrap_or("00");

        let usable = |part: &str| part != "00" && part.bytes().all(|b| b.is_ascii_digit());

        let mut sort_key = year.to_string();
        let mut granularity = DateGranularity::Year;
        if usable(month) {
            sort_key = format!("{}-{}", sort_key, month);
            granularity = DateGranularity::YearMonth;
            if usable(day) {
                sort_key = format!("{}-{}", sort_key, day);
                granularity = DateGranularity::Day;
            }
        }

        // The decomposed path keeps the ISO prefix as its label too: these
        // are values the date library could not vouch for.
        Ok(DisplayDate {
            granularity,
            label: sort_key.clone(),
            sort_key,
        })
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new(default_corrections())
    }
}

/// Expands a literal date of any granularity into an inclusive
/// `(start, end)` day range: `YYYY` spans the year, `YYYY-MM` the month,
/// and a full date is its own range.
pub fn expand_to_range(when: &str) -> Option<(String, String)> {
    // Literals arrive straight off the wire; a multibyte character makes
    // the value malformed, not a panic.
    if !when.is_ascii() {
        return None;
    }
    match when.len() {
        4 => Some((format!("{when}-01-01"), format!("{when}-12-31"))),
        7 => {
            let month: usize = when.get(5..7)?.parse().ok()?;
            if !(1..=12).contains(&month) {
                return None;
            }
            Some((
                format!("{when}-01"),
                format!("{when}-{:02}", MONTH_LENGTHS[month - 1]),
            ))
        }
        10 => Some((when.to_string(), when.to_string())),
        _ => None,
    }
}

/// Month name for a 1-based month number.
pub fn month_name(month: usize) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)?).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granularity_follows_input_length() {
        let normalizer = DateNormalizer::default();

        let year = normalizer.parse("1944", "D-Day").unwrap();
        assert_eq!(year.granularity, DateGranularity::Year);
        assert_eq!(year.label, "1944");

        let month = normalizer.parse("1944-06", "D-Day").unwrap();
        assert_eq!(month.granularity, DateGranularity::YearMonth);
        assert_eq!(month.label, "June 1944");

        let day = normalizer.parse("1944-06-06", "D-Day").unwrap();
        assert_eq!(day.granularity, DateGranularity::Day);
        assert_eq!(day.label, "June 6, 1944");
        assert_eq!(day.sort_key, "1944-06-06");
    }

    #[test]
    fn era_sign_and_time_suffix_are_stripped() {
        let normalizer = DateNormalizer::default();
        let parsed = normalizer.parse("+1944-06-06T00:00:00Z", "D-Day").unwrap();
        assert_eq!(parsed.sort_key, "1944-06-06");
        assert_eq!(parsed.granularity, DateGranularity::Day);
    }

    #[test]
    fn zero_sentinels_degrade_granularity() {
        let normalizer = DateNormalizer::default();

        let month_sentinel = normalizer.parse("1944-00", "whatever").unwrap();
        assert_eq!(month_sentinel.granularity, DateGranularity::Year);
        assert_eq!(month_sentinel.sort_key, "1944");

        let day_sentinel = normalizer.parse("1944-06-00", "whatever").unwrap();
        assert_eq!(day_sentinel.granularity, DateGranularity::YearMonth);
        assert_eq!(day_sentinel.sort_key, "1944-06");
    }

    #[test]
    fn all_zero_year_is_unresolvable() {
        let normalizer = DateNormalizer::default();
        assert!(matches!(
            normalizer.parse("0000-00-00", "whatever"),
            Err(ChronicleError::UnresolvableDate { .. })
        ));
        assert!(matches!(
            normalizer.parse("??", "whatever"),
            Err(ChronicleError::UnresolvableDate { .. })
        ));
    }

    #[test]
    fn war_correction_applies_by_title() {
        let correction = &default_corrections()[0];
        assert!(correction.applies_to("The Vietnam War"));
        assert!(correction.applies_to("war of the worlds"));
        assert!(!correction.applies_to("American Civil War"));
        assert!(!correction.applies_to("Armistice Day"));
    }

    #[test]
    fn seven_hour_offset_does_not_change_the_day() {
        // The shipped correction compensates an upstream shift without
        // rolling the date over when applied to a midnight-anchored day.
        let normalizer = DateNormalizer::default();
        let parsed = normalizer.parse("1944-06-06", "The Pacific War").unwrap();
        assert_eq!(parsed.sort_key, "1944-06-06");
    }

    #[test]
    fn range_expansion_by_granularity() {
        assert_eq!(
            expand_to_range("1944"),
            Some(("1944-01-01".to_string(), "1944-12-31".to_string()))
        );
        assert_eq!(
            expand_to_range("1944-02"),
            Some(("1944-02-01".to_string(), "1944-02-28".to_string()))
        );
        assert_eq!(
            expand_to_range("1944-06-06"),
            Some(("1944-06-06".to_string(), "1944-06-06".to_string()))
        );
        assert_eq!(expand_to_range("194"), None);
    }

    #[test]
    fn range_expansion_rejects_non_ascii_literals() {
        // Wire literals can carry arbitrary bytes; a multibyte character
        // at a slice boundary must yield None, not a panic.
        assert_eq!(expand_to_range("1944\u{e9}0"), None);
        assert_eq!(expand_to_range("1944-0\u{e9}"), None);
        assert_eq!(expand_to_range("1944-xx"), None);
    }
}
