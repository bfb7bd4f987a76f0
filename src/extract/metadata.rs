use crate::document::Document;
use chrono::{Month, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// `<Month> <Day>, <Year>` with an English month name or abbreviation
fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b([A-Z][a-z]+)\.? (\d{1,2}), (\d{4})\b").expect("date pattern is valid")
    })
}

/// Returns the text of the first `h1`, trimmed, or an empty string
pub fn extract_title(document: &dyn Document) -> String {
    document
        .first("h1")
        .map(|h1| h1.text.trim().to_string())
        .unwrap_or_default()
}

/// Finds the publication date of a page
///
/// The first `div` whose class list contains `marker_class` is scanned for a
/// date; other marked divs are ignored. Pages without the marker or without
/// a recognisable date yield `None`.
pub fn extract_publishing_date(document: &dyn Document, marker_class: &str) -> Option<NaiveDate> {
    document
        .find_all("div")
        .into_iter()
        .find(|div| div.has_class(marker_class))
        .and_then(|div| find_date(&div.text))
}

/// Returns the first valid `<Month> <Day>, <Year>` date in `text`
///
/// # Examples
///
/// ```
/// use blogscout::extract::find_date;
/// use chrono::NaiveDate;
///
/// assert_eq!(
///     find_date("Posted on Mar 5, 2021 by Jane"),
///     NaiveDate::from_ymd_opt(2021, 3, 5)
/// );
/// assert_eq!(find_date("no date here"), None);
/// ```
pub fn find_date(text: &str) -> Option<NaiveDate> {
    date_pattern().captures_iter(text).find_map(|captures| {
        let month = captures[1].parse::<Month>().ok()?;
        let day = captures[2].parse::<u32>().ok()?;
        let year = captures[3].parse::<i32>().ok()?;
        NaiveDate::from_ymd_opt(year, month.number_from_month(), day)
    })
}
