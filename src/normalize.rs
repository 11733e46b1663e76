//! Pure field normalizers: raw extracted strings into canonical forms.

use chrono::NaiveDate;

/// Accepted date layouts, tried strictly in order; first parse wins.
///
/// The order means `MM/DD/YYYY` beats `DD/MM/YYYY` whenever both could match.
/// That is a deliberate but lossy policy inherited from the filings themselves,
/// which overwhelmingly use US ordering.
const DATE_FORMATS: [DateFormat; 5] = [
    DateFormat::Full("%m/%d/%Y"),
    DateFormat::YearOnly,
    DateFormat::MonthYear,
    DateFormat::Full("%Y-%m-%d"),
    DateFormat::Full("%d/%m/%Y"),
];

#[derive(Clone, Copy)]
enum DateFormat {
    Full(&'static str),
    /// Bare `YYYY`; completed to January 1st.
    YearOnly,
    /// `MM/YYYY`; completed to the 1st of the month.
    MonthYear,
}

impl DateFormat {
    fn parse(self, s: &str) -> Option<NaiveDate> {
        match self {
            DateFormat::Full(fmt) => NaiveDate::parse_from_str(s, fmt).ok(),
            DateFormat::YearOnly => {
                if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
                    NaiveDate::from_ymd_opt(s.parse().ok()?, 1, 1)
                } else {
                    None
                }
            }
            DateFormat::MonthYear => {
                let (month, year) = s.split_once('/')?;
                if year.len() != 4 || year.contains('/') {
                    return None;
                }
                let month: u32 = month.parse().ok()?;
                let year: i32 = year.parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, 1)
            }
        }
    }
}

/// Parses a filing date into ISO `YYYY-MM-DD`. Returns `None` when no accepted
/// format matches; callers drop the record rather than guessing.
pub fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| fmt.parse(trimmed))
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Maps raw transaction-type text onto `buy`/`sell` by case-insensitive
/// substring. Anything that matches neither passes through verbatim; the
/// canonical set is not closed.
pub fn normalize_type(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    if lowered.contains("purchase") || lowered.contains("buy") {
        "buy".to_string()
    } else if lowered.contains("sale") || lowered.contains("sell") {
        "sell".to_string()
    } else {
        raw.to_string()
    }
}

/// Strips currency symbols and thousands separators. No numeric validation:
/// amounts are reported as ranges and stay strings.
pub fn normalize_amount(raw: &str) -> String {
    raw.replace('$', "").replace(',', "").trim().to_string()
}

/// Collapses whitespace runs to single spaces and trims the ends.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
