//! Interpreting free-text answers from the human port.

use chrono::NaiveDate;

const YES: &[&str] = &["y", "yes", "s", "si", "sì", "ok", "okay", "confirm", "approve", "approved"];
const NO: &[&str] = &["n", "no", "nope", "reject", "skip"];
const CHANGE: &[&str] = &["c", "change", "change date", "date", "cambia", "cambia data"];

fn normalized(answer: &str) -> String {
    answer
        .trim()
        .trim_end_matches(['.', '!'])
        .to_lowercase()
}

pub fn is_yes(answer: &str) -> bool {
    YES.contains(&normalized(answer).as_str())
}

pub fn is_no(answer: &str) -> bool {
    NO.contains(&normalized(answer).as_str())
}

pub fn is_change(answer: &str) -> bool {
    CHANGE.contains(&normalized(answer).as_str())
}

/// `YYYY-MM-DD`, `DD/MM/YYYY` or `DD-MM-YYYY`.
pub fn parse_date(answer: &str) -> Option<NaiveDate> {
    let text = answer.trim();
    ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Trimmed answer, or `None` when blank.
pub fn non_empty(answer: &str) -> Option<String> {
    let trimmed = answer.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
