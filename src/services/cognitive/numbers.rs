use crate::models::inventory::BarStatus;
use regex::Regex;
use std::sync::LazyLock;

static METRIC_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)*)\s*([KM])?").unwrap());

static TRAILING_GROUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\d{3}$").unwrap());

/// `current / max`, delimited by whitespace or string edges so that dates
/// like `2024/05/12` never qualify.
static BAR_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(\d[\d,.]*)\s*/\s*(\d[\d,.]*)(?:\s|$)").unwrap());

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{1,2}:\d{2}\b").unwrap());

static ID_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(ID|1D|lD|Id|id)\s*[:\)\.]?\s*").unwrap());

static ID_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{7,10}").unwrap());

static FIRST_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

static PERCENTAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+[,.]\d+)").unwrap());

/// Parse a battle ledger value such as `"Dead 12.5K"` or `"1,234,567"`.
///
/// Known labels are stripped first so their letters cannot leak into the
/// glyph fixes. Percentages are never metric values and yield 0.
pub fn parse_metric<'a, I>(text: &str, labels: I) -> i64
where
    I: IntoIterator<Item = &'a String>,
{
    if text.trim().is_empty() || text.contains('%') {
        return 0;
    }

    let mut clean = text.to_uppercase();
    for label in labels {
        let label = label.to_uppercase();
        if !label.is_empty() {
            clean = clean.replace(&label, "");
        }
    }

    let clean: String = clean
        .chars()
        .filter_map(|c| match c {
            '|' => Some(' '),
            'I' | 'L' => Some('1'),
            'O' => Some('0'),
            '+' => None,
            other => Some(other),
        })
        .collect();

    let Some(caps) = METRIC_VALUE.captures(&clean) else {
        return 0;
    };

    let mut number = caps[1].replace(',', ".");
    let suffix = caps.get(2).map(|m| m.as_str());

    let dots = number.matches('.').count();
    if dots > 1 || (dots == 1 && suffix.is_none() && TRAILING_GROUP.is_match(&number)) {
        number = number.replace('.', "");
    }

    let Ok(value) = number.parse::<f64>() else {
        return 0;
    };

    let multiplier = match suffix {
        Some("K") => 1_000.0,
        Some("M") => 1_000_000.0,
        _ => 1.0,
    };

    (value * multiplier).round() as i64
}

/// Integer with separators removed; `K`/`M` expand to zeros
pub fn parse_grouped(text: &str) -> i64 {
    let clean = text
        .replace(['.', ','], "")
        .replace('K', "000")
        .replace('M', "000000");

    FIRST_DIGITS
        .find(&clean)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Digits only, anything else dropped
pub fn digits_only(text: &str) -> i64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Parse a status bar reading such as `"875/1,000"`
pub fn parse_bar_status(text: &str) -> Option<BarStatus> {
    let text = text.trim();
    let caps = BAR_STATUS.captures(text)?;
    if is_short_date(text, &caps[1]) {
        return None;
    }
    let current = caps[1].replace(['.', ','], "").parse().ok()?;
    let max: i64 = caps[2].replace(['.', ','], "").parse().ok()?;

    if max <= 0 {
        return None;
    }

    Some(BarStatus { current, max })
}

/// `current/max` shape that is not a `MM/DD` date
pub fn is_bar_status(text: &str) -> bool {
    let text = text.trim();
    BAR_STATUS
        .captures(text)
        .is_some_and(|caps| !is_short_date(text, &caps[1]))
}

// Bars never zero-pad and never sit next to a clock time
fn is_short_date(text: &str, first: &str) -> bool {
    CLOCK_TIME.is_match(text) || (first.len() == 2 && first.starts_with('0'))
}

/// Governor identifier from an `ID: 12345678`-style reading
pub fn parse_governor_id(text: &str) -> Option<i64> {
    let stripped = ID_PREFIX.replace_all(text, "");
    ID_DIGITS.find(&stripped).and_then(|m| m.as_str().parse().ok())
}

/// First run of digits, e.g. the level in `"Barbarian Lv. 25"`
pub fn first_integer(text: &str) -> Option<i64> {
    FIRST_DIGITS.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Decimal percentage such as `"12,5%"`
pub fn parse_percentage(text: &str) -> Option<f64> {
    PERCENTAGE
        .captures(text)
        .and_then(|caps| caps[1].replace(',', ".").parse().ok())
}
