//! Heuristic extraction of subsidy attributes from free-text agent replies.
//!
//! The patterns are best-effort by design: a missed field is acceptable, a
//! wrongly populated field is not, so every heuristic is anchored on an
//! explicit label or marker and fields are extracted independently, first
//! match wins.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::subsidy::SubsidyInfo;

/// Words that mark a text as being about a grant program at all.
const GRANT_KEYWORDS: [&str; 4] = ["補助金", "助成金", "支援金", "奨励金"];

const KEYWORD_ALT: &str = "補助金|助成金|支援金|奨励金";

static BOLD_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\*\*([^*\n]*(?:{KEYWORD_ALT})[^*\n]*)\*\*")).expect("valid pattern")
});

// A heading-style line: optional numbered prefix, ends with the keyword.
static HEADING_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t　]*(?:[0-9０-９]+[.．、)）]?[ \t　]*)?([^\n]{{0,50}}?(?:{KEYWORD_ALT}))[ \t　]*$"
    ))
    .expect("valid pattern")
});

static BRACKET_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"「([^」\n]*(?:{KEYWORD_ALT})[^」\n]*)」")).expect("valid pattern")
});

static ADJACENT_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"([^\s、。．，,()（）「」【】＊*：:]{{1,30}}(?:{KEYWORD_ALT}))"))
        .expect("valid pattern")
});

static LABELED_AREA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:対象地域|対象エリア)[:：は]?[ \t　]*([^\n。、]+)").expect("valid pattern")
});

static ADMIN_AREA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"対象[:：は]?[ \t　]*(全国|[^\n。、：:\s]{1,10}?(?:都|道|府|県|市|区|町|村))")
        .expect("valid pattern")
});

static LIMIT_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:補助金額|補助上限額|補助上限|限度額|上限額)[:：は]?[ \t　]*([^\n。]+)")
        .expect("valid pattern")
});

static OKU_PART: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)億").expect("valid pattern"));
static MAN_PART: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)万").expect("valid pattern"));
static YEN_PART: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)円").expect("valid pattern"));

static PERIOD_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:申請期間|募集期間|応募期間)[:：は]?[ \t　]*([^\n]+)").expect("valid pattern")
});

static PERIOD_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{4})年([0-9]{1,2})月([0-9]{1,2})日").expect("valid pattern"));

static EMPLOYEE_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:従業員数?|対象企業|対象者)[^\n]{0,12}?([0-9０-９]+名(?:以下|以上|未満|程度)?)")
        .expect("valid pattern")
});

static SME_TERM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"対象[:：は]?[^\n。]{0,15}?(中小企業|小規模事業者)").expect("valid pattern")
});

/// Extracts a partial [`SubsidyInfo`] from free text.
///
/// Returns `None` when the text does not mention a grant program at all, or
/// when the heuristics recover neither a title nor a monetary ceiling.
pub fn extract(text: &str) -> Option<SubsidyInfo> {
    if !GRANT_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
        return None;
    }

    let (acceptance_start_datetime, acceptance_end_datetime) = extract_period(text);
    let info = SubsidyInfo {
        title: extract_title(text),
        target_area_search: extract_target_area(text),
        subsidy_max_limit: extract_max_limit(text),
        acceptance_start_datetime,
        acceptance_end_datetime,
        target_number_of_employees: extract_employees(text),
        ..Default::default()
    };

    info.has_substance().then_some(info)
}

fn extract_title(text: &str) -> Option<String> {
    for pattern in [&*BOLD_TITLE, &*HEADING_TITLE, &*BRACKET_TITLE, &*ADJACENT_TITLE] {
        if let Some(caps) = pattern.captures(text) {
            let title = caps[1].trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}

fn extract_target_area(text: &str) -> Option<String> {
    if let Some(caps) = LABELED_AREA.captures(text) {
        return Some(caps[1].trim().to_string());
    }
    ADMIN_AREA.captures(text).map(|caps| caps[1].trim().to_string())
}

fn extract_max_limit(text: &str) -> Option<u64> {
    let caps = LIMIT_LABEL.captures(text)?;
    parse_yen_amount(&caps[1])
}

/// Parses a Japanese numeral-unit amount span into yen.
///
/// 億 and 万 sub-matches contribute independently so mixed spans like
/// 「1億5,000万円」 sum correctly; a plain 円-suffixed integer is the
/// fallback when neither unit appears. Zero or unparsable spans yield
/// `None`, never zero.
fn parse_yen_amount(span: &str) -> Option<u64> {
    let cleaned = span.replace([',', '，'], "");
    let mut total: u64 = 0;

    for caps in OKU_PART.captures_iter(&cleaned) {
        total = total.checked_add(caps[1].parse::<u64>().ok()?.checked_mul(100_000_000)?)?;
    }
    for caps in MAN_PART.captures_iter(&cleaned) {
        total = total.checked_add(caps[1].parse::<u64>().ok()?.checked_mul(10_000)?)?;
    }
    if total == 0 {
        if let Some(caps) = YEN_PART.captures(&cleaned) {
            total = caps[1].parse::<u64>().ok()?;
        }
    }

    (total > 0).then_some(total)
}

fn extract_period(text: &str) -> (Option<String>, Option<String>) {
    let Some(caps) = PERIOD_LABEL.captures(text) else {
        return (None, None);
    };
    let span = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

    let dates: Vec<(NaiveDate, usize, usize)> = PERIOD_DATE
        .captures_iter(span)
        .filter_map(|date_caps| {
            let whole = date_caps.get(0)?;
            let year = date_caps[1].parse().ok()?;
            let month = date_caps[2].parse().ok()?;
            let day = date_caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
                .map(|date| (date, whole.start(), whole.end()))
        })
        .collect();

    match dates.as_slice() {
        [(start, ..), (end, ..), ..] => {
            (Some(start_timestamp(*start)), Some(end_timestamp(*end)))
        }
        [(date, from, to)] => {
            let before = span[..*from].trim_end();
            let after = span[*to..].trim_start();
            if after.starts_with('～') || after.starts_with('~') || after.starts_with("から") {
                (Some(start_timestamp(*date)), None)
            } else if before.ends_with('～')
                || before.ends_with('~')
                || before.ends_with("から")
                || after.starts_with("まで")
            {
                (None, Some(end_timestamp(*date)))
            } else {
                (Some(start_timestamp(*date)), None)
            }
        }
        [] => (None, None),
    }
}

fn start_timestamp(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

fn end_timestamp(date: NaiveDate) -> String {
    format!("{}T23:59:59Z", date.format("%Y-%m-%d"))
}

fn extract_employees(text: &str) -> Option<String> {
    if let Some(caps) = EMPLOYEE_COUNT.captures(text) {
        return Some(caps[1].to_string());
    }
    SME_TERM.captures(text).map(|caps| caps[1].to_string())
}
