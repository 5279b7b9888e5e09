use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Priority, Repeat, RepeatUnit};

/// Quick-add magic mode: selects which prefix markers denote assignees,
/// labels, projects and priorities in free-text task titles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuickAddMode {
    Disabled,
    #[default]
    Default,
    Todoist,
}

/// Marker set of the active mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefixes {
    pub assignee: char,
    pub label: char,
    pub project: char,
    pub priority: char,
}

impl QuickAddMode {
    pub fn prefixes(&self) -> Option<Prefixes> {
        match self {
            QuickAddMode::Disabled => None,
            QuickAddMode::Default => Some(Prefixes {
                assignee: '@',
                label: '#',
                project: '+',
                priority: '!',
            }),
            QuickAddMode::Todoist => Some(Prefixes {
                assignee: '+',
                label: '@',
                project: '#',
                priority: '!',
            }),
        }
    }
}

/// Structured draft produced from a raw task title.
///
/// `text` keeps assignee tokens and date phrases in place: assignee tokens are
/// only stripped later for users that actually resolved (see
/// [`cleanup_item_text`]), and date phrases stay part of the display title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTask {
    pub text: String,
    pub assignees: Vec<String>,
    pub labels: Vec<String>,
    pub project: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
    pub repeats: Option<Repeat>,
}

/// Parse a raw task title into a structured draft. Pure and deterministic:
/// the reference time is injected and no I/O happens here. Tokens are
/// recognized anywhere in the title, in any order.
pub fn parse_task_text(raw: &str, mode: QuickAddMode, now: DateTime<Utc>) -> ParsedTask {
    let Some(prefixes) = mode.prefixes() else {
        return ParsedTask {
            text: collapse_whitespace(raw),
            ..ParsedTask::default()
        };
    };

    let mut text = raw.to_string();
    let labels = extract_tokens(&mut text, prefixes.label, true);
    let project = extract_tokens(&mut text, prefixes.project, true)
        .into_iter()
        .next();
    let priority = extract_priority(&mut text, prefixes.priority);
    let assignees = extract_tokens(&mut text, prefixes.assignee, false);
    let (due_date, repeats) = scan_date_phrases(&text, now);

    ParsedTask {
        text: collapse_whitespace(&text),
        assignees,
        labels,
        project,
        priority,
        due_date,
        repeats,
    }
}

/// Strip `prefix`-marked occurrences of the given items from the text, bare
/// (`@dave`) or quoted (`@"John Doe"`), matching case-insensitively and
/// ignoring trailing punctuation. Used after assignee resolution so only
/// usernames that actually matched disappear from the title.
pub fn cleanup_item_text<S: AsRef<str>>(text: &str, items: &[S], prefix: char) -> String {
    let re = token_regex(prefix);
    let cleaned = re.replace_all(text, |captures: &regex::Captures<'_>| {
        let value = match captures.get(3) {
            Some(quoted) => quoted.as_str(),
            None => strip_trailing_punctuation(&captures[2]),
        };
        if items
            .iter()
            .any(|item| item.as_ref().eq_ignore_ascii_case(value))
        {
            captures[1].to_string()
        } else {
            captures[0].to_string()
        }
    });
    collapse_whitespace(&cleaned)
}

/// Collect `prefix`-marked tokens, bare (`#bug`) or quoted (`#"needs triage"`).
/// When `remove` is set the matched tokens are cut out of the text.
fn extract_tokens(text: &mut String, prefix: char, remove: bool) -> Vec<String> {
    let re = token_regex(prefix);
    let mut tokens = Vec::new();
    for captures in re.captures_iter(text) {
        let value = match captures.get(3) {
            Some(quoted) => quoted.as_str().to_string(),
            None => strip_trailing_punctuation(&captures[2]).to_string(),
        };
        if !value.is_empty() {
            tokens.push(value);
        }
    }
    if remove && !tokens.is_empty() {
        *text = re.replace_all(text, "$1").into_owned();
    }
    tokens
}

/// Marker characters used across all modes; their patterns are compiled once.
const MARKERS: [char; 4] = ['@', '#', '+', '!'];

fn token_regex(prefix: char) -> Regex {
    static TOKEN_RES: Lazy<HashMap<char, Regex>> = Lazy::new(|| {
        MARKERS
            .iter()
            .map(|&p| (p, compile_token_regex(p)))
            .collect()
    });
    TOKEN_RES
        .get(&prefix)
        .cloned()
        .unwrap_or_else(|| compile_token_regex(prefix))
}

fn compile_token_regex(prefix: char) -> Regex {
    let pattern = format!(
        r#"(^|\s){}("([^"]+)"|\S+)"#,
        regex::escape(&prefix.to_string())
    );
    Regex::new(&pattern).expect("valid token regex")
}

fn extract_priority(text: &mut String, prefix: char) -> Option<Priority> {
    static PRIORITY_RES: Lazy<HashMap<char, Regex>> = Lazy::new(|| {
        MARKERS
            .iter()
            .map(|&p| (p, compile_priority_regex(p)))
            .collect()
    });
    let re = PRIORITY_RES
        .get(&prefix)
        .cloned()
        .unwrap_or_else(|| compile_priority_regex(prefix));
    let level = re.captures(text)?[2].parse::<u8>().ok()?;
    *text = re.replace(text, "$1").into_owned();
    Some(Priority::from_level(level))
}

fn compile_priority_regex(prefix: char) -> Regex {
    let pattern = format!(r"(^|\s){}([1-5])($|\s)", regex::escape(&prefix.to_string()));
    Regex::new(&pattern).expect("valid priority regex")
}

/// Scan the remaining words for a due-date phrase and a repeat phrase.
/// The words themselves stay part of the title.
fn scan_date_phrases(text: &str, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<Repeat>) {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| strip_trailing_punctuation(w).to_ascii_lowercase())
        .collect();

    let mut due_date = None;
    let mut repeats = None;
    let mut i = 0;
    while i < words.len() {
        let word = words[i].as_str();

        if due_date.is_none() {
            if let Some((date, consumed)) = match_date_phrase(&words, i, now) {
                due_date = Some(date);
                i += consumed;
                continue;
            }
        }

        if repeats.is_none() && word == "every" {
            if let Some((repeat, consumed)) = match_repeat_phrase(&words, i) {
                repeats = Some(repeat);
                i += consumed;
                continue;
            }
        }

        i += 1;
    }

    (due_date, repeats)
}

fn match_date_phrase(
    words: &[String],
    i: usize,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, usize)> {
    let word = words[i].as_str();

    match word {
        "today" => return Some((now, 1)),
        "tomorrow" => return Some((now + Duration::days(1), 1)),
        _ => {}
    }

    if let Some(weekday) = parse_weekday(word) {
        return Some((next_weekday(now, weekday), 1));
    }

    if let Ok(date) = NaiveDate::parse_from_str(word, "%Y-%m-%d") {
        return Some((at_morning(date), 1));
    }

    if word == "next" && i + 1 < words.len() {
        match words[i + 1].as_str() {
            "week" => return Some((now + Duration::weeks(1), 2)),
            "month" => return Some((now + Months::new(1), 2)),
            _ => {}
        }
    }

    if word == "in" && i + 2 < words.len() {
        if let (Ok(amount), Ok(unit)) = (
            words[i + 1].parse::<u32>(),
            words[i + 2].parse::<RepeatUnit>(),
        ) {
            return Some((advance(now, amount, unit), 3));
        }
    }

    None
}

fn match_repeat_phrase(words: &[String], i: usize) -> Option<(Repeat, usize)> {
    // "every 3 weeks"
    if i + 2 < words.len() {
        if let (Ok(amount), Ok(unit)) = (
            words[i + 1].parse::<u32>(),
            words[i + 2].parse::<RepeatUnit>(),
        ) {
            return Some((Repeat { amount, unit }, 3));
        }
    }
    // "every week"
    if i + 1 < words.len() {
        if let Ok(unit) = words[i + 1].parse::<RepeatUnit>() {
            return Some((Repeat { amount: 1, unit }, 2));
        }
    }
    None
}

fn advance(now: DateTime<Utc>, amount: u32, unit: RepeatUnit) -> DateTime<Utc> {
    match unit {
        RepeatUnit::Hours => now + Duration::hours(amount.into()),
        RepeatUnit::Days => now + Duration::days(amount.into()),
        RepeatUnit::Weeks => now + Duration::weeks(amount.into()),
        RepeatUnit::Months => now + Months::new(amount),
        RepeatUnit::Years => now + Months::new(amount.saturating_mul(12)),
    }
}

fn next_weekday(now: DateTime<Utc>, weekday: Weekday) -> DateTime<Utc> {
    let mut days_ahead = (weekday.num_days_from_monday() as i64
        - now.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    if days_ahead == 0 {
        days_ahead = 7;
    }
    now + Duration::days(days_ahead)
}

fn at_morning(date: NaiveDate) -> DateTime<Utc> {
    let dt = date
        .and_hms_opt(9, 0, 0)
        .unwrap_or_else(|| date.and_hms_opt(0, 0, 0).expect("midnight"));
    Utc.from_utc_datetime(&dt)
}

fn parse_weekday(label: &str) -> Option<Weekday> {
    match label {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn strip_trailing_punctuation(input: &str) -> &str {
    static PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[[:punct:]]+$").expect("valid regex"));
    match PUNCT_RE.find(input) {
        Some(mat) => &input[..mat.start()],
        None => input,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 14, 30, 0).unwrap() // a Wednesday
    }

    fn parse(raw: &str) -> ParsedTask {
        parse_task_text(raw, QuickAddMode::Default, fixed_now())
    }

    #[test]
    fn extracts_basic_tokens() {
        let parsed = parse("Buy milk @alice #groceries tomorrow");
        assert_eq!(parsed.text, "Buy milk @alice tomorrow");
        assert_eq!(parsed.assignees, vec!["alice"]);
        assert_eq!(parsed.labels, vec!["groceries"]);
        assert_eq!(parsed.due_date, Some(fixed_now() + Duration::days(1)));
    }

    #[test]
    fn tokens_are_order_independent() {
        let front = parse("#bug @bob Fix the login flow !4 +backend");
        let back = parse("Fix the login flow +backend !4 @bob #bug");
        assert_eq!(front.text, "@bob Fix the login flow");
        assert_eq!(back.text, "Fix the login flow @bob");
        assert_eq!(front.labels, back.labels);
        assert_eq!(front.project, back.project);
        assert_eq!(front.priority, Some(Priority::Urgent));
        assert_eq!(back.priority, Some(Priority::Urgent));
    }

    #[test]
    fn assignee_tokens_stay_in_text() {
        let parsed = parse("Ping @carol about the launch");
        assert_eq!(parsed.text, "Ping @carol about the launch");
        assert_eq!(parsed.assignees, vec!["carol"]);
    }

    #[test]
    fn quoted_values_may_contain_spaces() {
        let parsed = parse(r#"Plan kickoff +"big launch" #"needs triage""#);
        assert_eq!(parsed.project.as_deref(), Some("big launch"));
        assert_eq!(parsed.labels, vec!["needs triage"]);
        assert_eq!(parsed.text, "Plan kickoff");
    }

    #[test]
    fn trailing_punctuation_is_not_part_of_the_token() {
        let parsed = parse("Call @dave, then report");
        assert_eq!(parsed.assignees, vec!["dave"]);
    }

    #[rstest]
    #[case("!1", Priority::Low)]
    #[case("!3", Priority::High)]
    #[case("!5", Priority::DoNow)]
    fn parses_priority_levels(#[case] token: &str, #[case] expected: Priority) {
        let parsed = parse(&format!("Ship it {token}"));
        assert_eq!(parsed.priority, Some(expected));
        assert_eq!(parsed.text, "Ship it");
    }

    #[test]
    fn out_of_range_priority_is_plain_text() {
        let parsed = parse("Countdown !9");
        assert_eq!(parsed.priority, None);
        assert_eq!(parsed.text, "Countdown !9");
    }

    #[rstest]
    #[case("today", 0)]
    #[case("tomorrow", 1)]
    fn parses_relative_day_words(#[case] word: &str, #[case] days: i64) {
        let parsed = parse(&format!("Water plants {word}"));
        assert_eq!(parsed.due_date, Some(fixed_now() + Duration::days(days)));
        assert_eq!(parsed.text, format!("Water plants {word}"));
    }

    #[test]
    fn weekday_resolves_to_next_occurrence() {
        // fixed_now is a Wednesday; "friday" is two days out, "wednesday" a full week.
        let friday = parse("Demo friday");
        assert_eq!(friday.due_date, Some(fixed_now() + Duration::days(2)));
        let wednesday = parse("Demo wednesday");
        assert_eq!(wednesday.due_date, Some(fixed_now() + Duration::days(7)));
    }

    #[test]
    fn parses_iso_dates_at_morning() {
        let parsed = parse("Submit report 2024-12-24");
        assert_eq!(
            parsed.due_date,
            Some(Utc.with_ymd_and_hms(2024, 12, 24, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn parses_in_n_units() {
        let parsed = parse("Follow up in 3 days");
        assert_eq!(parsed.due_date, Some(fixed_now() + Duration::days(3)));
    }

    #[test]
    fn parses_repeat_phrases() {
        let weekly = parse("Water plants every week");
        assert_eq!(
            weekly.repeats,
            Some(Repeat {
                amount: 1,
                unit: RepeatUnit::Weeks
            })
        );

        let biweekly = parse("Standup notes every 2 weeks");
        assert_eq!(
            biweekly.repeats,
            Some(Repeat {
                amount: 2,
                unit: RepeatUnit::Weeks
            })
        );
    }

    #[test]
    fn disabled_mode_only_collapses_whitespace() {
        let parsed = parse_task_text("Buy   milk @alice #groceries", QuickAddMode::Disabled, fixed_now());
        assert_eq!(parsed.text, "Buy milk @alice #groceries");
        assert!(parsed.assignees.is_empty());
        assert!(parsed.labels.is_empty());
    }

    #[test]
    fn todoist_mode_swaps_markers() {
        let parsed = parse_task_text(
            "Buy milk +alice @groceries #chores",
            QuickAddMode::Todoist,
            fixed_now(),
        );
        assert_eq!(parsed.assignees, vec!["alice"]);
        assert_eq!(parsed.labels, vec!["groceries"]);
        assert_eq!(parsed.project.as_deref(), Some("chores"));
    }

    #[test]
    fn cleanup_removes_only_listed_items() {
        let cleaned = cleanup_item_text("Buy milk @Alice @bob tomorrow", &["alice"], '@');
        assert_eq!(cleaned, "Buy milk @bob tomorrow");
    }

    #[test]
    fn cleanup_ignores_trailing_punctuation() {
        let cleaned = cleanup_item_text("Call @dave, then report", &["dave"], '@');
        assert_eq!(cleaned, "Call then report");
    }

    #[test]
    fn cleanup_strips_quoted_multi_word_items() {
        let cleaned = cleanup_item_text(r#"Sync with @"John Doe" about launch"#, &["john doe"], '@');
        assert_eq!(cleaned, "Sync with about launch");
    }

    #[test]
    fn cleanup_handles_unregistered_prefixes() {
        let cleaned = cleanup_item_text("Route %north first", &["north"], '%');
        assert_eq!(cleaned, "Route first");
    }
}
