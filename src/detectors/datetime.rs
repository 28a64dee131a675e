//! Date, time, relative-day and event-phrase detection
//!
//! Literal matches are classified into a sub-type by
//! [`classify_date_time_type`], which only ever looks at the matched
//! substring. Parsed components go into the match metadata; the calendar
//! action turns them back into a concrete date with [`DateTimeDetector::resolve_event`].

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::{Captures, Regex};
use serde_json::Value;

use super::{metadata, Detector};
use crate::types::{Metadata, PatternMatch, PatternType};

const EVENT_KEYWORDS: &[&str] = &[
    "meeting",
    "call",
    "lunch",
    "dinner",
    "breakfast",
    "appointment",
    "interview",
    "party",
    "conference",
    "class",
    "session",
];

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";
const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";

/// Hour assumed for "tonight" when no explicit time is given.
const TONIGHT_HOUR: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateForm {
    Iso,
    NamedMonth,
    DayMonth,
    Numeric,
    Event,
    Time12,
    Time24,
    Relative,
}

impl DateForm {
    fn base_confidence(&self) -> f64 {
        match self {
            DateForm::Iso => 0.9,
            DateForm::NamedMonth | DateForm::DayMonth => 0.85,
            DateForm::Numeric => 0.75,
            DateForm::Event => 0.85,
            DateForm::Time12 => 0.85,
            DateForm::Time24 => 0.8,
            DateForm::Relative => 0.75,
        }
    }
}

/// Sub-type of a date/time literal, judged from the matched text alone.
///
/// Priority: ISO timestamp (`T` and `Z`), clock time (`:`), separated date
/// (`/`, `-`, `.`), event phrase, then named months and am/pm markers, and
/// finally relative expressions.
pub fn classify_date_time_type(matched: &str) -> &'static str {
    if matched.contains('T') && matched.contains('Z') {
        return "iso";
    }

    let lower = matched
        .to_lowercase()
        .replace("a.m.", "am")
        .replace("p.m.", "pm");

    if lower.contains(':') {
        return "time";
    }
    if lower.contains(['/', '-', '.']) {
        return "date";
    }

    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if words.iter().any(|w| EVENT_KEYWORDS.contains(w)) {
        return "event";
    }
    if words.iter().any(|w| month_number(w).is_some()) {
        return "date";
    }
    if words
        .iter()
        .any(|w| *w == "am" || *w == "pm" || w.ends_with("am") || w.ends_with("pm"))
    {
        return "time";
    }
    "relative"
}

fn month_number(word: &str) -> Option<u32> {
    let word = word.trim_end_matches('.').to_lowercase();
    let month = match word.as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday_from(word: &str) -> Option<Weekday> {
    word.to_lowercase().parse::<Weekday>().ok()
}

/// How a relative expression moves away from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shift {
    Days(i64),
    Months(i32),
    Hours(i64),
    /// `next`, `this` or `last` occurrence of a weekday.
    Weekday(Weekday, i8),
}

/// Components recovered from one match.
#[derive(Debug, Clone, Default, PartialEq)]
struct DateParts {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    shift: Option<Shift>,
    relative: Option<String>,
}

impl DateParts {
    fn has_date(&self) -> bool {
        (self.month.is_some() && self.day.is_some()) || self.shift.is_some()
    }

    fn literal_date(&self, default_year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year.unwrap_or(default_year), self.month?, self.day?)
    }

    fn date(&self, now: NaiveDateTime) -> Option<NaiveDate> {
        let today = now.date();
        if let Some(date) = self.literal_date(today.year()) {
            return Some(date);
        }

        match self.shift? {
            Shift::Days(n) => today.checked_add_signed(Duration::days(n)),
            Shift::Hours(n) => Some((now + Duration::hours(n)).date()),
            Shift::Months(n) if n >= 0 => today.checked_add_months(Months::new(n as u32)),
            Shift::Months(n) => today.checked_sub_months(Months::new(n.unsigned_abs())),
            Shift::Weekday(target, direction) => {
                let from = today.weekday().num_days_from_monday() as i64;
                let to = target.num_days_from_monday() as i64;
                let ahead = (to - from).rem_euclid(7);
                let offset = match direction {
                    1 if ahead == 0 => 7,
                    1 | 0 => ahead,
                    _ => {
                        let back = (from - to).rem_euclid(7);
                        if back == 0 {
                            -7
                        } else {
                            -back
                        }
                    }
                };
                today.checked_add_signed(Duration::days(offset))
            }
        }
    }

    fn time(&self, now: NaiveDateTime) -> Option<NaiveTime> {
        if let Some(Shift::Hours(n)) = self.shift {
            return Some((now + Duration::hours(n)).time());
        }
        let hour = match (self.hour, self.relative.as_deref()) {
            (Some(h), _) => h,
            (None, Some("tonight")) => TONIGHT_HOUR,
            _ => return None,
        };
        NaiveTime::from_hms_opt(hour, self.minute.unwrap_or(0), 0)
    }

    fn into_metadata(self, date_type: &str) -> Metadata {
        let mut meta = metadata([("dateType", Value::from(date_type))]);
        let numbers = [
            ("year", self.year.map(i64::from)),
            ("month", self.month.map(i64::from)),
            ("day", self.day.map(i64::from)),
            ("hour", self.hour.map(i64::from)),
            ("minute", self.minute.map(i64::from)),
        ];
        for (key, value) in numbers {
            if let Some(v) = value {
                meta.insert(key.into(), Value::from(v));
            }
        }
        if let Some(relative) = self.relative {
            meta.insert("relative".into(), Value::from(relative));
        }
        match self.shift {
            Some(Shift::Days(n)) => {
                meta.insert("offsetDays".into(), Value::from(n));
            }
            Some(Shift::Months(n)) => {
                meta.insert("offsetMonths".into(), Value::from(n));
            }
            Some(Shift::Hours(n)) => {
                meta.insert("offsetHours".into(), Value::from(n));
            }
            Some(Shift::Weekday(day, _)) => {
                meta.insert("weekday".into(), Value::from(day.to_string()));
            }
            None => {}
        }
        meta
    }
}

/// A concrete date (and optional time) recovered from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTime {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl EventTime {
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.time.map(|t| self.date.and_time(t))
    }
}

pub struct DateTimeDetector {
    forms: Vec<(Regex, DateForm)>,
    threshold: f64,
}

impl DateTimeDetector {
    pub fn new(threshold: f64) -> Result<Self, regex::Error> {
        let ampm = r"(?P<ampm>am\b|pm\b|a\.m\.|p\.m\.)";
        let forms = vec![
            (
                Regex::new(
                    r"\b(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})(?:T(?P<hour>\d{2}):(?P<minute>\d{2})(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?\b",
                )?,
                DateForm::Iso,
            ),
            (
                Regex::new(&format!(
                    r"(?i)\b(?:(?:{WEEKDAYS}|mon|tues|tue|wed|thurs|thu|fri|sat|sun)\.?,?\s+)?(?P<mon>{MONTHS})\.?\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(?P<year>\d{{4}})\b)?"
                ))?,
                DateForm::NamedMonth,
            ),
            (
                Regex::new(&format!(
                    r"(?i)\b(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?(?P<mon>{MONTHS})\b\.?(?:,?\s+(?P<year>\d{{4}})\b)?"
                ))?,
                DateForm::DayMonth,
            ),
            (
                Regex::new(r"\b(?P<a>\d{1,2})(?P<sep>[/.-])(?P<b>\d{1,2})(?P<sep2>[/.-])(?P<year>\d{4}|\d{2})\b")?,
                DateForm::Numeric,
            ),
            (
                Regex::new(&format!(
                    r"(?i)\b(?P<event>{})\b[^.\n]{{0,40}}?\bat\s+(?P<hour>\d{{1,2}})(?::(?P<minute>\d{{2}}))?(?:\s*{ampm})?",
                    EVENT_KEYWORDS.join("|")
                ))?,
                DateForm::Event,
            ),
            (
                Regex::new(&format!(r"(?i)\b(?P<hour>\d{{1,2}})(?::(?P<minute>\d{{2}}))?\s*{ampm}"))?,
                DateForm::Time12,
            ),
            (
                Regex::new(r"\b(?P<hour>[01]?\d|2[0-3]):(?P<minute>[0-5]\d)(?::[0-5]\d)?\b")?,
                DateForm::Time24,
            ),
            (
                Regex::new(&format!(
                    r"(?i)\b(?P<rel>today|tonight|tomorrow|yesterday|(?P<dir>next|this|last)\s+(?P<target>{WEEKDAYS}|week|month|year)|in\s+(?P<n>\d{{1,3}})\s+(?P<unit>days?|weeks?|hours?))\b"
                ))?,
                DateForm::Relative,
            ),
        ];

        Ok(Self { forms, threshold })
    }

    /// Every candidate with its parsed components, before thresholding.
    fn scan<'t>(&self, text: &'t str) -> Vec<(regex::Match<'t>, DateParts, f64)> {
        let mut found = Vec::new();
        for (pattern, form) in &self.forms {
            for caps in pattern.captures_iter(text) {
                let Some(whole) = caps.get(0) else {
                    continue;
                };
                if let Some((parts, confidence)) = parse(&caps, *form) {
                    found.push((whole, parts, confidence));
                }
            }
        }
        found
    }

    /// Date and time of the first event-like expression in `text`, with
    /// relative expressions anchored at `now`.
    pub fn resolve_event(&self, text: &str, now: NaiveDateTime) -> Option<EventTime> {
        let mut found: Vec<_> = self
            .scan(text)
            .into_iter()
            .filter(|(_, _, confidence)| *confidence >= self.threshold)
            .collect();
        found.sort_by_key(|(m, _, _)| m.start());

        let date = found
            .iter()
            .filter(|(_, parts, _)| parts.has_date())
            .find_map(|(_, parts, _)| parts.date(now));
        let time = found.iter().find_map(|(_, parts, _)| parts.time(now));

        match (date, time) {
            (Some(date), time) => Some(EventTime { date, time }),
            (None, Some(time)) => Some(EventTime {
                date: now.date(),
                time: Some(time),
            }),
            (None, None) => None,
        }
    }
}

impl Detector for DateTimeDetector {
    fn name(&self) -> &'static str {
        "date_time"
    }

    fn pattern_type(&self) -> PatternType {
        PatternType::DateTime
    }

    fn detect(&self, text: &str) -> Vec<PatternMatch> {
        self.scan(text)
            .into_iter()
            .filter(|(_, _, confidence)| *confidence >= self.threshold)
            .map(|(m, parts, confidence)| {
                let meta = parts.into_metadata(classify_date_time_type(m.as_str()));
                PatternMatch::from_regex(PatternType::DateTime, m, confidence, meta)
            })
            .collect()
    }
}

fn num<T: std::str::FromStr>(caps: &Captures<'_>, name: &str) -> Option<T> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

fn to_24h(hour: u32, ampm: Option<&str>) -> Option<u32> {
    match ampm.map(|s| s.to_lowercase().replace('.', "")) {
        None => (hour < 24).then_some(hour),
        Some(_) if hour == 0 || hour > 12 => None,
        Some(m) if m == "pm" => Some(if hour == 12 { 12 } else { hour + 12 }),
        Some(_) => Some(if hour == 12 { 0 } else { hour }),
    }
}

/// Components and confidence for one regex hit. `None` drops the hit.
fn parse(caps: &Captures<'_>, form: DateForm) -> Option<(DateParts, f64)> {
    let mut parts = DateParts::default();
    let mut confidence = form.base_confidence();

    match form {
        DateForm::Iso => {
            parts.year = num(caps, "year");
            parts.month = num(caps, "month");
            parts.day = num(caps, "day");
            parts.hour = num(caps, "hour");
            parts.minute = num(caps, "minute");
        }
        DateForm::NamedMonth | DateForm::DayMonth => {
            parts.month = month_number(caps.name("mon")?.as_str());
            parts.day = num(caps, "day");
            parts.year = num(caps, "year");
            if parts.year.is_some() {
                confidence += 0.05;
            }
        }
        DateForm::Numeric => {
            if caps.name("sep")?.as_str() != caps.name("sep2")?.as_str() {
                return None;
            }
            let a: u32 = num(caps, "a")?;
            let b: u32 = num(caps, "b")?;
            let year: i32 = num(caps, "year")?;
            parts.year = Some(if year < 100 { 2000 + year } else { year });

            // Dotted dates are day-first; slashes and dashes are month-first
            // unless that cannot be a month.
            let day_first = caps.name("sep")?.as_str() == "." || (a > 12 && b <= 12);
            let (month, day) = if day_first { (b, a) } else { (a, b) };
            parts.month = Some(month);
            parts.day = Some(day);
        }
        DateForm::Event | DateForm::Time12 | DateForm::Time24 => {
            let ampm = caps.name("ampm").map(|m| m.as_str());
            parts.hour = Some(to_24h(num(caps, "hour")?, ampm)?);
            parts.minute = num(caps, "minute");
            if parts.minute.is_some_and(|m| m > 59) {
                return None;
            }
            if form == DateForm::Event && (ampm.is_some() || parts.minute.is_some()) {
                confidence += 0.05;
            }
        }
        DateForm::Relative => {
            let rel = caps.name("rel")?.as_str().to_lowercase();
            parts.shift = relative_shift(caps, &rel);
            parts.relative = Some(rel);
            if caps.name("n").is_some() {
                confidence += 0.1;
            }
        }
    }

    // Leap year when none is given, so "Feb 29" stays valid.
    let has_literal_date = parts.month.is_some() && parts.day.is_some();
    if has_literal_date && parts.literal_date(parts.year.unwrap_or(2000)).is_none() {
        return None;
    }

    Some((parts, confidence))
}

fn relative_shift(caps: &Captures<'_>, rel: &str) -> Option<Shift> {
    match rel {
        "today" | "tonight" => return Some(Shift::Days(0)),
        "tomorrow" => return Some(Shift::Days(1)),
        "yesterday" => return Some(Shift::Days(-1)),
        _ => {}
    }

    if let (Some(n), Some(unit)) = (num::<i64>(caps, "n"), caps.name("unit")) {
        let unit = unit.as_str().to_lowercase();
        return Some(if unit.starts_with("week") {
            Shift::Days(n * 7)
        } else if unit.starts_with("hour") {
            Shift::Hours(n)
        } else {
            Shift::Days(n)
        });
    }

    let direction: i8 = match caps.name("dir")?.as_str().to_lowercase().as_str() {
        "next" => 1,
        "last" => -1,
        _ => 0,
    };
    let target = caps.name("target")?.as_str().to_lowercase();
    match target.as_str() {
        "week" => Some(Shift::Days(7 * i64::from(direction))),
        "month" => Some(Shift::Months(i32::from(direction))),
        "year" => Some(Shift::Months(12 * i32::from(direction))),
        day => weekday_from(day).map(|w| Shift::Weekday(w, direction)),
    }
}
