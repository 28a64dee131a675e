//! Action bodies
//!
//! Each body turns the selected text into an [`ActionOutcome`]. Bodies never
//! touch the platform; they only describe the effect. When the specific
//! interpretation fails (no date found, unknown carrier, ...) a body falls
//! back to a less specific but still useful effect, usually a web search.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;

use super::{ActionContext, ActionOutcome, ActionType};
use crate::detectors::datetime::EventTime;
use crate::detectors::{currency, tracking, unit};
use crate::error::ActionError;

const MAPS_URL: &str = "https://www.google.com/maps/search/?api=1&query=";
const SEARCH_URL: &str = "https://www.google.com/search?q=";
const TRANSLATE_URL: &str = "https://translate.google.com/?sl=auto";
const GOOGLE_CALENDAR_URL: &str = "https://calendar.google.com/calendar/render?action=TEMPLATE";
const OUTLOOK_CALENDAR_URL: &str = "https://outlook.live.com/calendar/0/deeplink/compose?path=/calendar/action/compose&rru=addevent";

const DEFAULT_EVENT_LENGTH_HOURS: i64 = 1;

/// Run the body of `action_type` against `text`.
pub fn run(action_type: ActionType, text: &str, ctx: &ActionContext<'_>) -> Result<ActionOutcome, ActionError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ActionError::EmptySelection);
    }

    match action_type {
        ActionType::MapIt => Ok(ActionOutcome::open(
            "Opening map",
            format!("{MAPS_URL}{}", urlencoding::encode(text)),
        )),
        ActionType::Email => Ok(email(text, ctx)),
        ActionType::Calendar => Ok(calendar(text, ctx)),
        ActionType::TrackPackage => Ok(track_package(text, ctx)),
        ActionType::Call => dial("tel", "Calling", text, ctx),
        ActionType::Message => dial("sms", "Messaging", text, ctx),
        ActionType::Copy => Ok(ActionOutcome::copy("Copied to clipboard", text)),
        ActionType::Search => Ok(ActionOutcome::open("Searching the web", search_url(text))),
        ActionType::Convert => Ok(convert(text, ctx)),
        ActionType::Translate => Ok(ActionOutcome::open(
            "Opening translation",
            format!(
                "{TRANSLATE_URL}&tl={}&text={}",
                urlencoding::encode(&ctx.preferences.translation_target),
                urlencoding::encode(text)
            ),
        )),
        ActionType::Define => Ok(ActionOutcome::open(
            "Looking up definition",
            search_url(&format!("define {text}")),
        )),
        ActionType::QuickNote => Ok(quick_note(text, ctx)),
        ActionType::Share => Ok(share(text, ctx)),
    }
}

fn search_url(query: &str) -> String {
    format!("{SEARCH_URL}{}", urlencoding::encode(query))
}

fn email(text: &str, ctx: &ActionContext<'_>) -> ActionOutcome {
    match ctx.detectors.email().first_address(text) {
        Some(address) => ActionOutcome::open(format!("Composing email to {address}"), format!("mailto:{address}"))
            .with_data(json!({ "to": address })),
        None => ActionOutcome::open(
            "Composing email",
            format!("mailto:?body={}", urlencoding::encode(text)),
        ),
    }
}

fn dial(scheme: &str, verb: &str, text: &str, ctx: &ActionContext<'_>) -> Result<ActionOutcome, ActionError> {
    let number = ctx
        .detectors
        .phone()
        .dialable(text)
        .ok_or_else(|| ActionError::NoPhoneNumber(text.to_string()))?;
    Ok(ActionOutcome::open(format!("{verb} {number}"), format!("{scheme}:{number}"))
        .with_data(json!({ "number": number })))
}

fn track_package(text: &str, ctx: &ActionContext<'_>) -> ActionOutcome {
    match ctx.detectors.tracking().identify(text) {
        Some((carrier, number)) => {
            let name = tracking::carrier_name(carrier);
            ActionOutcome::open(
                format!("Tracking with {name}"),
                tracking::tracking_url(carrier, number),
            )
            .with_data(json!({ "carrier": carrier, "carrierName": name, "trackingNumber": number }))
        }
        None => ActionOutcome::open(
            "Searching for tracking information",
            search_url(&format!("track package {text}")),
        ),
    }
}

fn calendar(text: &str, ctx: &ActionContext<'_>) -> ActionOutcome {
    let outlook = ctx.preferences.default_calendar.eq_ignore_ascii_case("outlook");
    let title = urlencoding::encode(text);

    let Some(event) = ctx.detectors.date_time().resolve_event(text, ctx.now) else {
        let url = if outlook {
            format!("{OUTLOOK_CALENDAR_URL}&subject={title}")
        } else {
            format!("{GOOGLE_CALENDAR_URL}&text={title}")
        };
        return ActionOutcome::open("Creating calendar event", url);
    };

    let span = EventSpan::from(event);
    let url = if outlook {
        let all_day = if span.all_day { "&allday=true" } else { "" };
        format!(
            "{OUTLOOK_CALENDAR_URL}&subject={title}&startdt={}&enddt={}{all_day}&body={title}",
            span.outlook_start(),
            span.outlook_end()
        )
    } else {
        format!(
            "{GOOGLE_CALENDAR_URL}&text={title}&dates={}/{}&details={title}",
            span.google_start(),
            span.google_end()
        )
    };

    ActionOutcome::open(format!("Creating event on {}", span.start.format("%Y-%m-%d")), url).with_data(json!({
        "start": span.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "end": span.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "allDay": span.all_day,
    }))
}

/// Start and end of a calendar entry.
struct EventSpan {
    start: NaiveDateTime,
    end: NaiveDateTime,
    all_day: bool,
}

impl From<EventTime> for EventSpan {
    fn from(event: EventTime) -> Self {
        match event.start() {
            Some(start) => Self {
                start,
                end: start + Duration::hours(DEFAULT_EVENT_LENGTH_HOURS),
                all_day: false,
            },
            None => {
                let start = start_of(event.date);
                Self {
                    start,
                    end: start + Duration::days(1),
                    all_day: true,
                }
            }
        }
    }
}

/// Midnight of `date`, used where only a day is known.
fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

impl EventSpan {
    fn google_start(&self) -> String {
        google_stamp(self.start, self.all_day)
    }

    fn google_end(&self) -> String {
        google_stamp(self.end, self.all_day)
    }

    fn outlook_start(&self) -> String {
        outlook_stamp(self.start, self.all_day)
    }

    fn outlook_end(&self) -> String {
        outlook_stamp(self.end, self.all_day)
    }
}

fn google_stamp(at: NaiveDateTime, all_day: bool) -> String {
    if all_day {
        at.date().format("%Y%m%d").to_string()
    } else {
        at.format("%Y%m%dT%H%M%S").to_string()
    }
}

fn outlook_stamp(at: NaiveDateTime, all_day: bool) -> String {
    if all_day {
        at.date().format("%Y-%m-%d").to_string()
    } else {
        at.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

fn convert(text: &str, ctx: &ActionContext<'_>) -> ActionOutcome {
    if let Some(outcome) = convert_money(text, ctx) {
        return outcome;
    }
    if let Some(outcome) = convert_quantity(text, ctx) {
        return outcome;
    }
    ActionOutcome::open("Searching for a conversion", search_url(&format!("convert {text}")))
}

fn convert_money(text: &str, ctx: &ActionContext<'_>) -> Option<ActionOutcome> {
    let money = ctx.detectors.currency().first_amount(text)?;
    let preferred = ctx.preferences.preferred_currency.to_uppercase();
    let target = if preferred == money.code {
        if money.code == "USD" {
            "EUR".to_string()
        } else {
            "USD".to_string()
        }
    } else {
        preferred
    };

    let converted = currency::convert(money.amount, money.code, &target)?;
    let message = format!("{} {} ≈ {converted:.2} {target}", money.amount, money.code);
    let query = format!("{} {} to {target}", money.amount, money.code);

    Some(ActionOutcome::open(message, search_url(&query)).with_data(json!({
        "from": { "amount": money.amount, "code": money.code },
        "to": { "amount": (converted * 100.0).round() / 100.0, "code": target },
    })))
}

fn convert_quantity(text: &str, ctx: &ActionContext<'_>) -> Option<ActionOutcome> {
    let quantity = ctx.detectors.unit().first_quantity(text)?;
    let system = unit::System::from_preference(&ctx.preferences.preferred_units);
    let (target, converted) = unit::to_system(&quantity, system)?;

    let message = format!("{} {} ≈ {} {target}", quantity.value, quantity.unit, trim_number(converted));
    let query = format!("{} {} to {target}", quantity.value, quantity.unit);

    Some(ActionOutcome::open(message, search_url(&query)).with_data(json!({
        "category": quantity.category,
        "from": { "value": quantity.value, "unit": quantity.unit },
        "to": { "value": converted, "unit": target },
    })))
}

/// Two decimals without trailing zeros: `11.02`, `212`.
fn trim_number(value: f64) -> String {
    let s = format!("{value:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn quick_note(text: &str, ctx: &ActionContext<'_>) -> ActionOutcome {
    let platform = ctx.preferences.note_platform.to_lowercase();
    let url = match platform.as_str() {
        "keep" => "https://keep.google.com/#NOTE",
        "notion" => "https://www.notion.so/new",
        "evernote" => "https://www.evernote.com/client/web#/note/new",
        _ => return ActionOutcome::copy("Note copied to clipboard", text),
    };
    ActionOutcome::open(format!("Opening {platform}"), url.to_string())
        .with_data(json!({ "platform": platform, "text": text }))
}

fn share(text: &str, ctx: &ActionContext<'_>) -> ActionOutcome {
    let encoded = urlencoding::encode(text);
    let url = match ctx.preferences.share_platform.to_lowercase().as_str() {
        "twitter" => format!("https://twitter.com/intent/tweet?text={encoded}"),
        "x" => format!("https://x.com/intent/tweet?text={encoded}"),
        "email" => format!("mailto:?body={encoded}"),
        "whatsapp" => format!("https://wa.me/?text={encoded}"),
        _ => return ActionOutcome::copy("Copied for sharing", text),
    };
    ActionOutcome::open("Sharing", url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionEffect;
    use crate::config::{ActionPreferences, EngineConfig};
    use crate::detectors::DetectorSet;

    fn detectors() -> DetectorSet {
        DetectorSet::new(&EngineConfig::default()).unwrap()
    }

    fn friday_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn run_with(action: ActionType, text: &str, prefs: &ActionPreferences) -> Result<ActionOutcome, ActionError> {
        let set = detectors();
        let ctx = ActionContext::new(prefs, &set).at(friday_morning());
        run(action, text, &ctx)
    }

    fn url_of(outcome: &ActionOutcome) -> &str {
        match &outcome.effect {
            ActionEffect::OpenUrl(url) => url,
            ActionEffect::CopyToClipboard(_) => panic!("expected a URL effect"),
        }
    }

    #[test]
    fn test_map_it_encodes_query() {
        let out = run_with(ActionType::MapIt, "1600 Amphitheatre Pkwy", &ActionPreferences::default()).unwrap();
        assert_eq!(
            url_of(&out),
            "https://www.google.com/maps/search/?api=1&query=1600%20Amphitheatre%20Pkwy"
        );
    }

    #[test]
    fn test_email_uses_first_address() {
        let prefs = ActionPreferences::default();
        let out = run_with(ActionType::Email, "ping bob@example.com today", &prefs).unwrap();
        assert_eq!(url_of(&out), "mailto:bob@example.com");

        let out = run_with(ActionType::Email, "hello there", &prefs).unwrap();
        assert_eq!(url_of(&out), "mailto:?body=hello%20there");
    }

    #[test]
    fn test_call_and_message_schemes() {
        let prefs = ActionPreferences::default();
        let call = run_with(ActionType::Call, "+1 555 123 4567", &prefs).unwrap();
        assert_eq!(url_of(&call), "tel:+15551234567");
        let sms = run_with(ActionType::Message, "(555) 123-4567", &prefs).unwrap();
        assert_eq!(url_of(&sms), "sms:5551234567");
    }

    #[test]
    fn test_call_without_digits_fails() {
        let err = run_with(ActionType::Call, "call me maybe", &ActionPreferences::default()).unwrap_err();
        assert!(matches!(err, ActionError::NoPhoneNumber(_)));
    }

    #[test]
    fn test_empty_selection() {
        let err = run_with(ActionType::TrackPackage, "   ", &ActionPreferences::default()).unwrap_err();
        assert!(matches!(err, ActionError::EmptySelection));
    }

    #[test]
    fn test_track_package_known_and_fallback() {
        let prefs = ActionPreferences::default();
        let out = run_with(ActionType::TrackPackage, "1Z999AA10123456784", &prefs).unwrap();
        assert_eq!(url_of(&out), "https://www.ups.com/track?tracknum=1Z999AA10123456784");

        let out = run_with(ActionType::TrackPackage, "my parcel", &prefs).unwrap();
        assert_eq!(url_of(&out), "https://www.google.com/search?q=track%20package%20my%20parcel");
    }

    #[test]
    fn test_calendar_relative_event() {
        let out = run_with(ActionType::Calendar, "lunch tomorrow at 1pm", &ActionPreferences::default()).unwrap();
        assert!(url_of(&out).contains("dates=20240316T130000/20240316T140000"));
        assert_eq!(out.data.as_ref().unwrap()["allDay"], false);
    }

    #[test]
    fn test_calendar_all_day_and_outlook() {
        let mut prefs = ActionPreferences::default();
        let out = run_with(ActionType::Calendar, "March 20, 2024", &prefs).unwrap();
        assert!(url_of(&out).contains("dates=20240320/20240321"));

        prefs.default_calendar = "outlook".into();
        let out = run_with(ActionType::Calendar, "March 20, 2024", &prefs).unwrap();
        assert!(url_of(&out).starts_with("https://outlook.live.com/"));
        assert!(url_of(&out).contains("startdt=2024-03-20&enddt=2024-03-21&allday=true"));
    }

    #[test]
    fn test_calendar_without_date_links_raw_text() {
        let out = run_with(ActionType::Calendar, "team sync", &ActionPreferences::default()).unwrap();
        assert_eq!(
            url_of(&out),
            "https://calendar.google.com/calendar/render?action=TEMPLATE&text=team%20sync"
        );
    }

    #[test]
    fn test_convert_currency_to_preferred() {
        let mut prefs = ActionPreferences::default();
        prefs.preferred_currency = "EUR".into();
        let out = run_with(ActionType::Convert, "$100", &prefs).unwrap();
        assert_eq!(out.message, "100 USD ≈ 92.00 EUR");
        assert_eq!(out.data.as_ref().unwrap()["to"]["code"], "EUR");
    }

    #[test]
    fn test_convert_currency_already_preferred() {
        let out = run_with(ActionType::Convert, "$100", &ActionPreferences::default()).unwrap();
        assert_eq!(out.data.as_ref().unwrap()["to"]["code"], "EUR");
    }

    #[test]
    fn test_convert_unit_to_metric() {
        let out = run_with(ActionType::Convert, "10 miles", &ActionPreferences::default()).unwrap();
        assert_eq!(out.message, "10 mi ≈ 16.09 km");
        assert_eq!(out.data.as_ref().unwrap()["to"]["unit"], "km");
    }

    #[test]
    fn test_convert_fallback_search() {
        let out = run_with(ActionType::Convert, "a lot", &ActionPreferences::default()).unwrap();
        assert_eq!(url_of(&out), "https://www.google.com/search?q=convert%20a%20lot");
    }

    #[test]
    fn test_translate_uses_target_language() {
        let mut prefs = ActionPreferences::default();
        prefs.translation_target = "de".into();
        let out = run_with(ActionType::Translate, "good morning", &prefs).unwrap();
        assert_eq!(
            url_of(&out),
            "https://translate.google.com/?sl=auto&tl=de&text=good%20morning"
        );
    }

    #[test]
    fn test_note_and_share_default_to_clipboard() {
        let prefs = ActionPreferences::default();
        let note = run_with(ActionType::QuickNote, "remember this", &prefs).unwrap();
        assert_eq!(note.effect, ActionEffect::CopyToClipboard("remember this".into()));
        let shared = run_with(ActionType::Share, "look", &prefs).unwrap();
        assert_eq!(shared.effect, ActionEffect::CopyToClipboard("look".into()));
    }

    #[test]
    fn test_share_platforms() {
        let mut prefs = ActionPreferences::default();
        prefs.share_platform = "whatsapp".into();
        let out = run_with(ActionType::Share, "hi all", &prefs).unwrap();
        assert_eq!(url_of(&out), "https://wa.me/?text=hi%20all");

        prefs.note_platform = "notion".into();
        let note = run_with(ActionType::QuickNote, "idea", &prefs).unwrap();
        assert_eq!(url_of(&note), "https://www.notion.so/new");
        assert_eq!(note.data.unwrap()["text"], "idea");
    }
}
