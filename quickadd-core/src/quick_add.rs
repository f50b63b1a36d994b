//! Google Calendar quick-add parameters, as received by an event-creation
//! endpoint.
//!
//! A quick-add link looks like
//! `https://calendar.google.com/calendar/render?action=TEMPLATE&text=...&dates=...`.
//! The endpoint receives either those parameters directly or a single
//! `original=<url>` parameter wrapping the whole link.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::ORIGINAL_PARAM;
use crate::error::{QuickAddError, QuickAddResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
}

/// Free/busy status requested by the `crm` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    Busy,
    /// Out of office.
    Blocking,
}

impl Availability {
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "AVAILABLE" => Some(Availability::Available),
            "BUSY" => Some(Availability::Busy),
            "BLOCKING" => Some(Availability::Blocking),
            _ => None,
        }
    }
}

/// Parse a compact Google Calendar date.
///
/// - `YYYYMMDD` is an all-day date
/// - `YYYYMMDDTHHmmSSZ` is a UTC date-time
/// - `YYYYMMDDTHHmmSS` is a floating (local) date-time
pub fn parse_google_date(s: &str) -> Option<EventTime> {
    if s.len() == 8 {
        return NaiveDate::parse_from_str(s, "%Y%m%d")
            .ok()
            .map(EventTime::Date);
    }

    if !s.contains('T') {
        return None;
    }

    match s.strip_suffix('Z') {
        Some(utc) => NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| EventTime::DateTimeUtc(dt.and_utc())),
        None => NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
            .ok()
            .map(EventTime::DateTimeFloating),
    }
}

/// Result of parsing a `dates` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSpan {
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub all_day: bool,
}

/// Parse `start[/end]`.
pub fn parse_dates(s: &str) -> QuickAddResult<DateSpan> {
    let (start_str, end_str) = match s.split_once('/') {
        Some((start, end)) => (start, Some(end)),
        None => (s, None),
    };

    let start =
        parse_google_date(start_str).ok_or_else(|| QuickAddError::InvalidDate(start_str.into()))?;
    let end = match end_str.filter(|e| !e.is_empty()) {
        Some(e) => Some(parse_google_date(e).ok_or_else(|| QuickAddError::InvalidDate(e.into()))?),
        None => None,
    };

    Ok(DateSpan {
        start,
        end,
        all_day: start_str.len() == 8,
    })
}

/// An event pre-filled from a quick-add link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAddEvent {
    /// `text`
    pub title: Option<String>,
    /// `details`
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub all_day: bool,
    /// `ctz`, e.g. `America/New_York`
    pub timezone: Option<String>,
    /// `add`, comma-separated emails
    pub guests: Vec<String>,
    /// `crm`
    pub availability: Option<Availability>,
    /// `trp`
    pub show_as_busy: Option<bool>,
    /// `vcon=meet`
    pub video_meeting: bool,
    /// `recur`, an RFC 5545 rule
    pub recurrence: Option<String>,
    /// `src`, a shared calendar's email
    pub source_calendar: Option<String>,
    /// `sprop`, may repeat
    pub source_properties: Vec<String>,
    /// Parameters not listed above, in order.
    pub extra: Vec<(String, String)>,
}

impl QuickAddEvent {
    /// Build from a quick-add URL, or from a handler URL carrying one in its
    /// `original` parameter.
    pub fn from_url(url: &str) -> QuickAddResult<Self> {
        let parsed =
            Url::parse(url).map_err(|e| QuickAddError::InvalidUrl(url.to_string(), e.to_string()))?;
        Self::from_query_pairs(parsed.query_pairs())
    }

    /// Build from query parameters. A lone `original` parameter (no `action`)
    /// is followed one level to the wrapped link.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> QuickAddResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let wrapped = pairs
            .iter()
            .find(|(key, _)| key == ORIGINAL_PARAM)
            .filter(|_| !pairs.iter().any(|(key, _)| key == "action"));

        match wrapped {
            Some((_, original)) => {
                let url = Url::parse(original)
                    .map_err(|e| QuickAddError::InvalidUrl(original.clone(), e.to_string()))?;
                Self::from_params(
                    url.query_pairs()
                        .map(|(k, v)| (k.into_owned(), v.into_owned())),
                )
            }
            None => Self::from_params(pairs),
        }
    }

    fn from_params(pairs: impl IntoIterator<Item = (String, String)>) -> QuickAddResult<Self> {
        let mut event = QuickAddEvent::default();

        for (key, value) in pairs {
            match key.as_str() {
                // Always TEMPLATE on quick-add links.
                "action" => {}
                "text" => event.title = Some(value),
                "details" => event.description = Some(value),
                "location" => event.location = Some(value),
                "dates" => {
                    let span = parse_dates(&value)?;
                    event.start = Some(span.start);
                    event.end = span.end;
                    event.all_day = span.all_day;
                }
                "ctz" => event.timezone = Some(value),
                "add" => event.guests.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|email| !email.is_empty())
                        .map(String::from),
                ),
                "crm" => event.availability = Availability::from_param(&value),
                "trp" => event.show_as_busy = value.parse().ok(),
                "vcon" => event.video_meeting = value == "meet",
                "recur" => event.recurrence = Some(value),
                "src" => event.source_calendar = Some(value),
                "sprop" => event.source_properties.push(value),
                _ => event.extra.push((key, value)),
            }
        }

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_all_day_date() {
        assert_eq!(
            parse_google_date("20250315"),
            Some(EventTime::Date(NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()))
        );
    }

    #[test]
    fn parses_utc_and_floating_times() {
        assert_eq!(
            parse_google_date("20250101T100000Z"),
            Some(EventTime::DateTimeUtc(
                Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
            ))
        );
        assert_eq!(
            parse_google_date("20250101T100000"),
            Some(EventTime::DateTimeFloating(
                NaiveDate::from_ymd_opt(2025, 1, 1)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap()
            ))
        );
    }

    #[test]
    fn rejects_malformed_dates() {
        assert_eq!(parse_google_date("2025"), None);
        assert_eq!(parse_google_date("20251301"), None);
        assert_eq!(parse_google_date("20250101T25"), None);
        assert!(matches!(
            parse_dates("tomorrow"),
            Err(QuickAddError::InvalidDate(_))
        ));
    }

    #[test]
    fn date_span_flags_all_day() {
        let span = parse_dates("20250101/20250102").unwrap();
        assert!(span.all_day);
        assert_eq!(
            span.end,
            Some(EventTime::Date(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()))
        );

        let span = parse_dates("20250101T100000Z").unwrap();
        assert!(!span.all_day);
        assert_eq!(span.end, None);
    }

    #[test]
    fn event_from_quick_add_url() {
        let event = QuickAddEvent::from_url(
            "https://calendar.google.com/calendar/render?action=TEMPLATE&text=Team+sync\
             &dates=20250101T100000Z/20250101T110000Z&details=Agenda&location=Room+4\
             &add=a%40x.com,+b%40x.com&crm=BUSY&vcon=meet&ctz=Europe/Paris&foo=bar",
        )
        .unwrap();

        assert_eq!(event.title.as_deref(), Some("Team sync"));
        assert_eq!(event.description.as_deref(), Some("Agenda"));
        assert_eq!(event.location.as_deref(), Some("Room 4"));
        assert_eq!(event.guests, ["a@x.com", "b@x.com"]);
        assert_eq!(event.availability, Some(Availability::Busy));
        assert!(event.video_meeting);
        assert!(!event.all_day);
        assert_eq!(event.timezone.as_deref(), Some("Europe/Paris"));
        assert_eq!(event.extra, [("foo".to_string(), "bar".to_string())]);
        assert_eq!(
            event.end,
            Some(EventTime::DateTimeUtc(
                Utc.with_ymd_and_hms(2025, 1, 1, 11, 0, 0).unwrap()
            ))
        );
    }

    #[test]
    fn follows_original_parameter() {
        let original = "https://calendar.google.com/calendar/render?action=TEMPLATE&text=Lunch&dates=20250102";
        let handler = format!(
            "http://localhost:3000/event/add-to?original={}",
            urlencoding::encode(original)
        );

        let event = QuickAddEvent::from_url(&handler).unwrap();
        assert_eq!(event.title.as_deref(), Some("Lunch"));
        assert!(event.all_day);
        assert!(event.extra.is_empty());
    }

    #[test]
    fn expanded_params_ignore_original_key() {
        let event = QuickAddEvent::from_query_pairs([
            ("action", "TEMPLATE"),
            ("text", "Review"),
            ("original", "garbage"),
        ])
        .unwrap();
        assert_eq!(event.title.as_deref(), Some("Review"));
        assert_eq!(event.extra, [("original".to_string(), "garbage".to_string())]);
    }

    #[test]
    fn invalid_original_is_an_error() {
        let result = QuickAddEvent::from_query_pairs([("original", "not a url")]);
        assert!(matches!(result, Err(QuickAddError::InvalidUrl(..))));
    }
}
