//! Calendar links for a confirmed appointment.

use chrono::{DateTime, Utc};

const COMPACT_UTC: &str = "%Y%m%dT%H%M%SZ";

/// An appointment slot as calendar apps see it.
#[derive(Clone, Debug, PartialEq)]
pub struct CalendarEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CalendarEvent {
    /// Google Calendar "create event" URL.
    pub fn google_calendar_url(&self) -> String {
        format!(
            "https://calendar.google.com/calendar/render?action=TEMPLATE&text={}&dates={}/{}&details={}&location={}",
            urlencoding::encode(&self.title),
            self.start.format(COMPACT_UTC),
            self.end.format(COMPACT_UTC),
            urlencoding::encode(&self.description),
            urlencoding::encode(&self.location),
        )
    }

    /// Outlook.com compose deeplink.
    pub fn outlook_calendar_url(&self) -> String {
        format!(
            "https://outlook.live.com/calendar/0/deeplink/compose?subject={}&body={}&location={}&startdt={}&enddt={}",
            urlencoding::encode(&self.title),
            urlencoding::encode(&self.description),
            urlencoding::encode(&self.location),
            self.start.format("%Y-%m-%dT%H:%M:%SZ"),
            self.end.format("%Y-%m-%dT%H:%M:%SZ"),
        )
    }

    /// A single-event iCalendar document (CRLF line endings).
    pub fn to_ics(&self) -> String {
        [
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            "PRODID:-//LabLink//Appointments//EN".to_string(),
            "BEGIN:VEVENT".to_string(),
            format!("DTSTART:{}", self.start.format(COMPACT_UTC)),
            format!("DTEND:{}", self.end.format(COMPACT_UTC)),
            format!("SUMMARY:{}", escape_ics_text(&self.title)),
            format!("DESCRIPTION:{}", escape_ics_text(&self.description)),
            format!("LOCATION:{}", escape_ics_text(&self.location)),
            "END:VEVENT".to_string(),
            "END:VCALENDAR".to_string(),
        ]
        .join("\r\n")
    }
}

fn escape_ics_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> CalendarEvent {
        CalendarEvent {
            title: "Lab Test: Lipid Profile".into(),
            description: "Appointment at Synlab for Lipid Profile".into(),
            location: "12 Allen Ave, Ikeja".into(),
            start: Utc.with_ymd_and_hms(2026, 11, 2, 9, 30, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 11, 2, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn google_url_uses_compact_utc_dates() {
        let url = event().google_calendar_url();
        assert!(url.contains("dates=20261102T093000Z/20261102T103000Z"));
        assert!(url.contains("text=Lab%20Test%3A%20Lipid%20Profile"));
    }

    #[test]
    fn outlook_url_uses_iso_dates() {
        let url = event().outlook_calendar_url();
        assert!(url.contains("startdt=2026-11-02T09:30:00Z"));
        assert!(url.contains("enddt=2026-11-02T10:30:00Z"));
    }

    #[test]
    fn ics_escapes_commas_and_uses_crlf() {
        let ics = event().to_ics();
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("LOCATION:12 Allen Ave\\, Ikeja"));
        assert!(ics.contains("DTSTART:20261102T093000Z"));
        assert!(ics.ends_with("END:VCALENDAR"));
    }
}
