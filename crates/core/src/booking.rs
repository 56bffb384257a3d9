//! Booking confirmation and storage.
//!
//! A [`Booking`] is created once, at confirmation, with status [`BookingStatus::Pending`].
//! Later status transitions belong to the lab back office and are not modelled here.

use crate::calendar::CalendarEvent;
use crate::catalog::Catalog;
use crate::{LabError, LabResult};
use api_shared::{BookingRes, CreateBookingReq};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Processing,
    Completed,
    Cancelled,
    ResultReady,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Processing => "processing",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::ResultReady => "result_ready",
        };
        f.write_str(s)
    }
}

/// What is being booked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Test,
    Package,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemKind::Test => "test",
            ItemKind::Package => "package",
        })
    }
}

impl FromStr for ItemKind {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(ItemKind::Test),
            "package" => Ok(ItemKind::Package),
            other => Err(LabError::InvalidInput(format!(
                "item kind must be 'test' or 'package', got '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BookedItem {
    pub kind: ItemKind,
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BookedLab {
    pub id: String,
    pub name: String,
    pub address: String,
}

/// A user's selection, before it is checked against the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingRequest {
    pub user_id: String,
    pub item_kind: ItemKind,
    pub item_id: String,
    pub lab: BookedLab,
    pub scheduled_at: DateTime<Utc>,
}

impl TryFrom<CreateBookingReq> for BookingRequest {
    type Error = LabError;

    fn try_from(req: CreateBookingReq) -> Result<Self, Self::Error> {
        let scheduled_at = DateTime::parse_from_rfc3339(req.scheduled_at.trim())
            .map_err(|e| {
                LabError::InvalidInput(format!("scheduledAt must be an RFC 3339 timestamp: {e}"))
            })?
            .with_timezone(&Utc);

        Ok(BookingRequest {
            user_id: req.user_id,
            item_kind: req.item_kind.parse()?,
            item_id: req.item_id,
            lab: BookedLab {
                id: req.lab_id,
                name: req.lab_name,
                address: req.lab_address,
            },
            scheduled_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub item: BookedItem,
    pub lab: BookedLab,
    /// Price in naira; `0` when the item carries no price.
    pub price: u64,
    pub scheduled_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Validates a request against the catalog and creates a pending booking.
    ///
    /// Packages are priced at their discounted estimate; single tests carry no price.
    ///
    /// # Errors
    ///
    /// - `LabError::InvalidInput` if the user, item or lab id is blank, or the slot is not
    ///   after `now`,
    /// - `LabError::NotFound` if the item id is not in the catalog.
    pub fn confirm(
        request: BookingRequest,
        catalog: &Catalog,
        now: DateTime<Utc>,
    ) -> LabResult<Self> {
        for (field, value) in [
            ("userId", &request.user_id),
            ("itemId", &request.item_id),
            ("labId", &request.lab.id),
        ] {
            if value.trim().is_empty() {
                return Err(LabError::InvalidInput(format!("{field} is required")));
            }
        }

        if request.scheduled_at <= now {
            return Err(LabError::InvalidInput(
                "appointment must be scheduled in the future".into(),
            ));
        }

        let (name, price) = match request.item_kind {
            ItemKind::Test => catalog
                .test(&request.item_id)
                .map(|t| (t.name.clone(), 0)),
            ItemKind::Package => catalog
                .package(&request.item_id)
                .map(|p| (p.name.clone(), p.discounted_price())),
        }
        .ok_or_else(|| {
            LabError::NotFound(format!("{} '{}'", request.item_kind, request.item_id))
        })?;

        let mut lab = request.lab;
        if lab.name.trim().is_empty() {
            lab.name = lab.id.clone();
        }

        Ok(Booking {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            item: BookedItem {
                kind: request.item_kind,
                id: request.item_id,
                name,
            },
            lab,
            price,
            scheduled_at: request.scheduled_at,
            status: BookingStatus::Pending,
            created_at: now,
        })
    }

    /// The appointment as a one-hour calendar slot at the lab.
    pub fn calendar_event(&self) -> CalendarEvent {
        CalendarEvent {
            title: format!("Lab Test: {}", self.item.name),
            description: format!(
                "Appointment at {} for {}. Booking reference {}.",
                self.lab.name, self.item.name, self.id
            ),
            location: self.lab.address.clone(),
            start: self.scheduled_at,
            end: self.scheduled_at + Duration::hours(1),
        }
    }
}

impl From<&Booking> for BookingRes {
    fn from(b: &Booking) -> Self {
        BookingRes {
            id: b.id.to_string(),
            user_id: b.user_id.clone(),
            item_kind: b.item.kind.to_string(),
            item_id: b.item.id.clone(),
            item_name: b.item.name.clone(),
            lab_id: b.lab.id.clone(),
            lab_name: b.lab.name.clone(),
            lab_address: b.lab.address.clone(),
            price: b.price,
            scheduled_at: b.scheduled_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            status: b.status.to_string(),
            created_at: b.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Persistence seam for bookings.
pub trait BookingStore: Send + Sync {
    fn insert(&self, booking: Booking) -> LabResult<()>;

    fn get(&self, id: Uuid) -> LabResult<Option<Booking>>;

    /// A user's bookings, latest appointment first.
    fn list_for_user(&self, user_id: &str) -> LabResult<Vec<Booking>>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> LabError {
    LabError::Storage("booking store lock poisoned".into())
}

impl BookingStore for InMemoryBookingStore {
    fn insert(&self, booking: Booking) -> LabResult<()> {
        let mut bookings = self.bookings.write().map_err(poisoned)?;
        tracing::info!(booking_id = %booking.id, user_id = %booking.user_id, "booking stored");
        bookings.insert(booking.id, booking);
        Ok(())
    }

    fn get(&self, id: Uuid) -> LabResult<Option<Booking>> {
        let bookings = self.bookings.read().map_err(poisoned)?;
        Ok(bookings.get(&id).cloned())
    }

    fn list_for_user(&self, user_id: &str) -> LabResult<Vec<Booking>> {
        let bookings = self.bookings.read().map_err(poisoned)?;
        let mut mine: Vec<Booking> = bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        Ok(mine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    fn request(kind: ItemKind, item_id: &str) -> BookingRequest {
        BookingRequest {
            user_id: "user-1".into(),
            item_kind: kind,
            item_id: item_id.into(),
            lab: BookedLab {
                id: "lab-1".into(),
                name: "Synlab Ikeja".into(),
                address: "12 Allen Ave, Ikeja".into(),
            },
            scheduled_at: now() + Duration::days(1),
        }
    }

    fn catalog() -> Catalog {
        Catalog::bundled().expect("catalog")
    }

    #[test]
    fn package_booking_is_pending_with_discounted_price() {
        let booking =
            Booking::confirm(request(ItemKind::Package, "exec-check"), &catalog(), now())
                .expect("confirm");
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.item.name, "Executive Wellness");
        assert_eq!(booking.price, 58_500);
        assert_eq!(booking.created_at, now());
    }

    #[test]
    fn test_booking_has_no_price() {
        let booking = Booking::confirm(request(ItemKind::Test, "fbc"), &catalog(), now())
            .expect("confirm");
        assert_eq!(booking.price, 0);
        assert_eq!(booking.item.kind, ItemKind::Test);
    }

    #[test]
    fn unknown_item_is_not_found() {
        let err = Booking::confirm(request(ItemKind::Test, "unicorn"), &catalog(), now())
            .expect_err("unknown");
        assert!(matches!(err, LabError::NotFound(_)));
    }

    #[test]
    fn past_slot_and_blank_ids_are_rejected() {
        let mut past = request(ItemKind::Test, "fbc");
        past.scheduled_at = now();
        assert!(matches!(
            Booking::confirm(past, &catalog(), now()),
            Err(LabError::InvalidInput(_))
        ));

        let mut blank = request(ItemKind::Test, "fbc");
        blank.lab.id = " ".into();
        assert!(matches!(
            Booking::confirm(blank, &catalog(), now()),
            Err(LabError::InvalidInput(_))
        ));
    }

    #[test]
    fn wire_request_conversion() {
        let req = CreateBookingReq {
            user_id: "u".into(),
            item_kind: "Package".into(),
            item_id: "basic-check".into(),
            lab_id: "l".into(),
            lab_name: "Lab".into(),
            lab_address: String::new(),
            scheduled_at: "2026-11-02T10:30:00+01:00".into(),
        };
        let parsed = BookingRequest::try_from(req.clone()).expect("parse");
        assert_eq!(parsed.item_kind, ItemKind::Package);
        assert_eq!(
            parsed.scheduled_at,
            Utc.with_ymd_and_hms(2026, 11, 2, 9, 30, 0).unwrap()
        );

        let bad = CreateBookingReq {
            scheduled_at: "next tuesday".into(),
            ..req
        };
        assert!(matches!(
            BookingRequest::try_from(bad),
            Err(LabError::InvalidInput(_))
        ));
    }

    #[test]
    fn calendar_event_is_one_hour_at_the_lab() {
        let booking = Booking::confirm(request(ItemKind::Test, "fbc"), &catalog(), now())
            .expect("confirm");
        let event = booking.calendar_event();
        assert!(event.title.starts_with("Lab Test: "));
        assert_eq!(event.end - event.start, Duration::hours(1));
        assert_eq!(event.location, "12 Allen Ave, Ikeja");
    }

    #[test]
    fn response_uses_snake_case_status() {
        let booking = Booking::confirm(request(ItemKind::Test, "fbc"), &catalog(), now())
            .expect("confirm");
        let res = BookingRes::from(&booking);
        assert_eq!(res.status, "pending");
        assert_eq!(res.item_kind, "test");
        assert_eq!(res.created_at, "2026-10-19T08:00:00Z");
        assert_eq!(BookingStatus::ResultReady.to_string(), "result_ready");
    }

    #[test]
    fn store_lists_latest_appointment_first() {
        let store = InMemoryBookingStore::new();
        let c = catalog();
        let mut early = request(ItemKind::Test, "fbc");
        early.scheduled_at = now() + Duration::days(1);
        let mut late = request(ItemKind::Test, "malaria");
        late.scheduled_at = now() + Duration::days(5);
        let mut other = request(ItemKind::Test, "fbc");
        other.user_id = "user-2".into();

        let early = Booking::confirm(early, &c, now()).expect("confirm");
        let late = Booking::confirm(late, &c, now()).expect("confirm");
        store.insert(early.clone()).expect("insert");
        store.insert(late.clone()).expect("insert");
        store
            .insert(Booking::confirm(other, &c, now()).expect("confirm"))
            .expect("insert");

        let mine = store.list_for_user("user-1").expect("list");
        assert_eq!(mine, vec![late, early.clone()]);
        assert_eq!(store.get(early.id).expect("get"), Some(early));
        assert_eq!(store.get(Uuid::new_v4()).expect("get"), None);
    }
}
