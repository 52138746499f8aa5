use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;
use crate::models::target::{Target, TargetKind, TargetSelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, InProgress)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    pub fn is_cancellable(&self) -> bool {
        self.can_transition_to(BookingStatus::Cancelled)
    }
}

/// How `total_price` was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceStatus {
    Computed,
    /// Agency bookings have no price model; zero until the agency quotes.
    AwaitingQuote,
    Quoted,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: String,
    pub tourist_id: String,
    pub target: Target,
    pub status: BookingStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_people: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub price_status: PriceStatus,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn booking_type(&self) -> TargetKind {
        self.target.kind()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub booking_type: TargetKind,
    #[serde(flatten)]
    pub target: TargetSelection,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_party_size")]
    pub number_of_people: u32,
    pub special_requests: Option<String>,
}

pub const MAX_PARTY_SIZE: u32 = 500;

fn default_party_size() -> u32 {
    1
}

impl BookingRequest {
    pub fn validate_dates_and_party(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.end_date < self.start_date {
            errors.add("end_date", "must not be before start_date");
        }
        if self.number_of_people < 1 {
            errors.add("number_of_people", "must be at least 1");
        } else if self.number_of_people > MAX_PARTY_SIZE {
            errors.add(
                "number_of_people",
                format!("must be at most {}", MAX_PARTY_SIZE),
            );
        }
        if self
            .special_requests
            .as_deref()
            .map_or(false, |text| text.len() > 2000)
        {
            errors.add("special_requests", "must be at most 2000 characters");
        }
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingQuote {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub tourist_id: Option<String>,
    /// `Some(vec![])` matches nothing.
    pub targets: Option<Vec<Target>>,
    pub status: Option<BookingStatus>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.tourist_id
            .as_ref()
            .map_or(true, |id| &booking.tourist_id == id)
            && self
                .targets
                .as_ref()
                .map_or(true, |targets| targets.contains(&booking.target))
            && self.status.map_or(true, |status| booking.status == status)
    }
}
