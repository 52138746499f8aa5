use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{ApiError, FieldErrors};
use crate::models::bookings::PriceStatus;
use crate::models::package::Package;
use crate::models::profile::{AgencyProfile, GuideProfile};
use crate::models::target::Target;

/// Inclusive date range of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl StayPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ApiError> {
        if end < start {
            return Err(ApiError::Validation(FieldErrors::single(
                "end_date",
                "must not be before start_date",
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Both ends count: a same-day booking lasts one day.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub total: Decimal,
    pub status: PriceStatus,
}

impl Quote {
    fn computed(total: Decimal) -> Self {
        Self {
            total,
            status: PriceStatus::Computed,
        }
    }
}

/// Something a tourist can book. The price is fixed when the booking is made.
pub trait Bookable {
    fn target(&self) -> Target;
    fn quote(&self, period: &StayPeriod, party_size: u32) -> Result<Quote, ApiError>;
}

fn too_large() -> ApiError {
    ApiError::validation("number_of_people", "the booking total is too large")
}

pub struct PricingService;

impl PricingService {
    /// Package price per person times party size.
    pub fn package_total(price: Decimal, party_size: u32) -> Result<Decimal, ApiError> {
        price
            .checked_mul(Decimal::from(party_size))
            .ok_or_else(too_large)
    }

    /// Daily rate times days (inclusive) times party size.
    pub fn guide_total(
        daily_rate: Decimal,
        period: &StayPeriod,
        party_size: u32,
    ) -> Result<Decimal, ApiError> {
        daily_rate
            .checked_mul(Decimal::from(period.days()))
            .and_then(|total| total.checked_mul(Decimal::from(party_size)))
            .ok_or_else(too_large)
    }
}

impl Bookable for Package {
    fn target(&self) -> Target {
        Target::Package(self.id.clone())
    }

    fn quote(&self, _period: &StayPeriod, party_size: u32) -> Result<Quote, ApiError> {
        PricingService::package_total(self.price, party_size).map(Quote::computed)
    }
}

impl Bookable for GuideProfile {
    fn target(&self) -> Target {
        Target::Guide(self.id.clone())
    }

    fn quote(&self, period: &StayPeriod, party_size: u32) -> Result<Quote, ApiError> {
        PricingService::guide_total(self.daily_rate, period, party_size).map(Quote::computed)
    }
}

impl Bookable for AgencyProfile {
    fn target(&self) -> Target {
        Target::Agency(self.id.clone())
    }

    // No price model for agencies; the agency quotes before confirming.
    fn quote(&self, _period: &StayPeriod, _party_size: u32) -> Result<Quote, ApiError> {
        Ok(Quote {
            total: Decimal::ZERO,
            status: PriceStatus::AwaitingQuote,
        })
    }
}
