use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;

/// Upper bound on any unit price or rate.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Adds an error to `field` when `price` is negative or above [`MAX_PRICE`].
pub fn check_price(field: &str, price: Decimal, errors: &mut FieldErrors) {
    if price.is_sign_negative() {
        errors.add(field, "must not be negative");
    } else if price > MAX_PRICE {
        errors.add(field, format!("must be at most {}", MAX_PRICE));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Adventure,
    Cultural,
    Religious,
    Wildlife,
    Beach,
    Mountain,
    City,
    Heritage,
    Custom,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Adventure => "adventure",
            PackageType::Cultural => "cultural",
            PackageType::Religious => "religious",
            PackageType::Wildlife => "wildlife",
            PackageType::Beach => "beach",
            PackageType::Mountain => "mountain",
            PackageType::City => "city",
            PackageType::Heritage => "heritage",
            PackageType::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ItineraryDay {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Package {
    #[serde(rename = "_id")]
    pub id: String,
    pub agency_id: String,
    pub name: String,
    pub description: String,
    pub package_type: PackageType,
    pub duration_days: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub max_people: u32,
    #[serde(default)]
    pub included_services: Vec<String>,
    #[serde(default)]
    pub excluded_services: Vec<String>,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    #[serde(default)]
    pub images: Vec<String>,
    pub is_active: bool,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_bookings: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageInput {
    pub name: String,
    pub description: String,
    pub package_type: PackageType,
    pub duration_days: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default = "default_max_people")]
    pub max_people: u32,
    #[serde(default)]
    pub included_services: Vec<String>,
    #[serde(default)]
    pub excluded_services: Vec<String>,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_max_people() -> u32 {
    10
}

fn default_active() -> bool {
    true
}

impl PackageInput {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.add("name", "this field is required");
        } else if self.name.len() > 200 {
            errors.add("name", "must be at most 200 characters");
        }
        if self.description.trim().is_empty() {
            errors.add("description", "this field is required");
        }
        if self.duration_days == 0 {
            errors.add("duration_days", "must be at least 1");
        }
        check_price("price", self.price, &mut errors);
        if self.max_people == 0 {
            errors.add("max_people", "must be at least 1");
        }
        validate_itinerary(&self.itinerary, self.duration_days, &mut errors);
        errors
    }

    pub fn into_package(self, agency_id: &str) -> Package {
        let now = Utc::now();
        Package {
            id: uuid::Uuid::new_v4().to_string(),
            agency_id: agency_id.to_string(),
            name: self.name.trim().to_string(),
            description: self.description,
            package_type: self.package_type,
            duration_days: self.duration_days,
            price: self.price,
            max_people: self.max_people,
            included_services: self.included_services,
            excluded_services: self.excluded_services,
            destinations: self.destinations,
            itinerary: sorted_itinerary(self.itinerary),
            images: self.images,
            is_active: self.is_active,
            average_rating: 0.0,
            total_bookings: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub package_type: Option<PackageType>,
    pub duration_days: Option<u32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub max_people: Option<u32>,
    pub included_services: Option<Vec<String>>,
    pub excluded_services: Option<Vec<String>>,
    pub destinations: Option<Vec<String>>,
    pub itinerary: Option<Vec<ItineraryDay>>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl PackageUpdate {
    pub fn validate(&self, current: &Package) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.name.as_deref().map_or(false, |name| name.trim().is_empty()) {
            errors.add("name", "must not be blank");
        }
        if self.duration_days == Some(0) {
            errors.add("duration_days", "must be at least 1");
        }
        if let Some(price) = self.price {
            check_price("price", price, &mut errors);
        }
        if self.max_people == Some(0) {
            errors.add("max_people", "must be at least 1");
        }
        let duration = self.duration_days.unwrap_or(current.duration_days);
        let itinerary = self.itinerary.as_ref().unwrap_or(&current.itinerary);
        validate_itinerary(itinerary, duration, &mut errors);
        errors
    }

    pub fn apply(self, package: &mut Package) {
        if let Some(name) = self.name {
            package.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            package.description = description;
        }
        if let Some(package_type) = self.package_type {
            package.package_type = package_type;
        }
        if let Some(days) = self.duration_days {
            package.duration_days = days;
        }
        if let Some(price) = self.price {
            package.price = price;
        }
        if let Some(max_people) = self.max_people {
            package.max_people = max_people;
        }
        if let Some(services) = self.included_services {
            package.included_services = services;
        }
        if let Some(services) = self.excluded_services {
            package.excluded_services = services;
        }
        if let Some(destinations) = self.destinations {
            package.destinations = destinations;
        }
        if let Some(itinerary) = self.itinerary {
            package.itinerary = sorted_itinerary(itinerary);
        }
        if let Some(images) = self.images {
            package.images = images;
        }
        if let Some(active) = self.is_active {
            package.is_active = active;
        }
        package.updated_at = Utc::now();
    }
}

// Itinerary days are 1-based, unique, and fall inside the package duration.
fn validate_itinerary(itinerary: &[ItineraryDay], duration_days: u32, errors: &mut FieldErrors) {
    let mut seen = std::collections::BTreeSet::new();
    for entry in itinerary {
        if entry.day == 0 || entry.day > duration_days {
            errors.add(
                "itinerary",
                format!("day {} is outside the {}-day package", entry.day, duration_days),
            );
        } else if !seen.insert(entry.day) {
            errors.add("itinerary", format!("day {} is listed twice", entry.day));
        }
    }
}

fn sorted_itinerary(mut itinerary: Vec<ItineraryDay>) -> Vec<ItineraryDay> {
    itinerary.sort_by_key(|entry| entry.day);
    itinerary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> PackageInput {
        serde_json::from_value(serde_json::json!({
            "name": "Annapurna Base Camp",
            "description": "Ten days in the Himalaya",
            "package_type": "mountain",
            "duration_days": 3,
            "price": 100.00,
            "itinerary": [
                { "day": 2, "title": "Trek", "activities": ["hike"] },
                { "day": 1, "title": "Arrive" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn input_defaults_and_ordering() {
        let input = input();
        assert!(input.validate().is_empty());
        assert_eq!(input.max_people, 10);
        let package = input.into_package("agency-1");
        assert_eq!(package.price, dec!(100));
        assert!(package.is_active);
        assert_eq!(package.itinerary[0].day, 1);
        assert_eq!(package.average_rating, 0.0);
    }

    #[test]
    fn itinerary_days_must_fit_duration() {
        let mut input = input();
        input.itinerary.push(ItineraryDay {
            day: 4,
            title: "Extra".into(),
            activities: vec![],
        });
        input.itinerary.push(ItineraryDay {
            day: 1,
            title: "Again".into(),
            activities: vec![],
        });
        let errors = input.validate();
        assert_eq!(errors.get("itinerary").map(Vec::len), Some(2));
    }

    #[test]
    fn update_rejects_shrinking_below_itinerary() {
        let package = input().into_package("agency-1");
        let update = PackageUpdate {
            duration_days: Some(1),
            ..Default::default()
        };
        assert!(update.validate(&package).get("itinerary").is_some());
    }

    #[test]
    fn rejects_zero_capacity_and_negative_price() {
        let mut input = input();
        input.max_people = 0;
        input.price = dec!(-5);
        let errors = input.validate();
        assert!(errors.get("max_people").is_some());
        assert!(errors.get("price").is_some());
    }

    #[test]
    fn rejects_price_above_cap() {
        let mut pricey = input();
        pricey.price = MAX_PRICE + dec!(1);
        assert!(pricey.validate().get("price").is_some());
        pricey.price = MAX_PRICE;
        assert!(pricey.validate().get("price").is_none());

        let package = input().into_package("agency-1");
        let update = PackageUpdate {
            price: Some(dec!(1000000000000000000000)),
            ..Default::default()
        };
        assert!(update.validate(&package).get("price").is_some());
    }
}
