use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use url::Url;

use crate::error::FieldErrors;
use crate::models::package::check_price;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelInterest {
    Adventure,
    Cultural,
    Religious,
    Wildlife,
    Beach,
    Mountain,
    City,
    Heritage,
    Food,
    Photography,
    Relaxation,
    Family,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgencyType {
    TourOperator,
    TravelAgency,
    AdventureCompany,
    CulturalTours,
    EcoTourism,
    LuxuryTravel,
    BudgetTravel,
    CorporateTravel,
}

impl AgencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgencyType::TourOperator => "tour_operator",
            AgencyType::TravelAgency => "travel_agency",
            AgencyType::AdventureCompany => "adventure_company",
            AgencyType::CulturalTours => "cultural_tours",
            AgencyType::EcoTourism => "eco_tourism",
            AgencyType::LuxuryTravel => "luxury_travel",
            AgencyType::BudgetTravel => "budget_travel",
            AgencyType::CorporateTravel => "corporate_travel",
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TouristProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub account_id: String,
    #[serde(default)]
    pub travel_interests: Vec<TravelInterest>,
    pub emergency_contact: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub nationality: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub preferred_language: String,
    pub travel_budget_range: Option<String>,
    #[serde(default)]
    pub total_bookings: u32,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_spent: Decimal,
}

impl TouristProfile {
    pub fn new(account_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            travel_interests: Vec::new(),
            emergency_contact: None,
            emergency_contact_name: None,
            nationality: None,
            date_of_birth: None,
            preferred_language: "English".to_string(),
            travel_budget_range: None,
            total_bookings: 0,
            total_spent: Decimal::ZERO,
        }
    }

    pub fn age(&self, today: NaiveDate) -> Option<u32> {
        let born = self.date_of_birth?;
        let mut years = today.year() - born.year();
        if (today.month(), today.day()) < (born.month(), born.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    pub fn has_completed_profile(&self) -> bool {
        let filled = |value: &Option<String>| value.as_deref().map_or(false, |v| !v.is_empty());
        filled(&self.nationality) && self.date_of_birth.is_some() && filled(&self.emergency_contact)
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuideProfile {
    #[serde(rename = "_id")]
    pub id: String,
    /// Absent for standalone listings created by an agency.
    pub account_id: Option<String>,
    pub display_name: Option<String>,
    pub license_number: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub hourly_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_rate: Decimal,
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default)]
    pub portfolio_images: Vec<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_trips: u32,
}

impl GuideProfile {
    pub fn new(account_id: Option<&str>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.map(String::from),
            display_name: None,
            license_number: None,
            languages: Vec::new(),
            specializations: Vec::new(),
            hourly_rate: Decimal::ZERO,
            daily_rate: Decimal::ZERO,
            experience_years: 0,
            portfolio_images: Vec::new(),
            bio: None,
            average_rating: 0.0,
            total_trips: 0,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgencyProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub account_id: String,
    pub company_name: Option<String>,
    pub agency_type: Option<AgencyType>,
    pub license_document: Option<String>,
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub social_media_links: BTreeMap<String, String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub commission_rate: Decimal,
    #[serde(default)]
    pub managed_guides: Vec<String>,
    pub description: Option<String>,
    pub established_year: Option<i32>,
    pub employee_count: Option<u32>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub operating_regions: Vec<String>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub total_bookings: u32,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
}

impl AgencyProfile {
    pub fn new(account_id: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            company_name: None,
            agency_type: None,
            license_document: None,
            registration_number: None,
            tax_id: None,
            address: None,
            city: None,
            state: None,
            country: None,
            postal_code: None,
            website: None,
            social_media_links: BTreeMap::new(),
            commission_rate: Decimal::new(1500, 2),
            managed_guides: Vec::new(),
            description: None,
            established_year: None,
            employee_count: None,
            certifications: Vec::new(),
            operating_regions: Vec::new(),
            average_rating: 0.0,
            total_bookings: 0,
            total_revenue: Decimal::ZERO,
        }
    }

    pub fn years_in_business(&self) -> Option<i32> {
        self.established_year
            .map(|year| Utc::now().year() - year)
    }

    pub fn completion_percentage(&self) -> u8 {
        let required = [
            self.company_name.is_some(),
            self.agency_type.is_some(),
            self.address.is_some(),
            self.city.is_some(),
            self.country.is_some(),
            self.description.is_some(),
        ];
        let completed = required.iter().filter(|done| **done).count();
        (completed * 100 / required.len()) as u8
    }
}

/// The role-specific half of `GET /auth/profile`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RoleProfile {
    Tourist(TouristProfile),
    Guide(GuideProfile),
    Agency(AgencyProfile),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TouristProfileUpdate {
    pub travel_interests: Option<Vec<TravelInterest>>,
    pub emergency_contact: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub nationality: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub preferred_language: Option<String>,
    pub travel_budget_range: Option<String>,
}

impl TouristProfileUpdate {
    pub fn validate(&self, today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(contact) = &self.emergency_contact {
            if contact.len() > 15 {
                errors.add("emergency_contact", "must be at most 15 characters");
            }
        }
        if let Some(born) = self.date_of_birth {
            if born > today {
                errors.add("date_of_birth", "must not be in the future");
            }
        }
        errors
    }

    pub fn apply(self, profile: &mut TouristProfile) {
        if let Some(interests) = self.travel_interests {
            profile.travel_interests = interests;
        }
        set_if_some(&mut profile.emergency_contact, self.emergency_contact);
        set_if_some(&mut profile.emergency_contact_name, self.emergency_contact_name);
        set_if_some(&mut profile.nationality, self.nationality);
        if self.date_of_birth.is_some() {
            profile.date_of_birth = self.date_of_birth;
        }
        if let Some(language) = self.preferred_language {
            profile.preferred_language = language;
        }
        set_if_some(&mut profile.travel_budget_range, self.travel_budget_range);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuideProfileUpdate {
    pub display_name: Option<String>,
    pub license_number: Option<String>,
    pub languages: Option<Vec<String>>,
    pub specializations: Option<Vec<String>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub hourly_rate: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub daily_rate: Option<Decimal>,
    pub experience_years: Option<u32>,
    pub portfolio_images: Option<Vec<String>>,
    pub bio: Option<String>,
}

impl GuideProfileUpdate {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(rate) = self.hourly_rate {
            check_price("hourly_rate", rate, &mut errors);
        }
        if let Some(rate) = self.daily_rate {
            check_price("daily_rate", rate, &mut errors);
        }
        if self.experience_years.map_or(false, |years| years > 80) {
            errors.add("experience_years", "must be at most 80");
        }
        errors
    }

    pub fn apply(self, profile: &mut GuideProfile) {
        set_if_some(&mut profile.display_name, self.display_name);
        set_if_some(&mut profile.license_number, self.license_number);
        if let Some(languages) = self.languages {
            profile.languages = languages;
        }
        if let Some(specializations) = self.specializations {
            profile.specializations = specializations;
        }
        if let Some(rate) = self.hourly_rate {
            profile.hourly_rate = rate;
        }
        if let Some(rate) = self.daily_rate {
            profile.daily_rate = rate;
        }
        if let Some(years) = self.experience_years {
            profile.experience_years = years;
        }
        if let Some(images) = self.portfolio_images {
            profile.portfolio_images = images;
        }
        set_if_some(&mut profile.bio, self.bio);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgencyProfileUpdate {
    pub company_name: Option<String>,
    pub agency_type: Option<AgencyType>,
    pub license_document: Option<String>,
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub website: Option<String>,
    pub social_media_links: Option<BTreeMap<String, String>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub commission_rate: Option<Decimal>,
    pub description: Option<String>,
    pub established_year: Option<i32>,
    pub employee_count: Option<u32>,
    pub certifications: Option<Vec<String>>,
    pub operating_regions: Option<Vec<String>>,
}

pub const MAX_COMMISSION_RATE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

impl AgencyProfileUpdate {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(rate) = self.commission_rate {
            if rate < Decimal::ZERO || rate > MAX_COMMISSION_RATE {
                errors.add("commission_rate", "Commission rate must be between 0% and 50%");
            }
        }
        if let Some(website) = &self.website {
            match Url::parse(website) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => errors.add("website", "enter a valid URL"),
            }
        }
        if let Some(year) = self.established_year {
            if year < 1800 || year > Utc::now().year() {
                errors.add("established_year", "must be a past year");
            }
        }
        errors
    }

    pub fn apply(self, profile: &mut AgencyProfile) {
        set_if_some(&mut profile.company_name, self.company_name);
        if self.agency_type.is_some() {
            profile.agency_type = self.agency_type;
        }
        set_if_some(&mut profile.license_document, self.license_document);
        set_if_some(&mut profile.registration_number, self.registration_number);
        set_if_some(&mut profile.tax_id, self.tax_id);
        set_if_some(&mut profile.address, self.address);
        set_if_some(&mut profile.city, self.city);
        set_if_some(&mut profile.state, self.state);
        set_if_some(&mut profile.country, self.country);
        set_if_some(&mut profile.postal_code, self.postal_code);
        set_if_some(&mut profile.website, self.website);
        if let Some(links) = self.social_media_links {
            profile.social_media_links = links;
        }
        if let Some(rate) = self.commission_rate {
            profile.commission_rate = rate;
        }
        set_if_some(&mut profile.description, self.description);
        if self.established_year.is_some() {
            profile.established_year = self.established_year;
        }
        if self.employee_count.is_some() {
            profile.employee_count = self.employee_count;
        }
        if let Some(certifications) = self.certifications {
            profile.certifications = certifications;
        }
        if let Some(regions) = self.operating_regions {
            profile.operating_regions = regions;
        }
    }
}

fn set_if_some(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn guide_rates_are_capped() {
        let update = GuideProfileUpdate {
            daily_rate: Some(dec!(1000000000000000000000)),
            hourly_rate: Some(dec!(-1)),
            ..Default::default()
        };
        let errors = update.validate();
        assert!(errors.get("daily_rate").is_some());
        assert!(errors.get("hourly_rate").is_some());

        let update = GuideProfileUpdate {
            daily_rate: Some(dec!(250)),
            ..Default::default()
        };
        assert!(update.validate().is_empty());
    }

    #[test]
    fn commission_rate_is_bounded() {
        let update = AgencyProfileUpdate {
            commission_rate: Some(dec!(50.01)),
            ..Default::default()
        };
        assert!(update.validate().get("commission_rate").is_some());

        let update = AgencyProfileUpdate {
            commission_rate: Some(dec!(-1)),
            ..Default::default()
        };
        assert!(update.validate().get("commission_rate").is_some());

        for ok in [dec!(0), dec!(15), dec!(50)] {
            let update = AgencyProfileUpdate {
                commission_rate: Some(ok),
                ..Default::default()
            };
            assert!(update.validate().is_empty());
        }
    }

    #[test]
    fn website_must_be_absolute_http_url() {
        let update = AgencyProfileUpdate {
            website: Some("not a url".into()),
            ..Default::default()
        };
        assert!(update.validate().get("website").is_some());

        let update = AgencyProfileUpdate {
            website: Some("https://tours.example.com".into()),
            ..Default::default()
        };
        assert!(update.validate().is_empty());
    }

    #[test]
    fn update_leaves_aggregates_alone() {
        let mut agency = AgencyProfile::new("acc-1");
        agency.average_rating = 4.5;
        agency.total_bookings = 9;
        AgencyProfileUpdate {
            company_name: Some("Summit Treks".into()),
            ..Default::default()
        }
        .apply(&mut agency);
        assert_eq!(agency.company_name.as_deref(), Some("Summit Treks"));
        assert_eq!(agency.average_rating, 4.5);
        assert_eq!(agency.total_bookings, 9);
    }

    #[test]
    fn tourist_age_and_completion() {
        let mut tourist = TouristProfile::new("acc-1");
        assert!(!tourist.has_completed_profile());
        tourist.date_of_birth = NaiveDate::from_ymd_opt(1990, 6, 15);
        tourist.nationality = Some("USA".into());
        tourist.emergency_contact = Some("+1234567890".into());
        assert!(tourist.has_completed_profile());

        let today = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        assert_eq!(tourist.age(today), Some(33));
        let birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(tourist.age(birthday), Some(34));
    }

    #[test]
    fn unknown_travel_interest_is_rejected() {
        let parsed: Result<TouristProfileUpdate, _> =
            serde_json::from_value(serde_json::json!({ "travel_interests": ["skydiving"] }));
        assert!(parsed.is_err());
    }

    #[test]
    fn agency_completion_percentage() {
        let mut agency = AgencyProfile::new("acc-1");
        assert_eq!(agency.completion_percentage(), 0);
        agency.company_name = Some("Summit Treks".into());
        agency.city = Some("Kathmandu".into());
        agency.country = Some("Nepal".into());
        assert_eq!(agency.completion_percentage(), 50);
    }
}
