use std::cmp::Ordering;

use bson::{doc, Bson, Document};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::package::{Package, PackageType};
use crate::models::profile::{AgencyProfile, AgencyType, GuideProfile};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const DEFAULT_ORDERING: &str = "-average_rating";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// `page` is 1-based; `page_size` is capped at `MAX_PAGE_SIZE`.
    pub fn new(page: Option<u64>, page_size: Option<u64>) -> Result<Self, ApiError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ApiError::validation("page", "must be at least 1"));
        }
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(ApiError::validation("page_size", "must be at least 1"));
        }
        let page_size = page_size.min(MAX_PAGE_SIZE);
        // The offset must fit the database's signed 64-bit skip.
        let in_range = (page - 1)
            .checked_mul(page_size)
            .map_or(false, |offset| offset <= i64::MAX as u64);
        if !in_range {
            return Err(ApiError::validation("page", "is out of range"));
        }
        Ok(Self { page, page_size })
    }

    pub fn first(page_size: u64) -> Self {
        Self { page: 1, page_size }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Slices an already filtered and sorted list.
    pub fn from_sorted(items: Vec<T>, pagination: Pagination) -> Self {
        let count = items.len() as u64;
        let results = items
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.page_size as usize)
            .collect();
        Self {
            count,
            page: pagination.page,
            page_size: pagination.page_size,
            results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: &'static str,
    pub descending: bool,
}

impl SortSpec {
    /// Parses `field` / `-field` against an allow-list.
    pub fn parse(raw: Option<&str>, allowed: &[&'static str]) -> Result<Self, ApiError> {
        let raw = raw
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_ORDERING);
        let (descending, name) = match raw.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, raw),
        };
        let field = allowed
            .iter()
            .copied()
            .find(|candidate| *candidate == name)
            .ok_or_else(|| {
                ApiError::validation(
                    "ordering",
                    format!(
                        "unknown ordering field '{}'; expected one of {}",
                        name,
                        allowed.join(", ")
                    ),
                )
            })?;
        Ok(Self { field, descending })
    }

    pub fn to_document(&self) -> Document {
        let mut sort = Document::new();
        sort.insert(self.field, if self.descending { -1 } else { 1 });
        sort.insert("_id", 1);
        sort
    }

    fn order(&self, a: f64, b: f64) -> Ordering {
        let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

fn normalized_search(search: Option<String>) -> Option<String> {
    search
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn search_document(term: &str, fields: &[&str]) -> Document {
    let pattern = regex::escape(term);
    let clauses: Vec<Bson> = fields
        .iter()
        .map(|field| {
            let mut clause = Document::new();
            clause.insert(*field, doc! { "$regex": pattern.as_str(), "$options": "i" });
            Bson::Document(clause)
        })
        .collect();
    doc! { "$or": clauses }
}

fn and_all(conditions: Vec<Document>) -> Document {
    match conditions.len() {
        0 => Document::new(),
        1 => conditions.into_iter().next().unwrap_or_default(),
        _ => doc! { "$and": conditions },
    }
}

fn id_list(ids: &[String]) -> Vec<Bson> {
    ids.iter().cloned().map(Bson::String).collect()
}

// ---------------------------------------------------------------------------
// Packages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageParams {
    pub package_type: Option<PackageType>,
    pub agency: Option<String>,
    pub duration_days: Option<u32>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct PackageQuery {
    pub package_type: Option<PackageType>,
    pub agency_id: Option<String>,
    pub duration_days: Option<u32>,
    pub search: Option<String>,
    pub active_only: bool,
    /// Owning agencies allowed to appear; `None` means no restriction.
    pub agency_ids: Option<Vec<String>>,
    pub sort: SortSpec,
    pub pagination: Pagination,
}

impl PackageQuery {
    pub const ORDERING: &'static [&'static str] = &[
        "price",
        "duration_days",
        "average_rating",
        "total_bookings",
        "created_at",
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "description", "destinations"];

    pub fn from_params(params: PackageParams) -> Result<Self, ApiError> {
        Ok(Self {
            package_type: params.package_type,
            agency_id: params.agency.filter(|id| !id.trim().is_empty()),
            duration_days: params.duration_days,
            search: normalized_search(params.search),
            active_only: true,
            agency_ids: None,
            sort: SortSpec::parse(params.ordering.as_deref(), Self::ORDERING)?,
            pagination: Pagination::new(params.page, params.page_size)?,
        })
    }

    /// Every package of one agency, inactive ones included.
    pub fn owned_by(agency_id: &str) -> Self {
        Self {
            package_type: None,
            agency_id: Some(agency_id.to_string()),
            duration_days: None,
            search: None,
            active_only: false,
            agency_ids: None,
            sort: SortSpec {
                field: "created_at",
                descending: true,
            },
            pagination: Pagination::first(MAX_PAGE_SIZE),
        }
    }

    /// One page of an agency's own packages. Inactive ones are included and
    /// the newest come first unless `ordering` says otherwise; `agency` is
    /// ignored.
    pub fn owned_page(agency_id: &str, params: PackageParams) -> Result<Self, ApiError> {
        let mut query = Self::owned_by(agency_id);
        query.package_type = params.package_type;
        query.duration_days = params.duration_days;
        query.search = normalized_search(params.search);
        if params.ordering.is_some() {
            query.sort = SortSpec::parse(params.ordering.as_deref(), Self::ORDERING)?;
        }
        query.pagination = Pagination::new(params.page, params.page_size)?;
        Ok(query)
    }

    pub fn matches(&self, package: &Package) -> bool {
        if self.active_only && !package.is_active {
            return false;
        }
        if let Some(ids) = &self.agency_ids {
            if !ids.contains(&package.agency_id) {
                return false;
            }
        }
        if self.package_type.map_or(false, |kind| package.package_type != kind)
            || self
                .agency_id
                .as_ref()
                .map_or(false, |id| &package.agency_id != id)
            || self
                .duration_days
                .map_or(false, |days| package.duration_days != days)
        {
            return false;
        }
        match &self.search {
            Some(term) => {
                contains_ci(&package.name, term)
                    || contains_ci(&package.description, term)
                    || package
                        .destinations
                        .iter()
                        .any(|destination| contains_ci(destination, term))
            }
            None => true,
        }
    }

    fn sort_value(&self, package: &Package) -> f64 {
        match self.sort.field {
            "price" => package.price.to_f64().unwrap_or_default(),
            "duration_days" => package.duration_days as f64,
            "total_bookings" => package.total_bookings as f64,
            "created_at" => package.created_at.timestamp_millis() as f64,
            _ => package.average_rating,
        }
    }

    pub fn compare(&self, a: &Package, b: &Package) -> Ordering {
        self.sort
            .order(self.sort_value(a), self.sort_value(b))
            .then_with(|| a.id.cmp(&b.id))
    }

    pub fn to_filter(&self) -> Document {
        let mut conditions = Vec::new();
        if self.active_only {
            conditions.push(doc! { "is_active": true });
        }
        if let Some(ids) = &self.agency_ids {
            conditions.push(doc! { "agency_id": { "$in": id_list(ids) } });
        }
        if let Some(kind) = self.package_type {
            conditions.push(doc! { "package_type": kind.as_str() });
        }
        if let Some(id) = &self.agency_id {
            conditions.push(doc! { "agency_id": id.as_str() });
        }
        if let Some(days) = self.duration_days {
            conditions.push(doc! { "duration_days": days as i64 });
        }
        if let Some(term) = &self.search {
            conditions.push(search_document(term, Self::SEARCH_FIELDS));
        }
        and_all(conditions)
    }
}

// ---------------------------------------------------------------------------
// Guides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuideParams {
    pub experience_years: Option<u32>,
    pub language: Option<String>,
    pub specialization: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct GuideQuery {
    pub experience_years: Option<u32>,
    pub language: Option<String>,
    pub specialization: Option<String>,
    pub search: Option<String>,
    /// Guides linked to one of these accounts are hidden.
    pub excluded_accounts: Vec<String>,
    /// Restricts the listing to these guide ids.
    pub ids: Option<Vec<String>>,
    pub sort: SortSpec,
    pub pagination: Pagination,
}

impl GuideQuery {
    pub const ORDERING: &'static [&'static str] = &[
        "average_rating",
        "daily_rate",
        "hourly_rate",
        "experience_years",
        "total_trips",
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["bio", "languages", "specializations"];

    pub fn from_params(params: GuideParams) -> Result<Self, ApiError> {
        Ok(Self {
            experience_years: params.experience_years,
            language: params.language.filter(|value| !value.trim().is_empty()),
            specialization: params.specialization.filter(|value| !value.trim().is_empty()),
            search: normalized_search(params.search),
            excluded_accounts: Vec::new(),
            ids: None,
            sort: SortSpec::parse(params.ordering.as_deref(), Self::ORDERING)?,
            pagination: Pagination::new(params.page, params.page_size)?,
        })
    }

    pub fn with_ids(ids: Vec<String>) -> Self {
        Self {
            experience_years: None,
            language: None,
            specialization: None,
            search: None,
            excluded_accounts: Vec::new(),
            ids: Some(ids),
            sort: SortSpec {
                field: "average_rating",
                descending: true,
            },
            pagination: Pagination::first(MAX_PAGE_SIZE),
        }
    }

    pub fn matches(&self, guide: &GuideProfile) -> bool {
        if let Some(account_id) = &guide.account_id {
            if self.excluded_accounts.contains(account_id) {
                return false;
            }
        }
        if let Some(ids) = &self.ids {
            if !ids.contains(&guide.id) {
                return false;
            }
        }
        if self
            .experience_years
            .map_or(false, |years| guide.experience_years != years)
            || self
                .language
                .as_ref()
                .map_or(false, |language| !guide.languages.contains(language))
            || self
                .specialization
                .as_ref()
                .map_or(false, |tag| !guide.specializations.contains(tag))
        {
            return false;
        }
        match &self.search {
            Some(term) => {
                guide.bio.as_deref().map_or(false, |bio| contains_ci(bio, term))
                    || guide.languages.iter().any(|value| contains_ci(value, term))
                    || guide
                        .specializations
                        .iter()
                        .any(|value| contains_ci(value, term))
            }
            None => true,
        }
    }

    fn sort_value(&self, guide: &GuideProfile) -> f64 {
        match self.sort.field {
            "daily_rate" => guide.daily_rate.to_f64().unwrap_or_default(),
            "hourly_rate" => guide.hourly_rate.to_f64().unwrap_or_default(),
            "experience_years" => guide.experience_years as f64,
            "total_trips" => guide.total_trips as f64,
            _ => guide.average_rating,
        }
    }

    pub fn compare(&self, a: &GuideProfile, b: &GuideProfile) -> Ordering {
        self.sort
            .order(self.sort_value(a), self.sort_value(b))
            .then_with(|| a.id.cmp(&b.id))
    }

    pub fn to_filter(&self) -> Document {
        let mut conditions = Vec::new();
        if !self.excluded_accounts.is_empty() {
            // Standalone guides have no account_id and pass `$nin`.
            conditions.push(doc! { "account_id": { "$nin": id_list(&self.excluded_accounts) } });
        }
        if let Some(ids) = &self.ids {
            conditions.push(doc! { "_id": { "$in": id_list(ids) } });
        }
        if let Some(years) = self.experience_years {
            conditions.push(doc! { "experience_years": years as i64 });
        }
        if let Some(language) = &self.language {
            conditions.push(doc! { "languages": language.as_str() });
        }
        if let Some(tag) = &self.specialization {
            conditions.push(doc! { "specializations": tag.as_str() });
        }
        if let Some(term) = &self.search {
            conditions.push(search_document(term, Self::SEARCH_FIELDS));
        }
        and_all(conditions)
    }
}

// ---------------------------------------------------------------------------
// Agencies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgencyParams {
    pub agency_type: Option<AgencyType>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AgencyQuery {
    pub agency_type: Option<AgencyType>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub search: Option<String>,
    /// Owning accounts allowed to appear; `None` means no restriction.
    pub account_ids: Option<Vec<String>>,
    pub sort: SortSpec,
    pub pagination: Pagination,
}

impl AgencyQuery {
    pub const ORDERING: &'static [&'static str] =
        &["average_rating", "total_bookings", "established_year"];
    const SEARCH_FIELDS: &'static [&'static str] =
        &["company_name", "description", "city", "country"];

    pub fn from_params(params: AgencyParams) -> Result<Self, ApiError> {
        Ok(Self {
            agency_type: params.agency_type,
            city: params.city.filter(|value| !value.trim().is_empty()),
            country: params.country.filter(|value| !value.trim().is_empty()),
            search: normalized_search(params.search),
            account_ids: None,
            sort: SortSpec::parse(params.ordering.as_deref(), Self::ORDERING)?,
            pagination: Pagination::new(params.page, params.page_size)?,
        })
    }

    pub fn matches(&self, agency: &AgencyProfile) -> bool {
        if let Some(ids) = &self.account_ids {
            if !ids.contains(&agency.account_id) {
                return false;
            }
        }
        if self
            .agency_type
            .map_or(false, |kind| agency.agency_type != Some(kind))
            || self
                .city
                .as_ref()
                .map_or(false, |city| agency.city.as_ref() != Some(city))
            || self
                .country
                .as_ref()
                .map_or(false, |country| agency.country.as_ref() != Some(country))
        {
            return false;
        }
        match &self.search {
            Some(term) => [
                &agency.company_name,
                &agency.description,
                &agency.city,
                &agency.country,
            ]
            .into_iter()
            .any(|field| field.as_deref().map_or(false, |value| contains_ci(value, term))),
            None => true,
        }
    }

    fn sort_value(&self, agency: &AgencyProfile) -> f64 {
        match self.sort.field {
            "total_bookings" => agency.total_bookings as f64,
            // Missing values sort first ascending, as a null does in the database.
            "established_year" => agency
                .established_year
                .map_or(f64::NEG_INFINITY, |year| year as f64),
            _ => agency.average_rating,
        }
    }

    pub fn compare(&self, a: &AgencyProfile, b: &AgencyProfile) -> Ordering {
        self.sort
            .order(self.sort_value(a), self.sort_value(b))
            .then_with(|| a.id.cmp(&b.id))
    }

    pub fn to_filter(&self) -> Document {
        let mut conditions = Vec::new();
        if let Some(ids) = &self.account_ids {
            conditions.push(doc! { "account_id": { "$in": id_list(ids) } });
        }
        if let Some(kind) = self.agency_type {
            conditions.push(doc! { "agency_type": kind.as_str() });
        }
        if let Some(city) = &self.city {
            conditions.push(doc! { "city": city.as_str() });
        }
        if let Some(country) = &self.country {
            conditions.push(doc! { "country": country.as_str() });
        }
        if let Some(term) = &self.search {
            conditions.push(search_document(term, Self::SEARCH_FIELDS));
        }
        and_all(conditions)
    }
}
