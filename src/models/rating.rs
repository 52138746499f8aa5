use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FieldErrors;
use crate::models::target::{Target, TargetKind, TargetSelection};

pub const MIN_STARS: i32 = 1;
pub const MAX_STARS: i32 = 5;

/// One tourist's verdict on one target. Never updated after insert.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Rating {
    #[serde(rename = "_id")]
    pub id: String,
    pub tourist_id: String,
    pub target: Target,
    pub rating: u8,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(tourist_id: &str, target: Target, rating: u8, review: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tourist_id: tourist_id.to_string(),
            target,
            rating,
            review: review.filter(|text| !text.trim().is_empty()),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingRequest {
    pub rating_type: TargetKind,
    #[serde(flatten)]
    pub target: TargetSelection,
    pub rating: i32,
    pub review: Option<String>,
}

impl RatingRequest {
    pub fn validate_stars(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if !(MIN_STARS..=MAX_STARS).contains(&self.rating) {
            errors.add(
                "rating",
                format!("must be between {} and {}", MIN_STARS, MAX_STARS),
            );
        }
        errors
    }
}

#[derive(Debug, Clone, Default)]
pub struct RatingFilter {
    pub tourist_id: Option<String>,
    pub target: Option<Target>,
}

impl RatingFilter {
    pub fn matches(&self, rating: &Rating) -> bool {
        self.tourist_id
            .as_ref()
            .map_or(true, |id| &rating.tourist_id == id)
            && self.target.as_ref().map_or(true, |target| &rating.target == target)
    }
}

/// Mean of the given star values, 0.0 when there are none.
pub fn average(stars: impl IntoIterator<Item = u8>) -> f64 {
    let (sum, count) = stars
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), star| (sum + star as u64, count + 1));
    if count == 0 {
        0.0
    } else {
        ((sum as f64 / count as f64) * 100.0).round() / 100.0
    }
}
