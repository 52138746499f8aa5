use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FieldErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Package,
    Guide,
    Agency,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Package => "package",
            TargetKind::Guide => "guide",
            TargetKind::Agency => "agency",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The bookable / ratable entity a booking or rating points at.
///
/// Stored as `{ "kind": "package", "id": "<uuid>" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Target {
    Package(String),
    Guide(String),
    Agency(String),
}

impl Target {
    pub fn kind(&self) -> TargetKind {
        match self {
            Target::Package(_) => TargetKind::Package,
            Target::Guide(_) => TargetKind::Guide,
            Target::Agency(_) => TargetKind::Agency,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Target::Package(id) | Target::Guide(id) | Target::Agency(id) => id,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// Request-side shape: a type discriminator plus three optional references.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetSelection {
    pub package: Option<String>,
    pub guide: Option<String>,
    pub agency: Option<String>,
}

impl TargetSelection {
    /// Exactly one reference must be present and it must match `kind`.
    pub fn resolve(&self, kind: TargetKind) -> Result<Target, ApiError> {
        let supplied: Vec<Target> = [
            self.package.clone().map(Target::Package),
            self.guide.clone().map(Target::Guide),
            self.agency.clone().map(Target::Agency),
        ]
        .into_iter()
        .flatten()
        .filter(|target| !target.id().trim().is_empty())
        .collect();

        let target = match supplied.as_slice() {
            [only] => only.clone(),
            _ => return Err(ApiError::validation("target", "exactly one target required")),
        };

        if target.kind() != kind {
            let mut errors = FieldErrors::new();
            errors.add("target", "exactly one target required");
            errors.add(
                kind.as_str(),
                format!("{} reference required for a {} target", kind, kind),
            );
            return Err(ApiError::Validation(errors));
        }
        Ok(target)
    }
}
