//! Structured search criteria.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FathomError, Result};
use crate::index::DistanceUnit;
use crate::search::decay::RecencyDecay;

/// Circle a hit's location must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialFilter {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
    /// Unit of `radius`; the engine's configured unit when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<DistanceUnit>,
}

/// What to search for.
///
/// ```
/// use fathom::search::QueryCriteria;
///
/// let criteria = QueryCriteria::keywords("jazz club")
///     .filter("city", "Chicago")
///     .within(41.88, -87.63, 5.0)
///     .detailed(true);
/// assert!(criteria.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryCriteria {
    /// Free text matched against the query policy's fields.
    pub keywords: String,
    /// Field → text; every entry must match.
    pub filters: BTreeMap<String, String>,
    /// Rank by the indexed document score instead of text relevance.
    pub score_only: bool,
    /// Return every document, ignoring keywords.
    pub match_all: bool,
    pub spatial: Option<SpatialFilter>,
    pub recency: Option<RecencyDecay>,
    /// Return stored field values with each hit.
    pub detailed: bool,
    /// Owner partition; `None` or `"all"` searches every partition.
    pub owner: Option<String>,
}

impl QueryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keywords<S: Into<String>>(keywords: S) -> Self {
        QueryCriteria {
            keywords: keywords.into(),
            ..Default::default()
        }
    }

    /// Criteria matching every document.
    pub fn match_all() -> Self {
        QueryCriteria {
            match_all: true,
            ..Default::default()
        }
    }

    /// Criteria ranking by document score alone.
    pub fn score_only() -> Self {
        QueryCriteria {
            score_only: true,
            ..Default::default()
        }
    }

    pub fn with_keywords<S: Into<String>>(mut self, keywords: S) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn filter<F: Into<String>, V: Into<String>>(mut self, field: F, value: V) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    pub fn ranked_by_score(mut self, score_only: bool) -> Self {
        self.score_only = score_only;
        self
    }

    /// Keep hits within `radius` (in the engine's default unit) of a point.
    pub fn within(mut self, latitude: f64, longitude: f64, radius: f64) -> Self {
        self.spatial = Some(SpatialFilter {
            latitude,
            longitude,
            radius,
            unit: None,
        });
        self
    }

    pub fn with_spatial(mut self, spatial: SpatialFilter) -> Self {
        self.spatial = Some(spatial);
        self
    }

    pub fn with_recency(mut self, recency: RecencyDecay) -> Self {
        self.recency = Some(recency);
        self
    }

    pub fn detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    pub fn owner<S: Into<String>>(mut self, owner: S) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Whether the criteria carry any keyword text.
    pub fn has_keywords(&self) -> bool {
        !self.keywords.trim().is_empty()
    }

    /// Reject criteria that select nothing or carry invalid numbers.
    pub fn validate(&self) -> Result<()> {
        if !self.match_all
            && !self.score_only
            && !self.has_keywords()
            && self.filters.is_empty()
            && self.spatial.is_none()
        {
            return Err(FathomError::query(
                "criteria need keywords, filters, a spatial filter, score-only or match-all",
            ));
        }
        if let Some(spatial) = &self.spatial
            && (!spatial.radius.is_finite() || spatial.radius < 0.0)
        {
            return Err(FathomError::query(format!(
                "spatial radius must be non-negative, got {}",
                spatial.radius
            )));
        }
        if let Some(recency) = &self.recency {
            recency.validate()?;
        }
        Ok(())
    }
}
