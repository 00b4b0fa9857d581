//! Geographic points, great-circle distances and the tier/cell grid used to
//! narrow radius queries.
//!
//! Tier `t` splits latitude into `2^t` rows and longitude into `2^(t+1)`
//! columns, so every cell of a tier spans `180 / 2^t` degrees on each side.
//! Each indexed point is recorded in one cell per tier; a radius query picks
//! the finest tier whose cells cover the query's bounding box in a bounded
//! number of cells, collects the candidates there, and then applies an exact
//! haversine check.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FathomError, Result};

pub const MIN_TIER: u8 = 2;
pub const MAX_TIER: u8 = 15;

/// Upper bound on the cells a single radius query may enumerate.
pub const MAX_QUERY_CELLS: usize = 64;

const KM_PER_DEGREE: f64 = 111.195;

/// Unit a query radius is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Miles,
    Kilometers,
}

impl DistanceUnit {
    pub fn earth_radius(self) -> f64 {
        match self {
            DistanceUnit::Miles => 3958.8,
            DistanceUnit::Kilometers => 6371.0,
        }
    }

    pub fn to_kilometers(self, distance: f64) -> f64 {
        match self {
            DistanceUnit::Miles => distance * 1.609_344,
            DistanceUnit::Kilometers => distance,
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceUnit::Miles => f.write_str("miles"),
            DistanceUnit::Kilometers => f.write_str("kilometers"),
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = FathomError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mi" | "mile" | "miles" => Ok(DistanceUnit::Miles),
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => {
                Ok(DistanceUnit::Kilometers)
            }
            other => Err(FathomError::validation(format!(
                "unknown distance unit `{other}`"
            ))),
        }
    }
}

/// A geographical point with latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(FathomError::validation(format!(
                "invalid latitude {lat} (must be between -90 and 90)"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(FathomError::validation(format!(
                "invalid longitude {lng} (must be between -180 and 180)"
            )));
        }
        Ok(GeoPoint { lat, lng })
    }

    /// Haversine distance to `other`.
    pub fn distance_to(&self, other: &GeoPoint, unit: DistanceUnit) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        unit.earth_radius() * c
    }

    /// Cell of this point at `tier`.
    pub fn cell(&self, tier: u8) -> Cell {
        let size = cell_size(tier);
        let rows = 1i64 << tier;
        let cols = rows * 2;
        let row = (((self.lat + 90.0) / size).floor() as i64).clamp(0, rows - 1);
        let col = (((self.lng + 180.0) / size).floor() as i64).clamp(0, cols - 1);
        Cell { tier, row, col }
    }

    /// One cell per tier, coarsest first.
    pub fn cells(&self) -> Vec<Cell> {
        (MIN_TIER..=MAX_TIER).map(|tier| self.cell(tier)).collect()
    }
}

/// Side length, in degrees, of a cell at `tier`.
pub fn cell_size(tier: u8) -> f64 {
    180.0 / (1u64 << tier) as f64
}

/// One grid cell of one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub tier: u8,
    pub row: i64,
    pub col: i64,
}

impl Cell {
    /// Field the cell term is indexed under.
    pub fn field(&self) -> String {
        format!("_tier_{}", self.tier)
    }

    /// Term text of the cell within its tier field.
    pub fn term(&self) -> String {
        format!("{}:{}", self.row, self.col)
    }
}

/// Cells covering every point within `radius` of `center`, at the finest tier
/// that needs no more than [`MAX_QUERY_CELLS`] of them.
///
/// Returns `None` when even the coarsest tier would need too many cells (huge
/// radius or polar query); callers then scan all located documents.
pub fn covering_cells(center: &GeoPoint, radius: f64, unit: DistanceUnit) -> Option<Vec<Cell>> {
    let radius_deg = unit.to_kilometers(radius.max(0.0)) / KM_PER_DEGREE;
    let min_lat = center.lat - radius_deg;
    let max_lat = center.lat + radius_deg;
    if min_lat < -90.0 || max_lat > 90.0 {
        return None;
    }
    // widest longitude span occurs at the latitude furthest from the equator
    let extreme_lat = min_lat.abs().max(max_lat.abs()).to_radians();
    let lng_deg = radius_deg / extreme_lat.cos().max(1e-9);
    if lng_deg >= 180.0 {
        return None;
    }

    for tier in (MIN_TIER..=MAX_TIER).rev() {
        let size = cell_size(tier);
        let rows = 1i64 << tier;
        let cols = rows * 2;
        let row_of = |lat: f64| (((lat + 90.0) / size).floor() as i64).clamp(0, rows - 1);
        let col_of = |lng: f64| ((lng + 180.0) / size).floor() as i64;

        let (row_lo, row_hi) = (row_of(min_lat), row_of(max_lat));
        let (col_lo, col_hi) = (col_of(center.lng - lng_deg), col_of(center.lng + lng_deg));
        let row_count = (row_hi - row_lo + 1) as usize;
        let col_count = ((col_hi - col_lo + 1) as usize).min(cols as usize);
        if row_count * col_count > MAX_QUERY_CELLS {
            continue;
        }

        let mut cells = Vec::with_capacity(row_count * col_count);
        for row in row_lo..=row_hi {
            for offset in 0..col_count as i64 {
                let col = (col_lo + offset).rem_euclid(cols);
                cells.push(Cell { tier, row, col });
            }
        }
        return Some(cells);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let new_york = GeoPoint::new(40.7128, -74.0060).unwrap();
        let london = GeoPoint::new(51.5074, -0.1278).unwrap();
        let km = new_york.distance_to(&london, DistanceUnit::Kilometers);
        assert!((km - 5570.0).abs() < 10.0);
        let miles = new_york.distance_to(&london, DistanceUnit::Miles);
        assert!((miles - 3461.0).abs() < 10.0);
        assert_eq!(new_york.distance_to(&new_york, DistanceUnit::Miles), 0.0);
    }

    #[test]
    fn test_invalid_coordinates() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_cells_nest() {
        let point = GeoPoint::new(37.7749, -122.4194).unwrap();
        let cells = point.cells();
        assert_eq!(cells.len(), (MAX_TIER - MIN_TIER + 1) as usize);
        for pair in cells.windows(2) {
            assert_eq!(pair[1].row / 2, pair[0].row);
            assert_eq!(pair[1].col / 2, pair[0].col);
        }
        // poles and the antimeridian stay inside the grid
        let corner = GeoPoint::new(90.0, 180.0).unwrap().cell(3);
        assert_eq!((corner.row, corner.col), (7, 15));
    }

    #[test]
    fn test_covering_cells_contain_point() {
        let center = GeoPoint::new(40.7128, -74.0060).unwrap();

        let exact = covering_cells(&center, 0.0, DistanceUnit::Miles).unwrap();
        assert_eq!(exact, vec![center.cell(MAX_TIER)]);

        let cells = covering_cells(&center, 25.0, DistanceUnit::Miles).unwrap();
        assert!(cells.len() <= MAX_QUERY_CELLS);
        let nearby = GeoPoint::new(40.9, -74.2).unwrap();
        let tier = cells[0].tier;
        assert!(cells.contains(&nearby.cell(tier)));
    }

    #[test]
    fn test_covering_cells_wrap_antimeridian() {
        let center = GeoPoint::new(0.0, 179.99).unwrap();
        let cells = covering_cells(&center, 50.0, DistanceUnit::Kilometers).unwrap();
        let other_side = GeoPoint::new(0.0, -179.9).unwrap();
        assert!(cells.contains(&other_side.cell(cells[0].tier)));
    }

    #[test]
    fn test_huge_radius_falls_back() {
        let center = GeoPoint::new(80.0, 0.0).unwrap();
        assert!(covering_cells(&center, 5000.0, DistanceUnit::Miles).is_none());
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("KM".parse::<DistanceUnit>().unwrap(), DistanceUnit::Kilometers);
        assert_eq!("miles".parse::<DistanceUnit>().unwrap(), DistanceUnit::Miles);
        assert!("furlongs".parse::<DistanceUnit>().is_err());
    }
}
