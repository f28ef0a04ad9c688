//! Geo Distance Ranker
//!
//! Orders stores or products by great-circle distance from the customer. Every call site ranks
//! through [`DistanceRanker`] so there is exactly one distance formula.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Mean earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors raised while resolving coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Coordinate is missing, non-numeric or out of range.
    #[error("unresolvable coordinate: {0}")]
    UnresolvableCoordinate(String),

    /// Sphere radius is not a positive number of kilometres.
    #[error("invalid sphere radius: {0}")]
    InvalidRadius(f64),
}

/// Validated latitude/longitude pair in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::UnresolvableCoordinate`] if either component is not finite or the
    /// latitude is outside `[-90, 90]` or the longitude outside `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::UnresolvableCoordinate(format!(
                "latitude {latitude} out of range"
            )));
        }

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::UnresolvableCoordinate(format!(
                "longitude {longitude} out of range"
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// One coordinate component as the data API sends it: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawComponent {
    /// JSON number
    Number(f64),

    /// Numeric string such as `"-6.2088"`
    Text(String),
}

impl RawComponent {
    fn resolve(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl fmt::Display for RawComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "{text:?}"),
        }
    }
}

/// Unvalidated coordinate from the data API. Either component may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCoordinate {
    /// Latitude
    #[serde(default)]
    pub latitude: Option<RawComponent>,

    /// Longitude
    #[serde(default)]
    pub longitude: Option<RawComponent>,
}

fn component(raw: Option<&RawComponent>, name: &str) -> Result<f64, GeoError> {
    let raw = raw.ok_or_else(|| GeoError::UnresolvableCoordinate(format!("missing {name}")))?;

    raw.resolve()
        .ok_or_else(|| GeoError::UnresolvableCoordinate(format!("{name} {raw} is not a number")))
}

impl TryFrom<&RawCoordinate> for Coordinate {
    type Error = GeoError;

    fn try_from(raw: &RawCoordinate) -> Result<Self, Self::Error> {
        let latitude = component(raw.latitude.as_ref(), "latitude")?;
        let longitude = component(raw.longitude.as_ref(), "longitude")?;

        Self::new(latitude, longitude)
    }
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = GeoError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::try_from(&raw)
    }
}

/// Great-circle distance in kilometres on the mean earth sphere.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    DistanceRanker::default().distance_km(from, to)
}

/// Item annotated with its distance from the origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    /// Ranked item
    pub item: T,

    /// Distance from the origin in kilometres
    pub distance_km: f64,
}

/// Result of ranking: resolvable items nearest first, plus the items that were left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking<T> {
    /// Items sorted by ascending distance; ties keep input order
    pub ranked: Vec<Ranked<T>>,

    /// Items whose coordinate could not be resolved, in input order
    pub excluded: Vec<(T, GeoError)>,
}

impl<T> Ranking<T> {
    /// Iterate over the ranked items.
    pub fn iter(&self) -> impl Iterator<Item = &Ranked<T>> {
        self.ranked.iter()
    }

    /// Ranked items without their distances.
    pub fn into_items(self) -> Vec<T> {
        self.ranked.into_iter().map(|ranked| ranked.item).collect()
    }
}

/// Ranks items by great-circle distance on a sphere of a given radius.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DistanceRanker {
    radius_km: f64,
}

impl Default for DistanceRanker {
    fn default() -> Self {
        Self {
            radius_km: EARTH_RADIUS_KM,
        }
    }
}

impl DistanceRanker {
    /// Create a ranker for a sphere of `radius_km`.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidRadius`] if `radius_km` is not finite or not positive. A negative
    /// or NaN radius would reverse or scramble the ranking.
    pub fn new(radius_km: f64) -> Result<Self, GeoError> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(GeoError::InvalidRadius(radius_km));
        }

        Ok(Self { radius_km })
    }

    /// Sphere radius in kilometres.
    pub const fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Haversine distance between two coordinates.
    pub fn distance_km(&self, from: Coordinate, to: Coordinate) -> f64 {
        let lat_from = from.latitude.to_radians();
        let lat_to = to.latitude.to_radians();
        let d_lat = (to.latitude - from.latitude).to_radians();
        let d_lon = (to.longitude - from.longitude).to_radians();

        let h = (d_lat / 2.0).sin().powi(2)
            + lat_from.cos() * lat_to.cos() * (d_lon / 2.0).sin().powi(2);

        2.0 * self.radius_km * h.sqrt().min(1.0).asin()
    }

    /// Rank items by distance from `origin`.
    ///
    /// Items whose coordinate cannot be resolved are excluded, never ranked at distance zero.
    pub fn rank<T, I, F>(&self, origin: Coordinate, items: I, mut locate: F) -> Ranking<T>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> Result<Coordinate, GeoError>,
    {
        let mut ranked = Vec::new();
        let mut excluded = Vec::new();

        for item in items {
            match locate(&item) {
                Ok(coordinate) => {
                    let distance_km = self.distance_km(origin, coordinate);
                    ranked.push(Ranked { item, distance_km });
                }
                Err(error) => {
                    warn!(%error, "excluding item from distance ranking");
                    excluded.push((item, error));
                }
            }
        }

        // `sort_by` is stable, so equal distances keep input order.
        ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        debug!(
            ranked = ranked.len(),
            excluded = excluded.len(),
            nearest_km = ranked.first().map(|r| r.distance_km),
            "ranked items by distance"
        );

        Ranking { ranked, excluded }
    }

    /// The `limit` nearest items, e.g. the nearby-stores strip.
    pub fn nearest<T, I, F>(&self, origin: Coordinate, items: I, locate: F, limit: usize) -> Ranking<T>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> Result<Coordinate, GeoError>,
    {
        let mut ranking = self.rank(origin, items, locate);
        ranking.ranked.truncate(limit);
        ranking
    }
}

/// Rank items by distance from `origin` on the mean earth sphere.
pub fn rank_by_distance<T, I, F>(origin: Coordinate, items: I, locate: F) -> Ranking<T>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> Result<Coordinate, GeoError>,
{
    DistanceRanker::default().rank(origin, items, locate)
}

/// The `limit` nearest items on the mean earth sphere.
pub fn nearest<T, I, F>(origin: Coordinate, items: I, locate: F, limit: usize) -> Ranking<T>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> Result<Coordinate, GeoError>,
{
    DistanceRanker::default().nearest(origin, items, locate, limit)
}
