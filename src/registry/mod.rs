mod alerts;
mod locations;
mod metrics;

pub use alerts::{standard_alerts, standard_points};
pub use locations::standard_locations;
pub use metrics::standard_metrics;

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while assembling the static registries
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("duplicate location id `{0}`")]
    DuplicateId(String),
    #[error("point `{id}` has out-of-range coordinates ({lon}, {lat})")]
    PointOutOfRange { id: String, lon: f64, lat: f64 },
    #[error("point `{id}` has confidence {confidence} outside [0, 1]")]
    ConfidenceOutOfRange { id: String, confidence: f64 },
    #[error("unknown severity `{0}`")]
    UnknownSeverity(String),
}

/// Ordinal hazard level, drives colour coding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = RegistryError;

    /// Case-insensitive: map point records spell these "High", "Critical", ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(RegistryError::UnknownSeverity(s.to_string())),
        }
    }
}

/// Level of a node in the location hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    Global,
    Region,
    Country,
    City,
}

impl LocationKind {
    /// Single-cell glyph shown in front of the node name
    pub fn glyph(self) -> char {
        match self {
            LocationKind::Global => '◍',
            LocationKind::Region => '▦',
            LocationKind::Country => '⚑',
            LocationKind::City => '•',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LocationKind::Global => "global",
            LocationKind::Region => "region",
            LocationKind::Country => "country",
            LocationKind::City => "city",
        }
    }
}

/// A geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoord {
    pub lon: f64,
    pub lat: f64,
}

impl GeoCoord {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.lon) && (-90.0..=90.0).contains(&self.lat)
    }
}

/// A node of the location hierarchy (global → region → country → city).
///
/// `active_incidents` is stored as given; parent counts are not required to
/// equal the sum of their children.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationNode {
    pub id: String,
    pub name: String,
    pub kind: LocationKind,
    pub severity: Severity,
    pub active_incidents: u32,
    pub coordinates: Option<GeoCoord>,
    pub children: Vec<LocationNode>,
}

impl LocationNode {
    pub fn new(id: &str, name: &str, kind: LocationKind, severity: Severity, active_incidents: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            severity,
            active_incidents,
            coordinates: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<LocationNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_coordinates(mut self, lon: f64, lat: f64) -> Self {
        self.coordinates = Some(GeoCoord::new(lon, lat));
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Depth-first search for a descendant (or self) by id
    pub fn find(&self, id: &str) -> Option<&LocationNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    fn collect_ids<'a>(&'a self, seen: &mut HashSet<&'a str>) -> Result<(), RegistryError> {
        if !seen.insert(self.id.as_str()) {
            return Err(RegistryError::DuplicateId(self.id.clone()));
        }
        for child in &self.children {
            child.collect_ids(seen)?;
        }
        Ok(())
    }
}

/// The immutable location hierarchy
#[derive(Debug, Clone)]
pub struct LocationRegistry {
    roots: Vec<LocationNode>,
}

impl LocationRegistry {
    /// Build a registry, rejecting trees where an id appears twice
    pub fn new(roots: Vec<LocationNode>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for root in &roots {
            root.collect_ids(&mut seen)?;
        }
        Ok(Self { roots })
    }

    /// The built-in dataset
    pub fn standard() -> Result<Self, RegistryError> {
        Self::new(standard_locations())
    }

    pub fn roots(&self) -> &[LocationNode] {
        &self.roots
    }

    pub fn find(&self, id: &str) -> Option<&LocationNode> {
        self.roots.iter().find_map(|root| root.find(id))
    }
}

/// Hazard category of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Earthquake,
    Flood,
    Cyclone,
    Wildfire,
    Drought,
    Other,
}

impl AlertKind {
    pub fn glyph(self) -> char {
        match self {
            AlertKind::Earthquake => '⚡',
            AlertKind::Flood => '≈',
            AlertKind::Cyclone => '@',
            AlertKind::Wildfire => '▲',
            AlertKind::Drought => '☼',
            AlertKind::Other => '!',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AlertKind::Earthquake => "earthquake",
            AlertKind::Flood => "flood",
            AlertKind::Cyclone => "cyclone",
            AlertKind::Wildfire => "wildfire",
            AlertKind::Drought => "drought",
            AlertKind::Other => "alert",
        }
    }
}

/// An incident in the live alert feed
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub id: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    /// "City, Country"
    pub location: String,
    pub occurred_at: DateTime<Utc>,
    pub description: String,
    pub affected_population: u64,
    /// Percentage, 0-100
    pub confidence: u8,
    pub magnitude: Option<f64>,
}

/// A point fed to the map collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct HazardPoint {
    pub id: String,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub severity: Severity,
    pub displaced: u64,
    /// Fraction, 0.0-1.0
    pub confidence: f64,
}

impl HazardPoint {
    pub fn new(
        id: &str,
        name: &str,
        lon: f64,
        lat: f64,
        severity: Severity,
        displaced: u64,
        confidence: f64,
    ) -> Result<Self, RegistryError> {
        if !GeoCoord::new(lon, lat).is_valid() {
            return Err(RegistryError::PointOutOfRange { id: id.to_string(), lon, lat });
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(RegistryError::ConfidenceOutOfRange { id: id.to_string(), confidence });
        }
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            lon,
            lat,
            severity,
            displaced,
            confidence,
        })
    }

    pub fn coord(&self) -> GeoCoord {
        GeoCoord::new(self.lon, self.lat)
    }
}

/// Direction of a metric's recent change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increase,
    Decrease,
}

/// A headline metric card
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub title: String,
    pub value: u64,
    pub unit: String,
    pub change: String,
    pub trend: Trend,
    pub severity: Severity,
    /// Percentage, 0-100
    pub confidence: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_ids_unique() {
        let registry = LocationRegistry::standard().unwrap();
        assert_eq!(registry.roots().len(), 1);
        assert_eq!(registry.find("riyadh").map(|n| n.active_incidents), Some(2));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let root = LocationNode::new("global", "Global", LocationKind::Global, Severity::High, 1)
            .with_children(vec![
                LocationNode::new("x", "X", LocationKind::Region, Severity::Low, 0),
                LocationNode::new("x", "X again", LocationKind::Region, Severity::Low, 0),
            ]);
        assert_eq!(
            LocationRegistry::new(vec![root]).unwrap_err(),
            RegistryError::DuplicateId("x".to_string())
        );
    }

    #[test]
    fn test_parent_counts_not_aggregated() {
        // Global reports 47 while its regions sum to 41
        let registry = LocationRegistry::standard().unwrap();
        let global = registry.find("global").unwrap();
        let sum: u32 = global.children.iter().map(|c| c.active_incidents).sum();
        assert_eq!(global.active_incidents, 47);
        assert_ne!(sum, global.active_incidents);
    }

    #[test]
    fn test_severity_parse_case_insensitive() {
        assert_eq!("Critical".parse::<Severity>(), Ok(Severity::Critical));
        assert_eq!("low".parse::<Severity>(), Ok(Severity::Low));
        assert!("extreme".parse::<Severity>().is_err());
    }

    #[test]
    fn test_point_out_of_range() {
        let err = HazardPoint::new("p", "P", 200.0, 0.0, Severity::Low, 0, 0.5).unwrap_err();
        assert!(matches!(err, RegistryError::PointOutOfRange { .. }));
        let err = HazardPoint::new("p", "P", 0.0, 0.0, Severity::Low, 0, 1.5).unwrap_err();
        assert!(matches!(err, RegistryError::ConfidenceOutOfRange { .. }));
    }
}
