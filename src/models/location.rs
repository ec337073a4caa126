//! Location model and the municipality catalog

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::EnviroSnapError;

/// Administrative classification of a location
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    /// Provincial capital
    Capital,
    City,
    Municipality,
}

/// A selectable municipality
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Stable identifier (e.g. `calamba`)
    pub id: String,
    /// Display name
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Elevation above sea level in meters
    pub elevation: f64,
    pub kind: LocationKind,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        elevation: f64,
        kind: LocationKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
            elevation,
            kind,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Immutable set of locations loaded once at startup
#[derive(Debug, Clone)]
pub struct LocationCatalog {
    locations: Vec<Location>,
}

impl LocationCatalog {
    /// Build a catalog, rejecting empty sets and duplicate ids
    pub fn new(locations: Vec<Location>) -> crate::Result<Self> {
        if locations.is_empty() {
            return Err(EnviroSnapError::validation(
                "Location catalog must not be empty",
            ));
        }
        for (i, location) in locations.iter().enumerate() {
            if locations[..i].iter().any(|other| other.id == location.id) {
                return Err(EnviroSnapError::validation(format!(
                    "Duplicate location id '{}'",
                    location.id
                )));
            }
            if !(-90.0..=90.0).contains(&location.latitude)
                || !(-180.0..=180.0).contains(&location.longitude)
            {
                return Err(EnviroSnapError::validation(format!(
                    "Location '{}' has out-of-range coordinates",
                    location.id
                )));
            }
        }
        Ok(Self { locations })
    }

    /// Load a catalog from a JSON array of locations
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let locations: Vec<Location> = serde_json::from_str(&content).map_err(|e| {
            EnviroSnapError::validation(format!(
                "Failed to parse locations file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::new(locations)
    }

    /// The built-in Laguna catalog
    #[must_use]
    pub fn laguna() -> Self {
        use LocationKind::{Capital, City, Municipality};
        let locations = vec![
            Location::new("santa-cruz", "Santa Cruz", 14.2814, 121.4163, 7.0, Capital),
            Location::new("calamba", "Calamba", 14.2117, 121.1663, 12.0, City),
            Location::new("san-pablo", "San Pablo", 14.0683, 121.3256, 133.0, City),
            Location::new("santa-rosa", "Santa Rosa", 14.3122, 121.1114, 25.0, City),
            Location::new("binan", "Biñan", 14.3333, 121.0833, 17.0, City),
            Location::new("cabuyao", "Cabuyao", 14.2725, 121.1251, 15.0, City),
            Location::new("san-pedro", "San Pedro", 14.3595, 121.0473, 20.0, City),
            Location::new("los-banos", "Los Baños", 14.1699, 121.2441, 21.0, Municipality),
            Location::new("bay", "Bay", 14.1833, 121.2833, 8.0, Municipality),
            Location::new("pagsanjan", "Pagsanjan", 14.2730, 121.4554, 15.0, Municipality),
            Location::new("pila", "Pila", 14.2333, 121.3667, 8.0, Municipality),
            Location::new("nagcarlan", "Nagcarlan", 14.1364, 121.4165, 260.0, Municipality),
            Location::new("siniloan", "Siniloan", 14.4167, 121.4500, 12.0, Municipality),
            Location::new("paete", "Paete", 14.3642, 121.4825, 8.0, Municipality),
        ];
        Self { locations }
    }

    /// Look up a location by id (case-insensitive)
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Location> {
        self.locations
            .iter()
            .find(|location| location.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Look up a location by id, failing with [`EnviroSnapError::UnknownLocation`]
    pub fn require(&self, id: &str) -> crate::Result<&Location> {
        self.find(id)
            .ok_or_else(|| EnviroSnapError::unknown_location(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
