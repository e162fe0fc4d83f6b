//! Registry (ROR) reference table used to geocode organizations.

use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::models::GeoLocation;

/// Errors loading the registry table
#[derive(Debug, thiserror::Error)]
pub enum GeoTableError {
    #[error("IO error reading registry table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed registry table: {0}")]
    Csv(#[from] csv::Error),
}

/// One dump row; organizations with several locations carry `;`-joined cells
#[derive(Debug, Deserialize)]
struct RorRow {
    id: String,
    #[serde(rename = "locations.geonames_details.name", default)]
    city: Option<String>,
    #[serde(rename = "locations.geonames_details.country_subdivision_name", default)]
    region: Option<String>,
    #[serde(rename = "locations.geonames_details.country_name", default)]
    country: Option<String>,
    #[serde(rename = "locations.geonames_details.lat", default)]
    lat: Option<String>,
    #[serde(rename = "locations.geonames_details.lng", default)]
    lon: Option<String>,
}

/// First entry of a possibly multi-valued cell
fn first_value(cell: Option<String>) -> Option<String> {
    cell.as_deref()
        .and_then(|c| c.split(';').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// First coordinate of a cell; unparsable values become `None`
fn first_coordinate(cell: Option<String>) -> Option<f64> {
    first_value(cell).and_then(|v| v.parse().ok())
}

impl From<RorRow> for GeoLocation {
    fn from(row: RorRow) -> Self {
        Self {
            city: first_value(row.city),
            region: first_value(row.region),
            country: first_value(row.country),
            lat: first_coordinate(row.lat),
            lon: first_coordinate(row.lon),
        }
    }
}

/// Registry id → location, loaded read-only
#[derive(Debug, Clone, Default)]
pub struct RorTable {
    locations: HashMap<String, GeoLocation>,
}

impl RorTable {
    /// Table with no rows
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table from a CSV file; a missing file yields an empty table
    pub fn load(path: &Path) -> Result<Self, GeoTableError> {
        if !path.is_file() {
            tracing::warn!(
                "Registry table {} not found; locations will be left empty",
                path.display()
            );
            return Ok(Self::empty());
        }
        let table = Self::from_reader(std::fs::File::open(path)?)?;
        tracing::info!("Loaded {} registry organizations", table.len());
        Ok(table)
    }

    /// Parse CSV rows from any reader; the first row for a repeated id wins
    ///
    /// Multi-location organizations keep their first location. A cell that is
    /// not a number leaves that coordinate empty; only a table missing the `id`
    /// column or with unreadable records is an error.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GeoTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut locations = HashMap::new();
        for row in csv_reader.deserialize::<RorRow>() {
            let row = row?;
            if !locations.contains_key(&row.id) {
                locations.insert(row.id.clone(), GeoLocation::from(row));
            }
        }

        Ok(Self { locations })
    }

    /// Location for a registry id
    pub fn get(&self, ror: &str) -> Option<&GeoLocation> {
        self.locations.get(ror)
    }

    /// Insert or replace a row
    pub fn insert(&mut self, ror: impl Into<String>, location: GeoLocation) {
        self.locations.insert(ror.into(), location);
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
