use crate::{
    core::{
        config::GeofenceConfig,
        geo::{distance_meters, GeoBoundingBox, GeoPosition},
        poi::Poi,
    },
    GuideError, Result,
};
use serde::{Deserialize, Serialize};

/// One entry of the narration catalog as served by the REST backend.
///
/// Only `id` is required; records without coordinates are listed but never
/// become geofenced POIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub id: i64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default, alias = "accuracy")]
    pub accuracy_radius: Option<f64>,
    #[serde(default)]
    pub audio_id: Option<i64>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default, alias = "foodName")]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CatalogRecord {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            latitude: None,
            longitude: None,
            accuracy_radius: None,
            audio_id: None,
            priority: None,
            name: None,
            description: None,
        }
    }

    pub fn at(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.accuracy_radius = Some(radius);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Coordinates, when both are present and finite
    pub fn position(&self) -> Option<GeoPosition> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPosition::new(lat, lng)).filter(GeoPosition::is_valid),
            _ => None,
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id))
    }

    /// Distance from `position` in meters, if the record is located
    pub fn distance_from(&self, position: &GeoPosition) -> Option<f64> {
        self.position().map(|p| distance_meters(position, &p))
    }

    /// Derives the geofenced POI. `default_radius` replaces a missing or
    /// non-positive radius.
    pub fn to_poi(&self, default_radius: f64) -> Option<Poi> {
        let position = self.position()?;
        let radius = self
            .accuracy_radius
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(default_radius);

        let mut poi = Poi::new(self.id, position.lat, position.lng, radius);
        if let Some(priority) = self.priority {
            poi = poi.with_priority(priority);
        }
        if let Some(audio_id) = self.audio_id {
            poi = poi.with_audio(audio_id);
        }
        Some(poi)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogEnvelope {
    Wrapped { data: Page },
    Paged(Page),
    Bare(Vec<CatalogRecord>),
}

#[derive(Debug, Deserialize)]
struct Page {
    #[allow(dead_code)]
    meta: serde_json::Value,
    result: Vec<CatalogRecord>,
}

/// Parses a catalog response. Accepts `{data: {meta, result}}`,
/// `{meta, result}` or a bare array of records.
pub fn parse_catalog(json: &str) -> Result<Vec<CatalogRecord>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    parse_catalog_value(value)
}

pub fn parse_catalog_value(value: serde_json::Value) -> Result<Vec<CatalogRecord>> {
    match serde_json::from_value::<CatalogEnvelope>(value) {
        Ok(CatalogEnvelope::Wrapped { data }) => Ok(data.result),
        Ok(CatalogEnvelope::Paged(page)) => Ok(page.result),
        Ok(CatalogEnvelope::Bare(records)) => Ok(records),
        Err(e) => Err(GuideError::Catalog(format!("unrecognized catalog shape: {}", e))),
    }
}

/// Loaded catalog: every record for listing plus the POIs derived from the
/// located ones
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
    pois: Vec<Poi>,
}

impl Catalog {
    pub fn from_records(records: Vec<CatalogRecord>, config: &GeofenceConfig) -> Self {
        let pois: Vec<Poi> = records
            .iter()
            .filter_map(|r| r.to_poi(config.default_radius_m))
            .collect();

        log::info!(
            "catalog loaded: {} records, {} located",
            records.len(),
            pois.len()
        );

        Self { records, pois }
    }

    pub fn from_json(json: &str, config: &GeofenceConfig) -> Result<Self> {
        Ok(Self::from_records(parse_catalog(json)?, config))
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, id: i64) -> Option<&CatalogRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn poi(&self, id: i64) -> Option<&Poi> {
        self.pois.iter().find(|p| p.id == id)
    }

    /// First record that has coordinates
    pub fn first_located(&self) -> Option<&CatalogRecord> {
        self.records.iter().find(|r| r.position().is_some())
    }

    /// Bounds of all located records expanded by `padding_deg`
    pub fn bounding_box(&self, padding_deg: f64) -> Option<GeoBoundingBox> {
        GeoBoundingBox::from_positions(self.pois.iter().map(|p| p.position()), padding_deg)
    }
}

/// Orders records by distance from `position`, nearest first. Records without
/// coordinates keep their relative order at the end; without a position the
/// input order is kept.
pub fn sort_by_distance<'a>(
    records: &'a [CatalogRecord],
    position: Option<&GeoPosition>,
) -> Vec<&'a CatalogRecord> {
    let mut sorted: Vec<&CatalogRecord> = records.iter().collect();
    let Some(position) = position else {
        return sorted;
    };

    sorted.sort_by(|a, b| {
        let da = a.distance_from(position).unwrap_or(f64::INFINITY);
        let db = b.distance_from(position).unwrap_or(f64::INFINITY);
        da.total_cmp(&db)
    });
    sorted
}
