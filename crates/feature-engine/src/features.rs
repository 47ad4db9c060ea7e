//! Feature Vector Assembly

use crate::calendar::CalendarFields;
use crate::cyclical::CyclicalFeatures;
use crate::schema::{FeatureSchema, FeatureValue, Reconciled};
use crate::winsorize::OutlierBounds;
use data_validator::Observation;
use std::collections::BTreeMap;
use tracing::debug;

/// Every field produced by the transform, before schema reconciliation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineeredRecord {
    fields: BTreeMap<String, FeatureValue>,
}

impl EngineeredRecord {
    pub fn insert(&mut self, name: &str, value: FeatureValue) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.fields.get(name)
    }

    /// Remove a field, handing back its value
    pub fn take(&mut self, name: &str) -> Option<FeatureValue> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_names(self) -> Vec<String> {
        self.fields.into_keys().collect()
    }

    fn numeric(&mut self, name: &str, value: f64) {
        self.insert(name, FeatureValue::Numeric(value));
    }
}

/// Stateless transform from observation to model-ready features
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    /// Fields the scoring model expects, in order
    schema: FeatureSchema,
    /// Training-time clip bounds
    bounds: OutlierBounds,
}

impl FeatureExtractor {
    /// Create a new feature extractor
    pub fn new(schema: FeatureSchema, bounds: OutlierBounds) -> Self {
        Self { schema, bounds }
    }

    /// Canonical schema with the given clip bounds
    pub fn with_bounds(bounds: OutlierBounds) -> Self {
        Self::new(FeatureSchema::bike_sharing(), bounds)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn bounds(&self) -> &OutlierBounds {
        &self.bounds
    }

    /// Raw fields, calendar fields, cyclical pairs, and clipped humidity and
    /// wind speed. The raw timestamp is carried along and later dropped.
    pub fn engineer(&self, obs: &Observation) -> EngineeredRecord {
        let calendar = CalendarFields::from_timestamp(&obs.timestamp);
        let cyclical = CyclicalFeatures::from_calendar(&calendar);

        let mut record = EngineeredRecord::default();
        record.insert(
            "datetime",
            FeatureValue::Categorical(obs.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()),
        );

        record.numeric("season", obs.season as f64);
        record.numeric("holiday", obs.holiday as f64);
        record.numeric("workingday", obs.workingday as f64);
        record.numeric("weather", obs.weather as f64);
        record.numeric("temp", obs.temp);
        record.numeric("humidity", self.bounds.humidity.clip(obs.humidity as f64));
        record.numeric("windspeed", self.bounds.windspeed.clip(obs.windspeed));

        record.numeric("hour", calendar.hour as f64);
        record.numeric("month", calendar.month as f64);
        record.numeric("weekday", calendar.weekday as f64);
        record.numeric("day", calendar.day as f64);
        record.numeric("dayofyear", calendar.day_of_year as f64);
        record.insert("year", FeatureValue::Categorical(calendar.year));

        record.numeric("hour_sin", cyclical.hour.sin);
        record.numeric("hour_cos", cyclical.hour.cos);
        record.numeric("month_sin", cyclical.month.sin);
        record.numeric("month_cos", cyclical.month.cos);
        record.numeric("weekday_sin", cyclical.weekday.sin);
        record.numeric("weekday_cos", cyclical.weekday.cos);

        record
    }

    /// Engineer and reconcile against the schema
    pub fn extract(&self, obs: &Observation) -> Reconciled {
        let record = self.engineer(obs);
        debug!("Engineered {} fields for {}", record.len(), obs.timestamp);
        self.schema.reconcile(record)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::with_bounds(OutlierBounds::passthrough())
    }
}
