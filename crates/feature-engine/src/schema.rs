//! Feature Schema Reconciliation

use crate::features::EngineeredRecord;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use tracing::{debug, warn};

/// Value of a single engineered feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Categorical(String),
}

impl FeatureValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            FeatureValue::Categorical(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Numeric(_) => None,
            FeatureValue::Categorical(s) => Some(s),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FeatureValue::Numeric(_) => FieldKind::Numeric,
            FeatureValue::Categorical(_) => FieldKind::Categorical,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Numeric(v) => write!(f, "{}", v),
            FeatureValue::Categorical(s) => write!(f, "{:?}", s),
        }
    }
}

/// Whether a field is fed to the model as a number or as a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Categorical,
}

impl FieldKind {
    /// Value substituted when the engineered record lacks the field
    pub fn default_value(&self) -> FeatureValue {
        match self {
            FieldKind::Numeric => FeatureValue::Numeric(0.0),
            FieldKind::Categorical => FeatureValue::Categorical(String::new()),
        }
    }
}

/// Feature fields of the bike sharing demand model
pub const BIKE_SHARING_FIELDS: [(&str, FieldKind); 19] = [
    ("temp", FieldKind::Numeric),
    ("humidity", FieldKind::Numeric),
    ("windspeed", FieldKind::Numeric),
    ("day", FieldKind::Numeric),
    ("dayofyear", FieldKind::Numeric),
    ("hour_sin", FieldKind::Numeric),
    ("hour_cos", FieldKind::Numeric),
    ("month_sin", FieldKind::Numeric),
    ("month_cos", FieldKind::Numeric),
    ("weekday_sin", FieldKind::Numeric),
    ("weekday_cos", FieldKind::Numeric),
    ("season", FieldKind::Numeric),
    ("holiday", FieldKind::Numeric),
    ("workingday", FieldKind::Numeric),
    ("weather", FieldKind::Numeric),
    ("hour", FieldKind::Numeric),
    ("month", FieldKind::Numeric),
    ("weekday", FieldKind::Numeric),
    ("year", FieldKind::Categorical),
];

/// Named field in a model schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
}

/// Ordered set of fields a trained model expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    fields: Vec<SchemaField>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::bike_sharing()
    }
}

impl FeatureSchema {
    /// The canonical bike sharing schema
    pub fn bike_sharing() -> Self {
        Self::from_names(BIKE_SHARING_FIELDS.iter().map(|(name, _)| *name))
    }

    /// Build a schema from field names in model order. Kinds come from the
    /// canonical schema; names outside it are treated as numeric.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                let kind = BIKE_SHARING_FIELDS
                    .iter()
                    .find(|(known, _)| *known == name)
                    .map(|(_, kind)| *kind)
                    .unwrap_or(FieldKind::Numeric);
                SchemaField {
                    name: name.to_string(),
                    kind,
                }
            })
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Assemble exactly the schema's fields from an engineered record.
    ///
    /// Missing fields receive their kind's default and are reported in
    /// `defaulted`; fields outside the schema are dropped.
    pub fn reconcile(&self, mut record: EngineeredRecord) -> Reconciled {
        let mut entries = Vec::with_capacity(self.fields.len());
        let mut defaulted = Vec::new();

        for field in &self.fields {
            let value = match record.take(&field.name) {
                Some(value) => value,
                None => {
                    let default = field.kind.default_value();
                    warn!("Feature '{}' missing from engineered record, defaulting to {}", field.name, default);
                    defaulted.push(FieldDefaulted {
                        field: field.name.clone(),
                        default: default.clone(),
                    });
                    default
                }
            };
            entries.push((field.name.clone(), value));
        }

        let dropped = record.into_names();
        if !dropped.is_empty() {
            debug!("Dropped fields outside the model schema: {:?}", dropped);
        }

        Reconciled {
            vector: EngineeredFeatureVector { entries },
            defaulted,
            dropped,
        }
    }
}

/// Notification that a schema field was filled with its default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefaulted {
    pub field: String,
    pub default: FeatureValue,
}

/// Output of schema reconciliation
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Feature vector in schema order
    pub vector: EngineeredFeatureVector,
    /// Fields substituted with defaults
    pub defaulted: Vec<FieldDefaulted>,
    /// Engineered fields the schema does not name
    pub dropped: Vec<String>,
}

/// Named feature values in model schema order. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineeredFeatureVector {
    entries: Vec<(String, FeatureValue)>,
}

impl EngineeredFeatureVector {
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FeatureValue::as_f64)
    }

    pub fn categorical(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FeatureValue::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for EngineeredFeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl fmt::Display for EngineeredFeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, FeatureValue)]) -> EngineeredRecord {
        let mut record = EngineeredRecord::default();
        for (name, value) in pairs {
            record.insert(name, value.clone());
        }
        record
    }

    #[test]
    fn test_canonical_kinds() {
        let schema = FeatureSchema::bike_sharing();
        assert_eq!(schema.len(), 19);
        let year = schema.fields().iter().find(|f| f.name == "year").unwrap();
        assert_eq!(year.kind, FieldKind::Categorical);
    }

    #[test]
    fn test_reconcile_orders_and_drops() {
        let schema = FeatureSchema::from_names(["year", "temp"]);
        let reconciled = schema.reconcile(record(&[
            ("temp", FeatureValue::Numeric(21.5)),
            ("atemp", FeatureValue::Numeric(25.0)),
            ("year", FeatureValue::Categorical("2011".into())),
        ]));

        assert_eq!(reconciled.vector.names().collect::<Vec<_>>(), vec!["year", "temp"]);
        assert_eq!(reconciled.dropped, vec!["atemp".to_string()]);
        assert!(reconciled.defaulted.is_empty());
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let schema = FeatureSchema::from_names(["temp", "year", "registered"]);
        let reconciled = schema.reconcile(record(&[("temp", FeatureValue::Numeric(3.0))]));

        assert_eq!(reconciled.vector.len(), 3);
        assert_eq!(reconciled.vector.categorical("year"), Some(""));
        assert_eq!(reconciled.vector.numeric("registered"), Some(0.0));
        assert_eq!(
            reconciled.defaulted,
            vec![
                FieldDefaulted {
                    field: "year".into(),
                    default: FeatureValue::Categorical(String::new()),
                },
                FieldDefaulted {
                    field: "registered".into(),
                    default: FeatureValue::Numeric(0.0),
                },
            ]
        );
    }

    #[test]
    fn test_schema_json_is_field_list() {
        let schema: FeatureSchema = serde_json::from_str(
            r#"[{"name":"temp","kind":"numeric"},{"name":"year","kind":"categorical"}]"#,
        )
        .unwrap();
        assert_eq!(schema, FeatureSchema::from_names(["temp", "year"]));
    }

    #[test]
    fn test_vector_serializes_as_map() {
        let reconciled = FeatureSchema::from_names(["temp", "year"]).reconcile(record(&[
            ("temp", FeatureValue::Numeric(25.0)),
            ("year", FeatureValue::Categorical("2024".into())),
        ]));
        let json = serde_json::to_value(&reconciled.vector).unwrap();
        assert_eq!(json, serde_json::json!({"temp": 25.0, "year": "2024"}));
        assert_eq!(reconciled.vector.to_string(), r#"{temp=25, year="2024"}"#);
    }
}
