/// Selection of stored datasets to include in a share link
use crate::datasets::Dataset;
use crate::payload::Fields;
use crate::store::KeyValueStore;
use serde_json::{Map, Value};

/// Composable selector that reads datasets out of a store
///
/// Each view builds the selection matching what it displays, e.g. the
/// quarterly report only shares the indicator keys that belong to its quarter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Stats { indicator_keys: Vec<String> },
    Dataset(Dataset),
}

impl Selection {
    pub fn new() -> Self {
        Selection { parts: Vec::new() }
    }

    /// Detailed stats, keeping only `indicator_keys` inside each period
    ///
    /// An empty list keeps every indicator.
    pub fn stats<S: AsRef<str>>(mut self, indicator_keys: &[S]) -> Self {
        self.parts.push(Part::Stats {
            indicator_keys: indicator_keys.iter().map(|k| k.as_ref().to_string()).collect(),
        });
        self
    }

    pub fn context(self) -> Self {
        self.dataset(Dataset::Context)
    }

    pub fn dataset(mut self, dataset: Dataset) -> Self {
        self.parts.push(Part::Dataset(dataset));
        self
    }

    /// Default selection for a share button of the given kind
    ///
    /// Report views (`rqda_*`) share the detailed stats only; views that need
    /// a narrower indicator set build their own selection with [`Selection::stats`].
    pub fn for_kind(kind: &str) -> Self {
        match kind {
            "strategic" => Selection::new().dataset(Dataset::StrategicIndicators),
            "proposals" => Selection::new().dataset(Dataset::Proposals),
            k if k.starts_with("rqda") => Selection::new().stats::<&str>(&[]),
            _ => Selection::new().stats::<&str>(&[]).context(),
        }
    }

    /// Read the selected datasets, dropping anything empty
    pub fn read(&self, store: &dyn KeyValueStore) -> Fields {
        let mut fields = Fields::new();

        for part in &self.parts {
            let (dataset, value) = match part {
                Part::Stats { indicator_keys } => {
                    let value = store
                        .get(Dataset::DetailedStats.storage_key())
                        .map(|stats| filter_indicators(stats, indicator_keys));
                    (Dataset::DetailedStats, value)
                }
                Part::Dataset(dataset) => (*dataset, store.get(dataset.storage_key())),
            };

            if let Some(value) = value.filter(|v| !is_empty_value(v)) {
                fields.insert(dataset.field_name().to_string(), value);
            }
        }

        fields
    }
}

/// Keep only `keys` inside each period; periods left empty are dropped
fn filter_indicators(stats: Value, keys: &[String]) -> Value {
    if keys.is_empty() {
        return stats;
    }

    let Value::Object(periods) = stats else {
        return stats;
    };

    let filtered: Map<String, Value> = periods
        .into_iter()
        .filter_map(|(period, record)| {
            let Value::Object(record) = record else {
                return None;
            };
            let kept: Map<String, Value> = record
                .into_iter()
                .filter(|(indicator, _)| keys.iter().any(|k| k == indicator))
                .collect();
            (!kept.is_empty()).then(|| (period, Value::Object(kept)))
        })
        .collect();

    Value::Object(filtered)
}

/// `null`, blank strings and empty containers carry nothing worth sharing
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
