/// Datasets the share subsystem knows how to copy between browsers

/// A dataset persisted by the dashboard pages under a fixed storage key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dataset {
    /// Per-period detailed indicators, e.g. `{ "jan": { "i1_acolhimento": 120 } }`
    DetailedStats,
    /// Free-text context notes fed into report generation
    Context,
    StrategicIndicators,
    Proposals,
}

impl Dataset {
    pub const ALL: [Dataset; 4] = [
        Dataset::DetailedStats,
        Dataset::Context,
        Dataset::StrategicIndicators,
        Dataset::Proposals,
    ];

    pub fn storage_key(self) -> &'static str {
        match self {
            Dataset::DetailedStats => "hospital.detailed_stats",
            Dataset::Context => "hospital.context",
            Dataset::StrategicIndicators => "hospital.strategic_indicators",
            Dataset::Proposals => "hospital.proposals",
        }
    }

    /// Name of the field carrying this dataset inside a share payload
    pub fn field_name(self) -> &'static str {
        match self {
            Dataset::DetailedStats => "stats",
            Dataset::Context => "context",
            Dataset::StrategicIndicators => "strategic",
            Dataset::Proposals => "proposals",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Dataset> {
        Dataset::ALL.into_iter().find(|d| d.field_name() == name)
    }
}

/// Generic field name whose target depends on the payload kind
pub const GENERIC_DATA_FIELD: &str = "data";

/// Resolve a payload field to the dataset it restores
///
/// `data` is routed by kind: `strategic*` kinds carry strategic indicators,
/// `proposals*` kinds carry the proposals list. Anything else is unknown.
pub fn resolve_field(kind: &str, field: &str) -> Option<Dataset> {
    if field == GENERIC_DATA_FIELD {
        return dataset_for_kind(kind);
    }
    Dataset::from_field_name(field)
}

fn dataset_for_kind(kind: &str) -> Option<Dataset> {
    let kind = kind.to_ascii_lowercase();
    if kind.starts_with("strategic") {
        Some(Dataset::StrategicIndicators)
    } else if kind.starts_with("proposals") {
        Some(Dataset::Proposals)
    } else {
        None
    }
}
