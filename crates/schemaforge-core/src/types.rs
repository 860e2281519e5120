use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a column's value is produced by the server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum Generation {
    #[serde(rename = "NEVER")]
    Never,
    /// Expression default (`DEFAULT_GENERATED`).
    #[serde(rename = "BY DEFAULT")]
    ByDefault,
    /// Expression default that is also refreshed on update.
    #[serde(rename = "ALWAYS")]
    Always,
    #[serde(rename = "STORED")]
    Stored,
    #[serde(rename = "VIRTUAL")]
    Virtual,
}

impl Generation {
    /// Whether the column is computed from an expression (`AS (...)`).
    pub fn is_computed(self) -> bool {
        matches!(self, Generation::Stored | Generation::Virtual)
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Generation::Never => "NEVER",
            Generation::ByDefault => "BY DEFAULT",
            Generation::Always => "ALWAYS",
            Generation::Stored => "STORED",
            Generation::Virtual => "VIRTUAL",
        }
    }
}

/// Procedure parameter direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamMode {
    In,
    Out,
    #[serde(rename = "INOUT")]
    InOut,
}

impl ParamMode {
    /// Parse a catalog `PARAMETER_MODE`; anything unrecognised is treated as `IN`.
    pub fn from_catalog(value: Option<&str>) -> Self {
        match value.map(|mode| mode.trim().to_ascii_uppercase()).as_deref() {
            Some("OUT") => ParamMode::Out,
            Some("INOUT") => ParamMode::InOut,
            _ => ParamMode::In,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            ParamMode::In => "IN",
            ParamMode::Out => "OUT",
            ParamMode::InOut => "INOUT",
        }
    }
}

/// Foreign key action semantics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FkAction {
    Cascade,
    Restrict,
}
