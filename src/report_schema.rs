//! Raw layout of the offline compiler's `--format json` output.
//!
//! Only the fields the canonical model needs are declared; everything else in the
//! document is ignored. Fields the compiler may emit as `null` are `Option`s.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct JsonReport {
    #[serde(default)]
    pub shaders: Option<Vec<JsonShader>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonShader {
    #[serde(default)]
    pub properties: Option<Vec<JsonProperty>>,
    #[serde(default)]
    pub variants: Option<Vec<JsonVariant>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonProperty {
    pub display_name: String,
    pub name: String,

    /// Integer, float or boolean; classified later
    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonVariant {
    pub name: String,
    pub performance: JsonPerformance,
    #[serde(default)]
    pub properties: Option<Vec<JsonProperty>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonPerformance {
    #[serde(default)]
    pub pipelines: Option<Vec<Option<String>>>,
    pub total_cycles: JsonCycles,
    pub shortest_path_cycles: JsonCycles,
    pub longest_path_cycles: JsonCycles,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JsonCycles {
    #[serde(default)]
    pub bound_pipelines: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub cycle_count: Option<Vec<Option<f32>>>,
}
