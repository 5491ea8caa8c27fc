//! Canonical, pipeline-agnostic model of a structured (JSON) compiler report.

use std::convert::TryFrom;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::Pipeline;
use crate::report_schema::{JsonCycles, JsonProperty, JsonReport, JsonVariant};
use crate::{DynamicValue, ReportError};

/// Metrics of one compiled stage, as reported by the offline compiler
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct MaliocShader {
    /// Shader-wide properties, in report order; these are always unit-less
    pub properties: Vec<ShaderProperty>,
    pub variants: Vec<ShaderVariantMetrics>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Unit {
    None,
    Percent,
}

impl Unit {
    /// Unit of a property, decided solely by its raw identifier.
    pub fn for_property(identifier: &str) -> Unit {
        match identifier {
            "thread_occupancy" | "fp16_arithmetic" => Unit::Percent,
            _ => Unit::None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Percent => "%",
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ShaderProperty {
    /// Human-readable name
    pub name: String,

    /// Raw identifier, e.g. `thread_occupancy`
    pub identifier: String,

    pub value: DynamicValue,
    pub unit: Unit,
}

impl fmt::Display for ShaderProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Cycle counts of one path, aligned positionally with `ShaderVariantMetrics::pipelines`
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct PipelineCycles {
    pub cycles: Vec<f32>,

    /// `None` if the report named no bottleneck
    pub bound_pipeline: Option<Pipeline>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ShaderVariantMetrics {
    pub name: String,

    /// Pipelines present in this report; `None` marks a `null` entry
    pub pipelines: Vec<Option<Pipeline>>,

    pub properties: Vec<ShaderProperty>,

    pub total_cycles: PipelineCycles,
    pub shortest_path_cycles: PipelineCycles,
    pub longest_path_cycles: PipelineCycles,
}

impl ShaderVariantMetrics {
    pub fn property(&self, identifier: &str) -> Option<&ShaderProperty> {
        self.properties.iter().find(|p| p.identifier == identifier)
    }
}

/// Parse the JSON report of a single compiled stage.
pub fn parse_report(json: &str) -> Result<MaliocShader, ReportError> {
    let report: JsonReport = serde_json::from_str(json)?;

    let mut shaders = report.shaders.unwrap_or_default();
    if shaders.len() != 1 {
        return Err(ReportError::ShaderCount {
            found: shaders.len(),
        });
    }
    let shader = shaders.remove(0);

    let properties =
        convert_properties(shader.properties.unwrap_or_default(), |_| Unit::None)?;
    let variants = shader
        .variants
        .unwrap_or_default()
        .into_iter()
        .map(convert_variant)
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "decoded report with {} properties and {} variant(s)",
        properties.len(),
        variants.len()
    );

    Ok(MaliocShader {
        properties,
        variants,
    })
}

fn convert_properties(
    properties: Vec<JsonProperty>,
    unit_fn: impl Fn(&str) -> Unit,
) -> Result<Vec<ShaderProperty>, ReportError> {
    properties
        .into_iter()
        .map(|property| {
            Ok(ShaderProperty {
                value: DynamicValue::try_from(&property.value)?,
                unit: unit_fn(&property.name),
                name: property.display_name,
                identifier: property.name,
            })
        })
        .collect()
}

fn convert_variant(variant: JsonVariant) -> Result<ShaderVariantMetrics, ReportError> {
    let JsonVariant {
        name,
        performance,
        properties,
    } = variant;

    let pipelines = performance
        .pipelines
        .unwrap_or_default()
        .iter()
        .map(|p| parse_pipeline(p.as_deref()))
        .collect::<Result<Vec<_>, _>>()?;

    let aligned_cycles = |cycles: JsonCycles| -> Result<PipelineCycles, ReportError> {
        let cycles = convert_cycles(cycles)?;
        if cycles.cycles.len() != pipelines.len() {
            return Err(ReportError::CycleCountMismatch {
                variant: name.clone(),
                pipelines: pipelines.len(),
                cycles: cycles.cycles.len(),
            });
        }
        Ok(cycles)
    };

    let total_cycles = aligned_cycles(performance.total_cycles)?;
    let shortest_path_cycles = aligned_cycles(performance.shortest_path_cycles)?;
    let longest_path_cycles = aligned_cycles(performance.longest_path_cycles)?;

    Ok(ShaderVariantMetrics {
        properties: convert_properties(properties.unwrap_or_default(), Unit::for_property)?,
        name,
        pipelines,
        total_cycles,
        shortest_path_cycles,
        longest_path_cycles,
    })
}

fn convert_cycles(cycles: JsonCycles) -> Result<PipelineCycles, ReportError> {
    // Only one bottleneck is modeled; further entries are ignored.
    let bound_pipeline = match cycles.bound_pipelines.unwrap_or_default().first() {
        Some(first) => parse_pipeline(first.as_deref())?,
        None => None,
    };

    Ok(PipelineCycles {
        cycles: cycles
            .cycle_count
            .unwrap_or_default()
            .into_iter()
            .map(|count| count.unwrap_or(0.0))
            .collect(),
        bound_pipeline,
    })
}

fn parse_pipeline(identifier: Option<&str>) -> Result<Option<Pipeline>, ReportError> {
    match identifier {
        None => Ok(None),
        Some(identifier) => Pipeline::from_identifier(identifier)
            .map(Some)
            .ok_or_else(|| ReportError::UnknownPipeline {
                identifier: identifier.to_owned(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with_cycles(pipelines: &str, cycles: &str) -> String {
        format!(
            r#"{{
                "shaders": [{{
                    "properties": [],
                    "variants": [{{
                        "name": "Main",
                        "properties": [],
                        "performance": {{
                            "pipelines": {pipelines},
                            "total_cycles": {cycles},
                            "shortest_path_cycles": {cycles},
                            "longest_path_cycles": {cycles}
                        }}
                    }}]
                }}]
            }}"#,
            pipelines = pipelines,
            cycles = cycles
        )
    }

    #[test]
    fn null_cycles_default_to_zero() {
        let json = report_with_cycles(
            r#"["arithmetic", "load_store", "texture"]"#,
            r#"{"bound_pipelines": ["texture", "arithmetic"], "cycle_count": [1.5, null, 2.5]}"#,
        );
        let report = parse_report(&json).unwrap();
        let variant = &report.variants[0];

        assert_eq!(
            variant.pipelines,
            vec![
                Some(Pipeline::Arithmetic),
                Some(Pipeline::LoadStore),
                Some(Pipeline::Texture)
            ]
        );
        assert_eq!(variant.total_cycles.cycles, vec![1.5, 0.0, 2.5]);
        assert_eq!(variant.total_cycles.bound_pipeline, Some(Pipeline::Texture));
    }

    #[test]
    fn null_pipeline_entries() {
        let json = report_with_cycles(
            r#"["arithmetic", null]"#,
            r#"{"bound_pipelines": [null], "cycle_count": [1.0, 0.0]}"#,
        );
        let variant = &parse_report(&json).unwrap().variants[0];

        assert_eq!(variant.pipelines, vec![Some(Pipeline::Arithmetic), None]);
        assert_eq!(variant.longest_path_cycles.bound_pipeline, None);

        let json = report_with_cycles(
            r#"["varying"]"#,
            r#"{"bound_pipelines": [], "cycle_count": [0.0]}"#,
        );
        let variant = &parse_report(&json).unwrap().variants[0];
        assert_eq!(variant.shortest_path_cycles.bound_pipeline, None);
    }

    #[test]
    fn unknown_pipeline() {
        let json = report_with_cycles(
            r#"["arithmetic", "tensor"]"#,
            r#"{"bound_pipelines": [], "cycle_count": [1.0, 1.0]}"#,
        );
        match parse_report(&json) {
            Err(ReportError::UnknownPipeline { identifier }) if identifier == "tensor" => (),
            val @ _ => panic!("{:?}", val),
        }
    }

    #[test]
    fn misaligned_cycles() {
        let json = report_with_cycles(
            r#"["arithmetic", "texture"]"#,
            r#"{"bound_pipelines": ["texture"], "cycle_count": [1.0]}"#,
        );
        match parse_report(&json) {
            Err(ReportError::CycleCountMismatch {
                pipelines: 2,
                cycles: 1,
                ..
            }) => (),
            val @ _ => panic!("{:?}", val),
        }
    }

    #[test]
    fn shader_count() {
        for (json, expected) in &[
            (r#"{"shaders": []}"#, 0),
            (r#"{}"#, 0),
            (r#"{"shaders": [{}, {}]}"#, 2),
        ] {
            match parse_report(json) {
                Err(ReportError::ShaderCount { found }) if found == *expected => (),
                val @ _ => panic!("{:?}", val),
            }
        }
    }

    #[test]
    fn null_document() {
        match parse_report("null") {
            Err(ReportError::MalformedJson(_)) => (),
            val @ _ => panic!("{:?}", val),
        }
    }

    #[test]
    fn wide_property_values_are_narrowed() {
        let json = r#"{"shaders": [{
            "properties": [{"display_name": "X", "name": "x", "value": 4294967297}],
            "variants": []
        }]}"#;
        let report = parse_report(json).unwrap();

        assert_eq!(report.properties[0].value, DynamicValue::Int(1));
        assert!(report.variants.is_empty());
    }

    #[test]
    fn shader_properties_are_unitless() {
        let json = r#"{"shaders": [{
            "properties": [
                {"display_name": "Thread occupancy", "name": "thread_occupancy", "value": 100}
            ],
            "variants": [{
                "name": "Main",
                "properties": [
                    {"display_name": "Thread occupancy", "name": "thread_occupancy", "value": 100}
                ],
                "performance": {
                    "pipelines": [],
                    "total_cycles": {"cycle_count": []},
                    "shortest_path_cycles": {"cycle_count": []},
                    "longest_path_cycles": {"cycle_count": []}
                }
            }]
        }]}"#;
        let report = parse_report(json).unwrap();

        assert_eq!(report.properties[0].unit, Unit::None);
        assert_eq!(report.properties[0].to_string(), "100");
        assert_eq!(report.variants[0].properties[0].unit, Unit::Percent);
        assert_eq!(report.variants[0].properties[0].to_string(), "100%");
    }

    #[test]
    fn units_from_identifier() {
        assert_eq!(Unit::for_property("thread_occupancy"), Unit::Percent);
        assert_eq!(Unit::for_property("fp16_arithmetic"), Unit::Percent);
        assert_eq!(Unit::for_property("work_registers"), Unit::None);
        assert_eq!(Unit::for_property("Thread occupancy"), Unit::None);
    }

    #[test]
    fn property_display() {
        let property = ShaderProperty {
            name: "Thread occupancy".to_string(),
            identifier: "thread_occupancy".to_string(),
            value: DynamicValue::Int(100),
            unit: Unit::Percent,
        };
        assert_eq!(property.to_string(), "100%");
    }
}
