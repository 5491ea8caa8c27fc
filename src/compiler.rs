//! Attaching offline compiler metrics to the stages of a variant.
//!
//! This crate never launches the offline compiler itself. Instead, `compute_variant_metrics`
//! hands every stage to a user-provided callback, which is expected to write the stage's
//! `compiler_source()` somewhere the compiler can read it, run the compiler with the
//! stage's `compiler_flag()`, and return its standard output.
//!
//! An example implementation using `std::process::Command`:
//!
//! ```ignore
//! let computed = malioc_report::compute_variant_metrics(&mut variant, |stage| {
//!     let path = std::env::temp_dir().join("malioc-stage.glsl");
//!     std::fs::write(&path, stage.compiler_source())?;
//!
//!     let output = std::process::Command::new("malioc")
//!         .args(&["--core", "Mali-G76", "--format", "json"])
//!         .arg(stage.stage_type.compiler_flag())
//!         .arg(&path)
//!         .output()?;
//!
//!     std::fs::remove_file(&path)?;
//!     Ok(malioc_report::CompilerOutput::Json(
//!         String::from_utf8(output.stdout)?,
//!     ))
//! })?;
//! ```

use crate::error::BoxedCompilerError;
use crate::{
    CompiledShaderStageType, CompiledShaderVariant, CompilerShaderStage, ReportError,
    StageMetrics,
};

/// Standard output of the offline compiler for one stage
pub enum CompilerOutput {
    /// Plain-text report, produced without a structured output flag
    Text(String),

    /// Report produced with `--format json`
    Json(String),
}

/// Parse compiler output for a stage of the given type.
pub fn parse_compiler_output(
    stage_type: CompiledShaderStageType,
    output: &CompilerOutput,
) -> Result<StageMetrics, ReportError> {
    match output {
        CompilerOutput::Json(json) => crate::parse_report(json).map(StageMetrics::Structured),
        CompilerOutput::Text(text) => parse_text_output(stage_type, text),
    }
}

#[cfg(feature = "legacy_report")]
fn parse_text_output(
    stage_type: CompiledShaderStageType,
    text: &str,
) -> Result<StageMetrics, ReportError> {
    let lines: Vec<&str> = text.lines().collect();
    match stage_type {
        CompiledShaderStageType::Vertex => {
            crate::parse_vertex_metrics(&lines).map(StageMetrics::Vertex)
        }
        CompiledShaderStageType::Pixel => {
            crate::parse_pixel_metrics(&lines).map(StageMetrics::Pixel)
        }
    }
}

#[cfg(not(feature = "legacy_report"))]
fn parse_text_output(
    _stage_type: CompiledShaderStageType,
    _text: &str,
) -> Result<StageMetrics, ReportError> {
    Err(ReportError::LegacyReportUnsupported)
}

/// Compile every stage of `variant` via `compiler_fn`, and attach the parsed metrics.
///
/// Variants whose `metrics_computed` flag is already set are left alone, and `Ok(false)`
/// is returned. On failure, no stage is modified and the flag stays clear, so the call
/// may be retried.
pub fn compute_variant_metrics<CompilerFn>(
    variant: &mut CompiledShaderVariant,
    mut compiler_fn: CompilerFn,
) -> Result<bool, ReportError>
where
    CompilerFn: FnMut(&CompilerShaderStage) -> Result<CompilerOutput, BoxedCompilerError>,
{
    if variant.metrics_computed {
        return Ok(false);
    }

    let metrics = variant
        .stages
        .iter()
        .map(|stage| {
            let output = compiler_fn(stage).map_err(|cause| ReportError::CompilerError {
                stage: stage.stage_type,
                cause,
            })?;
            parse_compiler_output(stage.stage_type, &output)
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (stage, metrics) in variant.stages.iter_mut().zip(metrics) {
        stage.metrics = Some(metrics);
    }
    variant.metrics_computed = true;

    log::debug!(
        "computed metrics for {} stage(s) of variant [{}]",
        variant.stages.len(),
        variant.keywords_label()
    );

    Ok(true)
}
