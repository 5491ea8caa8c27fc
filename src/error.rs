use crate::CompiledShaderStageType;

pub type BoxedCompilerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A variant section without a `-- Hardware tier variant: Tier N` line
    #[error("variant starting at line {line:?} has no hardware tier")]
    MissingHardwareTier {
        /// Line of the variant's delimiter
        line: usize,
    },

    /// Tier number which doesn't fit the tier ordinal
    #[error("invalid hardware tier {token:?} at line {line:?}")]
    InvalidHardwareTier { line: usize, token: String },

    /// `#ifdef` of something other than `VERTEX` or `FRAGMENT`
    #[error("found an invalid stage name {name:?} at line {line:?}")]
    UnrecognizedStage { name: String, line: usize },

    /// Stage block whose `#ifdef` never got its matching `#endif`
    #[error("could not find #endif for #ifdef at line {line:?}")]
    UnterminatedConditional {
        /// Line of the opening `#ifdef`
        line: usize,
    },

    /// Numeric column of a legacy report which doesn't parse
    #[error("invalid number {token:?} at line {line:?}")]
    InvalidNumber { line: usize, token: String },

    #[error("unrecognized cycle label {label:?} at line {line:?}")]
    UnknownCycleLabel { line: usize, label: String },

    #[error("unknown bound pipeline {token:?} at line {line:?}")]
    UnknownBoundPipeline { line: usize, token: String },

    /// Pipeline string in a JSON report outside the known set
    #[error("unknown pipeline identifier {identifier:?}")]
    UnknownPipeline { identifier: String },

    /// A JSON report must describe exactly one shader
    #[error("expected exactly one shader in the report, found {found}")]
    ShaderCount { found: usize },

    /// Cycle list whose length differs from the variant's pipeline list
    #[error("variant {variant:?} lists {pipelines} pipelines but {cycles} cycle counts")]
    CycleCountMismatch {
        variant: String,
        pipelines: usize,
        cycles: usize,
    },

    #[error("unsupported scalar kind: {kind}")]
    UnsupportedScalar { kind: &'static str },

    #[error("malformed report JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// Any error reported by the user-supplied compiler callback
    #[error("compiler error: \"{cause:?}\" when compiling {stage:?} stage")]
    CompilerError {
        stage: CompiledShaderStageType,
        cause: BoxedCompilerError,
    },

    /// Legacy text output handed over while the `legacy_report` feature is off
    #[error("legacy text reports are not supported in this build")]
    LegacyReportUnsupported,
}
