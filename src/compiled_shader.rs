use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metrics::{PixelShaderMetrics, VertexShaderMetrics};
use crate::report::MaliocShader;

/// Result of parsing one compiled shader dump
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct CompiledShader {
    /// Shader identifier, if the caller knows it
    pub name: Option<String>,

    /// Variants in dump order
    pub variants: Vec<CompiledShaderVariant>,

    /// Set once a dump was parsed successfully; a default-constructed shader is not valid
    pub is_valid: bool,
}

impl CompiledShader {
    /// True if both shaders have the same number of variants, and each pair of
    /// variants at the same position has the same keywords in the same order.
    pub fn has_same_keywords(&self, other: &CompiledShader) -> bool {
        self.variants.len() == other.variants.len()
            && self
                .variants
                .iter()
                .zip(other.variants.iter())
                .all(|(a, b)| a.has_same_keywords(b))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct HardwareTier(pub u32);

impl fmt::Display for HardwareTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tier {}", self.0)
    }
}

/// One compiled permutation of a shader
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct CompiledShaderVariant {
    pub hardware_tier: HardwareTier,

    /// Keywords in the order the dump lists them
    pub keywords: Vec<String>,

    pub pass_name: Option<String>,
    pub light_mode: Option<String>,

    pub stages: Vec<CompilerShaderStage>,

    /// Set by the caller once metrics were attached to every stage
    pub metrics_computed: bool,
}

impl CompiledShaderVariant {
    /// Element-wise keyword comparison; `[A, B]` and `[B, A]` are different configurations.
    pub fn has_same_keywords(&self, other: &CompiledShaderVariant) -> bool {
        self.keywords == other.keywords
    }

    /// Keywords joined with spaces, or `<none>`
    pub fn keywords_label(&self) -> String {
        if self.keywords.is_empty() {
            "<none>".to_string()
        } else {
            self.keywords.join(" ")
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CompiledShaderStageType {
    Vertex,
    Pixel,
}

impl CompiledShaderStageType {
    /// Command line switch selecting this stage in the offline compiler
    pub fn compiler_flag(self) -> &'static str {
        match self {
            CompiledShaderStageType::Vertex => "-v",
            CompiledShaderStageType::Pixel => "-f",
        }
    }
}

/// Metrics attached to a stage by one of the report parsers
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum StageMetrics {
    Vertex(VertexShaderMetrics),
    Pixel(PixelShaderMetrics),
    Structured(MaliocShader),
}

/// One shading stage of a variant
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct CompilerShaderStage {
    pub stage_type: CompiledShaderStageType,

    /// Verbatim lines between the stage's `#ifdef` and its matching `#endif`
    pub source_lines: Vec<String>,

    pub metrics: Option<StageMetrics>,
}

impl CompilerShaderStage {
    /// Source text to hand over to the offline compiler
    pub fn compiler_source(&self) -> String {
        self.source_lines.join("\n")
    }
}
