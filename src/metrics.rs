use serde::{Deserialize, Serialize};

/// GPU execution pipeline to which instruction cycles are attributed
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Pipeline {
    Arithmetic,
    LoadStore,
    Varying,
    Texture,
}

impl Pipeline {
    /// Parse the column tag used by the plain-text report (`A`, `LS`, `V`, `T`).
    pub fn from_abbreviation(s: &str) -> Option<Pipeline> {
        match s {
            "A" => Some(Pipeline::Arithmetic),
            "LS" => Some(Pipeline::LoadStore),
            "V" => Some(Pipeline::Varying),
            "T" => Some(Pipeline::Texture),
            _ => None,
        }
    }

    /// Parse the identifier used by the JSON report (`arithmetic`, `load_store`, ...).
    pub fn from_identifier(s: &str) -> Option<Pipeline> {
        match s {
            "arithmetic" => Some(Pipeline::Arithmetic),
            "load_store" => Some(Pipeline::LoadStore),
            "varying" => Some(Pipeline::Varying),
            "texture" => Some(Pipeline::Texture),
            _ => None,
        }
    }
}

/// Per-pipeline cycle counts of one path through the shader.
///
/// `varying` is only reported for pixel shaders.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Cycles {
    pub arithmetic: f32,
    pub load_store: f32,
    pub varying: Option<f32>,
    pub texture: f32,

    /// Bottleneck pipeline for this path; `None` until a cycles row was read
    pub bound_pipeline: Option<Pipeline>,
}

/// Register usage and cycle counts of one section of a legacy report
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct VariantMetrics {
    pub work_registers: u32,
    pub uniform_registers: u32,
    pub stack_spilling: bool,

    /// Share of arithmetic done at 16-bit precision, 0-100
    pub arithmetic_16bit_percent: u32,

    pub total_cycles: Cycles,
    pub shortest_path_cycles: Cycles,
    pub longest_path_cycles: Cycles,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct VertexShaderMetrics {
    /// Only present for GPUs which don't split the vertex shader into position and varying parts
    pub main: Option<VariantMetrics>,
    pub position_variant: VariantMetrics,
    pub varying_variant: VariantMetrics,
    pub has_uniform_computation: bool,
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct PixelShaderMetrics {
    /// Copy of `variant` when the report labeled it with an explicit `Main shader` header
    pub main: Option<VariantMetrics>,
    pub variant: VariantMetrics,
    pub has_uniform_computation: bool,
    pub has_side_effects: bool,
    pub modifies_coverage: bool,
    pub uses_late_zs_test: bool,
    pub uses_late_zs_update: bool,
    pub reads_color_buffer: bool,
}
