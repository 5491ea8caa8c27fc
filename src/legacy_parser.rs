//! Parsing of the offline compiler's plain-text performance report.
//!
//! The report is a sequence of sections introduced by header lines (`Position variant`,
//! `Varying variant`, `Main shader`, `Shader properties`). Within a section, every
//! line is matched against a fixed set of `Label: value` patterns; anything else is
//! report chatter and gets skipped.
//!
//! Vertex reports list three cycle columns (arithmetic, load/store, texture), pixel
//! reports add a varying column between load/store and texture.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::metrics::{
    Cycles, PixelShaderMetrics, Pipeline, VariantMetrics, VertexShaderMetrics,
};
use crate::ReportError;

lazy_static! {
    static ref WORK_REGISTERS_RE: Regex = Regex::new(r"^Work registers: ([0-9]+)$").unwrap();
    static ref UNIFORM_REGISTERS_RE: Regex =
        Regex::new(r"^Uniform registers: ([0-9]+)$").unwrap();
    static ref STACK_SPILLING_RE: Regex =
        Regex::new(r"^Stack spilling registers: (false|true)$").unwrap();
    static ref ARITHMETIC_16BIT_RE: Regex = Regex::new(r"^16-bit arithmetic: ([0-9]+)%$").unwrap();
    static ref VERTEX_CYCLES_RE: Regex = Regex::new(
        r"^(?P<label>.*) cycles:\s+(?P<a>[0-9]+\.[0-9]+)\s+(?P<ls>[0-9]+\.[0-9]+)\s+(?P<t>[0-9]+\.[0-9]+)\s+(?P<bound>[A-Z]+)$"
    )
    .unwrap();
    static ref PIXEL_CYCLES_RE: Regex = Regex::new(
        r"^(?P<label>.*) cycles:\s+(?P<a>[0-9]+\.[0-9]+)\s+(?P<ls>[0-9]+\.[0-9]+)\s+(?P<v>[0-9]+\.[0-9]+)\s+(?P<t>[0-9]+\.[0-9]+)\s+(?P<bound>[A-Z]+)$"
    )
    .unwrap();
    static ref HAS_UNIFORM_COMPUTATION_RE: Regex =
        Regex::new(r"^Has uniform computation: (false|true)$").unwrap();
    static ref HAS_SIDE_EFFECTS_RE: Regex =
        Regex::new(r"^Has side-effects: (false|true)$").unwrap();
    static ref MODIFIES_COVERAGE_RE: Regex =
        Regex::new(r"^Modifies coverage: (false|true)$").unwrap();
    static ref USES_LATE_ZS_TEST_RE: Regex =
        Regex::new(r"^Uses late ZS test: (false|true)$").unwrap();
    static ref USES_LATE_ZS_UPDATE_RE: Regex =
        Regex::new(r"^Uses late ZS update: (false|true)$").unwrap();
    static ref READS_COLOR_BUFFER_RE: Regex =
        Regex::new(r"^Reads color buffer: (false|true)$").unwrap();
}

const PIXEL_PROPERTY_COUNT: usize = 6;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum VertexSection {
    None,
    Main,
    PositionVariant,
    VaryingVariant,
    ShaderProperties,
}

impl VertexSection {
    /// Section entered by `line`, or the current one if it isn't a header.
    fn next(self, line: &str) -> VertexSection {
        match line {
            "Main shader" => VertexSection::Main,
            "Position variant" => VertexSection::PositionVariant,
            "Varying variant" => VertexSection::VaryingVariant,
            "Shader properties" => VertexSection::ShaderProperties,
            _ => self,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CycleColumns {
    /// Arithmetic, load/store, texture
    Vertex,
    /// Arithmetic, load/store, varying, texture
    Pixel,
}

/// Parse the plain-text report of a vertex shader.
pub fn parse_vertex_metrics<S: AsRef<str>>(
    lines: &[S],
) -> Result<VertexShaderMetrics, ReportError> {
    let mut metrics = VertexShaderMetrics::default();
    let mut section = VertexSection::None;

    for (line_index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let line_number = line_index + 1;
        section = section.next(line);

        match section {
            VertexSection::None => (),
            VertexSection::Main => {
                let variant = metrics.main.get_or_insert_with(VariantMetrics::default);
                update_variant(variant, line, line_number, CycleColumns::Vertex)?;
            }
            VertexSection::PositionVariant => update_variant(
                &mut metrics.position_variant,
                line,
                line_number,
                CycleColumns::Vertex,
            )?,
            VertexSection::VaryingVariant => update_variant(
                &mut metrics.varying_variant,
                line,
                line_number,
                CycleColumns::Vertex,
            )?,
            VertexSection::ShaderProperties => {
                if let Some(value) = match_bool(&HAS_UNIFORM_COMPUTATION_RE, line) {
                    metrics.has_uniform_computation = value;
                }
            }
        }
    }

    Ok(metrics)
}

/// Parse the plain-text report of a pixel shader.
///
/// The properties block is the last section of a pixel report; scanning stops at its end.
pub fn parse_pixel_metrics<S: AsRef<str>>(
    lines: &[S],
) -> Result<PixelShaderMetrics, ReportError> {
    let mut metrics = PixelShaderMetrics::default();
    let mut explicit_main = false;
    let mut in_properties = false;
    let mut properties_read = 0;

    for (line_index, line) in lines.iter().enumerate() {
        let line = line.as_ref();

        if in_properties {
            if line.trim().is_empty() {
                if properties_read > 0 {
                    break;
                }
                continue;
            }

            if update_pixel_property(&mut metrics, line) {
                properties_read += 1;
                if properties_read == PIXEL_PROPERTY_COUNT {
                    break;
                }
            } else {
                log::trace!("skipping report line {}: {:?}", line_index + 1, line);
            }
            continue;
        }

        match line {
            "Shader properties" => in_properties = true,
            "Main shader" => explicit_main = true,
            _ => update_variant(
                &mut metrics.variant,
                line,
                line_index + 1,
                CycleColumns::Pixel,
            )?,
        }
    }

    if explicit_main {
        metrics.main = Some(metrics.variant.clone());
    }

    Ok(metrics)
}

fn update_pixel_property(metrics: &mut PixelShaderMetrics, line: &str) -> bool {
    let fields: [(&Regex, &mut bool); PIXEL_PROPERTY_COUNT] = [
        (&*HAS_UNIFORM_COMPUTATION_RE, &mut metrics.has_uniform_computation),
        (&*HAS_SIDE_EFFECTS_RE, &mut metrics.has_side_effects),
        (&*MODIFIES_COVERAGE_RE, &mut metrics.modifies_coverage),
        (&*USES_LATE_ZS_TEST_RE, &mut metrics.uses_late_zs_test),
        (&*USES_LATE_ZS_UPDATE_RE, &mut metrics.uses_late_zs_update),
        (&*READS_COLOR_BUFFER_RE, &mut metrics.reads_color_buffer),
    ];

    for (re, field) in fields {
        if let Some(value) = match_bool(re, line) {
            *field = value;
            return true;
        }
    }

    false
}

/// Apply one line of a variant section. Returns `Ok` for lines which match no pattern.
fn update_variant(
    variant: &mut VariantMetrics,
    line: &str,
    line_number: usize,
    columns: CycleColumns,
) -> Result<(), ReportError> {
    if let Some(value) = match_u32(&WORK_REGISTERS_RE, line, line_number)? {
        variant.work_registers = value;
    } else if let Some(value) = match_u32(&UNIFORM_REGISTERS_RE, line, line_number)? {
        variant.uniform_registers = value;
    } else if let Some(value) = match_bool(&STACK_SPILLING_RE, line) {
        variant.stack_spilling = value;
    } else if let Some(value) = match_u32(&ARITHMETIC_16BIT_RE, line, line_number)? {
        variant.arithmetic_16bit_percent = value;
    } else if let Some((label, cycles)) = match_cycles(line, line_number, columns)? {
        let slot = match label {
            "Total instruction" => &mut variant.total_cycles,
            "Shortest path" => &mut variant.shortest_path_cycles,
            "Longest path" => &mut variant.longest_path_cycles,
            _ => {
                return Err(ReportError::UnknownCycleLabel {
                    line: line_number,
                    label: label.to_owned(),
                })
            }
        };
        *slot = cycles;
    } else {
        log::trace!("skipping report line {}: {:?}", line_number, line);
    }

    Ok(())
}

fn match_cycles(
    line: &str,
    line_number: usize,
    columns: CycleColumns,
) -> Result<Option<(&str, Cycles)>, ReportError> {
    let re: &Regex = match columns {
        CycleColumns::Vertex => &*VERTEX_CYCLES_RE,
        CycleColumns::Pixel => &*PIXEL_CYCLES_RE,
    };

    let captures = match re.captures(line) {
        Some(captures) => captures,
        None => return Ok(None),
    };

    let bound = &captures["bound"];
    let bound_pipeline =
        Pipeline::from_abbreviation(bound).ok_or_else(|| ReportError::UnknownBoundPipeline {
            line: line_number,
            token: bound.to_owned(),
        })?;

    let varying = match columns {
        CycleColumns::Vertex => None,
        CycleColumns::Pixel => Some(parse_f32(&captures, "v", line_number)?),
    };

    let cycles = Cycles {
        arithmetic: parse_f32(&captures, "a", line_number)?,
        load_store: parse_f32(&captures, "ls", line_number)?,
        varying,
        texture: parse_f32(&captures, "t", line_number)?,
        bound_pipeline: Some(bound_pipeline),
    };

    // `label` borrows from `line`, not from the captures.
    let label = captures.name("label").map_or("", |m| m.as_str());
    Ok(Some((label, cycles)))
}

fn parse_f32(captures: &Captures, group: &str, line_number: usize) -> Result<f32, ReportError> {
    // Rust's float parsing doesn't depend on the locale.
    captures[group]
        .parse::<f32>()
        .map_err(|_| ReportError::InvalidNumber {
            line: line_number,
            token: captures[group].to_owned(),
        })
}

fn match_u32(re: &Regex, line: &str, line_number: usize) -> Result<Option<u32>, ReportError> {
    match re.captures(line) {
        Some(captures) => captures[1]
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ReportError::InvalidNumber {
                line: line_number,
                token: captures[1].to_owned(),
            }),
        None => Ok(None),
    }
}

fn match_bool(re: &Regex, line: &str) -> Option<bool> {
    re.captures(line).and_then(|captures| match &captures[1] {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX_REPORT: &str = "\
Mali Offline Compiler v7.4.0 (Build 330167)
Copyright 2007-2021 Arm Limited, all rights reserved

Configuration
=============

Hardware: Mali-G76 r0p0
Driver: Bifrost r19p0-00rel0
Shader type: OpenGL ES Vertex

Position variant
----------------

Work registers: 32
Uniform registers: 22
Stack spilling registers: false
16-bit arithmetic: 0%

                                A      LS       T    Bound
Total instruction cycles:    2.67    7.00    0.00       LS
Shortest path cycles:        2.67    7.00    0.00       LS
Longest path cycles:         2.67    7.00    0.00       LS

Varying variant
---------------

Work registers: 16
Uniform registers: 12
Stack spilling registers: true
16-bit arithmetic: 25%

                                A      LS       T    Bound
Total instruction cycles:    1.00    4.00    0.00       LS
Shortest path cycles:        0.50    4.00    0.00       LS
Longest path cycles:        11.25    4.00    1.00        A

Shader properties
=================

Uniform data
Has uniform computation: true
";

    const PIXEL_REPORT: &str = "\
Mali Offline Compiler v7.4.0 (Build 330167)

Main shader
===========

Work registers: 20
Uniform registers: 2
Stack spilling registers: false
16-bit arithmetic: 50%

                                A      LS       V       T    Bound
Total instruction cycles:    1.00    2.00    3.00    4.00        T
Shortest path cycles:        0.25    0.00    3.00    1.00        V
Longest path cycles:         1.00    2.00    3.00    4.00        T

Shader properties
=================

Has uniform computation: false
Has side-effects: true
Modifies coverage: false
Uses late ZS test: true
Uses late ZS update: false
Reads color buffer: true

Has side-effects: false
Work registers: 64
";

    fn lines(s: &str) -> Vec<&str> {
        s.lines().collect()
    }

    #[test]
    fn vertex_report() {
        let metrics = parse_vertex_metrics(&lines(VERTEX_REPORT)).unwrap();

        assert_eq!(metrics.main, None);
        assert_eq!(metrics.position_variant.work_registers, 32);
        assert_eq!(metrics.position_variant.uniform_registers, 22);
        assert!(!metrics.position_variant.stack_spilling);
        assert_eq!(metrics.position_variant.arithmetic_16bit_percent, 0);
        assert_eq!(
            metrics.position_variant.total_cycles,
            Cycles {
                arithmetic: 2.67,
                load_store: 7.0,
                varying: None,
                texture: 0.0,
                bound_pipeline: Some(Pipeline::LoadStore),
            }
        );

        assert_eq!(metrics.varying_variant.work_registers, 16);
        assert!(metrics.varying_variant.stack_spilling);
        assert_eq!(metrics.varying_variant.arithmetic_16bit_percent, 25);
        assert_eq!(metrics.varying_variant.shortest_path_cycles.arithmetic, 0.5);
        assert_eq!(metrics.varying_variant.longest_path_cycles.arithmetic, 11.25);
        assert_eq!(
            metrics.varying_variant.longest_path_cycles.bound_pipeline,
            Some(Pipeline::Arithmetic)
        );

        assert!(metrics.has_uniform_computation);
    }

    #[test]
    fn vertex_main_shader() {
        let report = "Main shader\nWork registers: 8\nTotal instruction cycles: 1.00 2.00 4.00 A";
        let metrics = parse_vertex_metrics(&lines(report)).unwrap();
        let main = metrics.main.unwrap();

        assert_eq!(main.work_registers, 8);
        assert_eq!(
            main.total_cycles,
            Cycles {
                arithmetic: 1.0,
                load_store: 2.0,
                varying: None,
                texture: 4.0,
                bound_pipeline: Some(Pipeline::Arithmetic),
            }
        );
        assert_eq!(metrics.position_variant, VariantMetrics::default());
    }

    #[test]
    fn lines_before_first_section_ignored() {
        let report = "Work registers: 8\nPosition variant\nUniform registers: 3";
        let metrics = parse_vertex_metrics(&lines(report)).unwrap();

        assert_eq!(metrics.position_variant.work_registers, 0);
        assert_eq!(metrics.position_variant.uniform_registers, 3);
    }

    #[test]
    fn pixel_report() {
        let metrics = parse_pixel_metrics(&lines(PIXEL_REPORT)).unwrap();

        assert_eq!(metrics.main.as_ref(), Some(&metrics.variant));
        assert_eq!(metrics.variant.work_registers, 20);
        assert_eq!(metrics.variant.uniform_registers, 2);
        assert_eq!(metrics.variant.arithmetic_16bit_percent, 50);
        assert_eq!(
            metrics.variant.total_cycles,
            Cycles {
                arithmetic: 1.0,
                load_store: 2.0,
                varying: Some(3.0),
                texture: 4.0,
                bound_pipeline: Some(Pipeline::Texture),
            }
        );
        assert_eq!(
            metrics.variant.shortest_path_cycles.bound_pipeline,
            Some(Pipeline::Varying)
        );

        assert!(!metrics.has_uniform_computation);
        assert!(metrics.has_side_effects);
        assert!(!metrics.modifies_coverage);
        assert!(metrics.uses_late_zs_test);
        assert!(!metrics.uses_late_zs_update);
        assert!(metrics.reads_color_buffer);
    }

    #[test]
    fn pixel_stops_after_properties_block() {
        let report = "Shader properties\n\nHas side-effects: true\n\nHas side-effects: false\nWork registers: 64";
        let metrics = parse_pixel_metrics(&lines(report)).unwrap();

        assert!(metrics.has_side_effects);
        assert_eq!(metrics.variant.work_registers, 0);
        assert_eq!(metrics.main, None);
    }

    #[test]
    fn five_column_row() {
        let row = ["Total instruction cycles: 1.00 2.00 3.00 4.00 A"];

        let pixel = parse_pixel_metrics(&row).unwrap();
        assert_eq!(
            pixel.variant.total_cycles,
            Cycles {
                arithmetic: 1.0,
                load_store: 2.0,
                varying: Some(3.0),
                texture: 4.0,
                bound_pipeline: Some(Pipeline::Arithmetic),
            }
        );

        // Too many columns for a vertex report; skipped as chatter.
        let vertex = parse_vertex_metrics(&["Position variant", row[0]]).unwrap();
        assert_eq!(vertex.position_variant.total_cycles, Cycles::default());
    }

    #[test]
    fn unknown_cycle_label() {
        match parse_pixel_metrics(&["", "Average cycles: 1.00 2.00 3.00 4.00 A"]) {
            Err(ReportError::UnknownCycleLabel { line: 2, label }) if label == "Average" => (),
            val @ _ => panic!("{:?}", val),
        }
    }

    #[test]
    fn unknown_bound_pipeline() {
        match parse_vertex_metrics(&["Varying variant", "Longest path cycles: 1.00 2.00 4.00 X"]) {
            Err(ReportError::UnknownBoundPipeline { line: 2, token }) if token == "X" => (),
            val @ _ => panic!("{:?}", val),
        }
    }

    #[test]
    fn register_overflow() {
        match parse_vertex_metrics(&["Position variant", "Work registers: 99999999999"]) {
            Err(ReportError::InvalidNumber { line: 2, .. }) => (),
            val @ _ => panic!("{:?}", val),
        }
    }

    #[test]
    fn chatter_ignored() {
        let report = [
            "Position variant",
            "",
            "Work registers: many",
            "Stack spilling registers: maybe",
            "                                A      LS       T    Bound",
        ];
        assert_eq!(
            parse_vertex_metrics(&report).unwrap(),
            VertexShaderMetrics::default()
        );
    }
}
