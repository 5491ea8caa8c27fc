//! Recovers variants and stage sources from a flat compiled shader dump.
//!
//! The dump lists each compiled permutation after a delimiter line of 54 slashes,
//! immediately followed by a `Keywords:` line. Stage sources are wrapped in
//! `#ifdef VERTEX` / `#ifdef FRAGMENT` blocks, which are matched up with their `#endif`
//! by counting nested conditionals rather than by evaluating them.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    CompiledShader, CompiledShaderStageType, CompiledShaderVariant, CompilerShaderStage,
    HardwareTier, ReportError,
};

const VARIANT_DELIMITER: &str = "//////////////////////////////////////////////////////";

lazy_static! {
    static ref KEYWORDS_RE: Regex = Regex::new(r"^Keywords: (<none>|.+)$").unwrap();
    static ref HARDWARE_TIER_RE: Regex =
        Regex::new(r"^-- Hardware tier variant: Tier ([0-9]+)$").unwrap();
    static ref STAGE_IFDEF_RE: Regex = Regex::new(r"^#ifdef ([A-Z]+)$").unwrap();
    static ref IF_RE: Regex = Regex::new(r"^\s*#if").unwrap();
    static ref ENDIF_RE: Regex = Regex::new(r"^\s*#endif").unwrap();
    static ref ES_VERSION_RE: Regex = Regex::new(r"^#version ([0-9]+) es$").unwrap();
}

/// Newest GLSL ES version the offline compiler refuses
const MAX_OUTDATED_ES_VERSION: u32 = 300;

/// Lowest GLSL ES version accepted by the offline compiler
const MIN_ES_VERSION: u32 = 310;

#[derive(Clone, Debug)]
pub struct DumpParseOptions {
    /// Rewrite `#version N es` with `N <= 300` inside stage sources to `#version 310 es`
    pub upgrade_es_version: bool,
}

impl Default for DumpParseOptions {
    fn default() -> Self {
        Self {
            upgrade_es_version: true,
        }
    }
}

/// Line range of one variant in the dump, along with its keywords
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VariantSpan {
    /// From the variant's delimiter line up to the next variant's delimiter, or the end of input
    pub lines: Range<usize>,
    pub keywords: Vec<String>,
}

/// Partition the dump into per-variant line ranges.
///
/// Lines before the first delimiter don't belong to any variant.
pub fn split_variants<S: AsRef<str>>(lines: &[S]) -> Vec<VariantSpan> {
    let mut starts: Vec<(usize, Vec<String>)> = Vec::new();

    for (index, pair) in lines.windows(2).enumerate() {
        if pair[0].as_ref() != VARIANT_DELIMITER {
            continue;
        }

        if let Some(captures) = KEYWORDS_RE.captures(pair[1].as_ref()) {
            let keywords = match &captures[1] {
                "<none>" => Vec::new(),
                list => list.split(' ').map(str::to_owned).collect(),
            };
            starts.push((index, keywords));
        }
    }

    let ends: Vec<usize> = starts
        .iter()
        .skip(1)
        .map(|(start, _)| *start)
        .chain(std::iter::once(lines.len()))
        .collect();

    starts
        .into_iter()
        .zip(ends)
        .map(|((start, keywords), end)| VariantSpan {
            lines: start..end,
            keywords,
        })
        .collect()
}

/// Parse the hardware tier and stage sources of one variant.
pub fn parse_variant<S: AsRef<str>>(
    lines: &[S],
    span: &VariantSpan,
    options: &DumpParseOptions,
) -> Result<CompiledShaderVariant, ReportError> {
    let mut hardware_tier = None;
    let mut stages = Vec::new();

    for line_index in span.lines.clone() {
        let line = lines[line_index].as_ref();

        if let Some(captures) = STAGE_IFDEF_RE.captures(line) {
            let stage_type = match &captures[1] {
                "VERTEX" => CompiledShaderStageType::Vertex,
                "FRAGMENT" => CompiledShaderStageType::Pixel,
                name => {
                    return Err(ReportError::UnrecognizedStage {
                        name: name.to_owned(),
                        line: line_index + 1,
                    })
                }
            };

            let source_lines = extract_stage_source(lines, line_index, span.lines.end, options)?;
            stages.push(CompilerShaderStage {
                stage_type,
                source_lines,
                metrics: None,
            });
        } else if let Some(captures) = HARDWARE_TIER_RE.captures(line) {
            let tier = captures[1]
                .parse::<u32>()
                .map_err(|_| ReportError::InvalidHardwareTier {
                    line: line_index + 1,
                    token: captures[1].to_owned(),
                })?;
            hardware_tier = Some(HardwareTier(tier));
        }
    }

    let hardware_tier = hardware_tier.ok_or(ReportError::MissingHardwareTier {
        line: span.lines.start + 1,
    })?;

    log::debug!(
        "variant at line {}: {}, {} stage(s)",
        span.lines.start + 1,
        hardware_tier,
        stages.len()
    );

    Ok(CompiledShaderVariant {
        hardware_tier,
        keywords: span.keywords.clone(),
        pass_name: None,
        light_mode: None,
        stages,
        metrics_computed: false,
    })
}

/// Collect the lines strictly between the `#ifdef` at `ifdef_index` and its matching `#endif`.
fn extract_stage_source<S: AsRef<str>>(
    lines: &[S],
    ifdef_index: usize,
    end: usize,
    options: &DumpParseOptions,
) -> Result<Vec<String>, ReportError> {
    // The stage's own `#ifdef` is already open.
    let mut nesting = 1;
    let body_start = ifdef_index + 1;

    for line_index in body_start..end {
        let line = lines[line_index].as_ref();

        if IF_RE.is_match(line) {
            nesting += 1;
        } else if ENDIF_RE.is_match(line) {
            nesting -= 1;
        }

        if nesting == 0 {
            return Ok(lines[body_start..line_index]
                .iter()
                .map(|line| {
                    let line = line.as_ref();
                    if options.upgrade_es_version {
                        upgrade_es_version(line)
                    } else {
                        line.to_owned()
                    }
                })
                .collect());
        }
    }

    Err(ReportError::UnterminatedConditional {
        line: ifdef_index + 1,
    })
}

fn upgrade_es_version(line: &str) -> String {
    if let Some(captures) = ES_VERSION_RE.captures(line) {
        // Overflowing versions are certainly not too old.
        let too_old = captures[1]
            .parse::<u32>()
            .map_or(false, |version| version <= MAX_OUTDATED_ES_VERSION);

        if too_old {
            return format!("#version {} es", MIN_ES_VERSION);
        }
    }

    line.to_owned()
}

/// Parse a whole compiled shader dump into its variants.
///
/// Any malformed variant fails the whole parse.
pub fn parse_compiled_shader<S: AsRef<str>>(
    name: Option<&str>,
    lines: &[S],
    options: &DumpParseOptions,
) -> Result<CompiledShader, ReportError> {
    let spans = split_variants(lines);
    log::debug!("found {} variant(s) in {} line(s)", spans.len(), lines.len());

    let variants = spans
        .iter()
        .map(|span| parse_variant(lines, span, options))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompiledShader {
        name: name.map(str::to_owned),
        variants,
        is_valid: true,
    })
}
