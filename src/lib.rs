//! **malioc-report** turns the output of a shader compilation pipeline into a structured
//! model of shader performance characteristics.
//!
//! It understands two inputs:
//!
//! * A compiled shader dump: one flat text file listing every compiled permutation
//!   of a shader. [`parse_compiled_shader`] recovers the variants, their keywords and
//!   hardware tiers, and the source of each vertex and pixel stage.
//! * Reports of the Mali offline compiler for a single stage. The newer JSON report
//!   is handled by [`parse_report`]; the older plain-text report by
//!   [`parse_vertex_metrics`] and [`parse_pixel_metrics`] (`legacy_report` feature).
//!
//! This crate does not run the compiler. [`compute_variant_metrics`] drives a
//! user-supplied compiler callback and attaches the parsed metrics to each stage.
//!
//! All parsing is pure: the same input always yields the same result or the same error.
//!
//! # Example
//!
//! ```rust
//! let dump = std::fs::read_to_string("Compiled-Unlit.shader").unwrap_or_default();
//! let lines: Vec<&str> = dump.lines().collect();
//!
//! let shader = malioc_report::parse_compiled_shader(
//!     Some("Unlit"),
//!     &lines,
//!     &malioc_report::DumpParseOptions::default(),
//! )
//! .expect("malformed dump");
//!
//! for variant in &shader.variants {
//!     println!("{} [{}]: {} stage(s)", variant.hardware_tier, variant.keywords_label(), variant.stages.len());
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

mod compiled_shader;
mod compiler;
mod dump_parser;
mod dynamic_value;
mod error;
mod filter;
#[cfg(feature = "legacy_report")]
mod legacy_parser;
pub mod metrics;
mod report;
mod report_schema;

pub use compiled_shader::*;
pub use compiler::*;
pub use dump_parser::*;
pub use dynamic_value::*;
pub use error::*;
pub use filter::*;
#[cfg(feature = "legacy_report")]
#[cfg_attr(docsrs, doc(cfg(feature = "legacy_report")))]
pub use legacy_parser::*;
pub use report::*;
