//! Credential-aware masking for API keys and tokens.
//!
//! This crate separates:
//! - **Detection**: what kind of token this is. A register of well-known
//!   formats plus caller-registered prefixes, with a structural fallback
//!   heuristic for everything else.
//! - **Validation**: whether the input looks like a real token. An additive
//!   0–100 risk score over configurable rules and suspicious-content
//!   signatures.
//! - **Masking**: how much of it stays visible. Overlap-safe head/tail
//!   composition under a strict no-full-exposure invariant.
//!
//! Key rules:
//! - Masking fails closed. No head/tail configuration can expose a whole
//!   secret; misconfigured calls (an unknown preset name) are an error, never
//!   a silent fallback to weaker masking.
//! - Validation warns, it never blocks. The masked output is independent of
//!   whether a warning fired.
//! - Fixed-length mask bodies are the default, so output length does not
//!   track secret length.
//!
//! What this crate does:
//! - classifies inputs against known token formats ([`Masker::detect`])
//! - scores inputs for token-likeness ([`validate`])
//! - masks inputs for display ([`Masker::mask`], [`Masker::mask_detailed`])
//!
//! What it does not do:
//! - store, encrypt, or transmit secrets
//! - perform I/O beyond `tracing` diagnostics
//!
//! # Quick start
//!
//! ```rust
//! use tokenmask::{MaskOptions, Masker};
//!
//! let masker = Masker::new();
//! let masked = masker.mask("npm_a1b2c3d4e5f6g7h8i9j0", &MaskOptions::new())?;
//! assert_eq!(masked, "npm_••••••••i9j0");
//! # Ok::<(), tokenmask::MaskError>(())
//! ```

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::default_trait_access,
    clippy::doc_markdown,
    clippy::enum_glob_use,
    clippy::missing_const_for_fn,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::option_if_let_else,
    clippy::redundant_pub_crate,
    clippy::struct_excessive_bools
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

// Module declarations
mod error;
pub mod heuristics;
mod masking;
mod registry;
pub mod validation;

// Re-exports
pub use error::MaskError;
pub use heuristics::looks_like_token;
pub use masking::{
    compare_presets, preset_info, preset_names, recommended_preset, BoundMask, MaskLength,
    MaskMode, MaskOptions, MaskResult, Masker, PrefixPolicy, PresetInfo, SegmentOptions,
    WarningHook, DEFAULT_MASK_CHAR, DEFAULT_MASK_LENGTH, DEFAULT_SHOW_TAIL,
};
pub use registry::{
    category_counts, known_prefix_names, PrefixDefinition, PrefixPattern, PrefixRegistry,
    TokenCategory, TokenMetadata, KNOWN_PREFIXES, UNKNOWN_TOKEN_TYPE,
};
pub use validation::{
    is_likely_valid, summarize_batch, validate, validate_batch, BatchSummary, RiskLevel,
    ValidationResult, ValidationRules,
};
