//! Masking strategies and their configuration.
//!
//! This module ties the pieces together:
//!
//! - **`options`**: Configuration layer - caller options, presets, and the
//!   deterministic defaults → preset → overrides resolution
//! - **`engine`**: Application layer - the [`Masker`], its three strategies,
//!   and the overlap-safety invariant

mod engine;
mod options;

pub use engine::{BoundMask, MaskResult, Masker};
pub use options::{
    compare_presets, preset_info, preset_names, recommended_preset, MaskLength, MaskMode,
    MaskOptions, PrefixPolicy, PresetInfo, SegmentOptions, WarningHook, DEFAULT_MASK_CHAR,
    DEFAULT_MASK_LENGTH, DEFAULT_SHOW_TAIL,
};
