//! Masking configuration: caller options, presets, and layered resolution.
//!
//! Options resolve deterministically in three layers: built-in defaults,
//! then the selected preset, then explicit caller overrides, field by field.
//! The result is an immutable [`ResolvedOptions`] value produced before any
//! masking logic runs, so strategies never see a partially-specified
//! configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::MaskError;
use crate::heuristics::MIN_TOKEN_LENGTH;
use crate::validation::{validate, RiskLevel, ValidationResult, ValidationRules};

/// Default number of mask characters in a fixed-length body.
pub const DEFAULT_MASK_LENGTH: usize = 8;

/// Default masking character.
pub const DEFAULT_MASK_CHAR: char = '•';

/// Default number of trailing characters kept visible.
pub const DEFAULT_SHOW_TAIL: usize = 4;

/// Hook invoked with the validation result when `warn_if_plain` finds
/// problems, replacing the default `tracing` diagnostic.
pub type WarningHook = Arc<dyn Fn(&ValidationResult) + Send + Sync>;

/// Length policy for the masked body.
///
/// Fixed-length bodies hide how long the secret is. `Variable` sizes the
/// body to the hidden span, which reveals the approximate secret length;
/// it is the less secure option and is never a default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MaskLength {
    /// Constant body width, floored at one mask character.
    Fixed(usize),
    /// Body width tracks the number of hidden characters.
    Variable,
}

impl Default for MaskLength {
    fn default() -> Self {
        Self::Fixed(DEFAULT_MASK_LENGTH)
    }
}

/// Whether a detected prefix stays visible in the output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PrefixPolicy {
    /// Keep any detected prefix in clear.
    #[default]
    Always,
    /// Mask the prefix along with the rest of the secret.
    Never,
    /// Keep only prefixes named in the list.
    AllowList(Vec<String>),
}

impl PrefixPolicy {
    /// True when `prefix` should stay visible under this policy.
    pub(crate) fn keeps(&self, prefix: &str) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::AllowList(allowed) => allowed.iter().any(|entry| entry == prefix),
        }
    }
}

/// Strategy selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaskMode {
    /// Resolve to the standard strategy.
    #[default]
    Auto,
    /// Head/tail masking with the overlap-safety invariant.
    Standard,
    /// Alias of the standard strategy for API-key call sites.
    ApiKey,
    /// Per-segment masking for three-part delimited tokens.
    Jwt,
    /// Per-segment masking for arbitrary delimited formats.
    Custom,
}

/// Delimiter-split configuration for the segment strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Character the input is split on.
    pub delimiter: char,
    /// Characters kept visible per segment.
    pub visible: usize,
}

impl SegmentOptions {
    /// Creates a segment configuration.
    #[must_use]
    pub fn new(delimiter: char, visible: usize) -> Self {
        Self { delimiter, visible }
    }
}

/// Caller-supplied masking options.
///
/// Every field is optional; unset fields fall back to the preset (when one
/// is selected) and then to the defaults. Constructed with [`MaskOptions::new`]
/// and the builder methods.
#[derive(Clone, Default)]
pub struct MaskOptions {
    pub(crate) preset: Option<String>,
    pub(crate) mask_length: Option<MaskLength>,
    pub(crate) show_head: Option<usize>,
    pub(crate) show_tail: Option<usize>,
    pub(crate) mask_char: Option<char>,
    pub(crate) preserve_prefix: Option<PrefixPolicy>,
    pub(crate) custom_prefixes: Option<BTreeMap<String, String>>,
    pub(crate) warn_if_plain: Option<bool>,
    pub(crate) validators: Option<ValidationRules>,
    pub(crate) on_warning: Option<WarningHook>,
    pub(crate) mode: Option<MaskMode>,
    pub(crate) segments: Option<SegmentOptions>,
}

impl MaskOptions {
    /// Creates an empty option set (everything defaulted).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a named preset as the base layer.
    #[must_use]
    pub fn preset(mut self, name: impl Into<String>) -> Self {
        self.preset = Some(name.into());
        self
    }

    /// Sets the mask-body length policy.
    #[must_use]
    pub fn mask_length(mut self, length: MaskLength) -> Self {
        self.mask_length = Some(length);
        self
    }

    /// Number of leading secret characters kept visible.
    #[must_use]
    pub fn show_head(mut self, count: usize) -> Self {
        self.show_head = Some(count);
        self
    }

    /// Number of trailing secret characters kept visible.
    #[must_use]
    pub fn show_tail(mut self, count: usize) -> Self {
        self.show_tail = Some(count);
        self
    }

    /// Uses a specific masking character.
    #[must_use]
    pub fn mask_char(mut self, mask_char: char) -> Self {
        self.mask_char = Some(mask_char);
        self
    }

    /// Controls whether detected prefixes stay visible.
    #[must_use]
    pub fn preserve_prefix(mut self, policy: PrefixPolicy) -> Self {
        self.preserve_prefix = Some(policy);
        self
    }

    /// Adds a prefix consulted ahead of the registry for this call only.
    #[must_use]
    pub fn custom_prefix(mut self, prefix: impl Into<String>, label: impl Into<String>) -> Self {
        self.custom_prefixes
            .get_or_insert_with(BTreeMap::new)
            .insert(prefix.into(), label.into());
        self
    }

    /// Runs the risk validator against the input before masking.
    #[must_use]
    pub fn warn_if_plain(mut self, enabled: bool) -> Self {
        self.warn_if_plain = Some(enabled);
        self
    }

    /// Rules for the `warn_if_plain` validation pass.
    #[must_use]
    pub fn validators(mut self, rules: ValidationRules) -> Self {
        self.validators = Some(rules);
        self
    }

    /// Receives the validation result instead of the default diagnostic.
    #[must_use]
    pub fn on_warning(mut self, hook: impl Fn(&ValidationResult) + Send + Sync + 'static) -> Self {
        self.on_warning = Some(Arc::new(hook));
        self
    }

    /// Selects the masking strategy.
    #[must_use]
    pub fn mode(mut self, mode: MaskMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Configures the delimiter and per-segment visibility for the segment
    /// strategies.
    #[must_use]
    pub fn segments(mut self, delimiter: char, visible: usize) -> Self {
        self.segments = Some(SegmentOptions::new(delimiter, visible));
        self
    }
}

impl fmt::Debug for MaskOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskOptions")
            .field("preset", &self.preset)
            .field("mask_length", &self.mask_length)
            .field("show_head", &self.show_head)
            .field("show_tail", &self.show_tail)
            .field("mask_char", &self.mask_char)
            .field("preserve_prefix", &self.preserve_prefix)
            .field("custom_prefixes", &self.custom_prefixes)
            .field("warn_if_plain", &self.warn_if_plain)
            .field("validators", &self.validators)
            .field("on_warning", &self.on_warning.as_ref().map(|_| "<hook>"))
            .field("mode", &self.mode)
            .field("segments", &self.segments)
            .finish()
    }
}

/// Names of the built-in presets.
const PRESET_NAMES: &[&str] = &["strict", "balanced", "lenient", "ui"];

/// Option layer for a named preset, or `None` for an unknown name.
fn preset_layer(name: &str) -> Option<MaskOptions> {
    let layer = match name {
        "strict" => MaskOptions::new()
            .mask_length(MaskLength::Fixed(12))
            .show_head(0)
            .show_tail(4)
            .warn_if_plain(true)
            .validators(
                ValidationRules::new()
                    .min_length(MIN_TOKEN_LENGTH)
                    .no_spaces(true),
            ),
        "balanced" => MaskOptions::new()
            .mask_length(MaskLength::Fixed(DEFAULT_MASK_LENGTH))
            .show_head(0)
            .show_tail(4),
        // Reveals the approximate secret length; opt-in only.
        "lenient" => MaskOptions::new()
            .mask_length(MaskLength::Variable)
            .show_head(2)
            .show_tail(4),
        "ui" => MaskOptions::new()
            .mask_length(MaskLength::Fixed(6))
            .show_head(0)
            .show_tail(4),
        _ => return None,
    };
    Some(layer)
}

/// Fully-populated immutable configuration, produced once per call.
#[derive(Clone)]
pub(crate) struct ResolvedOptions {
    pub(crate) mask_length: MaskLength,
    pub(crate) show_head: usize,
    pub(crate) show_tail: usize,
    pub(crate) mask_char: char,
    pub(crate) preserve_prefix: PrefixPolicy,
    pub(crate) custom_prefixes: BTreeMap<String, String>,
    pub(crate) warn_if_plain: bool,
    pub(crate) validators: ValidationRules,
    pub(crate) on_warning: Option<WarningHook>,
    pub(crate) mode: MaskMode,
    segments: Option<SegmentOptions>,
}

impl std::fmt::Debug for ResolvedOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedOptions")
            .field("mask_length", &self.mask_length)
            .field("show_head", &self.show_head)
            .field("show_tail", &self.show_tail)
            .field("mask_char", &self.mask_char)
            .field("preserve_prefix", &self.preserve_prefix)
            .field("custom_prefixes", &self.custom_prefixes)
            .field("warn_if_plain", &self.warn_if_plain)
            .field("validators", &self.validators)
            .field("on_warning", &self.on_warning.as_ref().map(|_| "<fn>"))
            .field("mode", &self.mode)
            .field("segments", &self.segments)
            .finish()
    }
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            mask_length: MaskLength::default(),
            show_head: 0,
            show_tail: DEFAULT_SHOW_TAIL,
            mask_char: DEFAULT_MASK_CHAR,
            preserve_prefix: PrefixPolicy::Always,
            custom_prefixes: BTreeMap::new(),
            warn_if_plain: false,
            validators: ValidationRules::default(),
            on_warning: None,
            mode: MaskMode::Auto,
            segments: None,
        }
    }
}

impl ResolvedOptions {
    /// Layers `options` over the defaults (and over its preset, when one is
    /// selected). Fails with [`MaskError::UnknownPreset`] before any masking
    /// work happens.
    pub(crate) fn resolve(options: &MaskOptions) -> Result<Self, MaskError> {
        let mut resolved = Self::default();
        if let Some(name) = &options.preset {
            let layer =
                preset_layer(name).ok_or_else(|| MaskError::UnknownPreset(name.clone()))?;
            resolved.apply(&layer);
        }
        resolved.apply(options);
        Ok(resolved)
    }

    /// Applies one layer field by field; set fields win, validators merge.
    fn apply(&mut self, layer: &MaskOptions) {
        if let Some(value) = layer.mask_length {
            self.mask_length = value;
        }
        if let Some(value) = layer.show_head {
            self.show_head = value;
        }
        if let Some(value) = layer.show_tail {
            self.show_tail = value;
        }
        if let Some(value) = layer.mask_char {
            self.mask_char = value;
        }
        if let Some(value) = &layer.preserve_prefix {
            self.preserve_prefix = value.clone();
        }
        if let Some(value) = &layer.custom_prefixes {
            self.custom_prefixes = value.clone();
        }
        if let Some(value) = layer.warn_if_plain {
            self.warn_if_plain = value;
        }
        if let Some(rules) = &layer.validators {
            self.validators = merge_rules(&self.validators, rules);
        }
        if let Some(hook) = &layer.on_warning {
            self.on_warning = Some(hook.clone());
        }
        if let Some(value) = layer.mode {
            self.mode = value;
        }
        if let Some(value) = layer.segments {
            self.segments = Some(value);
        }
    }

    /// Segment configuration, with mode-dependent defaults.
    pub(crate) fn segments_for(&self, mode: MaskMode) -> SegmentOptions {
        self.segments.unwrap_or(match mode {
            MaskMode::Custom => SegmentOptions::new('-', 2),
            _ => SegmentOptions::new('.', 3),
        })
    }
}

/// Field-by-field merge of validation rules; `overlay` wins on conflicts.
fn merge_rules(base: &ValidationRules, overlay: &ValidationRules) -> ValidationRules {
    ValidationRules {
        min_length: overlay.min_length.or(base.min_length),
        max_length: overlay.max_length.or(base.max_length),
        no_spaces: overlay.no_spaces || base.no_spaces,
        require_prefix: overlay.require_prefix || base.require_prefix,
        pattern: overlay.pattern.clone().or_else(|| base.pattern.clone()),
        custom: overlay.custom.clone().or_else(|| base.custom.clone()),
    }
}

/// Summary of one named preset, for introspection and comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PresetInfo {
    /// Canonical preset name.
    pub name: &'static str,
    /// Resolved body-length policy.
    pub mask_length: MaskLength,
    /// Leading characters kept visible.
    pub show_head: usize,
    /// Trailing characters kept visible.
    pub show_tail: usize,
    /// Whether the preset runs the risk validator.
    pub validates_input: bool,
    /// Whether the output length is independent of the secret length.
    pub hides_length: bool,
}

/// Names of the built-in presets, in documentation order.
#[must_use]
pub fn preset_names() -> &'static [&'static str] {
    PRESET_NAMES
}

/// Resolved summary of a named preset, or `None` for an unknown name.
#[must_use]
pub fn preset_info(name: &str) -> Option<PresetInfo> {
    let canonical = PRESET_NAMES.iter().find(|known| **known == name)?;
    let mut resolved = ResolvedOptions::default();
    resolved.apply(&preset_layer(canonical)?);
    Some(PresetInfo {
        name: canonical,
        mask_length: resolved.mask_length,
        show_head: resolved.show_head,
        show_tail: resolved.show_tail,
        validates_input: resolved.warn_if_plain,
        hides_length: matches!(resolved.mask_length, MaskLength::Fixed(_)),
    })
}

/// Lists the field-level differences between two presets.
pub fn compare_presets(left: &str, right: &str) -> Result<Vec<String>, MaskError> {
    let a = preset_info(left).ok_or_else(|| MaskError::UnknownPreset(left.to_owned()))?;
    let b = preset_info(right).ok_or_else(|| MaskError::UnknownPreset(right.to_owned()))?;

    let mut differences = Vec::new();
    if a.mask_length != b.mask_length {
        differences.push(format!(
            "mask length: {:?} ({left}) vs {:?} ({right})",
            a.mask_length, b.mask_length
        ));
    }
    if a.show_head != b.show_head {
        differences.push(format!(
            "visible head: {} ({left}) vs {} ({right})",
            a.show_head, b.show_head
        ));
    }
    if a.show_tail != b.show_tail {
        differences.push(format!(
            "visible tail: {} ({left}) vs {} ({right})",
            a.show_tail, b.show_tail
        ));
    }
    if a.validates_input != b.validates_input {
        differences.push(format!(
            "input validation: {} ({left}) vs {} ({right})",
            a.validates_input, b.validates_input
        ));
    }
    if a.hides_length != b.hides_length {
        differences.push(format!(
            "hides secret length: {} ({left}) vs {} ({right})",
            a.hides_length, b.hides_length
        ));
    }
    Ok(differences)
}

/// Recommends a preset for displaying `input`, based on its risk level.
///
/// Never recommends `lenient`: revealing the secret length is opt-in only.
#[must_use]
pub fn recommended_preset(input: &str) -> &'static str {
    let score = validate(input, &ValidationRules::default()).risk_score;
    match RiskLevel::from_score(score) {
        RiskLevel::High | RiskLevel::Critical => "strict",
        RiskLevel::Medium => "balanced",
        RiskLevel::Low => "ui",
    }
}
