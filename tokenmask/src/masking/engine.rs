//! The masking engine: strategy dispatch and overlap-safe composition.
//!
//! Strategies are pure string transformations over Unicode scalar values.
//! The standard strategy enforces the overlap-safety invariant: no
//! combination of head/tail visibility can expose a whole secret, because at
//! least one character is always reserved for masking. The segment
//! strategies (jwt, custom) trade that invariant for shape preservation: a
//! segment just above the visibility threshold exposes most of its content.
//! Segments at or below the threshold are left in clear.

use crate::error::MaskError;
use crate::masking::options::{
    MaskLength, MaskMode, MaskOptions, PrefixPolicy, ResolvedOptions, DEFAULT_MASK_LENGTH,
};
use crate::registry::{PrefixRegistry, TokenMetadata};
use crate::validation::{self, ValidationResult, ValidationRules};

/// Mask width appended to each visible jwt segment head.
const JWT_SEGMENT_MASK: usize = 3;

/// Mask width between the visible ends of each custom segment.
const CUSTOM_SEGMENT_MASK: usize = 4;

/// Segment count that identifies a jwt-shaped input.
const JWT_SEGMENT_COUNT: usize = 3;

/// Structured masking outcome.
///
/// Carries the masked string and everything derived about the input, but
/// never the input itself.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MaskResult {
    /// The masked output.
    pub masked: String,
    /// Classification of the input.
    pub metadata: TokenMetadata,
    /// Validation outcome, or the all-clear record when validation was not
    /// run.
    pub validation: ValidationResult,
    /// Character count of the original input.
    pub original_length: usize,
    /// Whether a prefix was detected.
    pub has_prefix: bool,
}

/// The masking engine.
///
/// Owns the custom-prefix registry; construction starts from an empty one.
/// Every masking call is a pure function of its inputs plus the registry
/// contents at call time.
#[derive(Debug, Default)]
pub struct Masker {
    registry: PrefixRegistry,
}

impl Masker {
    /// Creates an engine with an empty custom-prefix registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared access to the engine's prefix registry.
    #[must_use]
    pub fn registry(&self) -> &PrefixRegistry {
        &self.registry
    }

    /// Registers a custom prefix on this engine.
    ///
    /// See [`PrefixRegistry::register_prefix`].
    pub fn register_prefix(&self, prefix: &str, label: &str) -> Result<(), MaskError> {
        self.registry.register_prefix(prefix, label)
    }

    /// Classifies `input` without masking it.
    #[must_use]
    pub fn detect(&self, input: &str) -> TokenMetadata {
        self.registry.detect(input, None)
    }

    /// Scores `input` with the risk validator. Equivalent to
    /// [`crate::validate`]; provided so the engine is a complete handle.
    #[must_use]
    pub fn validate(&self, input: &str, rules: &ValidationRules) -> ValidationResult {
        validation::validate(input, rules)
    }

    /// Masks `input` under `options` and returns the masked string.
    pub fn mask(&self, input: &str, options: &MaskOptions) -> Result<String, MaskError> {
        let resolved = ResolvedOptions::resolve(options)?;
        Ok(self.run(input, &resolved).masked)
    }

    /// Masks `input` under `options` and returns the full result record.
    pub fn mask_detailed(&self, input: &str, options: &MaskOptions) -> Result<MaskResult, MaskError> {
        let resolved = ResolvedOptions::resolve(options)?;
        Ok(self.run(input, &resolved))
    }

    /// Resolves `options` once and returns a masking function bound to them.
    ///
    /// An unknown preset fails here, rather than on every call; the bound
    /// value masks infallibly thereafter.
    pub fn bind(&self, options: &MaskOptions) -> Result<BoundMask<'_>, MaskError> {
        Ok(BoundMask {
            masker: self,
            resolved: ResolvedOptions::resolve(options)?,
        })
    }

    /// Masks with the `strict` preset.
    #[must_use]
    pub fn mask_strict(&self, input: &str) -> String {
        self.mask_preset(input, "strict")
    }

    /// Masks with the `balanced` preset.
    #[must_use]
    pub fn mask_balanced(&self, input: &str) -> String {
        self.mask_preset(input, "balanced")
    }

    /// Masks with the `lenient` preset.
    #[must_use]
    pub fn mask_lenient(&self, input: &str) -> String {
        self.mask_preset(input, "lenient")
    }

    /// Masks with the `ui` preset.
    #[must_use]
    pub fn mask_ui(&self, input: &str) -> String {
        self.mask_preset(input, "ui")
    }

    fn mask_preset(&self, input: &str, name: &'static str) -> String {
        // Built-in names always resolve; fall back to the defaults rather
        // than panic if the table and accessors ever drift.
        let resolved =
            ResolvedOptions::resolve(&MaskOptions::new().preset(name)).unwrap_or_default();
        self.run(input, &resolved).masked
    }

    /// The shared pipeline behind every masking entrypoint.
    fn run(&self, input: &str, options: &ResolvedOptions) -> MaskResult {
        let validation = if options.warn_if_plain {
            let result = validation::validate(input, &options.validators);
            if !result.valid {
                deliver_warning(&result, options);
            }
            result
        } else {
            ValidationResult::passed()
        };

        let metadata = self.registry.detect(input, Some(&options.custom_prefixes));

        let masked = match options.mode {
            MaskMode::Jwt => mask_jwt(input, &metadata, options),
            MaskMode::Custom => mask_custom_segments(input, options),
            MaskMode::Auto | MaskMode::Standard | MaskMode::ApiKey => {
                mask_standard(input, &metadata, options)
            }
        };

        MaskResult {
            masked,
            has_prefix: metadata.prefix.is_some(),
            metadata,
            validation,
            original_length: input.chars().count(),
        }
    }
}

/// A masking function bound to pre-resolved options.
///
/// The reusable form of a named policy: construction validates the
/// configuration, calls cannot fail.
#[derive(Clone)]
pub struct BoundMask<'m> {
    masker: &'m Masker,
    resolved: ResolvedOptions,
}

impl BoundMask<'_> {
    /// Masks `input` under the bound configuration.
    #[must_use]
    pub fn mask(&self, input: &str) -> String {
        self.masker.run(input, &self.resolved).masked
    }
}

/// Routes a failed validation to the caller's hook or the default
/// diagnostic. Never affects the masked output.
fn deliver_warning(result: &ValidationResult, options: &ResolvedOptions) {
    if let Some(hook) = &options.on_warning {
        hook(result);
        return;
    }
    let warnings = result.warnings.join("; ");
    if result.suggestions.is_empty() {
        tracing::warn!(
            risk_score = result.risk_score,
            "input does not look like a real token: {warnings}"
        );
    } else {
        let suggestions = result.suggestions.join("; ");
        tracing::warn!(
            risk_score = result.risk_score,
            "input does not look like a real token: {warnings} (suggestions: {suggestions})"
        );
    }
}

/// Splits `input` into a visible prefix and the secret remainder, honoring
/// the prefix policy.
fn split_prefix<'i>(
    input: &'i str,
    metadata: &TokenMetadata,
    policy: &PrefixPolicy,
) -> (&'i str, &'i str) {
    if let Some(prefix) = &metadata.prefix {
        if policy.keeps(prefix) && input.starts_with(prefix.as_str()) {
            return input.split_at(prefix.len());
        }
    }
    ("", input)
}

/// A run of the mask character.
fn mask_run(mask_char: char, width: usize) -> String {
    std::iter::repeat(mask_char).take(width).collect()
}

/// Mask-body width: fixed (floored at one character) or tracking the hidden
/// span.
fn body_width(length: MaskLength, hidden: usize) -> usize {
    match length {
        MaskLength::Fixed(width) => width.max(1),
        MaskLength::Variable => hidden.max(1),
    }
}

/// Standard head/tail masking with the overlap-safety invariant.
fn mask_standard(input: &str, metadata: &TokenMetadata, options: &ResolvedOptions) -> String {
    let (prefix, secret) = split_prefix(input, metadata, &options.preserve_prefix);
    let secret_chars: Vec<char> = secret.chars().collect();
    let secret_len = secret_chars.len();

    // Nothing left to mask once the prefix is removed.
    if secret_len == 0 {
        return prefix.to_owned();
    }

    let mut head_chars = options.show_head.min(secret_len);
    let mut tail_chars = options.show_tail.min(secret_len);

    if head_chars + tail_chars >= secret_len {
        // The requested visibility would expose the whole secret. Reserve at
        // least one masked character and redistribute, tail first: trailing
        // characters are the more useful handle for identifying a token.
        let max_visible = secret_len - 1;
        if max_visible == 0 {
            // Single-character secret: ignore head/tail, mask fully.
            let width = match options.mask_length {
                MaskLength::Fixed(width) => width.max(1),
                MaskLength::Variable => DEFAULT_MASK_LENGTH,
            };
            return format!("{prefix}{}", mask_run(options.mask_char, width));
        }
        let adjusted_tail = tail_chars.min(max_visible / 2);
        let adjusted_head = head_chars.min(max_visible - adjusted_tail);
        if options.warn_if_plain {
            tracing::warn!(
                requested_head = head_chars,
                requested_tail = tail_chars,
                adjusted_head,
                adjusted_tail,
                secret_len,
                "requested visibility would expose the whole secret; reduced"
            );
        }
        head_chars = adjusted_head;
        tail_chars = adjusted_tail;
    }

    let head: String = secret_chars[..head_chars].iter().collect();
    let tail: String = if tail_chars > 0 {
        secret_chars[secret_len - tail_chars..].iter().collect()
    } else {
        String::new()
    };

    let width = body_width(options.mask_length, secret_len - head_chars - tail_chars);
    let masked = format!("{prefix}{head}{}{tail}", mask_run(options.mask_char, width));

    // Fail closed if the composition reproduces the input, which is possible
    // when the secret itself consists of mask characters.
    if masked == input {
        return format!("{prefix}{}", mask_run(options.mask_char, width));
    }
    masked
}

/// Per-segment masking for three-part delimited tokens.
///
/// Inputs that do not split into exactly three segments degrade to the
/// standard strategy over the whole input.
fn mask_jwt(input: &str, metadata: &TokenMetadata, options: &ResolvedOptions) -> String {
    let segments = options.segments_for(MaskMode::Jwt);
    let parts: Vec<&str> = input.split(segments.delimiter).collect();
    if parts.len() != JWT_SEGMENT_COUNT {
        tracing::debug!(
            segment_count = parts.len(),
            delimiter = %segments.delimiter,
            "input does not have three segments; using standard masking"
        );
        return mask_standard(input, metadata, options);
    }

    let masked: Vec<String> = parts
        .iter()
        .map(|part| {
            let chars: Vec<char> = part.chars().collect();
            if chars.len() <= segments.visible {
                // Too short to usefully mask.
                (*part).to_owned()
            } else {
                let mut segment: String = chars[..segments.visible].iter().collect();
                segment.push_str(&mask_run(options.mask_char, JWT_SEGMENT_MASK));
                segment
            }
        })
        .collect();
    masked.join(&segments.delimiter.to_string())
}

/// Per-segment masking for arbitrary delimited formats, keeping both ends of
/// each long-enough segment visible.
fn mask_custom_segments(input: &str, options: &ResolvedOptions) -> String {
    let segments = options.segments_for(MaskMode::Custom);
    let masked: Vec<String> = input
        .split(segments.delimiter)
        .map(|part| {
            let chars: Vec<char> = part.chars().collect();
            if chars.len() <= segments.visible * 2 {
                part.to_owned()
            } else {
                let head: String = chars[..segments.visible].iter().collect();
                let tail: String = chars[chars.len() - segments.visible..].iter().collect();
                format!(
                    "{head}{}{tail}",
                    mask_run(options.mask_char, CUSTOM_SEGMENT_MASK)
                )
            }
        })
        .collect();
    masked.join(&segments.delimiter.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::Masker;
    use crate::error::MaskError;
    use crate::masking::options::{MaskLength, MaskMode, MaskOptions, PrefixPolicy};

    #[test]
    fn standard_masking_with_known_prefix() {
        let masker = Masker::new();
        let masked = masker
            .mask("npm_a1b2c3d4e5f6g7h8i9j0", &MaskOptions::new())
            .unwrap();
        assert_eq!(masked, "npm_••••••••i9j0");
    }

    #[test]
    fn prefix_policy_never_masks_the_prefix_too() {
        let masker = Masker::new();
        let masked = masker
            .mask(
                "npm_a1b2c3d4e5f6g7h8i9j0",
                &MaskOptions::new().preserve_prefix(PrefixPolicy::Never),
            )
            .unwrap();
        assert_eq!(masked, "••••••••i9j0");
    }

    #[test]
    fn allow_list_keeps_only_named_prefixes() {
        let masker = Masker::new();
        let allow_npm = MaskOptions::new()
            .preserve_prefix(PrefixPolicy::AllowList(vec!["npm_".to_owned()]));
        assert_eq!(
            masker.mask("npm_a1b2c3d4e5f6g7h8i9j0", &allow_npm).unwrap(),
            "npm_••••••••i9j0"
        );
        // ghp_ is detected but not in the allow list, so it is masked.
        assert_eq!(
            masker.mask("ghp_a1b2c3d4e5f6g7h8i9j0", &allow_npm).unwrap(),
            "••••••••i9j0"
        );
    }

    #[test]
    fn single_character_secret_is_fully_masked() {
        let masker = Masker::new();
        let masked = masker
            .mask(
                "x",
                &MaskOptions::new()
                    .show_head(1)
                    .show_tail(1)
                    .preserve_prefix(PrefixPolicy::Never),
            )
            .unwrap();
        assert_eq!(masked, "••••••••");
    }

    #[test]
    fn overlap_redistribution_prioritizes_the_tail() {
        let masker = Masker::new();
        // Secret of 6, head 4 + tail 4 would cover it: max visible 5,
        // tail -> min(4, 2) = 2, head -> min(4, 3) = 3.
        let masked = masker
            .mask(
                "abcdef",
                &MaskOptions::new()
                    .show_head(4)
                    .show_tail(4)
                    .preserve_prefix(PrefixPolicy::Never),
            )
            .unwrap();
        assert_eq!(masked, "abc••••••••ef");
    }

    #[test]
    fn head_tail_exactly_covering_the_secret_triggers_redistribution() {
        let masker = Masker::new();
        let masked = masker
            .mask(
                "abcd",
                &MaskOptions::new()
                    .show_head(2)
                    .show_tail(2)
                    .preserve_prefix(PrefixPolicy::Never),
            )
            .unwrap();
        // max visible 3: tail 1, head 2.
        assert_eq!(masked, "ab••••••••d");
    }

    #[test]
    fn oversized_visibility_clamps_instead_of_erroring() {
        let masker = Masker::new();
        let masked = masker
            .mask(
                "abcdefgh",
                &MaskOptions::new()
                    .show_head(1000)
                    .show_tail(1000)
                    .preserve_prefix(PrefixPolicy::Never),
            )
            .unwrap();
        // max visible 7: tail 3, head 4, one character stays masked.
        assert_eq!(masked, "abcd••••••••fgh");
    }

    #[test]
    fn variable_length_tracks_the_hidden_span() {
        let masker = Masker::new();
        let options = MaskOptions::new()
            .mask_length(MaskLength::Variable)
            .preserve_prefix(PrefixPolicy::Never);
        let masked = masker.mask("abcdefghij", &options).unwrap();
        // 10 chars, tail 4 visible: 6 hidden.
        assert_eq!(masked, "••••••ghij");
    }

    #[test]
    fn fixed_length_hides_the_secret_length() {
        let masker = Masker::new();
        let options = MaskOptions::new().preserve_prefix(PrefixPolicy::Never);
        let short = masker.mask("abcdefgh", &options).unwrap();
        let long = masker.mask(&"a".repeat(100), &options).unwrap();
        assert_eq!(short.chars().count(), long.chars().count());
    }

    #[test]
    fn empty_input_masks_to_empty() {
        let masker = Masker::new();
        assert_eq!(masker.mask("", &MaskOptions::new()).unwrap(), "");
    }

    #[test]
    fn prefix_only_input_returns_the_prefix() {
        let masker = Masker::new();
        assert_eq!(masker.mask("npm_", &MaskOptions::new()).unwrap(), "npm_");
    }

    #[test]
    fn mask_character_collision_fails_closed() {
        let masker = Masker::new();
        // Fixed body of 8 over a 12-character bullet-run secret would
        // reproduce the input; the engine must fully mask instead.
        let input = "••••••••abcd";
        let masked = masker
            .mask(input, &MaskOptions::new().preserve_prefix(PrefixPolicy::Never))
            .unwrap();
        assert_ne!(masked, input);
        assert_eq!(masked, "••••••••");
    }

    #[test]
    fn jwt_mode_masks_each_segment_head() {
        let masker = Masker::new();
        let masked = masker
            .mask(
                "eyJhbGciOi.eyJzdWIiOi.SflKxwRJ",
                &MaskOptions::new().mode(MaskMode::Jwt),
            )
            .unwrap();
        assert_eq!(masked, "eyJ•••.eyJ•••.Sfl•••");
    }

    #[test]
    fn jwt_mode_leaves_short_segments_in_clear() {
        let masker = Masker::new();
        let masked = masker
            .mask("abc.defg.hi", &MaskOptions::new().mode(MaskMode::Jwt))
            .unwrap();
        assert_eq!(masked, "abc.def•••.hi");
    }

    #[test]
    fn jwt_mode_falls_back_to_standard_for_wrong_shapes() {
        let masker = Masker::new();
        let options = MaskOptions::new()
            .mode(MaskMode::Jwt)
            .preserve_prefix(PrefixPolicy::Never);
        let masked = masker.mask("no-dots-here", &options).unwrap();
        assert_eq!(masked, "••••••••here");
    }

    #[test]
    fn custom_mode_masks_segment_middles() {
        let masker = Masker::new();
        let masked = masker
            .mask("abcd-ef-ghijkl", &MaskOptions::new().mode(MaskMode::Custom))
            .unwrap();
        // 4 > 2*2 is false for "abcd" (== 4), "ef" stays, "ghijkl" masks.
        assert_eq!(masked, "abcd-ef-gh••••kl");
    }

    #[test]
    fn custom_mode_honors_configured_segments() {
        let masker = Masker::new();
        let masked = masker
            .mask(
                "abcdef:ghijkl",
                &MaskOptions::new().mode(MaskMode::Custom).segments(':', 1),
            )
            .unwrap();
        assert_eq!(masked, "a••••f:g••••l");
    }

    #[test]
    fn unknown_preset_is_fatal() {
        let masker = Masker::new();
        let err = masker
            .mask("token123", &MaskOptions::new().preset("nope"))
            .unwrap_err();
        assert_eq!(err, MaskError::UnknownPreset("nope".to_owned()));
    }

    #[test]
    fn warning_hook_receives_the_validation_result() {
        let masker = Masker::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = MaskOptions::new()
            .warn_if_plain(true)
            .preserve_prefix(PrefixPolicy::Never)
            .on_warning(move |result| {
                sink.lock().unwrap().push(result.clone());
            });

        let masked = masker.mask("undefined", &options).unwrap();
        // The warning fired but masking is unaffected.
        assert_eq!(masked, "••••••••ined");
        let captured = seen.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert!(!captured[0].valid);
        assert!(captured[0].risk_score >= 50);
    }

    #[test]
    fn validation_never_runs_unless_requested() {
        let masker = Masker::new();
        let seen = Arc::new(Mutex::new(0_usize));
        let sink = Arc::clone(&seen);
        let options = MaskOptions::new().on_warning(move |_| {
            *sink.lock().unwrap() += 1;
        });

        masker.mask("undefined", &options).unwrap();
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[test]
    fn per_call_prefixes_shape_the_output() {
        let masker = Masker::new();
        let options = MaskOptions::new().custom_prefix("acme_", "acme token");
        let masked = masker.mask("acme_a1b2c3d4e5f6", &options).unwrap();
        assert_eq!(masked, "acme_••••••••e5f6");

        // Without the per-call map the prefix is unknown and masked through.
        let plain = masker
            .mask("acme_a1b2c3d4e5f6", &MaskOptions::new())
            .unwrap();
        assert_eq!(plain, "••••••••e5f6");
    }

    #[test]
    fn detailed_result_carries_metadata_and_summary() {
        let masker = Masker::new();
        let result = masker
            .mask_detailed("npm_a1b2c3d4e5f6g7h8i9j0", &MaskOptions::new())
            .unwrap();
        assert_eq!(result.masked, "npm_••••••••i9j0");
        assert_eq!(result.metadata.token_type, "npm access token");
        assert!(result.has_prefix);
        assert_eq!(result.original_length, 24);
        // Validation did not run, so the record is the all-clear default.
        assert!(result.validation.valid);
        assert_eq!(result.validation.risk_score, 0);
    }

    #[test]
    fn bound_mask_matches_engine_output() {
        let masker = Masker::new();
        let options = MaskOptions::new().preset("strict");
        let bound = masker.bind(&options).unwrap();
        let input = "sk_test_1234567890abcdefghijklmn";
        assert_eq!(bound.mask(input), masker.mask(input, &options).unwrap());

        assert!(masker.bind(&MaskOptions::new().preset("nope")).is_err());
    }

    #[test]
    fn preset_accessors_match_preset_options() {
        let masker = Masker::new();
        let input = "sk_test_1234567890abcdefghijklmn";
        assert_eq!(masker.mask_strict(input), "sk_test_••••••••••••klmn");
        assert_eq!(
            masker.mask_balanced(input),
            masker
                .mask(input, &MaskOptions::new().preset("balanced"))
                .unwrap()
        );
        assert_eq!(
            masker.mask_lenient(input),
            masker
                .mask(input, &MaskOptions::new().preset("lenient"))
                .unwrap()
        );
        assert_eq!(
            masker.mask_ui(input),
            masker.mask(input, &MaskOptions::new().preset("ui")).unwrap()
        );
    }
}
