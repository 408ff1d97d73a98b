//! Core value types for rule-based morphological analysis.
//!
//! A [`Gloss`](gloss::Gloss) is one candidate analysis of a surface word
//! form: a part-of-speech tag set, a human-readable gloss text, and an
//! ordered sequence of morpheme children (themselves glosses). Glosses are
//! immutable values: every derivation constructs a new value, and the one
//! possibly-failing operation, [`union`](gloss::Gloss::union), reports
//! failure as `None` rather than panicking.
//!
//! # Architecture
//!
//! - [`gloss`] -- The `Gloss` value, unification, and `CompactGloss` expansion
//! - [`template`] -- Query templates with literal/regex field matchers
//! - [`pattern`] -- `(select, mark)` rewrite rules and their application
//! - [`detone`] -- Tone-mark stripping used for fallback dictionary keys

pub mod detone;
pub mod gloss;
pub mod pattern;
pub mod template;

pub use detone::detone;
pub use gloss::{CompactGloss, Gloss};
pub use pattern::Pattern;
pub use template::{FieldSpec, FormMatcher, GlossTemplate};

/// Error type for template and form-matcher compilation.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A form matcher segment failed to compile as a regular expression.
    #[error("invalid form matcher `{{{source_text}}}`: {reason}")]
    BadMatcher { source_text: String, reason: String },

    /// A form matcher was given no segments at all.
    #[error("empty form matcher")]
    EmptyMatcher,
}
