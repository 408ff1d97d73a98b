// Query templates: glosses whose form/gloss fields may be regex matchers.
//
// Templates appear only on the `select` side of patterns and in lookup
// filters; concrete data glosses never carry matchers. Matching is
// asymmetric: the template side supplies matcher semantics, the data side
// is always literal.

use std::collections::BTreeSet;

use regex::Regex;

use crate::TemplateError;
use crate::gloss::Gloss;

/// A compiled form matcher built from segment syntax `{seg|seg|...}`.
///
/// Each segment is a regex fragment and becomes one capture group; the
/// whole matcher is anchored, so it both tests a form and splits it into
/// one piece per segment.
#[derive(Debug, Clone)]
pub struct FormMatcher {
    source_text: String,
    regex: Regex,
}

impl FormMatcher {
    /// Compile a matcher from its segments. `{.|b}` has the segments
    /// `["." , "b"]` and splits `"ab"` into `["a", "b"]`.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Result<Self, TemplateError> {
        if segments.is_empty() {
            return Err(TemplateError::EmptyMatcher);
        }
        let source_text = segments
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join("|");
        let mut pattern = String::from("^");
        for seg in segments {
            pattern.push('(');
            pattern.push_str(seg.as_ref());
            pattern.push(')');
        }
        pattern.push('$');
        let regex = Regex::new(&pattern).map_err(|e| TemplateError::BadMatcher {
            source_text: source_text.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { source_text, regex })
    }

    /// Compile from the raw `{...}` body, splitting on `|`.
    pub fn from_source(source: &str) -> Result<Self, TemplateError> {
        let segments: Vec<&str> = source.split('|').collect();
        Self::from_segments(&segments)
    }

    /// The `seg|seg|...` body this matcher was compiled from.
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Number of segments, i.e. the number of pieces [`split`](Self::split)
    /// produces on success.
    pub fn segment_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    /// Whole-form match test.
    pub fn is_match(&self, form: &str) -> bool {
        self.regex.is_match(form)
    }

    /// Split a form into one piece per segment. Returns `None` when the
    /// form does not match or any group did not participate in the match
    /// (the capture-count mismatch case, treated as a non-match).
    pub fn split(&self, form: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(form)?;
        if caps.len() < 2 {
            return None;
        }
        let mut pieces = Vec::with_capacity(caps.len() - 1);
        for i in 1..caps.len() {
            pieces.push(caps.get(i)?.as_str().to_string());
        }
        Some(pieces)
    }
}

impl PartialEq for FormMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.source_text == other.source_text
    }
}

impl Eq for FormMatcher {}

/// A template field: either a literal string compared for equality, or a
/// compiled matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    Literal(String),
    Matcher(FormMatcher),
}

impl FieldSpec {
    /// Test a concrete data field against this spec. A missing data field
    /// never matches a present spec.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (FieldSpec::Literal(lit), Some(v)) => lit == v,
            (FieldSpec::Matcher(m), Some(v)) => m.is_match(v),
            (_, None) => false,
        }
    }

    /// The matcher inside, if this spec is one.
    pub fn as_matcher(&self) -> Option<&FormMatcher> {
        match self {
            FieldSpec::Matcher(m) => Some(m),
            FieldSpec::Literal(_) => None,
        }
    }
}

/// A gloss-shaped query template. Structure mirrors [`Gloss`], with
/// matcher-capable fields; an absent field is unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlossTemplate {
    pub form: Option<FieldSpec>,
    pub ps: BTreeSet<String>,
    pub gloss: Option<FieldSpec>,
    pub morphemes: Vec<GlossTemplate>,
}

impl GlossTemplate {
    /// The neutral template: matches every gloss.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Template constraining only ps and gloss, as used by dictionary
    /// lookup filtering.
    pub fn ps_gloss_filter(ps: &BTreeSet<String>, gloss: Option<&str>) -> Self {
        Self {
            form: None,
            ps: ps.clone(),
            gloss: gloss
                .filter(|g| !g.is_empty())
                .map(|g| FieldSpec::Literal(g.to_string())),
            morphemes: Vec::new(),
        }
    }

    /// Structural match of a concrete gloss against this template.
    ///
    /// Each constrained field must match; ps uses non-strict set matching
    /// ([`ps_match`]); morphemes use [`morph_match`] with the given
    /// fuzziness.
    pub fn matches(&self, data: &Gloss, fuzzy: bool) -> bool {
        if let Some(form) = &self.form {
            if !form.matches(data.form.as_deref()) {
                return false;
            }
        }
        if let Some(gloss) = &self.gloss {
            if !gloss.matches(data.gloss.as_deref()) {
                return false;
            }
        }
        ps_match(&data.ps, &self.ps, false) && morph_match(&data.morphemes, &self.morphemes, fuzzy)
    }
}

/// Part-of-speech set matching. Strict requires set equality; non-strict
/// treats an empty set on either side as unconstrained and otherwise
/// requires a non-empty intersection.
pub fn ps_match(query: &BTreeSet<String>, pattern: &BTreeSet<String>, strict: bool) -> bool {
    if strict {
        query == pattern
    } else if query.is_empty() || pattern.is_empty() {
        true
    } else {
        query.intersection(pattern).next().is_some()
    }
}

/// Morpheme-sequence matching. An unconstrained (empty) template sequence
/// matches anything. Non-fuzzy requires equal length and pairwise matches;
/// fuzzy accepts the template sequence as a contiguous subsequence
/// anywhere inside the data sequence, taking the first alignment found
/// scanning left to right.
pub fn morph_match(data: &[Gloss], template: &[GlossTemplate], fuzzy: bool) -> bool {
    if template.is_empty() {
        return true;
    }
    if !fuzzy {
        return data.len() == template.len()
            && template.iter().zip(data).all(|(t, d)| t.matches(d, false));
    }
    if template.len() > data.len() {
        return false;
    }
    for start in 0..=(data.len() - template.len()) {
        if template
            .iter()
            .zip(&data[start..])
            .all(|(t, d)| t.matches(d, true))
        {
            return true;
        }
    }
    false
}
