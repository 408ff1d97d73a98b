// Pattern: a (select, mark) rewrite rule over glosses.
//
// `select` is a template that recognizes glosses; `mark` is a concrete
// gloss unified onto the recognized one. Application may also segment a
// matched morpheme: a matcher-typed form on a select morpheme splits the
// matched form into one new morpheme per matcher segment.

use std::collections::BTreeMap;

use crate::gloss::Gloss;
use crate::template::GlossTemplate;

/// A declarative rewrite rule. Built once at grammar-load time, immutable
/// afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub select: GlossTemplate,
    pub mark: Gloss,
}

impl Pattern {
    pub fn new(select: GlossTemplate, mark: Gloss) -> Self {
        Self { select, mark }
    }

    /// Whether this pattern would recognize the given gloss.
    pub fn matches(&self, gloss: &Gloss, fuzzy: bool) -> bool {
        self.select.matches(gloss, fuzzy)
    }

    /// Apply the rule to a gloss, producing the rewritten gloss or `None`
    /// when the rule does not fit.
    ///
    /// Steps: canonicalize (an atomic gloss becomes its own single
    /// morpheme); fail unless `select` matches fuzzily; align each select
    /// morpheme with the first unconsumed data morpheme it matches,
    /// scanning left to right; where the select morpheme's form is a
    /// matcher, split the aligned morpheme into one literal-form morpheme
    /// per matcher segment, splicing the list in place; finally unify the
    /// mark onto the result through the recorded index map.
    pub fn apply(&self, gloss: &Gloss) -> Option<Gloss> {
        let mut target = gloss.provide_morph();
        if !self.select.matches(&target, true) {
            return None;
        }

        // {mark morpheme index -> target morpheme index}
        let mut index_map: BTreeMap<usize, usize> = BTreeMap::new();
        let mut mark_idx = 0usize;
        let mut search_from = 0usize;

        for sel in &self.select.morphemes {
            let found = (search_from..target.morphemes.len())
                .find(|&i| sel.matches(&target.morphemes[i], true))?;

            if let Some(matcher) = sel.form.as_ref().and_then(|f| f.as_matcher()) {
                let form = target.morphemes[found].form.clone()?;
                let pieces = matcher.split(&form)?;
                let count = pieces.len();
                let replacements: Vec<Gloss> = pieces
                    .into_iter()
                    .map(|p| Gloss {
                        form: Some(p),
                        ..Gloss::default()
                    })
                    .collect();
                target.morphemes.splice(found..=found, replacements);
                for offset in 0..count {
                    index_map.insert(mark_idx, found + offset);
                    mark_idx += 1;
                }
                search_from = found + count;
            } else {
                index_map.insert(mark_idx, found);
                mark_idx += 1;
                search_from = found + 1;
            }
        }

        target.union(&self.mark, Some(&index_map), false)
    }
}
