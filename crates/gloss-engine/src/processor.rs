// The staged combinator pipeline: binds a dictionary and a compiled
// grammar into an executable analyzer.
//
// State is the candidate list, seeded with the bare token gloss. Each
// stage either grows the list (`add`) or rewrites it (`apply`) through one
// of the per-candidate functions; `return if` lines cut the run short as
// soon as any candidate satisfies their predicate. Everything is
// synchronous and the bound structures are immutable, so one processor
// may serve any number of threads.

use std::collections::BTreeSet;

use gloss_core::gloss::PS_AFFIX;
use gloss_core::{CompactGloss, Gloss, Pattern};

use crate::dictionary::GlossDictionary;
use crate::grammar::{Grammar, GrammarError, PlanStep, StageFunc, StageInstruction, StageOp};
use crate::lookup::{lookup_gloss, parse_composite};

/// Stage id reported when no stage made progress before the pipeline ran
/// out, i.e. the word stayed unparsed.
pub const STAGE_UNPARSED: i32 = -1;

/// Token level a processor runs by default.
pub const LEVEL_WORD: &str = "word";

/// Executable binding of a dictionary and a grammar.
pub struct Processor {
    dictionary: GlossDictionary,
    grammar: Grammar,
    level: String,
}

impl Processor {
    /// Bind for the default `word` level. Fails when the grammar has no
    /// plan for it.
    pub fn new(dictionary: GlossDictionary, grammar: Grammar) -> Result<Self, GrammarError> {
        Self::for_level(dictionary, grammar, LEVEL_WORD)
    }

    /// Bind for a specific token level.
    pub fn for_level(
        dictionary: GlossDictionary,
        grammar: Grammar,
        level: &str,
    ) -> Result<Self, GrammarError> {
        if grammar.plan_for(level).is_none() {
            return Err(GrammarError::MissingLevel {
                level: level.to_string(),
            });
        }
        Ok(Self {
            dictionary,
            grammar,
            level: level.to_string(),
        })
    }

    pub fn dictionary(&self) -> &GlossDictionary {
        &self.dictionary
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Analyze one word: run the plan over a candidate list seeded with
    /// `nullgloss(word)` and return the accepted candidates together with
    /// the stage at which they were accepted.
    ///
    /// The reported stage id only advances when a stage actually changes
    /// the candidate list. A `return if` line whose predicate keeps at
    /// least one candidate ends the run immediately with the filtered
    /// list. A word that survives nothing degrades to
    /// `(STAGE_UNPARSED, [nullgloss(word)])`.
    pub fn lemmatize(&self, word: &str) -> (i32, Vec<Gloss>) {
        let mut candidates = vec![Gloss::nullgloss(word)];
        let mut stage = STAGE_UNPARSED;
        let steps = self
            .grammar
            .plan_for(&self.level)
            .expect("level validated at construction");

        for step in steps {
            match step {
                PlanStep::Stage(instr) => {
                    let next = self.run_stage(instr, &candidates);
                    if next != candidates {
                        stage = instr.id;
                        candidates = next;
                    }
                }
                PlanStep::ReturnIf(pred) => {
                    let kept: Vec<Gloss> = candidates
                        .iter()
                        .filter(|g| pred.eval(g))
                        .cloned()
                        .collect();
                    if !kept.is_empty() {
                        return (stage, kept);
                    }
                }
            }
        }
        (STAGE_UNPARSED, candidates)
    }

    /// Expand the candidate alternatives for every word of a sentence.
    pub fn lemmatize_sentence(&self, words: &[String]) -> Vec<(i32, Vec<Gloss>)> {
        words.iter().map(|w| self.lemmatize(w)).collect()
    }

    fn run_stage(&self, instr: &StageInstruction, input: &[Gloss]) -> Vec<Gloss> {
        match instr.op {
            StageOp::Add => {
                let mut out = input.to_vec();
                for gloss in input {
                    if let Some(results) = self.stage_fn(&instr.func, gloss) {
                        for result in results {
                            if !out.contains(&result) {
                                out.push(result);
                            }
                        }
                    }
                }
                out
            }
            StageOp::Apply => {
                let mut out = Vec::with_capacity(input.len());
                for gloss in input {
                    match self.stage_fn(&instr.func, gloss) {
                        Some(results) if !results.is_empty() => out.extend(results),
                        _ => out.push(gloss.clone()),
                    }
                }
                out
            }
        }
    }

    /// Evaluate one candidate through the stage's function. `None` means
    /// the candidate produced nothing (`add` skips it, `apply` passes it
    /// through unchanged).
    fn stage_fn(&self, func: &StageFunc, gloss: &Gloss) -> Option<Vec<Gloss>> {
        match func {
            StageFunc::Lookup => self.lookup_candidates(gloss),
            StageFunc::Parallel(binding) => {
                let patterns = self.grammar.section(&binding.section)?;
                let mut out = Vec::new();
                for pattern in patterns {
                    out.extend(self.apply_pattern(pattern, gloss, binding.decompose));
                }
                if out.is_empty() { None } else { Some(out) }
            }
            StageFunc::Sequential(binding) => {
                let patterns = self.grammar.section(&binding.section)?;
                // Best-effort chaining: every pattern gets a try against
                // the most recent result; a miss is skipped, not fatal.
                let mut current: Option<Gloss> = None;
                for pattern in patterns {
                    let base = current.as_ref().unwrap_or(gloss);
                    if let Some(result) = self
                        .apply_pattern(pattern, base, binding.decompose)
                        .into_iter()
                        .next()
                    {
                        current = Some(result);
                    }
                }
                current.map(|g| vec![g])
            }
            StageFunc::FirstMatch(binding) => {
                let patterns = self.grammar.section(&binding.section)?;
                for pattern in patterns {
                    let results = self.apply_pattern(pattern, gloss, binding.decompose);
                    if !results.is_empty() {
                        return Some(results);
                    }
                }
                None
            }
        }
    }

    /// Apply one pattern, optionally segmenting an unsegmented candidate
    /// into as many composite parts as the pattern's select expects.
    fn apply_pattern(&self, pattern: &Pattern, gloss: &Gloss, decompose: bool) -> Vec<Gloss> {
        let parts = pattern.select.morphemes.len();
        if decompose && gloss.morphemes.len() <= 1 && parts >= 2 {
            let Some(form) = gloss.form.as_deref() else {
                return Vec::new();
            };
            let mut out = Vec::new();
            for segmentation in parse_composite(form, &self.dictionary, parts) {
                let candidate = gloss.with_morphemes(segmentation);
                if let Some(result) = pattern.apply(&candidate) {
                    out.push(result);
                }
            }
            out
        } else {
            pattern.apply(gloss).into_iter().collect()
        }
    }

    /// Dictionary lookup as a stage function. An atomic query is looked up
    /// directly. For a segmented query only the morphemes still lacking a
    /// gloss are looked up, each possibly ambiguously; the alternatives
    /// recombine through a `CompactGloss` cartesian expansion.
    fn lookup_candidates(&self, gloss: &Gloss) -> Option<Vec<Gloss>> {
        if gloss.morphemes.is_empty() {
            let found = lookup_gloss(gloss, &self.dictionary);
            return if found.is_empty() { None } else { Some(found) };
        }

        let mut any_found = false;
        let mut slots: Vec<Vec<Gloss>> = Vec::with_capacity(gloss.morphemes.len());
        for morpheme in &gloss.morphemes {
            if morpheme.has_gloss() {
                slots.push(vec![morpheme.clone()]);
                continue;
            }
            let found = lookup_gloss(morpheme, &self.dictionary);
            if found.is_empty() {
                slots.push(vec![morpheme.clone()]);
            } else {
                any_found = true;
                slots.push(found);
            }
        }
        if !any_found {
            return None;
        }

        let compact = CompactGloss {
            form: gloss.form.clone(),
            ps: gloss.ps.clone(),
            gloss: gloss.gloss.clone(),
            morphemes: slots,
        };
        let results = compact
            .expand()
            .into_iter()
            .map(|expanded| recombine_composite(gloss, expanded))
            .collect();
        Some(results)
    }
}

/// Derive the parent fields of a freshly glossed composite.
///
/// The parent gloss text joins the morpheme glosses only when every
/// morpheme has one. The parent ps comes from the single non-affix
/// morpheme (intersected with the query's own tags when it has any);
/// with zero or several non-affix morphemes the query's tags are kept.
fn recombine_composite(query: &Gloss, expanded: Gloss) -> Gloss {
    let all_glossed = expanded.morphemes.iter().all(Gloss::has_gloss);
    let gloss = if all_glossed {
        Some(
            expanded
                .morphemes
                .iter()
                .map(|m| m.gloss.as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join("-"),
        )
    } else {
        query.gloss.clone()
    };

    let stems: Vec<&Gloss> = expanded
        .morphemes
        .iter()
        .filter(|m| !m.ps.contains(PS_AFFIX))
        .collect();
    let ps: BTreeSet<String> = if stems.len() == 1 {
        if query.ps.is_empty() {
            stems[0].ps.clone()
        } else {
            stems[0].ps.intersection(&query.ps).cloned().collect()
        }
    } else {
        query.ps.clone()
    };

    Gloss {
        form: query.form.clone(),
        ps,
        gloss,
        morphemes: expanded.morphemes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::GlossDictionary;
    use std::collections::BTreeSet;

    fn tags(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    fn dict() -> GlossDictionary {
        GlossDictionary::from_entries([
            Gloss::new("ab", ["n"], "gloss", vec![]),
            Gloss::new("sa", ["v"], "die", vec![]),
            Gloss::new("sa", ["n"], "snake", vec![]),
            Gloss::new("ra", ["mrph"], "PFV", vec![]),
        ])
    }

    fn processor(grammar: &str) -> Processor {
        Processor::new(dict(), Grammar::load(grammar).unwrap()).unwrap()
    }

    #[test]
    fn add_lookup_returns_dictionary_entry() {
        let p = processor("plan\nfor word:\n  stage 0 add lookup\n  return if parsed\n");
        let (stage, candidates) = p.lemmatize("ab");
        assert_eq!(stage, 0);
        assert_eq!(candidates, vec![Gloss::new("ab", ["n"], "gloss", vec![])]);
    }

    #[test]
    fn unknown_word_degrades_to_nullgloss() {
        let p = processor("plan\nfor word:\n  stage 0 add lookup\n  return if parsed\n");
        let (stage, candidates) = p.lemmatize("qqq");
        assert_eq!(stage, STAGE_UNPARSED);
        assert_eq!(candidates, vec![Gloss::nullgloss("qqq")]);
    }

    #[test]
    fn lemmatize_is_deterministic() {
        let grammar = "\
plan
for word:
  stage 0 add lookup
  return if parsed
  stage 1 apply parallel parse inflection
  stage 2 add lookup
  return if parsed

section inflection
pattern :: [{.+|ra}] | :v: [:v: :mrph:PFV]
";
        let p = processor(grammar);
        assert_eq!(p.lemmatize("sara"), p.lemmatize("sara"));
        assert_eq!(p.lemmatize("sa"), p.lemmatize("sa"));
    }

    #[test]
    fn stage_id_only_advances_on_progress() {
        let grammar = "\
plan
for word:
  stage 0 apply parallel parse nothing
  stage 5 add lookup
  return if parsed

section nothing
pattern nomatch:q: | :q:
";
        let p = processor(grammar);
        let (stage, _) = p.lemmatize("ab");
        assert_eq!(stage, 5);
    }

    #[test]
    fn inflection_lookup_roundtrip() {
        let grammar = "\
plan
for word:
  stage 0 add lookup
  return if parsed
  stage 1 apply parallel parse inflection
  stage 2 add lookup
  return if parsed

section inflection
pattern :: [{.+|ra}] | :v: [:v: :mrph:PFV]
";
        let p = processor(grammar);
        let (stage, candidates) = p.lemmatize("sara");
        assert_eq!(stage, 2);
        assert_eq!(candidates.len(), 1);
        let parsed = &candidates[0];
        assert_eq!(parsed.form.as_deref(), Some("sara"));
        assert_eq!(parsed.ps, tags(&["v"]));
        assert_eq!(parsed.gloss.as_deref(), Some("die-PFV"));
        assert_eq!(parsed.morphemes.len(), 2);
        assert_eq!(parsed.morphemes[0].gloss.as_deref(), Some("die"));
        assert_eq!(parsed.morphemes[1].gloss.as_deref(), Some("PFV"));
    }

    #[test]
    fn sequential_skips_failures_best_effort() {
        let grammar = "\
plan
for word:
  stage 0 apply sequential parse chain
  return if unparsed

section chain
pattern nomatch:q: | :q:
pattern :: [{.+|ra}] | :v: [:v: :mrph:PFV]
";
        let p = processor(grammar);
        let (_, candidates) = p.lemmatize("sara");
        // The first pattern never matches; the second still applied.
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].morphemes.len(), 2);
        assert_eq!(candidates[0].morphemes[1].gloss.as_deref(), Some("PFV"));
    }

    #[test]
    fn firstmatch_stops_at_first_success() {
        let grammar = "\
plan
for word:
  stage 0 apply firstmatch parse rules
  return if unparsed

section rules
pattern :: [{.+|ra}] | :v: [:v: :mrph:PFV]
pattern :: [{.+|a}] | :n: [:n: :mrph:ART]
";
        let p = processor(grammar);
        let (_, candidates) = p.lemmatize("sara");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].morphemes[1].gloss.as_deref(), Some("PFV"));
    }

    #[test]
    fn parallel_collects_every_success() {
        let grammar = "\
plan
for word:
  stage 0 apply parallel parse rules
  return if unparsed

section rules
pattern :: [{.+|ra}] | :v: [:v: :mrph:PFV]
pattern :: [{.+|a}] | :n: [:n: :mrph:ART]
";
        let p = processor(grammar);
        let (_, candidates) = p.lemmatize("sara");
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn composite_lookup_recombines_ambiguity() {
        let p = processor("plan\nfor word:\n  stage 0 add lookup\n  return if parsed\n");
        let query = Gloss::nullgloss("sara")
            .with_morphemes(vec![Gloss::nullgloss("sa"), Gloss::nullgloss("ra")]);
        let results = p.lookup_candidates(&query).unwrap();
        // "sa" is ambiguous (v/n), "ra" is unique: two expansions.
        assert_eq!(results.len(), 2);
        for r in &results {
            assert_eq!(r.form.as_deref(), Some("sara"));
            assert!(r.is_parsed());
            // One non-affix morpheme: parent adopts its tags.
            assert_eq!(r.ps, r.morphemes[0].ps);
            let joined = format!(
                "{}-{}",
                r.morphemes[0].gloss.as_deref().unwrap(),
                r.morphemes[1].gloss.as_deref().unwrap()
            );
            assert_eq!(r.gloss.as_deref(), Some(joined.as_str()));
        }
    }

    #[test]
    fn composite_lookup_leaves_gloss_empty_on_partial_success() {
        let p = processor("plan\nfor word:\n  stage 0 add lookup\n  return if parsed\n");
        let query = Gloss::nullgloss("saqq")
            .with_morphemes(vec![Gloss::nullgloss("sa"), Gloss::nullgloss("qq")]);
        let results = p.lookup_candidates(&query).unwrap();
        for r in results {
            assert!(r.gloss.is_none());
            assert!(!r.is_parsed());
        }
    }

    #[test]
    fn decompose_tries_every_segmentation() {
        let grammar = "\
plan
for word:
  stage 0 add parallel decompose composites
  stage 1 add lookup
  return if parsed

section composites
pattern :: [:: ::] | :: [:: ::]
";
        let d = GlossDictionary::from_entries([
            Gloss::new("ab", ["n"], "dog", vec![]),
            Gloss::new("a", ["prt"], "it", vec![]),
            Gloss::new("bc", ["n"], "tree", vec![]),
            Gloss::new("c", ["mrph"], "PL", vec![]),
        ]);
        let p = Processor::new(d, Grammar::load(grammar).unwrap()).unwrap();
        let (stage, candidates) = p.lemmatize("abc");
        assert_eq!(stage, 1);
        let shapes: Vec<Vec<&str>> = candidates
            .iter()
            .map(|g| {
                g.morphemes
                    .iter()
                    .map(|m| m.form.as_deref().unwrap())
                    .collect()
            })
            .collect();
        assert!(shapes.contains(&vec!["ab", "c"]));
        assert!(shapes.contains(&vec!["a", "bc"]));
    }

    #[test]
    fn missing_level_is_a_construction_error() {
        let grammar = Grammar::load("plan\nfor sentence:\n  stage 0 add lookup\n").unwrap();
        assert!(matches!(
            Processor::new(dict(), grammar),
            Err(GrammarError::MissingLevel { .. })
        ));
    }
}
