// Gloss: the immutable candidate-analysis value and its unification.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One candidate analysis of a surface form.
///
/// `form` and `gloss` are `None` when unconstrained/unknown; `ps` is a set
/// of part-of-speech tags (empty = unconstrained); `morphemes` is the
/// ordered decomposition into child glosses (empty = atomic).
///
/// Glosses are immutable by convention: derived values are produced by the
/// `with_*` constructors and by [`union`](Gloss::union), never by editing a
/// value shared with someone else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gloss {
    pub form: Option<String>,
    pub ps: BTreeSet<String>,
    pub gloss: Option<String>,
    pub morphemes: Vec<Gloss>,
}

/// Part-of-speech tag marking a morpheme as an affix rather than a stem.
pub const PS_AFFIX: &str = "mrph";

impl Gloss {
    /// Fully specified constructor.
    pub fn new<I, S>(form: &str, ps: I, gloss: &str, morphemes: Vec<Gloss>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            form: Some(form.to_string()),
            ps: ps.into_iter().map(Into::into).collect(),
            gloss: Some(gloss.to_string()),
            morphemes,
        }
    }

    /// The neutral, completely unconstrained gloss.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Seed gloss for a raw token: carries only the surface form.
    pub fn nullgloss(word: &str) -> Self {
        Self {
            form: Some(word.to_string()),
            ..Self::default()
        }
    }

    /// `true` when form, ps and gloss are all absent.
    ///
    /// Morphemes are deliberately not consulted: a gloss with children but
    /// no fields of its own still has nothing to unify onto.
    pub fn is_empty(&self) -> bool {
        self.form.is_none() && self.ps.is_empty() && self.gloss.is_none()
    }

    /// `true` when the gloss text is present and non-blank.
    pub fn has_gloss(&self) -> bool {
        self.gloss.as_deref().is_some_and(|g| !g.is_empty())
    }

    /// Replace-constructor for the morpheme list.
    pub fn with_morphemes(&self, morphemes: Vec<Gloss>) -> Self {
        Self {
            form: self.form.clone(),
            ps: self.ps.clone(),
            gloss: self.gloss.clone(),
            morphemes,
        }
    }

    /// Canonicalize for pattern application: an atomic gloss becomes a
    /// single-morpheme gloss whose only child is its own atomic copy.
    /// A gloss that already has morphemes is returned unchanged.
    pub fn provide_morph(&self) -> Self {
        if !self.morphemes.is_empty() {
            return self.clone();
        }
        let child = Self {
            form: self.form.clone(),
            ps: self.ps.clone(),
            gloss: self.gloss.clone(),
            morphemes: Vec::new(),
        };
        self.with_morphemes(vec![child])
    }

    /// `true` when every morpheme, recursively, carries a non-empty gloss
    /// text. An atomic gloss is parsed iff its own gloss text is non-empty.
    pub fn is_parsed(&self) -> bool {
        if self.morphemes.is_empty() {
            self.has_gloss()
        } else {
            self.morphemes.iter().all(Gloss::is_parsed)
        }
    }

    /// Unify two glosses into a new one, or fail with `None`.
    ///
    /// Failure cases:
    /// - `self` is entirely empty (nothing to unify onto);
    /// - both ps sets are non-empty but their intersection is empty
    ///   (the whole union fails, not just the field);
    /// - any required child union fails.
    ///
    /// Field rules: `ps` becomes `other.ps` under `ps_override`, else the
    /// intersection when both sides constrain it, else the union. `form`
    /// and `gloss` take `other`'s value when it has one, else keep
    /// `self`'s. Morphemes: adopt `other`'s when `self` has none; unify
    /// pairwise by position when no `index_map` is given; with an
    /// `index_map` of `{other index -> self index}`, unify only the
    /// targeted positions and leave the rest of `self`'s children alone.
    pub fn union(
        &self,
        other: &Gloss,
        index_map: Option<&BTreeMap<usize, usize>>,
        ps_override: bool,
    ) -> Option<Gloss> {
        if self.is_empty() {
            return None;
        }

        let ps: BTreeSet<String> = if ps_override {
            other.ps.clone()
        } else if !self.ps.is_empty() && !other.ps.is_empty() {
            let shared: BTreeSet<String> = self.ps.intersection(&other.ps).cloned().collect();
            if shared.is_empty() {
                return None;
            }
            shared
        } else {
            self.ps.union(&other.ps).cloned().collect()
        };

        let form = other.form.clone().or_else(|| self.form.clone());
        let gloss = other.gloss.clone().or_else(|| self.gloss.clone());

        let morphemes = if self.morphemes.is_empty() {
            other.morphemes.clone()
        } else if other.morphemes.is_empty() {
            self.morphemes.clone()
        } else if let Some(map) = index_map {
            let mut children = self.morphemes.clone();
            for (&src, &dst) in map {
                let mark_child = other.morphemes.get(src)?;
                let target = children.get(dst)?;
                // An affix mark replaces the matched morpheme's tags; a
                // mark child without tags must not clear them.
                let override_child = !mark_child.ps.is_empty();
                children[dst] = target.union(mark_child, None, override_child)?;
            }
            children
        } else {
            let longest = self.morphemes.len().max(other.morphemes.len());
            let mut children = Vec::with_capacity(longest);
            for i in 0..longest {
                match (self.morphemes.get(i), other.morphemes.get(i)) {
                    (Some(a), Some(b)) => children.push(a.union(b, None, ps_override)?),
                    (Some(a), None) => children.push(a.clone()),
                    (None, Some(b)) => children.push(b.clone()),
                    (None, None) => unreachable!(),
                }
            }
            children
        };

        Some(Gloss {
            form,
            ps,
            gloss,
            morphemes,
        })
    }
}

impl std::fmt::Display for Gloss {
    /// Compact `form:ps1/ps2:gloss [children]` rendering.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.form.as_deref().unwrap_or(""),
            self.ps.iter().cloned().collect::<Vec<_>>().join("/"),
            self.gloss.as_deref().unwrap_or("")
        )?;
        if !self.morphemes.is_empty() {
            write!(f, " [")?;
            for (i, m) in self.morphemes.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{m}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Transient ambiguity-carrying gloss: each morpheme slot holds a list of
/// alternative child glosses. Produced during composite lookup and expanded
/// into plain glosses before leaving the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactGloss {
    pub form: Option<String>,
    pub ps: BTreeSet<String>,
    pub gloss: Option<String>,
    pub morphemes: Vec<Vec<Gloss>>,
}

impl CompactGloss {
    /// Wrap a plain gloss; every slot starts as a singleton alternative.
    pub fn from_gloss(gloss: &Gloss) -> Self {
        Self {
            form: gloss.form.clone(),
            ps: gloss.ps.clone(),
            gloss: gloss.gloss.clone(),
            morphemes: gloss.morphemes.iter().map(|m| vec![m.clone()]).collect(),
        }
    }

    /// Expand into concrete glosses via the cartesian product of all
    /// alternative slots. A slot with no alternatives yields no expansions.
    pub fn expand(&self) -> Vec<Gloss> {
        let mut combos: Vec<Vec<Gloss>> = vec![Vec::new()];
        for slot in &self.morphemes {
            let mut next = Vec::with_capacity(combos.len() * slot.len());
            for combo in &combos {
                for alt in slot {
                    let mut extended = combo.clone();
                    extended.push(alt.clone());
                    next.push(extended);
                }
            }
            combos = next;
        }
        combos
            .into_iter()
            .map(|children| Gloss {
                form: self.form.clone(),
                ps: self.ps.clone(),
                gloss: self.gloss.clone(),
                morphemes: children,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ps(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn empty_gloss_is_empty() {
        assert!(Gloss::empty().is_empty());
        assert!(!Gloss::nullgloss("ab").is_empty());
    }

    #[test]
    fn union_with_empty_is_identity() {
        let g = Gloss::new("ab", ["n"], "dog", vec![]);
        assert_eq!(g.union(&Gloss::empty(), None, false), Some(g.clone()));
    }

    #[test]
    fn union_onto_empty_self_fails() {
        let g = Gloss::new("ab", ["n"], "dog", vec![]);
        assert_eq!(Gloss::empty().union(&g, None, false), None);
        // Empty-empty is also a failure: there is still nothing to unify onto.
        assert_eq!(Gloss::empty().union(&Gloss::empty(), None, false), None);
    }

    #[test]
    fn union_disjoint_ps_fails_entirely() {
        let a = Gloss::new("ab", ["n"], "dog", vec![]);
        let b = Gloss {
            ps: ps(&["v"]),
            ..Gloss::default()
        };
        assert_eq!(a.union(&b, None, false), None);
    }

    #[test]
    fn union_ps_intersection_and_union() {
        let a = Gloss::new("ab", ["n", "v"], "dog", vec![]);
        let b = Gloss {
            ps: ps(&["v", "adj"]),
            ..Gloss::default()
        };
        let u = a.union(&b, None, false).unwrap();
        assert_eq!(u.ps, ps(&["v"]));

        let unconstrained = Gloss::nullgloss("ab");
        let u = unconstrained.union(&b, None, false).unwrap();
        assert_eq!(u.ps, ps(&["adj", "v"]));
    }

    #[test]
    fn union_ps_override_replaces() {
        let a = Gloss::new("ab", ["n"], "dog", vec![]);
        let b = Gloss {
            ps: ps(&["mrph"]),
            ..Gloss::default()
        };
        let u = a.union(&b, None, true).unwrap();
        assert_eq!(u.ps, ps(&["mrph"]));
    }

    #[test]
    fn union_keeps_own_fields_when_other_is_silent() {
        let a = Gloss::new("ab", ["n"], "dog", vec![]);
        let b = Gloss {
            gloss: Some("hound".to_string()),
            ..Gloss::default()
        };
        let u = a.union(&b, None, false).unwrap();
        assert_eq!(u.form.as_deref(), Some("ab"));
        assert_eq!(u.gloss.as_deref(), Some("hound"));
    }

    #[test]
    fn union_adopts_morphemes_when_self_has_none() {
        let a = Gloss::new("abc", ["n"], "dog", vec![]);
        let children = vec![Gloss::nullgloss("ab"), Gloss::nullgloss("c")];
        let b = Gloss::empty().with_morphemes(children.clone());
        let u = a.union(&b, None, false).unwrap();
        assert_eq!(u.morphemes, children);
    }

    #[test]
    fn union_pairwise_morphemes() {
        let a = Gloss::empty()
            .with_morphemes(vec![Gloss::nullgloss("ab"), Gloss::nullgloss("c")])
            .union(&Gloss::nullgloss("abc"), None, false);
        // self is empty at the top level, so even with children the union fails
        assert_eq!(a, None);

        let a = Gloss::nullgloss("abc")
            .with_morphemes(vec![Gloss::nullgloss("ab"), Gloss::nullgloss("c")]);
        let b = Gloss::empty().with_morphemes(vec![
            Gloss::new("ab", ["n"], "dog", vec![]),
            Gloss::new("c", ["mrph"], "PL", vec![]),
        ]);
        let u = a.union(&b, None, false).unwrap();
        assert_eq!(u.morphemes[0].gloss.as_deref(), Some("dog"));
        assert_eq!(u.morphemes[1].ps, ps(&["mrph"]));
    }

    #[test]
    fn union_with_index_map_touches_only_mapped_children() {
        let a = Gloss::nullgloss("abc").with_morphemes(vec![
            Gloss::nullgloss("a"),
            Gloss::nullgloss("b"),
            Gloss::nullgloss("c"),
        ]);
        let mark_child = Gloss {
            ps: ps(&["mrph"]),
            gloss: Some("PL".to_string()),
            ..Gloss::default()
        };
        let mark = Gloss::empty().with_morphemes(vec![mark_child]);
        let mut map = BTreeMap::new();
        map.insert(0usize, 2usize);
        let u = a.union(&mark, Some(&map), false).unwrap();
        assert_eq!(u.morphemes[0], Gloss::nullgloss("a"));
        assert_eq!(u.morphemes[1], Gloss::nullgloss("b"));
        assert_eq!(u.morphemes[2].form.as_deref(), Some("c"));
        assert_eq!(u.morphemes[2].ps, ps(&["mrph"]));
        assert_eq!(u.morphemes[2].gloss.as_deref(), Some("PL"));
    }

    #[test]
    fn provide_morph_wraps_atomic_gloss_once() {
        let g = Gloss::new("ab", ["n"], "dog", vec![]);
        let wrapped = g.provide_morph();
        assert_eq!(wrapped.morphemes.len(), 1);
        assert_eq!(wrapped.morphemes[0].form.as_deref(), Some("ab"));
        // Already-segmented glosses are untouched.
        assert_eq!(wrapped.provide_morph(), wrapped);
    }

    #[test]
    fn parsed_predicate() {
        assert!(!Gloss::nullgloss("ab").is_parsed());
        assert!(Gloss::new("ab", ["n"], "dog", vec![]).is_parsed());
        let half = Gloss::nullgloss("abc").with_morphemes(vec![
            Gloss::new("ab", ["n"], "dog", vec![]),
            Gloss::nullgloss("c"),
        ]);
        assert!(!half.is_parsed());
        let full = Gloss::nullgloss("abc").with_morphemes(vec![
            Gloss::new("ab", ["n"], "dog", vec![]),
            Gloss::new("c", ["mrph"], "PL", vec![]),
        ]);
        assert!(full.is_parsed());
    }

    #[test]
    fn compact_gloss_expands_cartesian_product() {
        let compact = CompactGloss {
            form: Some("abc".to_string()),
            ps: BTreeSet::new(),
            gloss: None,
            morphemes: vec![
                vec![
                    Gloss::new("ab", ["n"], "dog", vec![]),
                    Gloss::new("ab", ["v"], "bark", vec![]),
                ],
                vec![Gloss::new("c", ["mrph"], "PL", vec![])],
            ],
        };
        let expanded = compact.expand();
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].morphemes[0].gloss.as_deref(), Some("dog"));
        assert_eq!(expanded[1].morphemes[0].gloss.as_deref(), Some("bark"));
        assert!(expanded.iter().all(|g| g.morphemes.len() == 2));
    }

    #[test]
    fn compact_gloss_empty_slot_yields_nothing() {
        let compact = CompactGloss {
            form: Some("abc".to_string()),
            ps: BTreeSet::new(),
            gloss: None,
            morphemes: vec![vec![Gloss::nullgloss("ab")], vec![]],
        };
        assert!(compact.expand().is_empty());
    }

    #[test]
    fn display_round_trips_the_shape() {
        let g = Gloss::new(
            "abc",
            ["n"],
            "dog-PL",
            vec![
                Gloss::new("ab", ["n"], "dog", vec![]),
                Gloss::new("c", ["mrph"], "PL", vec![]),
            ],
        );
        assert_eq!(g.to_string(), "abc:n:dog-PL [ab:n:dog c:mrph:PL]");
    }
}
