// Dictionary lookup and composite-word segmentation.

use gloss_core::template::GlossTemplate;
use gloss_core::{Gloss, detone};

use crate::dictionary::Dictionary;

/// Look up the candidate glosses for a query gloss.
///
/// Tries the exact form first, then its tone-stripped spelling through the
/// detoned index. Found candidates are filtered against the query's own
/// ps/gloss constraints (form unconstrained), so a query that already
/// carries tags only accepts compatible entries.
pub fn lookup_gloss<D: Dictionary + ?Sized>(query: &Gloss, dict: &D) -> Vec<Gloss> {
    let Some(form) = query.form.as_deref() else {
        return Vec::new();
    };
    let mut found: Vec<&Gloss> = dict.lookup(form).iter().collect();
    if found.is_empty() {
        found = dict.lookup_detoned(&detone(form));
    }
    let filter = GlossTemplate::ps_gloss_filter(&query.ps, query.gloss.as_deref());
    found
        .into_iter()
        .filter(|candidate| filter.matches(candidate, true))
        .cloned()
        .collect()
}

/// Segment an unlisted composite form into exactly `num_parts` pieces that
/// are all dictionary keys and concatenate back to the form.
///
/// Backtracking search: at each step every dictionary-known prefix of the
/// remaining suffix is tried, longest first, and every full segmentation
/// is collected, not merely the first. Each returned morpheme carries only
/// its literal form; ps and gloss are filled in by a later pattern union.
pub fn parse_composite<D: Dictionary + ?Sized>(
    form: &str,
    dict: &D,
    num_parts: usize,
) -> Vec<Vec<Gloss>> {
    let mut segmentations = Vec::new();
    if num_parts == 0 || form.is_empty() {
        return segmentations;
    }
    if num_parts == 1 {
        if dict.contains(form) {
            segmentations.push(vec![Gloss::nullgloss(form)]);
        }
        return segmentations;
    }
    for prefix in dict.iter_prefixes(form).into_iter().rev() {
        if prefix.len() == form.len() {
            // The whole form as one piece leaves nothing for the rest.
            continue;
        }
        for mut rest in parse_composite(&form[prefix.len()..], dict, num_parts - 1) {
            let mut parts = Vec::with_capacity(num_parts);
            parts.push(Gloss::nullgloss(prefix));
            parts.append(&mut rest);
            segmentations.push(parts);
        }
    }
    segmentations
}
