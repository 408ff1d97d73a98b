// Word-form dictionary: exact map, detoned reverse index, prefix iteration.
//
// Built once, read-only for the lifetime of a parsing session. Hot
// reloading, when needed, is an atomic swap of a freshly built dictionary.

use std::io::BufRead;
use std::path::Path;

use gloss_core::{Gloss, detone};
use hashbrown::HashMap;

use crate::grammar::parse_gloss_literal;

/// Error type for dictionary construction. Malformed entries are not
/// errors: they are logged and skipped so one bad line cannot take down
/// the whole dictionary.
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("failed to read dictionary source: {0}")]
    Io(#[from] std::io::Error),
}

/// The lookup seam the engine consumes. How the structure is populated is
/// the caller's business; the engine only reads.
pub trait Dictionary {
    /// Candidate glosses stored under an exact form.
    fn lookup(&self, form: &str) -> &[Gloss];

    /// Candidate glosses stored under any form whose tone-stripped
    /// spelling equals `detoned`.
    fn lookup_detoned(&self, detoned: &str) -> Vec<&Gloss>;

    /// Whether the exact form is a dictionary key.
    fn contains(&self, form: &str) -> bool;

    /// All prefixes of `word` that are dictionary keys, shortest first.
    fn iter_prefixes<'w>(&self, word: &'w str) -> Vec<&'w str>;
}

/// Prefix-indexed dictionary mapping word forms to candidate gloss lists.
/// Insertion order within an entry is preserved and duplicates are kept.
#[derive(Debug, Clone, Default)]
pub struct GlossDictionary {
    entries: HashMap<String, Vec<Gloss>>,
    /// detoned form -> keys of `entries` sharing that spelling
    detoned: HashMap<String, Vec<String>>,
}

impl GlossDictionary {
    /// Build from in-memory glosses. Each gloss must carry a form; glosses
    /// without one are logged and skipped.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Gloss>,
    {
        let mut dict = Self::default();
        for gloss in entries {
            dict.insert(gloss);
        }
        dict
    }

    /// Build from a line-oriented text source: one gloss expression per
    /// line (`form:ps1/ps2:gloss`, optional bracketed morphemes), `#`
    /// comments and blank lines ignored. Malformed entries are logged via
    /// `tracing` and skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, DictionaryError> {
        let mut dict = Self::default();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let number = i + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match parse_gloss_literal(trimmed, number) {
                Ok(gloss) => dict.insert(gloss),
                Err(error) => {
                    tracing::warn!(line = number, %error, "skipping malformed dictionary entry");
                }
            }
        }
        Ok(dict)
    }

    /// Load a dictionary source file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    fn insert(&mut self, gloss: Gloss) {
        let Some(form) = gloss.form.clone() else {
            tracing::warn!("skipping dictionary entry without a form");
            return;
        };
        let stripped = detone(&form);
        let keys = self.detoned.entry(stripped).or_default();
        if !keys.contains(&form) {
            keys.push(form.clone());
        }
        self.entries.entry(form).or_default().push(gloss);
    }

    /// Number of distinct word forms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Dictionary for GlossDictionary {
    fn lookup(&self, form: &str) -> &[Gloss] {
        self.entries.get(form).map(Vec::as_slice).unwrap_or(&[])
    }

    fn lookup_detoned(&self, detoned_form: &str) -> Vec<&Gloss> {
        let mut found = Vec::new();
        if let Some(keys) = self.detoned.get(detoned_form) {
            for key in keys {
                if let Some(glosses) = self.entries.get(key) {
                    found.extend(glosses.iter());
                }
            }
        }
        found
    }

    fn contains(&self, form: &str) -> bool {
        self.entries.contains_key(form)
    }

    fn iter_prefixes<'w>(&self, word: &'w str) -> Vec<&'w str> {
        let mut prefixes = Vec::new();
        for (end, _) in word.char_indices().skip(1) {
            if self.entries.contains_key(&word[..end]) {
                prefixes.push(&word[..end]);
            }
        }
        if self.entries.contains_key(word) {
            prefixes.push(word);
        }
        prefixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GlossDictionary {
        GlossDictionary::from_entries([
            Gloss::new("sà", ["n"], "snake", vec![]),
            Gloss::new("sà", ["v"], "die", vec![]),
            Gloss::new("sa", ["n"], "grasshopper", vec![]),
            Gloss::new("ra", ["mrph"], "PFV", vec![]),
        ])
    }

    #[test]
    fn preserves_insertion_order_and_duplicates() {
        let dict = GlossDictionary::from_entries([
            Gloss::new("ab", ["n"], "one", vec![]),
            Gloss::new("ab", ["n"], "two", vec![]),
            Gloss::new("ab", ["n"], "one", vec![]),
        ]);
        let glosses = dict.lookup("ab");
        let texts: Vec<_> = glosses.iter().map(|g| g.gloss.as_deref().unwrap()).collect();
        assert_eq!(texts, vec!["one", "two", "one"]);
    }

    #[test]
    fn detoned_index_reaches_all_marked_keys() {
        let dict = sample();
        assert!(dict.lookup("sa\u{0300}ra").is_empty());
        let detoned: Vec<_> = dict
            .lookup_detoned("sa")
            .into_iter()
            .map(|g| g.gloss.as_deref().unwrap())
            .collect();
        // Both the tone-marked and the unmarked key detone to "sa".
        assert_eq!(detoned.len(), 3);
        assert!(detoned.contains(&"snake"));
        assert!(detoned.contains(&"grasshopper"));
    }

    #[test]
    fn prefix_iteration_is_shortest_first_and_exact() {
        let dict = GlossDictionary::from_entries([
            Gloss::new("a", ["n"], "x", vec![]),
            Gloss::new("ab", ["n"], "y", vec![]),
            Gloss::new("abc", ["n"], "z", vec![]),
        ]);
        assert_eq!(dict.iter_prefixes("abcd"), vec!["a", "ab", "abc"]);
        assert_eq!(dict.iter_prefixes("abc"), vec!["a", "ab", "abc"]);
        assert_eq!(dict.iter_prefixes("ba"), Vec::<&str>::new());
    }

    #[test]
    fn loader_skips_malformed_entries() {
        let source = "\
# demo dictionary
sà:n:snake
this line is hopeless
ra:mrph:PFV
";
        let dict = GlossDictionary::from_reader(source.as_bytes()).unwrap();
        assert_eq!(dict.len(), 2);
        assert!(dict.contains("sà"));
        assert!(dict.contains("ra"));
    }

    #[test]
    fn loader_reads_segmented_entries() {
        let source = "saraw:n:snake-PFV-PL [sa:n:snake ra:mrph:PFV w:mrph:PL]\n";
        let dict = GlossDictionary::from_reader(source.as_bytes()).unwrap();
        assert_eq!(dict.lookup("saraw")[0].morphemes.len(), 3);
    }
}
