// The declarative grammar DSL: compiled plan and pattern sections.
//
// A rule file has two kinds of blocks. The `plan` block lists, per token
// level, an ordered sequence of combinator stages and early-return
// predicates. `section` blocks carry named, ordered lists of
// select/mark rewrite patterns referenced by the stages. The whole file
// is compiled once at load time; any malformed input is fatal and no
// partial grammar is ever produced.

mod lexer;
mod parser;

pub use lexer::{Line, Tok, lex, lex_line};
pub use parser::parse_gloss_literal;

use gloss_core::{Gloss, Pattern, TemplateError};
use hashbrown::HashMap;

/// Error type for grammar-file loading. All variants abort the load.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("line {line}: unexpected character `{ch}`")]
    UnexpectedChar { line: usize, ch: char },

    #[error("line {line}: unterminated matcher literal")]
    UnterminatedMatcher { line: usize },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unknown combinator `{name}`")]
    UnknownCombinator { line: usize, name: String },

    #[error("line {line}: reference to unknown pattern section `{name}`")]
    UnknownSection { line: usize, name: String },

    #[error("line {line}: duplicate {what} `{name}`")]
    Duplicate {
        line: usize,
        what: &'static str,
        name: String,
    },

    #[error("line {line}: matcher literal not allowed in a mark gloss")]
    MatcherInMark { line: usize },

    #[error("line {line}: {source}")]
    Template {
        line: usize,
        #[source]
        source: TemplateError,
    },

    #[error("grammar defines no plan for level `{level}`")]
    MissingLevel { level: String },
}

/// How a stage folds its function's outputs into the candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOp {
    /// Grow the list: keep every input and append new outputs.
    Add,
    /// Transform the list: replace each input by its outputs, passing
    /// unproductive inputs through unchanged.
    Apply,
}

/// Which pattern section a combinator runs, and whether composite
/// segmentation precedes pattern application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBinding {
    pub section: String,
    pub decompose: bool,
}

/// The per-candidate function a stage evaluates, resolved from the closed
/// combinator vocabulary at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageFunc {
    /// Dictionary lookup (atomic or per-morpheme recombination).
    Lookup,
    /// Try every pattern in the section, collecting all successes.
    Parallel(SectionBinding),
    /// Fold the patterns left to right over the latest success;
    /// non-matching patterns are skipped.
    Sequential(SectionBinding),
    /// Stop at the first pattern that applies.
    FirstMatch(SectionBinding),
}

/// One `stage` line of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInstruction {
    pub id: i32,
    pub op: StageOp,
    pub func: StageFunc,
}

/// Predicate of a `return if` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnPred {
    Parsed,
    Unparsed,
}

impl ReturnPred {
    pub fn eval(&self, gloss: &Gloss) -> bool {
        match self {
            ReturnPred::Parsed => gloss.is_parsed(),
            ReturnPred::Unparsed => !gloss.is_parsed(),
        }
    }
}

/// One step in a level's plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    Stage(StageInstruction),
    ReturnIf(ReturnPred),
}

/// A compiled rule file: per-level plans plus named pattern sections.
/// Immutable after loading.
#[derive(Debug, Clone)]
pub struct Grammar {
    plan: HashMap<String, Vec<PlanStep>>,
    sections: HashMap<String, Vec<Pattern>>,
}

impl Grammar {
    /// Compile a rule file. Any lexical or structural problem, unknown
    /// combinator name, or dangling section reference is a fatal error.
    pub fn load(text: &str) -> Result<Self, GrammarError> {
        parser::parse_grammar(text)
    }

    pub(crate) fn new(
        plan: HashMap<String, Vec<PlanStep>>,
        sections: HashMap<String, Vec<Pattern>>,
    ) -> Self {
        Self { plan, sections }
    }

    /// The ordered plan steps for a token level, if the grammar has one.
    pub fn plan_for(&self, level: &str) -> Option<&[PlanStep]> {
        self.plan.get(level).map(Vec::as_slice)
    }

    /// The ordered patterns of a named section.
    pub fn section(&self, name: &str) -> Option<&[Pattern]> {
        self.sections.get(name).map(Vec::as_slice)
    }

    /// Token levels this grammar has plans for.
    pub fn levels(&self) -> impl Iterator<Item = &str> {
        self.plan.keys().map(String::as_str)
    }
}
