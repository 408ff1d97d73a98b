//! Rule-driven morphological analysis engine.
//!
//! Binds a read-only [`GlossDictionary`](dictionary::GlossDictionary) and a
//! compiled [`Grammar`](grammar::Grammar) into a
//! [`Processor`](processor::Processor) whose `lemmatize` turns one surface
//! word into candidate analyses. The engine is fully synchronous and all
//! loaded structures are immutable, so independent words may be analyzed
//! from as many threads as desired.
//!
//! # Architecture
//!
//! - [`dictionary`] -- Word-form dictionary with detoned and prefix indexes
//! - [`lookup`] -- Dictionary lookup and composite-word segmentation
//! - [`grammar`] -- The declarative rule-file DSL: lexer, parser, compiled plan
//! - [`processor`] -- Staged combinator pipeline executing a plan

pub mod dictionary;
pub mod grammar;
pub mod lookup;
pub mod processor;

pub use dictionary::{Dictionary, DictionaryError, GlossDictionary};
pub use grammar::{Grammar, GrammarError};
pub use processor::Processor;
