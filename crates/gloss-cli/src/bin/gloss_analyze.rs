// gloss-analyze: morphological analysis of words from argv or stdin.
//
// Prints every candidate analysis for each word together with the plan
// stage that accepted it.
//
// Usage:
//   gloss-analyze [-d DICT] [-g GRAMMAR] [--json] [WORD...]
//
// Options:
//   -d, --dict PATH      Dictionary source file (or directory holding lexicon.txt)
//   -g, --grammar PATH   Grammar rule file (or directory holding grammar.txt)
//   --json               Emit one JSON object per word instead of text
//   -h, --help           Print help

use std::io::{self, BufRead, Write};

use gloss_core::Gloss;
use gloss_engine::Processor;
use serde::Serialize;

#[derive(Serialize)]
struct WordResult<'a> {
    word: &'a str,
    stage: i32,
    candidates: &'a [Gloss],
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (dict_path, args) = gloss_cli::parse_opt(&args, "dict", "-d");
    let (grammar_path, args) = gloss_cli::parse_opt(&args, "grammar", "-g");

    if gloss_cli::wants_help(&args) {
        println!("gloss-analyze: Rule-based morphological analysis.");
        println!();
        println!("Usage: gloss-analyze [-d DICT] [-g GRAMMAR] [--json] [WORD...]");
        println!();
        println!("If WORD arguments are given, analyzes each word.");
        println!("Otherwise reads words from stdin (one per line).");
        println!();
        println!("Options:");
        println!("  -d, --dict PATH      Dictionary source file");
        println!("  -g, --grammar PATH   Grammar rule file");
        println!("  --json               Emit one JSON object per word");
        println!("  -h, --help           Print this help");
        return;
    }

    let json = args.iter().any(|a| a == "--json");
    let words: Vec<String> = args.into_iter().filter(|a| !a.starts_with('-')).collect();

    let processor = gloss_cli::load_processor(dict_path.as_deref(), grammar_path.as_deref())
        .unwrap_or_else(|e| gloss_cli::fatal(&e));

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    if words.is_empty() {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let word = line.trim();
            if !word.is_empty() {
                analyze_word(word, &processor, json, &mut out);
            }
        }
    } else {
        for word in &words {
            analyze_word(word, &processor, json, &mut out);
        }
    }
}

fn analyze_word(
    word: &str,
    processor: &Processor,
    json: bool,
    out: &mut io::BufWriter<io::StdoutLock<'_>>,
) {
    let (stage, candidates) = processor.lemmatize(word);
    if json {
        let result = WordResult {
            word,
            stage,
            candidates: &candidates,
        };
        match serde_json::to_string(&result) {
            Ok(line) => {
                let _ = writeln!(out, "{line}");
            }
            Err(e) => gloss_cli::fatal(&format!("failed to serialize result: {e}")),
        }
        return;
    }

    let _ = writeln!(out, "{word}: stage {stage}");
    for (i, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, candidate);
    }
}
