// gloss-cli: shared utilities for the command-line tools.

use std::path::PathBuf;
use std::process;

use gloss_engine::{GlossDictionary, Grammar, Processor};

/// Default dictionary source file name.
const DICT_FILE: &str = "lexicon.txt";

/// Default grammar rule file name.
const GRAMMAR_FILE: &str = "grammar.txt";

/// Locate data files and build a processor.
///
/// Search order for each file:
/// 1. Explicit `--dict`/`--grammar` argument (if provided)
/// 2. `GLOSS_DATA_PATH` environment variable (directory)
/// 3. `~/.gloss`
/// 4. Current working directory
pub fn load_processor(
    dict_path: Option<&str>,
    grammar_path: Option<&str>,
) -> Result<Processor, String> {
    let dict_file = find_file(dict_path, DICT_FILE)?;
    let grammar_file = find_file(grammar_path, GRAMMAR_FILE)?;

    let dictionary = GlossDictionary::from_path(&dict_file)
        .map_err(|e| format!("failed to load {}: {}", dict_file.display(), e))?;
    let text = std::fs::read_to_string(&grammar_file)
        .map_err(|e| format!("failed to read {}: {}", grammar_file.display(), e))?;
    let grammar = Grammar::load(&text)
        .map_err(|e| format!("failed to compile {}: {}", grammar_file.display(), e))?;

    Processor::new(dictionary, grammar).map_err(|e| format!("failed to bind processor: {e}"))
}

fn find_file(explicit: Option<&str>, default_name: &str) -> Result<PathBuf, String> {
    let candidates = build_search_paths(explicit, default_name);
    for path in &candidates {
        if path.is_file() {
            return Ok(path.clone());
        }
    }
    Err(format!(
        "could not find {} in any of the search paths:\n{}",
        default_name,
        candidates
            .iter()
            .map(|p| format!("  - {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n")
    ))
}

fn build_search_paths(explicit: Option<&str>, default_name: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. Explicit path from argument (a file, or a directory containing it)
    if let Some(p) = explicit {
        let p = PathBuf::from(p);
        if p.is_dir() {
            paths.push(p.join(default_name));
        } else {
            paths.push(p);
        }
    }

    // 2. GLOSS_DATA_PATH environment variable
    if let Ok(env_path) = std::env::var("GLOSS_DATA_PATH") {
        paths.push(PathBuf::from(&env_path).join(default_name));
    }

    // 3. Home directory
    if let Some(home) = home_dir() {
        paths.push(home.join(".gloss").join(default_name));
    }

    // 4. Current directory (fallback for local development)
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(default_name));
    }

    paths
}

/// Get the user's home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

/// Parse a `--NAME=VALUE` / `--NAME VALUE` / short `-X VALUE` option out
/// of the argument list. Returns `(value, remaining_args)`.
pub fn parse_opt(args: &[String], long: &str, short: &str) -> (Option<String>, Vec<String>) {
    let long_eq = format!("--{long}=");
    let long_flag = format!("--{long}");
    let mut value = None;
    let mut remaining = Vec::new();
    let mut skip_next = false;

    for (i, arg) in args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if let Some(v) = arg.strip_prefix(&long_eq) {
            value = Some(v.to_string());
        } else if arg == &long_flag || arg == short {
            if i + 1 < args.len() {
                value = Some(args[i + 1].clone());
                skip_next = true;
            } else {
                eprintln!("error: {arg} requires a value");
                process::exit(1);
            }
        } else {
            remaining.push(arg.clone());
        }
    }

    (value, remaining)
}

/// Check whether the args request help.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "-h" || a == "--help")
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}
