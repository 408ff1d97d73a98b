// gloss-detone: strip tone marks from stdin lines.
//
// Usage:
//   gloss-detone [WORD...]
//
// With arguments, detones each argument; otherwise filters stdin.

use std::io::{self, BufRead, Write};

use gloss_core::detone;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if gloss_cli::wants_help(&args) {
        println!("gloss-detone: Strip tone marks from words.");
        println!();
        println!("Usage: gloss-detone [WORD...]");
        println!();
        println!("With WORD arguments, prints each detoned; otherwise");
        println!("reads lines from stdin and prints them detoned.");
        return;
    }

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    if args.is_empty() {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let _ = writeln!(out, "{}", detone(&line));
        }
    } else {
        for word in &args {
            let _ = writeln!(out, "{}", detone(word));
        }
    }
}
