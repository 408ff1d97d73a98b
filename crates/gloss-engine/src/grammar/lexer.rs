// Line lexer for the grammar rule-file DSL.
//
// Classifies characters into a small token vocabulary: names, numbers,
// punctuation, brace-delimited matcher literals, and explicit spacing.
// Comments (`#` to end of line) and blank lines are discarded. Spacing is
// kept as a token because it separates sibling gloss expressions.

use super::GrammarError;

/// One lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tok {
    /// Identifier, keyword, form, tag or gloss text.
    Name(String),
    /// A run of ASCII digits (stage identifiers).
    Number(i32),
    /// Raw body of a `{...}` matcher literal.
    Matcher(String),
    Colon,
    Slash,
    Pipe,
    LBracket,
    RBracket,
    /// A run of whitespace between tokens.
    Space,
}

/// One non-empty source line with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub toks: Vec<Tok>,
}

/// Characters allowed inside a name token. Besides letters and digits this
/// admits the punctuation that occurs in word forms and gloss texts, and
/// combining diacritics so tone-marked forms lex as single names.
fn is_name_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(c, '_' | '.' | '-' | '\'' | '\u{2019}' | '*')
        || ('\u{0300}'..='\u{036F}').contains(&c)
}

/// Lex a whole rule file into its non-empty lines.
pub fn lex(text: &str) -> Result<Vec<Line>, GrammarError> {
    let mut lines = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let number = i + 1;
        let toks = lex_line(raw, number)?;
        if !toks.is_empty() {
            lines.push(Line { number, toks });
        }
    }
    Ok(lines)
}

/// Lex a single line. Leading/trailing spacing is dropped and interior
/// spacing runs collapse into single [`Tok::Space`] tokens.
pub fn lex_line(raw: &str, number: usize) -> Result<Vec<Tok>, GrammarError> {
    let mut toks: Vec<Tok> = Vec::new();
    let mut chars = raw.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c == '#' {
            break;
        }
        if c.is_whitespace() {
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            if !toks.is_empty() {
                toks.push(Tok::Space);
            }
            continue;
        }
        match c {
            '{' => {
                chars.next();
                let mut body = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => body.push(ch),
                        None => {
                            return Err(GrammarError::UnterminatedMatcher { line: number });
                        }
                    }
                }
                toks.push(Tok::Matcher(body));
            }
            ':' => {
                chars.next();
                toks.push(Tok::Colon);
            }
            '/' => {
                chars.next();
                toks.push(Tok::Slash);
            }
            '|' => {
                chars.next();
                toks.push(Tok::Pipe);
            }
            '[' => {
                chars.next();
                toks.push(Tok::LBracket);
            }
            ']' => {
                chars.next();
                toks.push(Tok::RBracket);
            }
            c if is_name_char(c) => {
                let mut name = String::new();
                while chars.peek().copied().is_some_and(is_name_char) {
                    name.push(chars.next().unwrap());
                }
                if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
                    let value = name.parse::<i32>().map_err(|_| GrammarError::Syntax {
                        line: number,
                        message: format!("number `{name}` out of range"),
                    })?;
                    toks.push(Tok::Number(value));
                } else {
                    toks.push(Tok::Name(name));
                }
            }
            other => {
                return Err(GrammarError::UnexpectedChar {
                    line: number,
                    ch: other,
                });
            }
        }
    }

    while toks.last() == Some(&Tok::Space) {
        toks.pop();
    }
    Ok(toks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_stage_line() {
        let toks = lex_line("  stage 0 add lookup  # seed from dictionary", 1).unwrap();
        assert_eq!(
            toks,
            vec![
                Tok::Name("stage".into()),
                Tok::Space,
                Tok::Number(0),
                Tok::Space,
                Tok::Name("add".into()),
                Tok::Space,
                Tok::Name("lookup".into()),
            ]
        );
    }

    #[test]
    fn lexes_pattern_line() {
        let toks = lex_line(":v: [{.+|ra}] | :v: [:v: :mrph:PFV]", 2).unwrap();
        assert!(toks.contains(&Tok::Matcher(".+|ra".into())));
        assert!(toks.contains(&Tok::Pipe));
        assert_eq!(toks.first(), Some(&Tok::Colon));
    }

    #[test]
    fn comment_only_and_blank_lines_vanish() {
        let lines = lex("# header\n\n   \nplan\n").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].number, 4);
    }

    #[test]
    fn tone_marked_forms_are_single_names() {
        let toks = lex_line("jàkúma:n:cat", 1).unwrap();
        assert_eq!(toks[0], Tok::Name("jàkúma".into()));
    }

    #[test]
    fn unterminated_matcher_is_fatal() {
        assert!(matches!(
            lex_line("pattern {oops", 7),
            Err(GrammarError::UnterminatedMatcher { line: 7 })
        ));
    }

    #[test]
    fn unexpected_character_is_fatal() {
        assert!(matches!(
            lex_line("stage 0 add ;", 3),
            Err(GrammarError::UnexpectedChar { line: 3, ch: ';' })
        ));
    }
}
