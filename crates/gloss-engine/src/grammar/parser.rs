// Recursive-descent parser over the lexed token stream.
//
// Produces the compiled plan and pattern sections. Combinator names are
// resolved against the closed vocabulary here, at load time; an unknown
// name never survives to execution.

use std::collections::BTreeSet;

use gloss_core::template::{FieldSpec, FormMatcher, GlossTemplate};
use gloss_core::{Gloss, Pattern};
use hashbrown::HashMap;

use super::lexer::{Tok, lex, lex_line};
use super::{
    Grammar, GrammarError, PlanStep, ReturnPred, SectionBinding, StageFunc, StageInstruction,
    StageOp,
};

/// Token cursor over one line.
struct Cursor<'a> {
    toks: &'a [Tok],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(toks: &'a [Tok], line: usize) -> Self {
        Self { toks, pos: 0, line }
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn next(&mut self) -> Option<&Tok> {
        let tok = self.toks.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn skip_space(&mut self) {
        while self.peek() == Some(&Tok::Space) {
            self.pos += 1;
        }
    }

    fn syntax(&self, message: impl Into<String>) -> GrammarError {
        GrammarError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    /// Take the next word (name or number), skipping leading spacing.
    fn take_word(&mut self, what: &str) -> Result<String, GrammarError> {
        self.skip_space();
        match self.next() {
            Some(Tok::Name(s)) => Ok(s.clone()),
            Some(Tok::Number(n)) => Ok(n.to_string()),
            _ => Err(self.syntax(format!("expected {what}"))),
        }
    }

    /// Expect an exact token with no spacing skipped.
    fn expect(&mut self, tok: &Tok, what: &str) -> Result<(), GrammarError> {
        if self.peek() == Some(tok) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.syntax(format!("expected {what}")))
        }
    }

    fn expect_end(&mut self) -> Result<(), GrammarError> {
        self.skip_space();
        if self.pos < self.toks.len() {
            Err(self.syntax("unexpected trailing tokens"))
        } else {
            Ok(())
        }
    }
}

/// Which block the line-level parser is currently inside.
enum Block {
    None,
    Plan,
    Level(String),
    Section(String),
}

pub(super) fn parse_grammar(text: &str) -> Result<Grammar, GrammarError> {
    let lines = lex(text)?;
    let mut plan: HashMap<String, Vec<PlanStep>> = HashMap::new();
    let mut sections: HashMap<String, Vec<Pattern>> = HashMap::new();
    // Section references are checked after the whole file is read, so a
    // plan may name sections defined further down.
    let mut section_refs: Vec<(usize, String)> = Vec::new();
    let mut block = Block::None;

    for line in &lines {
        let mut cur = Cursor::new(&line.toks, line.number);
        let keyword = cur.take_word("a directive")?;
        match keyword.as_str() {
            "plan" => {
                cur.expect_end()?;
                block = Block::Plan;
            }
            "for" => {
                if matches!(block, Block::None | Block::Section(_)) {
                    return Err(cur.syntax("`for` outside a `plan` block"));
                }
                let level = cur.take_word("a level name")?;
                cur.expect(&Tok::Colon, "`:` after level name")?;
                cur.expect_end()?;
                if plan.contains_key(&level) {
                    return Err(GrammarError::Duplicate {
                        line: line.number,
                        what: "level",
                        name: level,
                    });
                }
                plan.insert(level.clone(), Vec::new());
                block = Block::Level(level);
            }
            "stage" => {
                let Block::Level(level) = &block else {
                    return Err(cur.syntax("`stage` outside a `for` block"));
                };
                let instr = parse_stage(&mut cur, &mut section_refs)?;
                plan.get_mut(level).unwrap().push(PlanStep::Stage(instr));
            }
            "return" => {
                let Block::Level(level) = &block else {
                    return Err(cur.syntax("`return` outside a `for` block"));
                };
                if cur.take_word("`if`")? != "if" {
                    return Err(cur.syntax("expected `if` after `return`"));
                }
                let pred = match cur.take_word("a predicate")?.as_str() {
                    "parsed" => ReturnPred::Parsed,
                    "unparsed" => ReturnPred::Unparsed,
                    other => return Err(cur.syntax(format!("unknown predicate `{other}`"))),
                };
                cur.expect_end()?;
                plan.get_mut(level).unwrap().push(PlanStep::ReturnIf(pred));
            }
            "section" => {
                let name = cur.take_word("a section name")?;
                cur.expect_end()?;
                if sections.contains_key(&name) {
                    return Err(GrammarError::Duplicate {
                        line: line.number,
                        what: "section",
                        name,
                    });
                }
                sections.insert(name.clone(), Vec::new());
                block = Block::Section(name);
            }
            "pattern" => {
                let Block::Section(name) = &block else {
                    return Err(cur.syntax("`pattern` outside a `section` block"));
                };
                let select = parse_template_expr(&mut cur)?;
                cur.skip_space();
                cur.expect(&Tok::Pipe, "`|` between select and mark")?;
                let mark_template = parse_template_expr(&mut cur)?;
                let mark = template_to_literal(&mark_template, line.number)?;
                cur.expect_end()?;
                sections
                    .get_mut(name)
                    .unwrap()
                    .push(Pattern::new(select, mark));
            }
            other => {
                return Err(cur.syntax(format!("unknown directive `{other}`")));
            }
        }
    }

    for (line, name) in section_refs {
        if !sections.contains_key(&name) {
            return Err(GrammarError::UnknownSection { line, name });
        }
    }

    Ok(Grammar::new(plan, sections))
}

fn parse_stage(
    cur: &mut Cursor<'_>,
    section_refs: &mut Vec<(usize, String)>,
) -> Result<StageInstruction, GrammarError> {
    cur.skip_space();
    let id = match cur.next() {
        Some(Tok::Number(n)) => *n,
        _ => return Err(cur.syntax("expected a stage id")),
    };

    let op_name = cur.take_word("a combinator")?;
    let op = match op_name.as_str() {
        "add" => StageOp::Add,
        "apply" => StageOp::Apply,
        _ => {
            return Err(GrammarError::UnknownCombinator {
                line: cur.line,
                name: op_name,
            });
        }
    };

    let func_name = cur.take_word("a combinator")?;
    let func = match func_name.as_str() {
        "lookup" => {
            cur.expect_end()?;
            StageFunc::Lookup
        }
        "parallel" | "sequential" | "firstmatch" => {
            let decompose = match cur.take_word("`parse` or `decompose`")?.as_str() {
                "parse" => false,
                "decompose" => true,
                other => {
                    return Err(
                        cur.syntax(format!("expected `parse` or `decompose`, found `{other}`"))
                    );
                }
            };
            let section = cur.take_word("a section name")?;
            cur.expect_end()?;
            section_refs.push((cur.line, section.clone()));
            let binding = SectionBinding { section, decompose };
            match func_name.as_str() {
                "parallel" => StageFunc::Parallel(binding),
                "sequential" => StageFunc::Sequential(binding),
                _ => StageFunc::FirstMatch(binding),
            }
        }
        _ => {
            return Err(GrammarError::UnknownCombinator {
                line: cur.line,
                name: func_name,
            });
        }
    };

    Ok(StageInstruction { id, op, func })
}

/// Parse one gloss expression: `form:ps1/ps2:gloss` with an optional
/// bracketed morpheme list. Fields are compact (no internal spacing);
/// spacing separates sibling expressions inside brackets.
fn parse_template_expr(cur: &mut Cursor<'_>) -> Result<GlossTemplate, GrammarError> {
    cur.skip_space();
    let form = parse_field_opt(cur)?;
    cur.expect(&Tok::Colon, "`:` after form")?;

    let mut ps = BTreeSet::new();
    while matches!(cur.peek(), Some(Tok::Name(_)) | Some(Tok::Number(_))) {
        let tag = match cur.next() {
            Some(Tok::Name(s)) => s.clone(),
            Some(Tok::Number(n)) => n.to_string(),
            _ => unreachable!(),
        };
        ps.insert(tag);
        if cur.peek() == Some(&Tok::Slash) {
            cur.pos += 1;
        } else {
            break;
        }
    }
    cur.expect(&Tok::Colon, "`:` after part-of-speech tags")?;

    let gloss = parse_field_opt(cur)?;

    let mut morphemes = Vec::new();
    let save = cur.pos;
    cur.skip_space();
    if cur.peek() == Some(&Tok::LBracket) {
        cur.pos += 1;
        loop {
            cur.skip_space();
            match cur.peek() {
                Some(Tok::RBracket) => {
                    cur.pos += 1;
                    break;
                }
                None => return Err(cur.syntax("unterminated morpheme list")),
                _ => morphemes.push(parse_template_expr(cur)?),
            }
        }
    } else {
        cur.pos = save;
    }

    Ok(GlossTemplate {
        form,
        ps,
        gloss,
        morphemes,
    })
}

/// An optional field directly at the cursor: a literal name/number or a
/// `{...}` matcher. Spacing stops the field (it belongs to the next
/// sibling expression instead).
fn parse_field_opt(cur: &mut Cursor<'_>) -> Result<Option<FieldSpec>, GrammarError> {
    let tok = cur.peek().cloned();
    match tok {
        Some(Tok::Name(s)) => {
            cur.pos += 1;
            Ok(Some(FieldSpec::Literal(s)))
        }
        Some(Tok::Number(n)) => {
            cur.pos += 1;
            Ok(Some(FieldSpec::Literal(n.to_string())))
        }
        Some(Tok::Matcher(body)) => {
            cur.pos += 1;
            let matcher = FormMatcher::from_source(&body).map_err(|e| GrammarError::Template {
                line: cur.line,
                source: e,
            })?;
            Ok(Some(FieldSpec::Matcher(matcher)))
        }
        _ => Ok(None),
    }
}

/// Convert a parsed expression to a concrete gloss; matcher fields are
/// rejected (they are only meaningful on the select side).
fn template_to_literal(template: &GlossTemplate, line: usize) -> Result<Gloss, GrammarError> {
    fn literal_field(
        field: &Option<FieldSpec>,
        line: usize,
    ) -> Result<Option<String>, GrammarError> {
        match field {
            None => Ok(None),
            Some(FieldSpec::Literal(s)) => Ok(Some(s.clone())),
            Some(FieldSpec::Matcher(_)) => Err(GrammarError::MatcherInMark { line }),
        }
    }

    let mut morphemes = Vec::with_capacity(template.morphemes.len());
    for child in &template.morphemes {
        morphemes.push(template_to_literal(child, line)?);
    }
    Ok(Gloss {
        form: literal_field(&template.form, line)?,
        ps: template.ps.clone(),
        gloss: literal_field(&template.gloss, line)?,
        morphemes,
    })
}

/// Parse a single gloss expression with literal fields only, as used by
/// the dictionary text loader. `line` is reported in errors.
pub fn parse_gloss_literal(text: &str, line: usize) -> Result<Gloss, GrammarError> {
    let toks = lex_line(text, line)?;
    let mut cur = Cursor::new(&toks, line);
    let template = parse_template_expr(&mut cur)?;
    cur.expect_end()?;
    template_to_literal(&template, line)
}
