//! CNF-form TPTP parser
//!
//! Parses `cnf(name, role, clause).` statements into clauses over a fresh
//! `LogicContext`. Parsing happens in two phases: nom combinators build a
//! name-based AST, and a builder interns symbols and terms, recording
//! occurrence counts for precedence generation along the way.

use crate::error::{ProverError, Result};
use crate::logic::literal::Literal;
use crate::logic::{Clause, ClauseRole, LogicContext, TermId};
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while, take_while1},
    character::complete::{char, multispace1},
    combinator::{map, opt, recognize, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, tuple},
    IResult,
};
use std::collections::HashMap;
use std::path::Path;

/// Parsed problem: the populated context and its input clauses
#[derive(Debug)]
pub struct ParsedProblem {
    pub ctx: LogicContext,
    pub clauses: Vec<Clause>,
}

// =============================================================================
// AST
// =============================================================================

#[derive(Debug, Clone)]
enum PTerm {
    Var(String),
    App(String, Vec<PTerm>),
}

#[derive(Debug, Clone)]
enum PAtom {
    Pred(String, Vec<PTerm>),
    Eq(PTerm, PTerm),
}

#[derive(Debug, Clone)]
struct PLiteral {
    positive: bool,
    atom: PAtom,
}

#[derive(Debug, Clone)]
struct PClause {
    name: String,
    role: String,
    literals: Vec<PLiteral>,
}

// =============================================================================
// Lexing helpers
// =============================================================================

/// Whitespace and `%` line comments
fn sp(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), pair(char('%'), opt(is_not("\n")))),
        ))),
    )(input)
}

fn token<'a, O>(
    mut inner: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    move |input| {
        let (input, _) = sp(input)?;
        inner(input)
    }
}

fn lower_word(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_lowercase()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn upper_word(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_uppercase() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn dollar_word(input: &str) -> IResult<&str, &str> {
    recognize(pair(char('$'), lower_word))(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('\''), is_not("'"), char('\''))(input)
}

fn numeric(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_digit())(input)
}

/// A functor or statement name
fn name(input: &str) -> IResult<&str, String> {
    map(
        alt((lower_word, dollar_word, quoted, numeric)),
        str::to_string,
    )(input)
}

// =============================================================================
// Terms and literals
// =============================================================================

fn term(input: &str) -> IResult<&str, PTerm> {
    alt((
        map(token(upper_word), |v| PTerm::Var(v.to_string())),
        map(
            tuple((
                token(name),
                opt(delimited(
                    token(char('(')),
                    separated_list1(token(char(',')), term),
                    token(char(')')),
                )),
            )),
            |(functor, args)| PTerm::App(functor, args.unwrap_or_default()),
        ),
    ))(input)
}

fn literal(input: &str) -> IResult<&str, PLiteral> {
    // Optional negation, then a term, then an optional (dis)equality tail
    let (input, negated) = opt(token(char('~')))(input)?;
    let (input, lhs) = term(input)?;
    let (input, tail) = opt(tuple((
        token(alt((tag("!="), tag("=")))),
        term,
    )))(input)?;

    let positive_sign = negated.is_none();
    let lit = match tail {
        Some((op, rhs)) => {
            let eq_positive = op == "=";
            PLiteral {
                positive: positive_sign == eq_positive,
                atom: PAtom::Eq(lhs, rhs),
            }
        }
        None => match lhs {
            PTerm::App(functor, args) => PLiteral {
                positive: positive_sign,
                atom: PAtom::Pred(functor, args),
            },
            PTerm::Var(_) => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Verify,
                )))
            }
        },
    };
    Ok((input, lit))
}

fn disjunction(input: &str) -> IResult<&str, Vec<PLiteral>> {
    separated_list1(token(char('|')), literal)(input)
}

fn clause_body(input: &str) -> IResult<&str, Vec<PLiteral>> {
    alt((
        delimited(token(char('(')), disjunction, token(char(')'))),
        disjunction,
    ))(input)
}

/// Consume everything up to the `)` closing the enclosing `cnf(`,
/// respecting nested parentheses and single-quoted atoms. The closing
/// parenthesis itself is left unconsumed.
fn skip_annotations(input: &str) -> IResult<&str, ()> {
    let mut depth = 0usize;
    let mut in_quote = false;
    for (i, c) in input.char_indices() {
        if in_quote {
            if c == '\'' {
                in_quote = false;
            }
            continue;
        }
        match c {
            '\'' => in_quote = true,
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Ok((&input[i..], ()));
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::TakeUntil,
    )))
}

fn cnf_statement(input: &str) -> IResult<&str, PClause> {
    let (input, _) = token(tag("cnf"))(input)?;
    let (input, _) = token(char('('))(input)?;
    let (input, stmt_name) = token(name)(input)?;
    let (input, _) = token(char(','))(input)?;
    let (input, role) = token(lower_word)(input)?;
    let (input, _) = token(char(','))(input)?;
    let (input, literals) = clause_body(input)?;
    // Annotations (source, useful-info) are accepted and ignored
    let (input, _) = skip_annotations(input)?;
    let (input, _) = token(char(')'))(input)?;
    let (input, _) = token(char('.'))(input)?;
    Ok((
        input,
        PClause {
            name: stmt_name,
            role: role.to_string(),
            literals,
        },
    ))
}

// =============================================================================
// Builder: AST -> clauses over a LogicContext
// =============================================================================

struct Builder {
    ctx: LogicContext,
    /// Per-clause variable numbering
    vars: HashMap<String, u32>,
}

impl Builder {
    fn new() -> Self {
        Builder {
            ctx: LogicContext::new(),
            vars: HashMap::new(),
        }
    }

    fn build_term(&mut self, t: &PTerm) -> Result<TermId> {
        match t {
            PTerm::Var(v) => {
                let next = self.vars.len() as u32;
                let n = *self.vars.entry(v.clone()).or_insert(next);
                Ok(self.ctx.var(n))
            }
            PTerm::App(functor, args) => {
                let head = self.intern_functor(functor, args.len(), false)?;
                let built: Result<Vec<TermId>> =
                    args.iter().map(|a| self.build_term(a)).collect();
                Ok(self.ctx.app(head, built?))
            }
        }
    }

    /// Intern a functor, checking that arity and kind agree with any
    /// earlier use of the same name.
    fn intern_functor(&mut self, functor: &str, arity: usize, is_pred: bool) -> Result<TermId> {
        if let Some(sym) = self.ctx.signature.get(functor) {
            if self.ctx.signature.arity(sym) != arity {
                return Err(ProverError::Type(format!(
                    "symbol '{}' used with arities {} and {}",
                    functor,
                    self.ctx.signature.arity(sym),
                    arity
                )));
            }
            let ret = if is_pred { self.ctx.otype } else { self.ctx.itype };
            let expected = self.ctx.types.arrow(vec![self.ctx.itype; arity], ret);
            if self.ctx.signature.ty(sym) != expected {
                return Err(ProverError::Type(format!(
                    "symbol '{}' used both as predicate and function",
                    functor
                )));
            }
        }
        let head = if is_pred {
            self.ctx.pred(functor, arity)
        } else if arity == 0 {
            self.ctx.const_(functor)
        } else {
            self.ctx.func(functor, arity)
        };
        if let Some(sym) = self.ctx.terms.head_symbol(head) {
            self.ctx.signature.record_occurrence(sym);
        }
        Ok(head)
    }

    fn build_literal(&mut self, lit: &PLiteral) -> Result<Option<Literal>> {
        match &lit.atom {
            PAtom::Eq(l, r) => {
                let lhs = self.build_term(l)?;
                let rhs = self.build_term(r)?;
                Ok(Some(Literal::eqn(lhs, rhs, lit.positive)))
            }
            PAtom::Pred(functor, args) => {
                // Builtin truth constants become trivial literals
                if functor == "$true" && args.is_empty() {
                    return Ok(Some(if lit.positive {
                        Literal::mk_true(&self.ctx)
                    } else {
                        Literal::mk_false(&self.ctx)
                    }));
                }
                if functor == "$false" && args.is_empty() {
                    return Ok(Some(if lit.positive {
                        Literal::mk_false(&self.ctx)
                    } else {
                        Literal::mk_true(&self.ctx)
                    }));
                }
                let head = self.intern_functor(functor, args.len(), true)?;
                let built: Result<Vec<TermId>> =
                    args.iter().map(|a| self.build_term(a)).collect();
                let atom = self.ctx.app(head, built?);
                Ok(Some(Literal::prop(&self.ctx, atom, lit.positive)))
            }
        }
    }

    fn build_clause(&mut self, pc: &PClause) -> Result<Clause> {
        self.vars.clear();
        let mut lits = Vec::with_capacity(pc.literals.len());
        for pl in &pc.literals {
            if let Some(lit) = self.build_literal(pl)? {
                lits.push(lit);
            }
        }
        let role = ClauseRole::from_tptp_role(&pc.role);
        Ok(Clause::input(&mut self.ctx, lits, &pc.name, role))
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Parse a CNF-form TPTP problem from a string
pub fn parse_problem(input: &str) -> Result<ParsedProblem> {
    let mut builder = Builder::new();
    let mut clauses = Vec::new();
    let mut rest = input;

    loop {
        let (after_ws, _) = sp(rest).map_err(|e| ProverError::Parse(e.to_string()))?;
        if after_ws.is_empty() {
            break;
        }
        if after_ws.starts_with("include") {
            return Err(ProverError::Unsupported(
                "include directives are not supported; inline the axioms".into(),
            ));
        }
        if after_ws.starts_with("fof") || after_ws.starts_with("tff") || after_ws.starts_with("thf")
        {
            return Err(ProverError::Unsupported(
                "only cnf statements are supported; run a clausifier first".into(),
            ));
        }
        match cnf_statement(after_ws) {
            Ok((next, pc)) => {
                clauses.push(builder.build_clause(&pc)?);
                rest = next;
            }
            Err(e) => {
                let context: String = after_ws.chars().take(40).collect();
                return Err(ProverError::Parse(format!("at '{}...': {}", context, e)));
            }
        }
    }

    Ok(ParsedProblem {
        ctx: builder.ctx,
        clauses,
    })
}

/// Parse a CNF-form TPTP problem from a file
pub fn parse_problem_file(path: &Path) -> Result<ParsedProblem> {
    let content = std::fs::read_to_string(path)?;
    parse_problem(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_facts() {
        let input = "
            % a comment
            cnf(c1, axiom, p(a)).
            cnf(c2, axiom, ~p(X) | q(X)).
            cnf(goal, negated_conjecture, ~q(a)).
        ";
        let parsed = parse_problem(input).unwrap();
        assert_eq!(parsed.clauses.len(), 3);
        assert_eq!(parsed.clauses[0].literals.len(), 1);
        assert_eq!(parsed.clauses[1].literals.len(), 2);
        assert_eq!(parsed.clauses[2].role, ClauseRole::NegatedConjecture);
        assert!(!parsed.clauses[2].literals[0].positive);
    }

    #[test]
    fn test_parse_equality() {
        let input = "cnf(c, axiom, f(X) = X). cnf(d, axiom, a != b).";
        let parsed = parse_problem(input).unwrap();
        assert_eq!(parsed.clauses.len(), 2);
        assert!(parsed.clauses[0].literals[0].positive);
        assert!(!parsed.clauses[1].literals[0].positive);
    }

    #[test]
    fn test_parse_parenthesized_body_and_annotations() {
        let input = "cnf(c, axiom, (p(a) | q(b)), file('x.p', c)).";
        let parsed = parse_problem(input).unwrap();
        assert_eq!(parsed.clauses[0].literals.len(), 2);
    }

    #[test]
    fn test_shared_variables_within_clause() {
        let input = "cnf(c, axiom, ~p(X) | q(X)).";
        let parsed = parse_problem(input).unwrap();
        let clause = &parsed.clauses[0];
        // Both literals mention the same variable
        assert_eq!(clause.vars(&parsed.ctx.terms).len(), 1);
    }

    #[test]
    fn test_dollar_false() {
        let input = "cnf(c, negated_conjecture, $false).";
        let parsed = parse_problem(input).unwrap();
        // The clause carries the trivially-false literal; basic
        // simplification in the engine turns it into the empty clause
        assert_eq!(parsed.clauses[0].literals.len(), 1);
        assert!(parsed.clauses[0].literals[0].is_trivially_false());
    }

    #[test]
    fn test_include_is_rejected() {
        let err = parse_problem("include('Axioms/EQ001+0.ax').").unwrap_err();
        assert!(matches!(err, ProverError::Unsupported(_)));
    }

    #[test]
    fn test_fof_is_rejected() {
        let err = parse_problem("fof(c, axiom, ![X]: p(X)).").unwrap_err();
        assert!(matches!(err, ProverError::Unsupported(_)));
    }

    #[test]
    fn test_arity_clash_is_reported() {
        let err = parse_problem("cnf(c, axiom, p(f(a))). cnf(d, axiom, p(f(a, b))).").unwrap_err();
        assert!(matches!(err, ProverError::Type(_)));
    }

    #[test]
    fn test_occurrences_recorded() {
        let input = "cnf(c, axiom, p(f(f(a)))).";
        let parsed = parse_problem(input).unwrap();
        let f = parsed.ctx.signature.get("f").unwrap();
        assert_eq!(parsed.ctx.signature.occurrences(f), 2);
    }
}
