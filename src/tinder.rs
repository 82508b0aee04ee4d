//! Tinder: the notation for feeding Kindling.
//!
//! A script is a sequence of semicolon-terminated statements. `fact` and
//! `rule` statements accumulate declarations; each `infer` statement runs a
//! fresh, independent session over everything declared so far, so the same
//! facts and rules can be put through several strategies in one script;
//! `explain` and `show` query the most recent run. Grammar details live in
//! `tinder.pest`.
//!
//! ```text
//! fact graduate-only(CS550), not-graduate-student(Carol);
//! rule graduate-only-course-restriction @7
//!   when graduate-only(?course), not-graduate-student(?student)
//!   then cannot-enroll-course(?student, ?course);
//! infer priority;
//! explain cannot-enroll-course(Carol, CS550);
//! ```

use std::str::FromStr;
use std::sync::Arc;

use pest::Parser;
use pest::error::{ErrorVariant, LineColLocation};
use pest_derive::Parser;
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::agenda::Strategy;
use crate::construct::{Fact, RuleBase, Term};
use crate::engine::{Halt, Session, TracingSink};
use crate::error::{KindlingError, Result};

#[derive(Parser)]
#[grammar = "tinder.pest"]
struct TinderParser;

// ------------- Statements -------------
#[derive(Debug)]
enum Statement {
    Facts(Vec<Term>),
    Rule {
        name: String,
        priority: i64,
        conditions: Vec<Term>,
        actions: Vec<Term>,
    },
    Infer {
        strategy: Option<String>,
        limit: Option<usize>,
    },
    Explain(Term),
    Show {
        filter: Option<String>,
    },
}

// ------------- Results -------------
/// Outcome of one `infer` statement. Facts and keys are rendered to text so
/// the report is directly printable and serializable.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub strategy: String,
    pub halt: Halt,
    pub cycles: usize,
    /// Fired activation keys, in firing order.
    pub fired: Vec<String>,
    /// Facts the run added to working memory, in assertion order.
    pub asserted: Vec<String>,
    /// The full final working memory, in insertion order.
    pub memory: Vec<String>,
}

/// Everything a script produced, in statement order.
#[derive(Debug, Default, Serialize)]
pub struct ScriptResult {
    pub facts_declared: usize,
    pub rules_declared: usize,
    pub runs: Vec<RunReport>,
    pub explanations: Vec<String>,
    pub listings: Vec<Vec<String>>,
}

// ------------- Engine -------------
pub struct Engine {
    facts: Vec<Fact>,
    base: RuleBase,
    last: Option<Session>,
    step_limit: Option<usize>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            facts: Vec::new(),
            base: RuleBase::new(),
            last: None,
            step_limit: None,
        }
    }
    /// An engine whose `infer` statements default to the given step limit
    /// instead of the engine-wide default. A `limit` clause still wins.
    pub fn with_step_limit(limit: usize) -> Self {
        Self {
            step_limit: Some(limit),
            ..Self::new()
        }
    }

    /// Executes a script, logging run outcomes and discarding the rest.
    pub fn execute(&mut self, script: &str) -> Result<()> {
        let result = self.execute_collect(script)?;
        for run in &result.runs {
            info!(
                strategy = %run.strategy,
                cycles = run.cycles,
                facts = run.memory.len(),
                halt = ?run.halt,
                "run complete"
            );
        }
        Ok(())
    }

    /// Executes a script and returns everything it produced.
    pub fn execute_collect(&mut self, script: &str) -> Result<ScriptResult> {
        let statements = parse_script(script)?;
        let mut result = ScriptResult::default();
        for statement in statements {
            match statement {
                Statement::Facts(terms) => {
                    for term in terms {
                        let rendered = term.to_string();
                        let fact = Fact::new(term).ok_or_else(|| {
                            KindlingError::Execution(format!(
                                "a fact must be a ground compound: {}",
                                rendered
                            ))
                        })?;
                        self.facts.push(fact);
                    }
                }
                Statement::Rule {
                    name,
                    priority,
                    conditions,
                    actions,
                } => {
                    self.base.create_rule(name, conditions, actions, priority)?;
                }
                Statement::Infer { strategy, limit } => {
                    let strategy = match strategy {
                        Some(name) => Strategy::from_str(&name)?,
                        None => Strategy::default(),
                    };
                    let mut session = Session::new(
                        self.facts.clone(),
                        Arc::new(self.base.clone()),
                        strategy,
                        limit.or(self.step_limit),
                    );
                    let given = session.memory().len();
                    let halt = session.infer(&mut TracingSink)?;
                    result.runs.push(RunReport {
                        strategy: strategy.to_string(),
                        halt,
                        cycles: session.fired_keys().len(),
                        fired: session.fired_keys().iter().map(|k| k.to_string()).collect(),
                        asserted: session.memory().facts()[given..]
                            .iter()
                            .map(|f| f.to_string())
                            .collect(),
                        memory: session
                            .memory()
                            .facts()
                            .iter()
                            .map(|f| f.to_string())
                            .collect(),
                    });
                    self.last = Some(session);
                }
                Statement::Explain(term) => {
                    let session = self.last.as_ref().ok_or_else(|| {
                        KindlingError::Execution(String::from(
                            "explain requires a prior infer statement",
                        ))
                    })?;
                    let rendered = term.to_string();
                    let fact = Fact::new(term).ok_or_else(|| {
                        KindlingError::Execution(format!(
                            "explain takes a ground fact: {}",
                            rendered
                        ))
                    })?;
                    result.explanations.push(session.explain(&fact));
                }
                Statement::Show { filter } => {
                    let rendered: Vec<String> = match &self.last {
                        Some(session) => session
                            .memory()
                            .facts()
                            .iter()
                            .map(|f| f.to_string())
                            .collect(),
                        // before any run there is no session memory, so the
                        // declared facts are what an author wants to see
                        None => self.facts.iter().map(|f| f.to_string()).collect(),
                    };
                    let listed = match filter {
                        Some(pattern) => {
                            let matcher = Regex::new(&pattern).map_err(|e| {
                                KindlingError::Execution(format!("bad show filter: {}", e))
                            })?;
                            rendered.into_iter().filter(|f| matcher.is_match(f)).collect()
                        }
                        None => rendered,
                    };
                    result.listings.push(listed);
                }
            }
        }
        result.facts_declared = self.facts.len();
        result.rules_declared = self.base.len();
        Ok(result)
    }

    /// The most recent run's session, for programmatic follow-up queries.
    pub fn last_session(&self) -> Option<&Session> {
        self.last.as_ref()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- Parsing -------------
fn parse_script(src: &str) -> Result<Vec<Statement>> {
    let mut pairs = TinderParser::parse(Rule::script, src).map_err(translate_parse_error)?;
    let script = pairs
        .next()
        .ok_or_else(|| KindlingError::Invariant(String::from("parse produced no script node")))?;
    let mut statements = Vec::new();
    for pair in script.into_inner() {
        if pair.as_rule() == Rule::statement {
            let inner = pair.into_inner().next().ok_or_else(|| {
                KindlingError::Invariant(String::from("statement node with no body"))
            })?;
            statements.push(parse_statement(inner)?);
        }
    }
    Ok(statements)
}

fn parse_statement(pair: pest::iterators::Pair<Rule>) -> Result<Statement> {
    match pair.as_rule() {
        Rule::fact_stmt => {
            let mut terms = Vec::new();
            for p in pair.into_inner() {
                if p.as_rule() == Rule::compound {
                    terms.push(parse_term(p)?);
                }
            }
            Ok(Statement::Facts(terms))
        }
        Rule::rule_stmt => {
            let mut name = String::new();
            let mut priority = 0;
            let mut conditions = Vec::new();
            let mut actions = Vec::new();
            let mut in_actions = false;
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::ident => name = String::from(p.as_str()),
                    Rule::priority => {
                        let digits = p
                            .into_inner()
                            .next()
                            .ok_or_else(|| {
                                KindlingError::Invariant(String::from("priority with no number"))
                            })?
                            .as_str()
                            .to_string();
                        priority = parse_number(&digits)?;
                    }
                    Rule::kw_then => in_actions = true,
                    Rule::compound => {
                        let term = parse_term(p)?;
                        if in_actions {
                            actions.push(term);
                        } else {
                            conditions.push(term);
                        }
                    }
                    _ => (),
                }
            }
            Ok(Statement::Rule {
                name,
                priority,
                conditions,
                actions,
            })
        }
        Rule::infer_stmt => {
            let mut strategy = None;
            let mut limit = None;
            for p in pair.into_inner() {
                match p.as_rule() {
                    Rule::strategy => strategy = Some(String::from(p.as_str())),
                    Rule::limit_clause => {
                        let digits = p
                            .into_inner()
                            .find(|n| n.as_rule() == Rule::number)
                            .ok_or_else(|| {
                                KindlingError::Invariant(String::from("limit with no number"))
                            })?
                            .as_str()
                            .to_string();
                        let value = parse_number(&digits)?;
                        if value < 0 {
                            return Err(KindlingError::Execution(format!(
                                "step limit must not be negative: {}",
                                value
                            )));
                        }
                        limit = Some(value as usize);
                    }
                    _ => (),
                }
            }
            Ok(Statement::Infer { strategy, limit })
        }
        Rule::explain_stmt => {
            let compound = pair
                .into_inner()
                .find(|p| p.as_rule() == Rule::compound)
                .ok_or_else(|| {
                    KindlingError::Invariant(String::from("explain with no compound"))
                })?;
            Ok(Statement::Explain(parse_term(compound)?))
        }
        Rule::show_stmt => {
            let filter = pair
                .into_inner()
                .find(|p| p.as_rule() == Rule::text)
                .map(|p| unquote(p.as_str()));
            Ok(Statement::Show { filter })
        }
        other => Err(KindlingError::Invariant(format!(
            "unexpected statement node: {:?}",
            other
        ))),
    }
}

fn parse_term(pair: pest::iterators::Pair<Rule>) -> Result<Term> {
    match pair.as_rule() {
        Rule::term => {
            let inner = pair
                .into_inner()
                .next()
                .ok_or_else(|| KindlingError::Invariant(String::from("term node with no body")))?;
            parse_term(inner)
        }
        Rule::variable => Ok(Term::variable(&pair.as_str()[1..])),
        Rule::symbol => Ok(Term::symbol(pair.as_str())),
        Rule::text => Ok(Term::symbol(&unquote(pair.as_str()))),
        Rule::number => Ok(Term::number(parse_number(pair.as_str())?)),
        Rule::compound => {
            let mut inner = pair.into_inner();
            let functor = inner
                .next()
                .ok_or_else(|| {
                    KindlingError::Invariant(String::from("compound with no functor"))
                })?
                .as_str();
            let mut elements = vec![Term::symbol(functor)];
            if let Some(list) = inner.next() {
                for t in list.into_inner() {
                    elements.push(parse_term(t)?);
                }
            }
            Ok(Term::Compound(elements))
        }
        other => Err(KindlingError::Invariant(format!(
            "unexpected term node: {:?}",
            other
        ))),
    }
}

fn parse_number(digits: &str) -> Result<i64> {
    digits.parse::<i64>().map_err(|_| {
        KindlingError::Execution(format!("number out of range: {}", digits))
    })
}

fn unquote(text: &str) -> String {
    String::from(text.trim_matches('"'))
}

fn translate_parse_error(e: pest::error::Error<Rule>) -> KindlingError {
    let (line, col) = match e.line_col {
        LineColLocation::Pos((line, col)) => (line, col),
        LineColLocation::Span((line, col), _) => (line, col),
    };
    let message = match &e.variant {
        ErrorVariant::ParsingError { positives, .. } => {
            format!("expected one of {:?} at line {}, column {}", positives, line, col)
        }
        ErrorVariant::CustomError { message } => message.clone(),
    };
    KindlingError::Parse {
        message,
        line: Some(line),
        col: Some(col),
    }
}
