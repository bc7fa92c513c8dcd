//! Piret reader: source text to data values.
//!
//! The reader knows nothing about evaluation. It produces the same `Value`s
//! the evaluator consumes, so programs can be built by hand just as well.

use crate::ast::{Keyword, Symbol};
use crate::runtime::values::{List, Value};
use pest::iterators::Pair;
use pest::Parser;
use thiserror::Error;

// Define the parser struct using the grammar file
#[derive(pest_derive::Parser)]
#[grammar = "piret.pest"] // Path relative to src/
pub struct PiretParser;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("syntax error: {0}")]
    Syntax(Box<pest::error::Error<Rule>>),

    #[error("no form to read")]
    Empty,

    #[error("expected exactly one form, found {0}")]
    TrailingForms(usize),

    #[error("invalid number literal: {0}")]
    InvalidNumber(String),
}

impl From<pest::error::Error<Rule>> for ReadError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        ReadError::Syntax(Box::new(e))
    }
}

/// Read every top-level form in `source`.
pub fn read_all(source: &str) -> Result<Vec<Value>, ReadError> {
    let mut pairs = PiretParser::parse(Rule::program, source)?;
    let program = match pairs.next() {
        Some(program) => program,
        None => return Ok(Vec::new()),
    };
    program
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(build_value)
        .collect()
}

/// Read exactly one form from `source`.
pub fn read(source: &str) -> Result<Value, ReadError> {
    let mut forms = read_all(source)?;
    match forms.len() {
        0 => Err(ReadError::Empty),
        1 => Ok(forms.remove(0)),
        n => Err(ReadError::TrailingForms(n)),
    }
}

fn build_value(pair: Pair<Rule>) -> Result<Value, ReadError> {
    match pair.as_rule() {
        Rule::list => Ok(Value::List(
            pair.into_inner()
                .map(build_value)
                .collect::<Result<List, _>>()?,
        )),
        Rule::vector => Ok(Value::Vector(
            pair.into_inner()
                .map(build_value)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        Rule::quoted => {
            // 'x -> (quote x)
            let quoted = pair
                .into_inner()
                .map(build_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::list(
                std::iter::once(Value::symbol("quote")).chain(quoted),
            ))
        }
        Rule::string => {
            let raw = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Ok(Value::String(unescape(raw)))
        }
        Rule::integer => pair
            .as_str()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| ReadError::InvalidNumber(pair.as_str().to_string())),
        Rule::float => pair
            .as_str()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ReadError::InvalidNumber(pair.as_str().to_string())),
        Rule::boolean => Ok(Value::Boolean(pair.as_str() == "true")),
        Rule::nil => Ok(Value::Nil),
        Rule::keyword => Ok(Value::Keyword(Keyword::new(&pair.as_str()[1..]))),
        Rule::symbol => Ok(Value::Symbol(Symbol::new(pair.as_str()))),
        rule => Err(ReadError::from(pest::error::Error::new_from_span(
            pest::error::ErrorVariant::CustomError {
                message: format!("unexpected {:?}", rule),
            },
            pair.as_span(),
        ))),
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
