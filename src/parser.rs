//! This module provides the parser for the textual machine notation, utilizing the `pest`
//! crate. The grammar lives in `grammar.pest`; this module turns its parse tree into a generic
//! `serde_json::Value`, which `MachineModel::from_value` then validates.

use crate::types::{TuringMachineError, MAX_DEFINITION_SIZE};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use serde_json::{Map, Value};

/// Derives a `PestParser` for the machine notation defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct NotationParser;

/// Parses machine notation into a generic value.
///
/// # Arguments
///
/// * `input` - The definition text.
///
/// # Returns
///
/// * `Ok(Value)` holding a mapping of the top-level keys.
/// * `Err(TuringMachineError::ValidationError)` if the input exceeds `MAX_DEFINITION_SIZE`.
/// * `Err(TuringMachineError::ParseError)` on syntax errors or duplicate keys.
pub fn parse(input: &str) -> Result<Value, TuringMachineError> {
    if input.len() > MAX_DEFINITION_SIZE {
        return Err(TuringMachineError::ValidationError(format!(
            "Definition is {} bytes, the limit is {} bytes",
            input.len(),
            MAX_DEFINITION_SIZE
        )));
    }

    let root = NotationParser::parse(Rule::definition, input)
        .map_err(|e| TuringMachineError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| TuringMachineError::ValidationError("Empty parse tree".to_string()))?;

    let mut entries = Map::new();

    for entry in root.into_inner() {
        if entry.as_rule() != Rule::entry {
            continue;
        }

        let span = entry.as_span();
        let (key, value) = parse_keyed(entry)?;
        insert_unique(&mut entries, key, value, span)?;
    }

    Ok(Value::Object(entries))
}

/// Parses a `key: value` pair (a top-level `entry` or a mapping `pair`).
fn parse_keyed(pair: Pair<Rule>) -> Result<(String, Value), TuringMachineError> {
    let mut key = String::new();
    let mut value = Value::Null;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::key => key = inner.as_str().to_string(),
            Rule::EOI => {}
            _ => value = parse_value(inner)?,
        }
    }

    Ok((key, value))
}

fn parse_value(pair: Pair<Rule>) -> Result<Value, TuringMachineError> {
    let value = match pair.as_rule() {
        Rule::block_seq => Value::Array(
            pair.into_inner()
                .map(parse_seq_item)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Rule::flow_seq => Value::Array(
            pair.into_inner()
                .map(parse_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Rule::mapping => {
            let mut fields = Map::new();
            for field in pair.into_inner() {
                let span = field.as_span();
                let (key, value) = parse_keyed(field)?;
                insert_unique(&mut fields, key, value, span)?;
            }
            Value::Object(fields)
        }
        Rule::double_quoted => Value::String(unescape(inner_str(pair))),
        Rule::single_quoted => Value::String(inner_str(pair).replace("''", "'")),
        Rule::plain | Rule::flow_plain => plain_scalar(pair.as_str()),
        _ => {
            return Err(parse_error(
                &format!("Unexpected {:?}", pair.as_rule()),
                pair.as_span(),
            ))
        }
    };

    Ok(value)
}

fn parse_seq_item(item: Pair<Rule>) -> Result<Value, TuringMachineError> {
    item.into_inner()
        .find(|p| p.as_rule() != Rule::EOI)
        .map_or(Ok(Value::Null), parse_value)
}

/// Plain scalars are kept as text; `~`, `null` and empty values become null.
fn plain_scalar(raw: &str) -> Value {
    match raw.trim() {
        "" | "~" | "null" => Value::Null,
        text => Value::String(text.to_string()),
    }
}

/// Extracts the text between the quotes of a quoted scalar.
fn inner_str(pair: Pair<Rule>) -> &str {
    pair.into_inner().next().map_or("", |inner| inner.as_str())
}

/// Resolves the backslash escapes of a double-quoted scalar.
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
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

/// Inserts `key` into `map`, rejecting keys that were already declared.
fn insert_unique(
    map: &mut Map<String, Value>,
    key: String,
    value: Value,
    span: Span,
) -> Result<(), TuringMachineError> {
    if map.contains_key(&key) {
        return Err(parse_error(&format!("Duplicate \"{key}:\" declaration"), span));
    }

    map.insert(key, value);
    Ok(())
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}
