//! Nom parser for inline `[ref ...]` / `[op ...]` tokens
//!
//! Grammar:
//!
//! ```text
//! token := "[" ("ref" | "op") (ws pair)* ws? "]"      (tag is case-insensitive)
//! pair  := key ":" (quoted | bare)
//! quoted:= '"' (any char except '"' or '\' | '\' any char)* '"'
//! bare  := one or more chars, no whitespace, no ']' and no '"'
//! ```
//!
//! A `[` that is not followed by a token tag is ordinary text. Once a tag is
//! recognised the token must be well formed, otherwise the whole parse fails.

use std::collections::BTreeMap;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, peek, value},
    multi::{fold_many0, many0},
    sequence::{delimited, preceded, separated_pair, terminated},
    IResult,
};
use tracing::debug;

use super::types::{ParsedMessage, ParsedOp, ParsedRef, TokenKind};
use crate::error::TokenParseError;

// =============================================================================
// ENTRY POINT
// =============================================================================

/// Parse raw text into a placeholder-substituted message plus tokens
///
/// # Examples
///
/// ```
/// use workroom_ops::tokens::parse_message;
///
/// let parsed = parse_message(r#"Link this [ref v:1 type:"task" id:task-1] please."#).unwrap();
/// assert_eq!(parsed.llm_text, "Link this <<REF_1>> please.");
/// ```
pub fn parse_message(text: &str) -> Result<ParsedMessage, TokenParseError> {
    let mut llm_text = String::with_capacity(text.len());
    let mut references: Vec<ParsedRef> = Vec::new();
    let mut operations: Vec<ParsedOp> = Vec::new();

    // `cursor` marks the end of the last copied segment, `scan` where to look next
    let mut cursor = 0;
    let mut scan = 0;

    while let Some(offset) = text[scan..].find('[') {
        let start = scan + offset;
        let (after_head, kind) = match token_head(&text[start..]) {
            Ok(ok) => ok,
            Err(_) => {
                scan = start + 1;
                continue;
            }
        };

        let (after_body, pairs) =
            token_body(after_head).map_err(|e| TokenParseError::Malformed {
                token: kind.as_str(),
                position: start,
                message: describe_nom_error(e),
            })?;
        let end = text.len() - after_body.len();

        llm_text.push_str(&text[cursor..start]);
        match kind {
            TokenKind::Ref => {
                let parsed = build_ref(pairs, references.len() + 1, start)?;
                llm_text.push_str(&parsed.marker());
                references.push(parsed);
            }
            TokenKind::Op => {
                let parsed = build_op(pairs, operations.len() + 1, start)?;
                llm_text.push_str(&parsed.marker());
                operations.push(parsed);
            }
        }

        cursor = end;
        scan = end;
    }
    llm_text.push_str(&text[cursor..]);

    debug!(
        refs = references.len(),
        ops = operations.len(),
        "parsed message tokens"
    );

    Ok(ParsedMessage {
        raw_text: text.to_string(),
        llm_text,
        references,
        operations,
    })
}

// =============================================================================
// TOKEN PARSERS
// =============================================================================

/// `[ref` or `[op` followed by whitespace or the closing bracket
fn token_head(input: &str) -> IResult<&str, TokenKind> {
    let (input, _) = char('[')(input)?;
    let (input, kind) = alt((
        value(TokenKind::Ref, tag_no_case("ref")),
        value(TokenKind::Op, tag_no_case("op")),
    ))(input)?;
    let (input, _) = peek(alt((multispace1, tag("]"))))(input)?;
    Ok((input, kind))
}

/// Key/value pairs up to and including the closing bracket
fn token_body(input: &str) -> IResult<&str, Vec<(&str, String)>> {
    terminated(
        many0(preceded(multispace1, key_value)),
        preceded(multispace0, char(']')),
    )(input)
}

fn key_value(input: &str) -> IResult<&str, (&str, String)> {
    separated_pair(key, char(':'), alt((quoted_value, bare_value)))(input)
}

fn key(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-')(input)
}

fn bare_value(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| !c.is_whitespace() && c != ']' && c != '"'),
        String::from,
    )(input)
}

/// Double-quoted value; a backslash escapes the following character
fn quoted_value(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        fold_many0(
            alt((is_not("\\\""), preceded(char('\\'), take(1usize)))),
            String::new,
            |mut acc: String, piece: &str| {
                acc.push_str(piece);
                acc
            },
        ),
        char('"'),
    )(input)
}

fn describe_nom_error(err: nom::Err<nom::error::Error<&str>>) -> String {
    match err {
        nom::Err::Incomplete(_) => "incomplete token".to_string(),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let snippet: String = e.input.chars().take(24).collect();
            if snippet.is_empty() {
                "unterminated token".to_string()
            } else {
                format!("unexpected input near '{}'", snippet)
            }
        }
    }
}

// =============================================================================
// TOKEN ASSEMBLY
// =============================================================================

fn collect_pairs(pairs: Vec<(&str, String)>) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect()
}

fn take_version(
    fields: &mut BTreeMap<String, String>,
    token: &'static str,
    position: usize,
) -> Result<u32, TokenParseError> {
    let raw = fields.remove("v").ok_or(TokenParseError::MissingField {
        token,
        field: "v",
        position,
    })?;
    match raw.trim().parse::<u32>() {
        Ok(v) if v >= 1 => Ok(v),
        _ => Err(TokenParseError::InvalidVersion {
            token,
            value: raw,
            position,
        }),
    }
}

fn take_required(
    fields: &mut BTreeMap<String, String>,
    token: &'static str,
    field: &'static str,
    position: usize,
) -> Result<String, TokenParseError> {
    match fields.remove(field) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(TokenParseError::MissingField {
            token,
            field,
            position,
        }),
    }
}

fn build_ref(
    pairs: Vec<(&str, String)>,
    index: usize,
    position: usize,
) -> Result<ParsedRef, TokenParseError> {
    let mut fields = collect_pairs(pairs);
    let version = take_version(&mut fields, "ref", position)?;
    let entity_type = take_required(&mut fields, "ref", "type", position)?;
    let entity_id = take_required(&mut fields, "ref", "id", position)?;

    Ok(ParsedRef {
        placeholder: format!("{}_{}", TokenKind::Ref.placeholder_prefix(), index),
        version,
        entity_type: entity_type.to_lowercase(),
        entity_id,
        meta: fields,
    })
}

fn build_op(
    pairs: Vec<(&str, String)>,
    index: usize,
    position: usize,
) -> Result<ParsedOp, TokenParseError> {
    let mut fields = collect_pairs(pairs);
    let version = take_version(&mut fields, "op", position)?;
    let op_type = take_required(&mut fields, "op", "type", position)?;
    if fields.is_empty() {
        return Err(TokenParseError::MissingArguments { position });
    }

    Ok(ParsedOp {
        placeholder: format!("{}_{}", TokenKind::Op.placeholder_prefix(), index),
        version,
        op_type: op_type.to_lowercase(),
        args: fields,
    })
}
