//! Changelog script grammar using nom.
//!
//! # Syntax Overview
//!
//! ```text
//! changeSet(id: '1', author: 'amy') {      <- node: name, args, block
//!     dropTable(tableName: 'monkey')       <- nested node
//!     rollback "create table monkey()"     <- command form: name + string
//! }
//! ```
//!
//! Values are strings (`'..'`, `".."`, `'''..'''`, `""".."""`), numbers,
//! `true`/`false`/`null`, lists `[a, b]` and bare identifiers (property
//! references). `//` and `/* */` comments and `;` separators are skipped.

use nom::{
    Err, IResult,
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while, take_while1},
    character::complete::{char, digit1, multispace1, space0},
    combinator::{cut, map, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, terminated, tuple},
};

use super::ast::*;

/// A grammar failure with its 1-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

/// Parse a complete changelog script.
pub fn parse_script(src: &str) -> Result<Script, SyntaxError> {
    let mut nodes = Vec::new();
    let mut input = src;

    loop {
        let (rest, _) = ws(input).map_err(|e| syntax_error(src, e))?;
        if rest.is_empty() {
            break;
        }
        let (rest, parsed) = node(src, rest).map_err(|e| syntax_error(src, e))?;
        nodes.push(parsed);
        input = rest;
    }

    Ok(Script { nodes })
}

/// 1-based line of `rest` inside `src`.
fn line_of(src: &str, rest: &str) -> usize {
    let offset = src.len().saturating_sub(rest.len());
    src[..offset].matches('\n').count() + 1
}

fn syntax_error(src: &str, err: Err<Error<&str>>) -> SyntaxError {
    let (rest, kind) = match err {
        Err::Error(e) | Err::Failure(e) => (e.input, e.code),
        Err::Incomplete(_) => ("", ErrorKind::Eof),
    };

    let message = if rest.is_empty() {
        "unexpected end of input (unclosed block or argument list?)".to_string()
    } else if kind == ErrorKind::Char && rest.starts_with(['\'', '"']) {
        "unterminated string literal".to_string()
    } else if kind == ErrorKind::TakeWhile1 {
        format!("expected an element name, found '{}'", snippet(rest))
    } else {
        format!("unexpected input near '{}'", snippet(rest))
    };

    SyntaxError {
        line: line_of(src, rest),
        message,
    }
}

fn snippet(rest: &str) -> String {
    rest.lines().next().unwrap_or("").chars().take(24).collect()
}

/// Whitespace, comments and statement separators.
fn ws(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((multispace1, line_comment, block_comment, tag(";")))),
    )(input)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("//"), opt(is_not("\r\n"))))(input)
}

fn block_comment(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

/// Parse an identifier (element name, attribute key, property reference).
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
    ))(input)
}

/// Parse any string literal form.
fn string_literal(input: &str) -> IResult<&str, String> {
    alt((
        map(
            delimited(tag("\"\"\""), take_until("\"\"\""), tag("\"\"\"")),
            str::to_string,
        ),
        map(
            delimited(tag("'''"), take_until("'''"), tag("'''")),
            str::to_string,
        ),
        double_quoted,
        single_quoted,
    ))(input)
}

fn double_quoted(input: &str) -> IResult<&str, String> {
    quoted(input, '"')
}

fn single_quoted(input: &str) -> IResult<&str, String> {
    quoted(input, '\'')
}

/// Short string with backslash escapes. An unterminated string is a hard failure.
fn quoted(input: &str, quote: char) -> IResult<&str, String> {
    let (mut rest, _) = char(quote)(input)?;
    let mut out = String::new();

    loop {
        let mut chars = rest.chars();
        match chars.next() {
            None => return Err(Err::Failure(Error::new(input, ErrorKind::Char))),
            Some(c) if c == quote => return Ok((chars.as_str(), out)),
            Some('\\') => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => return Err(Err::Failure(Error::new(input, ErrorKind::Char))),
            },
            Some(c) => out.push(c),
        }
        rest = chars.as_str();
    }
}

/// Parse a number (integer or float).
fn number(input: &str) -> IResult<&str, Literal> {
    let (rest, text) = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;

    // `1abc` is not a number followed by an identifier.
    if rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err(Err::Error(Error::new(input, ErrorKind::Digit)));
    }

    let literal = if text.contains('.') {
        text.parse().map(Literal::Float).ok()
    } else {
        text.parse().map(Literal::Int).ok()
    };
    match literal {
        Some(lit) => Ok((rest, lit)),
        None => Err(Err::Failure(Error::new(input, ErrorKind::Digit))),
    }
}

/// Keywords and property references.
fn word(input: &str) -> IResult<&str, Literal> {
    map(identifier, |w| match w {
        "true" => Literal::Bool(true),
        "false" => Literal::Bool(false),
        "null" => Literal::Null,
        other => Literal::Ident(other.to_string()),
    })(input)
}

fn comma(input: &str) -> IResult<&str, ()> {
    value((), tuple((ws, char(','), ws)))(input)
}

fn list(input: &str) -> IResult<&str, Literal> {
    map(
        delimited(
            pair(char('['), ws),
            terminated(separated_list0(comma, literal), opt(pair(ws, char(',')))),
            pair(ws, char(']')),
        ),
        Literal::List,
    )(input)
}

/// Parse a value.
fn literal(input: &str) -> IResult<&str, Literal> {
    alt((map(string_literal, Literal::Str), list, number, word))(input)
}

fn named_arg(input: &str) -> IResult<&str, Arg> {
    let (input, key) = alt((map(identifier, str::to_string), string_literal))(input)?;
    let (input, _) = tuple((ws, char(':'), ws))(input)?;
    let (input, value) = literal(input)?;
    Ok((
        input,
        Arg {
            key: Some(key),
            value,
        },
    ))
}

fn arg(input: &str) -> IResult<&str, Arg> {
    alt((
        named_arg,
        map(literal, |value| Arg { key: None, value }),
    ))(input)
}

/// Parse `( arg, arg, ... )`.
fn args(input: &str) -> IResult<&str, Vec<Arg>> {
    delimited(
        pair(char('('), ws),
        terminated(separated_list0(comma, arg), opt(pair(ws, char(',')))),
        pair(ws, char(')')),
    )(input)
}

/// Parse an element: name, optional args or command-form string, optional block.
fn node<'a>(src: &'a str, input: &'a str) -> IResult<&'a str, Node> {
    let line = line_of(src, input);
    let (input, name) = identifier(input)?;

    let (spaced, _) = space0(input)?;
    let (input, parsed_args) = if spaced.starts_with('(') {
        cut(args)(spaced)?
    } else {
        match string_literal(spaced) {
            Ok((rest, text)) => (
                rest,
                vec![Arg {
                    key: None,
                    value: Literal::Str(text),
                }],
            ),
            Err(Err::Failure(e)) => return Err(Err::Failure(e)),
            Err(_) => (input, Vec::new()),
        }
    };

    let (after_ws, _) = ws(input)?;
    let (input, body) = if after_ws.starts_with('{') {
        let (rest, items) = block(src, after_ws)?;
        (rest, Some(items))
    } else {
        (input, None)
    };

    Ok((
        input,
        Node {
            name: name.to_string(),
            args: parsed_args,
            body,
            line,
        },
    ))
}

/// Parse `{ item* }`. Errors inside a block are not backtracked.
fn block<'a>(src: &'a str, input: &'a str) -> IResult<&'a str, Vec<Item>> {
    let (mut input, _) = char('{')(input)?;
    let mut items = Vec::new();

    loop {
        let (rest, _) = ws(input)?;
        if let Some(rest) = rest.strip_prefix('}') {
            return Ok((rest, items));
        }
        if rest.is_empty() {
            return Err(Err::Failure(Error::new(rest, ErrorKind::Eof)));
        }
        let (rest, parsed) = cut(|i| item(src, i))(rest)?;
        items.push(parsed);
        input = rest;
    }
}

fn item<'a>(src: &'a str, input: &'a str) -> IResult<&'a str, Item> {
    match string_literal(input) {
        Ok((rest, text)) => return Ok((rest, Item::Text(text))),
        Err(Err::Failure(e)) => return Err(Err::Failure(e)),
        Err(_) => {}
    }
    let (rest, parsed) = node(src, input)?;
    Ok((rest, Item::Node(parsed)))
}
