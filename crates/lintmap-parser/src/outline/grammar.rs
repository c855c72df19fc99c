//! Line-level grammar for the Python constructs the outliner cares about.

use winnow::{
    Parser as _,
    ascii::{space0, space1},
    combinator::{alt, cut_err, delimited, fail, opt, separated},
    error::{ContextError, ModalResult, StrContext},
    token::{literal, take, take_while},
};

/// A parsed `class` statement header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClassHeader<'s> {
    pub name: &'s str,
    pub bases: Vec<&'s str>,
}

fn identifier<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_')
        .verify(|s: &str| !s.starts_with(|c: char| c.is_ascii_digit()))
        .parse_next(input)
}

fn dotted_name<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    separated(1.., identifier, '.')
        .map(|()| ())
        .take()
        .parse_next(input)
}

/// Whether the (left-trimmed) line opens a `class` statement.
pub(crate) fn is_class_statement(line: &str) -> bool {
    let parsed: ModalResult<_> = (literal("class"), space1).parse_next(&mut &*line);
    parsed.is_ok()
}

/// Whether the (left-trimmed) line opens a function definition.
pub(crate) fn is_function_statement(line: &str) -> bool {
    let parsed: ModalResult<_> =
        (opt((literal("async"), space1)), literal("def"), space1).parse_next(&mut &*line);
    parsed.is_ok()
}

/// Tracks bracket depth, string literals and comments across header text.
#[derive(Debug, Default)]
struct Nesting {
    depth: usize,
    quote: Option<char>,
    escaped: bool,
    comment: bool,
}

impl Nesting {
    /// Feeds one character and reports whether it is code at bracket depth zero.
    fn advance(&mut self, c: char) -> bool {
        if self.comment {
            self.comment = c != '\n';
            return false;
        }
        if let Some(quote) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == quote {
                self.quote = None;
            }
            return false;
        }
        match c {
            '#' => {
                self.comment = true;
                false
            }
            '\'' | '"' => {
                self.quote = Some(c);
                false
            }
            '(' | '[' | '{' => {
                self.depth += 1;
                false
            }
            ')' | ']' | '}' if self.depth > 0 => {
                self.depth -= 1;
                false
            }
            _ => self.depth == 0,
        }
    }
}

/// Whether a class header still has an unclosed bracket, ignoring brackets
/// inside comments and string literals.
pub(crate) fn header_is_open(text: &str) -> bool {
    let mut nesting = Nesting::default();
    for c in text.chars() {
        nesting.advance(c);
    }
    nesting.depth > 0
}

/// Number of characters before the `)` closing an argument list whose `(`
/// was already consumed.
fn closing_paren(arguments: &str) -> Option<usize> {
    let mut nesting = Nesting::default();
    arguments
        .chars()
        .position(|c| nesting.advance(c) && c == ')')
}

/// The text between balanced parentheses, excluding the closing one.
fn argument_list<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    match closing_paren(*input) {
        Some(end) => take(end).parse_next(input),
        None => fail.parse_next(input),
    }
}

fn header_body<'s>(input: &mut &'s str) -> ModalResult<ClassHeader<'s>> {
    let name = identifier
        .context(StrContext::Label("class name"))
        .parse_next(input)?;
    let arguments = opt(delimited((space0, '('), argument_list, ')')).parse_next(input)?;
    (space0, ':', take_while(0.., |_: char| true))
        .void()
        .context(StrContext::Label("`:`"))
        .parse_next(input)?;

    let bases = arguments.map(split_bases).unwrap_or_default();
    Ok(ClassHeader { name, bases })
}

fn class_header<'s>(input: &mut &'s str) -> ModalResult<ClassHeader<'s>> {
    (literal("class"), space1).void().parse_next(input)?;
    cut_err(header_body).parse_next(input)
}

/// Parses a complete class header, which may span several physical lines.
pub(crate) fn parse_class_header(text: &str) -> Result<ClassHeader<'_>, String> {
    class_header
        .parse(text.trim())
        .map_err(|err| err.inner().to_string())
}

/// Extracts base class names from a parenthesized argument list.
///
/// Keyword arguments such as `metaclass=Meta` are dropped and generic
/// subscripts such as `Generic[T]` are reduced to the subscripted name.
fn split_bases(arguments: &str) -> Vec<&str> {
    let mut nesting = Nesting::default();
    let mut start = 0;
    let mut pieces = Vec::new();
    for (offset, c) in arguments.char_indices() {
        if nesting.advance(c) && c == ',' {
            pieces.push(&arguments[start..offset]);
            start = offset + 1;
        }
    }
    pieces.push(&arguments[start..]);

    pieces
        .into_iter()
        .filter_map(|argument| {
            let argument = strip_comments(argument);
            if argument.is_empty() || argument.contains('=') {
                return None;
            }
            let name = argument.split('[').next().unwrap_or(argument).trim_end();
            dotted_name
                .parse(name)
                .ok()
                .filter(|n: &&str| *n != "object")
        })
        .collect()
}

fn strip_comments(argument: &str) -> &str {
    let mut argument = argument.trim();
    while let Some(comment) = argument.strip_prefix('#') {
        argument = comment.split_once('\n').map_or("", |(_, rest)| rest).trim();
    }
    argument.split('#').next().unwrap_or(argument).trim()
}

/// Matches `self.attr = Name(` and returns `Name`.
pub(crate) fn self_assignment<'s>(line: &'s str) -> Option<&'s str> {
    let mut input = line;
    let parsed: ModalResult<&'s str, ContextError> = (
        alt((literal("self."), literal("self ."))),
        identifier,
        space0,
        '=',
        space0,
        dotted_name,
        space0,
        '(',
    )
        .map(|(_, _, _, _, _, class_name, _, _)| class_name)
        .parse_next(&mut input);
    parsed.ok()
}
