//! Parsing of binding declarations, keypaths and text templates.

use smallvec::SmallVec;
use tether_reactive::Value;

use crate::error::{Error, Result};

/// A parsed declaration target: a constant or a keypath to observe.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    Primitive(Value),
    Keypath(String),
}

/// One segment of a keypath and the interface character that selects the
/// adapter used to reach it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyToken {
    pub interface: char,
    pub path: String,
}

/// A piece of a text node's content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateToken {
    Text(String),
    Binding(String),
}

/// Classifies `input` as a primitive (quoted string, number, `true`,
/// `false`, `null`, `undefined`) or a keypath.
pub fn parse_target(input: &str) -> Result<Target> {
    let input = input.trim();
    let Some(first) = input.chars().next() else {
        return Err(Error::EmptyKeypath(input.to_owned()));
    };

    if first == '\'' || first == '"' {
        return if input.len() >= 2 && input.ends_with(first) {
            Ok(Target::Primitive(Value::from(&input[1..input.len() - 1])))
        } else {
            Err(Error::UnterminatedString(input.to_owned()))
        };
    }

    let primitive = match input {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "null" | "undefined" => Some(Value::Null),
        _ if looks_numeric(input) => input.parse::<f64>().ok().map(Value::Number),
        _ => None,
    };
    Ok(primitive.map_or_else(|| Target::Keypath(input.to_owned()), Target::Primitive))
}

fn looks_numeric(input: &str) -> bool {
    let digits = input.trim_start_matches(['-', '+']);
    digits
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || (c == '.' && digits.len() > 1))
}

/// Splits `keypath` into its segments. A leading interface character
/// overrides `root` for the first segment. The last segment is returned
/// separately as the observed key.
pub fn tokenize_keypath(
    keypath: &str,
    is_interface: impl Fn(char) -> bool,
    root: char,
) -> Result<(SmallVec<[KeyToken; 4]>, KeyToken)> {
    let mut chars = keypath.chars().peekable();
    let mut current = root;
    if let Some(&first) = chars.peek()
        && is_interface(first)
    {
        current = first;
        chars.next();
    }

    let mut tokens = SmallVec::<[KeyToken; 4]>::new();
    let mut path = String::new();
    for c in chars {
        if is_interface(c) {
            tokens.push(KeyToken {
                interface: current,
                path: std::mem::take(&mut path),
            });
            current = c;
        } else {
            path.push(c);
        }
    }
    tokens.push(KeyToken {
        interface: current,
        path,
    });

    if tokens.iter().any(|token| token.path.is_empty()) {
        return Err(if keypath.is_empty() {
            Error::EmptyKeypath(keypath.to_owned())
        } else {
            Error::EmptySegment(keypath.to_owned())
        });
    }
    let key = tokens.pop().ok_or_else(|| Error::EmptyKeypath(keypath.to_owned()))?;
    Ok((tokens, key))
}

/// Splits a declaration on `|` outside of quotes into the target and its
/// formatter declarations, all trimmed.
pub fn split_declaration(declaration: &str) -> Result<(String, SmallVec<[String; 2]>)> {
    let mut pipes = split_outside_quotes(declaration, |c| c == '|')?
        .into_iter()
        .map(|pipe| pipe.trim().to_owned());
    let target = pipes.next().unwrap_or_default();
    if target.is_empty() {
        return Err(Error::EmptyKeypath(declaration.to_owned()));
    }
    let formatters = pipes.collect::<SmallVec<[String; 2]>>();
    if formatters.iter().any(String::is_empty) {
        return Err(Error::EmptyFormatter(declaration.to_owned()));
    }
    Ok((target, formatters))
}

/// Splits a formatter declaration on whitespace outside of quotes. The
/// first item is the formatter name, the rest its arguments.
pub fn split_arguments(formatter: &str) -> Result<SmallVec<[String; 2]>> {
    Ok(split_outside_quotes(formatter, char::is_whitespace)?
        .into_iter()
        .filter(|arg| !arg.is_empty())
        .map(str::to_owned)
        .collect())
}

fn split_outside_quotes(input: &str, is_separator: impl Fn(char) -> bool) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut quote = None;
    let mut start = 0;
    for (index, c) in input.char_indices() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if is_separator(c) => {
                parts.push(&input[start..index]);
                start = index + c.len_utf8();
            }
            None => {}
        }
    }
    if quote.is_some() {
        return Err(Error::UnterminatedString(input.to_owned()));
    }
    parts.push(&input[start..]);
    Ok(parts)
}

/// Splits `text` into literal and binding pieces using the `open` and
/// `close` delimiters. Returns `None` when the text holds no binding.
/// An opening delimiter without a matching close is kept as text.
pub fn parse_template(text: &str, open: &str, close: &str) -> Option<Vec<TemplateToken>> {
    if open.is_empty() || close.is_empty() {
        return None;
    }
    let mut tokens = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let Some(start) = rest.find(open) else {
            push_text(&mut tokens, rest);
            break;
        };
        push_text(&mut tokens, &rest[..start]);
        let after_open = &rest[start + open.len()..];
        let Some(end) = after_open.find(close) else {
            push_text(&mut tokens, &rest[start..]);
            break;
        };
        tokens.push(TemplateToken::Binding(after_open[..end].trim().to_owned()));
        rest = &after_open[end + close.len()..];
    }

    tokens
        .iter()
        .any(|token| matches!(token, TemplateToken::Binding(_)))
        .then_some(tokens)
}

fn push_text(tokens: &mut Vec<TemplateToken>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(TemplateToken::Text(last)) = tokens.last_mut() {
        last.push_str(text);
    } else {
        tokens.push(TemplateToken::Text(text.to_owned()));
    }
}
