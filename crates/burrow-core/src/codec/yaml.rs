// YAML decoding on top of saphyr-parser's event stream, plus a small block
// style emitter. Only the first document of a stream is read.
use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::DateTime;
use saphyr_parser::{Event, Parser, ScalarStyle, Span as SaphyrSpan, SpannedEventReceiver, Tag};
use tracing::trace;

use super::Error;
use crate::value::{Key, Mapping, Value};

pub fn decode(bytes: &[u8]) -> Result<Value, Error> {
    let text = std::str::from_utf8(bytes)?;
    let mut builder = TreeBuilder::default();
    Parser::new_from_str(text)
        .load(&mut builder, false)
        .map_err(|e| Error::Yaml(format!("{e}")))?;
    builder.finish()
}

pub fn encode(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Mapping(map) if !map.is_empty() => write_mapping(map, 0, &mut out),
        Value::Sequence(items) if !items.is_empty() => write_sequence(items, 0, &mut out),
        other => {
            out.push_str(&inline(other));
            out.push('\n');
        }
    }
    out
}

enum Frame {
    Sequence {
        items: Vec<Value>,
        anchor: usize,
    },
    Mapping {
        entries: Mapping,
        key: Option<Key>,
        anchor: usize,
    },
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    anchors: HashMap<usize, Value>,
    root: Option<Value>,
    error: Option<String>,
}

impl TreeBuilder {
    fn finish(self) -> Result<Value, Error> {
        match self.error {
            Some(e) => Err(Error::Yaml(e)),
            None => Ok(self.root.unwrap_or(Value::Null)),
        }
    }

    fn awaiting_key(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Mapping { key: None, .. }))
    }

    fn fail(&mut self, msg: String) {
        if self.error.is_none() {
            self.error = Some(msg);
        }
    }

    /// A node is complete: remember it under its anchor and hand it to the
    /// enclosing collection (or make it the document root).
    fn complete(&mut self, value: Value, anchor: usize) {
        if anchor > 0 {
            self.anchors.insert(anchor, value.clone());
        }
        let rejected = match self.stack.last_mut() {
            None => {
                if self.root.is_none() {
                    self.root = Some(value);
                }
                false
            }
            Some(Frame::Sequence { items, .. }) => {
                items.push(value);
                false
            }
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                Some(k) => {
                    entries.insert(k, value);
                    false
                }
                None => match value_to_key(value) {
                    Some(k) => {
                        *key = Some(k);
                        false
                    }
                    None => true,
                },
            },
        };
        if rejected {
            self.fail("mapping keys must be scalars".to_string());
        }
    }

    fn scalar(&mut self, text: &str, style: ScalarStyle, anchor: usize, tag: Option<&Tag>) {
        // `!!str 42` is the string "42".
        let plain = matches!(style, ScalarStyle::Plain) && !tag.is_some_and(is_str_tag);
        if self.awaiting_key() {
            // Keep the key's text as written unless it is a plain integer.
            let key = match plain.then(|| resolve_plain(text)) {
                Some(Value::Int(i)) => Value::Int(i),
                _ => Value::String(text.to_string()),
            };
            self.complete(key, anchor);
        } else if plain {
            self.complete(resolve_plain(text), anchor);
        } else {
            self.complete(Value::String(text.to_string()), anchor);
        }
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Sequence { items, anchor } => self.complete(Value::Sequence(items), anchor),
            Frame::Mapping {
                entries,
                key,
                anchor,
            } => {
                if let Some(k) = key {
                    // `key:` with nothing after it
                    trace!(%k, "mapping closed with a dangling key");
                }
                self.complete(Value::Mapping(entries), anchor)
            }
        }
    }
}

impl SpannedEventReceiver<'_> for TreeBuilder {
    fn on_event(&mut self, event: Event<'_>, _span: SaphyrSpan) {
        if self.error.is_some() {
            return;
        }
        match event {
            Event::Scalar(value, style, anchor, tag) => {
                self.scalar(&value, style, anchor, tag.as_deref())
            }
            Event::SequenceStart(anchor, _tag) => self.stack.push(Frame::Sequence {
                items: Vec::new(),
                anchor,
            }),
            Event::MappingStart(anchor, _tag) => self.stack.push(Frame::Mapping {
                entries: Mapping::new(),
                key: None,
                anchor,
            }),
            Event::SequenceEnd | Event::MappingEnd => self.close(),
            Event::Alias(id) => match self.anchors.get(&id).cloned() {
                Some(value) => self.complete(value, 0),
                None => self.fail(format!("alias to unknown anchor #{id}")),
            },
            _ => {}
        }
    }
}

fn is_str_tag(tag: &Tag) -> bool {
    tag.is_yaml_core_schema() && tag.suffix == "str"
}

fn value_to_key(value: Value) -> Option<Key> {
    match value {
        Value::Int(i) => Some(Key::Int(i)),
        Value::String(s) => Some(Key::Str(s)),
        Value::Null => Some(Key::Str("null".to_string())),
        Value::Bool(b) => Some(Key::Str(b.to_string())),
        Value::Float(f) => Some(Key::Str(format_float(f))),
        Value::Timestamp(t) => Some(Key::Str(t.to_rfc3339())),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Resolve an unquoted scalar: YAML 1.2 core schema plus RFC 3339 timestamps.
pub(crate) fn resolve_plain(text: &str) -> Value {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return Value::Null,
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return Value::Float(f64::INFINITY);
        }
        "-.inf" | "-.Inf" | "-.INF" => return Value::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Value::Float(f64::NAN),
        _ => {}
    }
    if let Some(i) = parse_int(text) {
        return Value::Int(i);
    }
    if looks_like_float(text)
        && let Ok(f) = text.parse::<f64>()
    {
        return Value::Float(f);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Value::Timestamp(t);
    }
    Value::String(text.to_string())
}

fn parse_int(text: &str) -> Option<i64> {
    let (neg, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = if let Some(hex) = body.strip_prefix("0x") {
        (16, hex)
    } else if let Some(oct) = body.strip_prefix("0o") {
        (8, oct)
    } else {
        (10, body)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    // Parse with the sign attached so i64::MIN stays in range.
    if neg {
        i64::from_str_radix(&format!("-{digits}"), radix).ok()
    } else {
        i64::from_str_radix(digits, radix).ok()
    }
}

fn looks_like_float(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat_n(' ', indent));
}

// Implicit keys end within 1024 characters; longer ones need `? key`.
const MAX_IMPLICIT_KEY: usize = 1024;

fn write_mapping(map: &Mapping, indent: usize, out: &mut String) {
    for (k, v) in map {
        let key = match k {
            Key::Int(i) => i.to_string(),
            Key::Str(s) => quote_if_needed(s),
        };
        pad(out, indent);
        let explicit = key.chars().count() >= MAX_IMPLICIT_KEY;
        if explicit {
            out.push_str("? ");
            out.push_str(&key);
            out.push('\n');
            pad(out, indent);
        } else {
            out.push_str(&key);
        }
        out.push(':');
        match v {
            Value::Mapping(m) if !m.is_empty() => {
                out.push('\n');
                write_mapping(m, indent + 2, out);
            }
            Value::Sequence(items) if !items.is_empty() => {
                out.push('\n');
                write_sequence(items, if explicit { indent + 2 } else { indent }, out);
            }
            other => {
                out.push(' ');
                out.push_str(&inline(other));
                out.push('\n');
            }
        }
    }
}

// Nested collections are rendered one level deeper and their first line is
// pulled up behind the dash.
fn write_sequence(items: &[Value], indent: usize, out: &mut String) {
    for item in items {
        pad(out, indent);
        out.push_str("- ");
        let mut body = String::new();
        match item {
            Value::Mapping(m) if !m.is_empty() => write_mapping(m, indent + 2, &mut body),
            Value::Sequence(s) if !s.is_empty() => write_sequence(s, indent + 2, &mut body),
            other => {
                out.push_str(&inline(other));
                out.push('\n');
                continue;
            }
        }
        out.push_str(&body[indent + 2..]);
    }
}

fn inline(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::String(s) => quote_if_needed(s),
        Value::Timestamp(t) => t.to_rfc3339(),
        Value::Sequence(_) => "[]".to_string(),
        Value::Mapping(_) => "{}".to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        let s = if f > 0.0 { ".inf" } else { "-.inf" };
        s.to_string()
    } else {
        let s = f.to_string();
        if s.contains(['.', 'e', 'E']) { s } else { s + ".0" }
    }
}

fn quote_if_needed(s: &str) -> String {
    if is_plain_safe(s) {
        s.to_string()
    } else {
        format!("\"{}\"", escape_double_quoted(s))
    }
}

// Plain only if it reads back as the same string and cannot be mistaken for
// an indicator, a comment or a key separator.
fn is_plain_safe(s: &str) -> bool {
    let (Some(first), Some(last)) = (s.chars().next(), s.chars().last()) else {
        return false;
    };
    matches!(resolve_plain(s), Value::String(_))
        && !first.is_whitespace()
        && !last.is_whitespace()
        && !"-?:,[]{}#&*!|>'\"%@`".contains(first)
        && last != ':'
        && !s.contains(": ")
        && !s.contains(" #")
        && !s.chars().any(|c| c.is_control())
}

fn escape_double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                write!(&mut out, "\\u{:04x}", c as u32).ok();
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_scalar_resolution() {
        assert_eq!(resolve_plain("~"), Value::Null);
        assert_eq!(resolve_plain("True"), Value::Bool(true));
        assert_eq!(resolve_plain("-17"), Value::Int(-17));
        assert_eq!(resolve_plain("0x1f"), Value::Int(31));
        assert_eq!(resolve_plain("0o17"), Value::Int(15));
        assert_eq!(resolve_plain("30.5"), Value::Float(30.5));
        assert_eq!(resolve_plain("1e3"), Value::Float(1000.0));
        assert_eq!(resolve_plain("-.inf"), Value::Float(f64::NEG_INFINITY));
        assert!(matches!(resolve_plain(".nan"), Value::Float(f) if f.is_nan()));
        assert!(matches!(resolve_plain("2001-02-20T21:03:55Z"), Value::Timestamp(_)));
        assert_eq!(resolve_plain("2019-01-01"), Value::from("2019-01-01"));
        assert_eq!(resolve_plain("1-2"), Value::from("1-2"));
        assert_eq!(resolve_plain("yes"), Value::from("yes"));
        assert_eq!(resolve_plain("-9223372036854775808"), Value::Int(i64::MIN));
        assert_eq!(resolve_plain("-0x8000000000000000"), Value::Int(i64::MIN));
        assert!(matches!(resolve_plain("9223372036854775808"), Value::Float(_)));
    }

    #[test]
    fn str_tag_keeps_scalars_as_text() {
        let v = decode(b"a: !!str 42\nb: !!str true\nc: !!str ~\n!!str 7: x\nd: 42\n").unwrap();
        let expected: Value = [
            (Key::from("a"), Value::from("42")),
            (Key::from("b"), Value::from("true")),
            (Key::from("c"), Value::from("~")),
            (Key::from("7"), Value::from("x")),
            (Key::from("d"), Value::Int(42)),
        ]
        .into_iter()
        .collect();
        assert_eq!(v, expected);
    }

    #[test]
    fn long_keys_use_explicit_form() {
        let long = "k".repeat(1100);
        let v: Value = [
            (long.as_str(), Value::from(vec![1, 2])),
            ("short", Value::Int(1)),
        ]
        .into_iter()
        .collect();
        let out = encode(&v);
        assert!(out.starts_with(&format!("? {long}\n:\n  - 1\n")));
        assert_eq!(decode(out.as_bytes()).unwrap(), v);

        let nested: Value = [(long.as_str(), Value::from("x"))].into_iter().collect();
        let out = encode(&nested);
        assert_eq!(out, format!("? {long}\n: x\n"));
        assert_eq!(decode(out.as_bytes()).unwrap(), nested);
    }

    #[test]
    fn ambiguous_strings_are_quoted() {
        assert_eq!(quote_if_needed("hello world"), "hello world");
        assert_eq!(quote_if_needed("42"), "\"42\"");
        assert_eq!(quote_if_needed("true"), "\"true\"");
        assert_eq!(quote_if_needed(""), "\"\"");
        assert_eq!(quote_if_needed("a: b"), "\"a: b\"");
        assert_eq!(quote_if_needed("- x"), "\"- x\"");
        assert_eq!(quote_if_needed("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(quote_if_needed("€290.77"), "€290.77");
    }

    #[test]
    fn floats_keep_a_fraction() {
        assert_eq!(format_float(4.0), "4.0");
        assert_eq!(format_float(4.4), "4.4");
        assert_eq!(format_float(f64::INFINITY), ".inf");
    }
}
