//! Block-style YAML output that YAML 1.1 readers load back unchanged.
//!
//! serde_yaml resolves plain scalars with the YAML 1.2 core schema, so it
//! writes strings such as `on`, `yes` or `1_000` without quotes. A service that
//! parses its config with a YAML 1.1 loader would read those back as booleans
//! or integers. Here every string a YAML 1.1 resolver would not treat as a
//! string is single-quoted; everything else is rendered by serde_yaml.

use crate::error::Result;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::OnceLock;

const INDENT: usize = 2;

static IMPLICIT_RE: OnceLock<Regex> = OnceLock::new();

/// Plain scalars a YAML 1.1 resolver turns into something other than a string.
fn implicit_re() -> &'static Regex {
    IMPLICIT_RE.get_or_init(|| {
        Regex::new(concat!(
            // bool, null, merge and value keys
            r"^(?:|y|Y|yes|Yes|YES|n|N|no|No|NO|true|True|TRUE|false|False|FALSE",
            r"|on|On|ON|off|Off|OFF|~|null|Null|NULL|<<|=)$",
            // int, including base 60
            r"|^[-+]?(?:0b[01_]+|0x[0-9a-fA-F_]+|0[0-7_]+|0|[1-9][0-9_]*(?::[0-5]?[0-9])*)$",
            // float
            r"|^[-+]?(?:[0-9][0-9_]*)?\.[0-9_]*(?:[eE][-+]?[0-9]+)?$",
            r"|^[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*$",
            r"|^[-+]?\.(?:inf|Inf|INF)$|^\.(?:nan|NaN|NAN)$",
            // timestamp
            r"|^[0-9]{4}-[0-9]{1,2}-[0-9]{1,2}",
            r"(?:(?:[Tt]|[ \t]+)[0-9]{1,2}:[0-9]{2}:[0-9]{2}(?:\.[0-9]*)?",
            r"(?:[ \t]*(?:Z|[-+][0-9]{1,2}(?::[0-9]{2})?))?)?$",
        ))
        .unwrap()
    })
}

pub(crate) fn needs_quotes(s: &str) -> bool {
    implicit_re().is_match(s)
}

/// Render a document root. Tagged values and non-scalar keys are left to
/// serde_yaml as-is.
pub(crate) fn to_string(root: &Mapping) -> Result<String> {
    if !is_plain_mapping(root) {
        return Ok(serde_yaml::to_string(root)?);
    }
    if root.is_empty() {
        return Ok("{}\n".to_string());
    }
    let mut out = String::new();
    write_mapping(&mut out, root, 0)?;
    Ok(out)
}

fn is_scalar(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

fn is_plain(value: &Value) -> bool {
    match value {
        Value::Tagged(_) => false,
        Value::Sequence(items) => items.iter().all(is_plain),
        Value::Mapping(map) => is_plain_mapping(map),
        _ => true,
    }
}

fn is_plain_mapping(map: &Mapping) -> bool {
    map.iter().all(|(k, v)| is_scalar(k) && is_plain(v))
}

fn push_indent(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat(' ').take(indent));
}

fn write_mapping(out: &mut String, map: &Mapping, indent: usize) -> Result<()> {
    for (key, value) in map {
        push_indent(out, indent);
        out.push_str(&scalar(key)?);
        out.push(':');
        match value {
            Value::Mapping(child) if !child.is_empty() => {
                out.push('\n');
                write_mapping(out, child, indent + INDENT)?;
            }
            // serde_yaml style: sequence items sit at the key's indent
            Value::Sequence(items) if !items.is_empty() => {
                out.push('\n');
                write_sequence(out, items, indent)?;
            }
            _ => {
                out.push(' ');
                out.push_str(&scalar(value)?);
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn write_sequence(out: &mut String, items: &[Value], indent: usize) -> Result<()> {
    for item in items {
        // Render one level deeper, then swap the first indent for the dash.
        let mut nested = String::new();
        match item {
            Value::Mapping(map) if !map.is_empty() => {
                write_mapping(&mut nested, map, indent + INDENT)?;
            }
            Value::Sequence(seq) if !seq.is_empty() => {
                write_sequence(&mut nested, seq, indent + INDENT)?;
            }
            _ => {
                push_indent(&mut nested, indent + INDENT);
                nested.push_str(&scalar(item)?);
                nested.push('\n');
            }
        }
        push_indent(out, indent);
        out.push_str("- ");
        out.push_str(&nested[indent + INDENT..]);
    }
    Ok(())
}

fn scalar(value: &Value) -> Result<String> {
    match value {
        Value::String(s) if needs_quotes(s) => Ok(single_quoted(s)),
        Value::String(s) => {
            let line = serde_line(value)?;
            if line.contains('\n') {
                Ok(double_quoted(s))
            } else {
                Ok(line)
            }
        }
        Value::Sequence(_) => Ok("[]".to_string()),
        Value::Mapping(_) => Ok("{}".to_string()),
        _ => serde_line(value),
    }
}

fn serde_line(value: &Value) -> Result<String> {
    let rendered = serde_yaml::to_string(value)?;
    Ok(rendered.trim_end_matches('\n').to_string())
}

fn single_quoted(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
