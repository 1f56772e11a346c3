//! Inlines parameters into SQL text as quoted literals.
//!
//! Placeholders are `%s` / `%d` for positional parameters and `%(name)s` /
//! `%(name)d` for named ones. When parameters are supplied a literal percent
//! sign must be written `%%`; without parameters the text is sent verbatim.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde_json::Value;

use crate::error::{Error, Result};

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Rendered as `(a,b,c)`, for `IN` lists. Elements must be scalar;
    /// [`substitute`] rejects a list that contains another list.
    List(Vec<Param>),
}

/// A parameter container: either a sequence or a mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    Positional(Vec<Param>),
    Named(BTreeMap<String, Param>),
}

impl Params {
    pub fn positional<I, P>(values: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Param>,
    {
        Params::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, P>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<Param>,
    {
        Params::Named(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

macro_rules! param_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<$t> for Param {
            fn from(v: $t) -> Self {
                Param::$variant(v.into())
            }
        })*
    };
}

param_from! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => Str,
    &str => Str,
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map_or(Param::Null, Into::into)
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(v: Vec<T>) -> Self {
        Param::List(v.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<Value> for Params {
    type Error = Error;

    /// Accepts a JSON array (positional) or object (named). Anything else,
    /// and any element that is not a scalar or a list of scalars, is rejected.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(param_from_json)
                .collect::<Result<Vec<_>>>()
                .map(Params::Positional),
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| param_from_json(v).map(|p| (k, p)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Params::Named),
            other => Err(Error::programming(format!(
                "unsupported parameter container: {}",
                json_kind(&other)
            ))),
        }
    }
}

fn param_from_json(value: Value) -> Result<Param> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(scalar_from_json)
            .collect::<Result<Vec<_>>>()
            .map(Param::List),
        other => scalar_from_json(other),
    }
}

fn scalar_from_json(value: Value) -> Result<Param> {
    match value {
        Value::Null => Ok(Param::Null),
        Value::Bool(b) => Ok(Param::Bool(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Param::Int(i)),
            None => n
                .as_f64()
                .map(Param::Float)
                .ok_or_else(|| Error::programming(format!("unsupported number: {n}"))),
        },
        Value::String(s) => Ok(Param::Str(s)),
        other => Err(Error::programming(format!(
            "unsupported parameter value: {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders `param` as a SQL literal.
///
/// Infallible: nested lists are rendered as written. Use [`substitute`] to
/// have them rejected.
pub fn quote(param: &Param) -> String {
    match param {
        Param::Null => "NULL".to_string(),
        Param::Bool(true) => "TRUE".to_string(),
        Param::Bool(false) => "FALSE".to_string(),
        Param::Int(i) => i.to_string(),
        Param::Float(f) if f.is_nan() => "nan()".to_string(),
        Param::Float(f) if f.is_infinite() && *f > 0.0 => "infinity()".to_string(),
        Param::Float(f) if f.is_infinite() => "-infinity()".to_string(),
        // `{:?}` keeps the decimal point: 1.0 stays a double literal
        Param::Float(f) => format!("{f:?}"),
        Param::Str(s) => quote_string(s),
        Param::List(items) => {
            let inner = items.iter().map(quote).collect::<Vec<_>>().join(",");
            format!("({inner})")
        }
    }
}

/// Single quotes are doubled. Text holding a backslash or a control
/// character is written as a `U&'...'` literal with `\XXXX` escapes so
/// it survives any client or log in between intact.
pub fn quote_string(s: &str) -> String {
    let needs_unicode = s.chars().any(|c| c == '\\' || c.is_control());
    if !needs_unicode {
        return format!("'{}'", s.replace('\'', "''"));
    }

    let mut out = String::with_capacity(s.len() + 8);
    out.push_str("U&'");
    for c in s.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\005C"),
            c if c.is_control() => {
                let _ = write!(out, "\\{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Substitutes `params` into `sql`. With `None` the text is returned unchanged.
pub fn substitute(sql: &str, params: Option<&Params>) -> Result<String> {
    match params {
        None => Ok(sql.to_string()),
        Some(params) => Formatter::new(params).format(sql),
    }
}

struct Formatter<'a> {
    params: &'a Params,
    next_positional: usize,
}

impl<'a> Formatter<'a> {
    fn new(params: &'a Params) -> Self {
        Self {
            params,
            next_positional: 0,
        }
    }

    fn format(mut self, sql: &str) -> Result<String> {
        let mut out = String::with_capacity(sql.len());
        let mut chars = sql.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.next() {
                None => return Err(Error::programming("incomplete format")),
                Some('%') => out.push('%'),
                Some('(') => {
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some(')') => break,
                            Some(k) => key.push(k),
                            None => return Err(Error::programming("incomplete format key")),
                        }
                    }
                    let conversion = chars
                        .next()
                        .ok_or_else(|| Error::programming("incomplete format"))?;
                    let param = self.named(&key)?;
                    out.push_str(&convert(conversion, param)?);
                }
                Some(conversion) => {
                    let param = self.positional()?;
                    out.push_str(&convert(conversion, param)?);
                }
            }
        }

        if let Params::Positional(values) = self.params {
            if self.next_positional < values.len() {
                return Err(Error::programming(
                    "not all arguments converted during string formatting",
                ));
            }
        }
        Ok(out)
    }

    fn positional(&mut self) -> Result<&'a Param> {
        let Params::Positional(values) = self.params else {
            return Err(Error::programming(
                "positional placeholder used with named parameters",
            ));
        };
        let param = values
            .get(self.next_positional)
            .ok_or_else(|| Error::programming("not enough arguments for format string"))?;
        self.next_positional += 1;
        Ok(param)
    }

    fn named(&self, key: &str) -> Result<&'a Param> {
        let Params::Named(values) = self.params else {
            return Err(Error::programming(
                "named placeholder used with positional parameters",
            ));
        };
        values
            .get(key)
            .ok_or_else(|| Error::programming(format!("missing parameter: {key}")))
    }
}

fn convert(conversion: char, param: &Param) -> Result<String> {
    match conversion {
        's' => match param {
            Param::List(items) if items.iter().any(|p| matches!(p, Param::List(_))) => {
                Err(Error::programming("nested lists cannot be rendered as a literal"))
            }
            other => Ok(quote(other)),
        },
        'd' | 'i' => match param {
            Param::Int(i) => Ok(i.to_string()),
            Param::Bool(b) => Ok(i64::from(*b).to_string()),
            // 2^63 is exactly representable; anything outside [-2^63, 2^63) would saturate
            Param::Float(f) if (i64::MIN as f64..i64::MAX as f64).contains(&f.trunc()) => {
                Ok((f.trunc() as i64).to_string())
            }
            Param::Float(f) => Err(Error::programming(format!(
                "%{conversion} format: {f} does not fit in a 64-bit integer"
            ))),
            other => Err(Error::programming(format!(
                "%{conversion} format: a number is required, not {other:?}"
            ))),
        },
        other => Err(Error::programming(format!(
            "unsupported format character '{other}'"
        ))),
    }
}
