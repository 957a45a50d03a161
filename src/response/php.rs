//! Data-only reader for the PHP `serialize()` format (`o=php`)
//!
//! Only plain data is produced: scalars, arrays and objects become
//! [`PhpValue`] trees, and no class is ever instantiated. The following are
//! rejected as [`MmfError::MalformedResponse`]:
//!
//! - references (`r:` / `R:`),
//! - custom-serialized objects (`C:`) and enums (`E:`),
//! - nesting deeper than [`MAX_DEPTH`],
//! - trailing bytes after the top-level value.
//!
//! String lengths are byte counts, as PHP writes them.

use std::fmt;

use serde_json::{Map, Number, Value};

use crate::error::{MmfError, Result};

/// Maximum nesting of arrays and objects.
pub const MAX_DEPTH: usize = 128;

/// Array key: PHP arrays are keyed by integers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhpKey {
    /// Integer key.
    Int(i64),
    /// String key.
    String(String),
}

impl fmt::Display for PhpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhpKey::Int(i) => write!(f, "{i}"),
            PhpKey::String(s) => f.write_str(s),
        }
    }
}

/// A decoded PHP value.
#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    /// `N;`
    Null,
    /// `b:0;` / `b:1;`
    Bool(bool),
    /// `i:<n>;`
    Int(i64),
    /// `d:<f>;`
    Float(f64),
    /// `s:<len>:"<bytes>";`
    String(String),
    /// `a:<n>:{<key><value>...}` in source order.
    Array(Vec<(PhpKey, PhpValue)>),
    /// `O:<len>:"<class>":<n>:{<name><value>...}`, kept as plain data.
    Object {
        /// Class name as written by the server.
        class: String,
        /// Properties in source order. Non-public names keep PHP's
        /// `\0*\0` / `\0Class\0` prefix.
        properties: Vec<(String, PhpValue)>,
    },
}

impl PhpValue {
    /// Parses a complete serialized value.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapmyfitness::response::php::{PhpKey, PhpValue};
    ///
    /// let value = PhpValue::parse(r#"a:1:{s:4:"name";s:3:"Bob";}"#).unwrap();
    /// assert_eq!(
    ///     value,
    ///     PhpValue::Array(vec![(PhpKey::String("name".into()), PhpValue::String("Bob".into()))])
    /// );
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = Parser {
            input: input.trim_end().as_bytes(),
            pos: 0,
        };
        let value = parser.value(0)?;
        if parser.pos != parser.input.len() {
            return Err(parser.error("unexpected trailing data"));
        }
        Ok(value)
    }

    /// Looks up a string key in an array, or a public property of an object.
    pub fn get(&self, key: &str) -> Option<&PhpValue> {
        match self {
            PhpValue::Array(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, PhpKey::String(s) if s == key))
                .map(|(_, v)| v),
            PhpValue::Object { properties, .. } => properties
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Converts to JSON: lists (`0..n` integer keys) become arrays, other
    /// arrays and objects become JSON objects, non-finite floats become
    /// `null`.
    pub fn to_json(&self) -> Value {
        match self {
            PhpValue::Null => Value::Null,
            PhpValue::Bool(b) => Value::Bool(*b),
            PhpValue::Int(i) => Value::Number((*i).into()),
            PhpValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            PhpValue::String(s) => Value::String(s.clone()),
            PhpValue::Array(entries) => {
                let is_list = entries
                    .iter()
                    .enumerate()
                    .all(|(i, (k, _))| *k == PhpKey::Int(i as i64));
                if is_list {
                    Value::Array(entries.iter().map(|(_, v)| v.to_json()).collect())
                } else {
                    Value::Object(
                        entries
                            .iter()
                            .map(|(k, v)| (k.to_string(), v.to_json()))
                            .collect::<Map<_, _>>(),
                    )
                }
            }
            PhpValue::Object { properties, .. } => Value::Object(
                properties
                    .iter()
                    .map(|(name, v)| (visible_property_name(name).to_string(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

/// Strips the `\0*\0` / `\0Class\0` visibility prefix.
fn visible_property_name(name: &str) -> &str {
    match name.strip_prefix('\0') {
        Some(rest) => rest.split_once('\0').map(|(_, n)| n).unwrap_or(rest),
        None => name,
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> MmfError {
        MmfError::MalformedResponse(format!(
            "invalid PHP serialized data at byte {}: {message}",
            self.pos
        ))
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    /// Reads up to (not including) `terminator` and consumes the terminator.
    fn read_until(&mut self, terminator: u8) -> Result<&'a str> {
        let input = self.input;
        let start = self.pos;
        let offset = input[start..]
            .iter()
            .position(|&b| b == terminator)
            .ok_or_else(|| self.error(&format!("missing '{}'", terminator as char)))?;
        self.pos = start + offset + 1;
        std::str::from_utf8(&input[start..start + offset])
            .map_err(|_| self.error("non-UTF-8 token"))
    }

    fn read_int(&mut self, terminator: u8) -> Result<i64> {
        let raw = self.read_until(terminator)?;
        raw.parse::<i64>()
            .map_err(|_| self.error(&format!("invalid integer '{raw}'")))
    }

    fn read_count(&mut self) -> Result<usize> {
        let n = self.read_int(b':')?;
        usize::try_from(n).map_err(|_| self.error("negative length"))
    }

    /// `<len>:"<bytes>"`, without the trailing terminator.
    fn read_quoted(&mut self) -> Result<String> {
        let len = self.read_count()?;
        self.expect(b'"')?;
        let input = self.input;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= input.len())
            .ok_or_else(|| self.error("string length exceeds input"))?;
        let bytes = &input[self.pos..end];
        self.pos = end;
        self.expect(b'"')?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn value(&mut self, depth: usize) -> Result<PhpValue> {
        let tag = self.peek().ok_or_else(|| self.error("unexpected end of input"))?;
        self.pos += 1;

        match tag {
            b'N' => {
                self.expect(b';')?;
                Ok(PhpValue::Null)
            }
            b'b' => {
                self.expect(b':')?;
                match self.read_until(b';')? {
                    "0" => Ok(PhpValue::Bool(false)),
                    "1" => Ok(PhpValue::Bool(true)),
                    other => Err(self.error(&format!("invalid boolean '{other}'"))),
                }
            }
            b'i' => {
                self.expect(b':')?;
                Ok(PhpValue::Int(self.read_int(b';')?))
            }
            b'd' => {
                self.expect(b':')?;
                let raw = self.read_until(b';')?;
                let value = match raw {
                    "INF" => f64::INFINITY,
                    "-INF" => f64::NEG_INFINITY,
                    "NAN" => f64::NAN,
                    _ => raw
                        .parse::<f64>()
                        .map_err(|_| self.error(&format!("invalid float '{raw}'")))?,
                };
                Ok(PhpValue::Float(value))
            }
            b's' => {
                self.expect(b':')?;
                let s = self.read_quoted()?;
                self.expect(b';')?;
                Ok(PhpValue::String(s))
            }
            b'a' => {
                self.expect(b':')?;
                let entries = self.entries(depth, |p| p.key())?;
                Ok(PhpValue::Array(entries))
            }
            b'O' => {
                self.expect(b':')?;
                let class = self.read_quoted()?;
                self.expect(b':')?;
                let properties = self.entries(depth, |p| match p.key()? {
                    PhpKey::String(name) => Ok(name),
                    PhpKey::Int(i) => Ok(i.to_string()),
                })?;
                Ok(PhpValue::Object { class, properties })
            }
            b'r' | b'R' => Err(self.error("references are not supported")),
            b'C' => Err(self.error("custom-serialized objects are not supported")),
            b'E' => Err(self.error("enum values are not supported")),
            other => Err(self.error(&format!("unknown type tag '{}'", other as char))),
        }
    }

    /// `<n>:{<key><value>...}`
    fn entries<K>(
        &mut self,
        depth: usize,
        mut read_key: impl FnMut(&mut Self) -> Result<K>,
    ) -> Result<Vec<(K, PhpValue)>> {
        if depth + 1 > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        let count = self.read_count()?;
        self.expect(b'{')?;

        let remaining = self.input.len() - self.pos;
        let mut entries = Vec::with_capacity(count.min(remaining / 4));
        for _ in 0..count {
            let key = read_key(self)?;
            let value = self.value(depth + 1)?;
            entries.push((key, value));
        }

        self.expect(b'}')?;
        Ok(entries)
    }

    fn key(&mut self) -> Result<PhpKey> {
        match self.value(MAX_DEPTH)? {
            PhpValue::Int(i) => Ok(PhpKey::Int(i)),
            PhpValue::String(s) => Ok(PhpKey::String(s)),
            _ => Err(self.error("array keys must be integers or strings")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
