//! Response format selection and body decoding
//!
//! The API renders every endpoint in the format requested through the `o`
//! query parameter. [`ResponseFormat`] is fixed when the client is built and
//! [`decode`] turns the raw body into a [`Decoded`] value:
//!
//! | wire name | format                           | decoded as               |
//! |-----------|----------------------------------|--------------------------|
//! | `json`    | [`ResponseFormat::Json`]             | [`serde_json::Value`]    |
//! | `xml`     | [`ResponseFormat::Xml`]              | [`xml::XmlElement`]      |
//! | `php`     | [`ResponseFormat::NativeSerialized`] | [`php::PhpValue`]        |
//! | `txt`     | [`ResponseFormat::Raw`]              | the body, unchanged      |
//!
//! `php` is only accepted when the caller opts in with
//! `allow_native_serialized`; even then it is read by a data-only parser.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{MmfError, Result};

pub mod php;
pub mod xml;

pub use php::{PhpKey, PhpValue};
pub use xml::XmlElement;

// ---------------------------------------------------------------------------
// ResponseFormat
// ---------------------------------------------------------------------------

/// Response body format requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseFormat {
    /// `json` (default)
    #[default]
    Json,
    /// `xml`
    Xml,
    /// `php`: PHP `serialize()` output
    NativeSerialized,
    /// `txt`: body passed through unchanged
    Raw,
}

impl ResponseFormat {
    /// Every format, in wire-name order.
    pub const ALL: [ResponseFormat; 4] = [
        ResponseFormat::Json,
        ResponseFormat::Xml,
        ResponseFormat::NativeSerialized,
        ResponseFormat::Raw,
    ];

    /// Value sent as the `o` parameter.
    pub fn wire_name(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
            ResponseFormat::NativeSerialized => "php",
            ResponseFormat::Raw => "txt",
        }
    }

    /// Parses a wire name and applies the native-serialized opt-in.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::Configuration`] for an unknown name, or for `php`
    /// when `allow_native_serialized` is `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapmyfitness::response::ResponseFormat;
    ///
    /// assert_eq!(ResponseFormat::select("xml", false).unwrap(), ResponseFormat::Xml);
    /// assert!(ResponseFormat::select("php", false).is_err());
    /// assert!(ResponseFormat::select("php", true).is_ok());
    /// assert!(ResponseFormat::select("yaml", true).is_err());
    /// ```
    pub fn select(name: &str, allow_native_serialized: bool) -> Result<Self> {
        let format: ResponseFormat = name.parse()?;
        if format == ResponseFormat::NativeSerialized && !allow_native_serialized {
            return Err(MmfError::Configuration(
                "response format 'php' requires allow_native_serialized to be enabled".to_string(),
            ));
        }
        Ok(format)
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for ResponseFormat {
    type Err = MmfError;

    fn from_str(s: &str) -> Result<Self> {
        ResponseFormat::ALL
            .into_iter()
            .find(|f| f.wire_name() == s)
            .ok_or_else(|| {
                MmfError::Configuration(format!(
                    "response format must be one of 'json', 'xml', 'php', 'txt', got '{s}'"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Decoded
// ---------------------------------------------------------------------------

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Parsed JSON document.
    Json(Value),
    /// Root element of an XML document.
    Xml(XmlElement),
    /// PHP-serialized value, as data.
    Native(PhpValue),
    /// Unparsed body text.
    Raw(String),
}

impl Decoded {
    /// The JSON value, if this is a JSON body.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Decoded::Json(v) => Some(v),
            _ => None,
        }
    }

    /// The XML root element, if this is an XML body.
    pub fn as_xml(&self) -> Option<&XmlElement> {
        match self {
            Decoded::Xml(e) => Some(e),
            _ => None,
        }
    }

    /// The PHP value, if this is a native-serialized body.
    pub fn as_native(&self) -> Option<&PhpValue> {
        match self {
            Decoded::Native(v) => Some(v),
            _ => None,
        }
    }

    /// The raw text, if this is a raw body.
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Decoded::Raw(s) => Some(s),
            _ => None,
        }
    }

    /// Uniform JSON view of any decoded body.
    pub fn to_json(&self) -> Value {
        match self {
            Decoded::Json(v) => v.clone(),
            Decoded::Xml(e) => e.to_json(),
            Decoded::Native(v) => v.to_json(),
            Decoded::Raw(s) => Value::String(s.clone()),
        }
    }
}

impl Serialize for Decoded {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// decode
// ---------------------------------------------------------------------------

/// Decodes `raw` according to `format`. Pure: no I/O, no state.
///
/// # Errors
///
/// Returns [`MmfError::MalformedResponse`] when the body is not valid in the
/// given format. [`ResponseFormat::Raw`] never fails.
///
/// # Examples
///
/// ```
/// use mapmyfitness::response::{decode, Decoded, ResponseFormat};
///
/// let decoded = decode(r#"{"result":{"status":1}}"#, ResponseFormat::Json).unwrap();
/// assert_eq!(decoded.as_json().unwrap()["result"]["status"], 1);
///
/// let raw = decode("plain text", ResponseFormat::Raw).unwrap();
/// assert_eq!(raw, Decoded::Raw("plain text".to_string()));
/// ```
pub fn decode(raw: &str, format: ResponseFormat) -> Result<Decoded> {
    match format {
        ResponseFormat::Json => serde_json::from_str(raw)
            .map(Decoded::Json)
            .map_err(|e| MmfError::MalformedResponse(format!("invalid JSON: {e}"))),
        ResponseFormat::Xml => XmlElement::parse(raw).map(Decoded::Xml),
        ResponseFormat::NativeSerialized => PhpValue::parse(raw).map(Decoded::Native),
        ResponseFormat::Raw => Ok(Decoded::Raw(raw.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
