//! Wire codec for the RIS protocol.
//!
//! Requests go out as `application/x-www-form-urlencoded` bodies built from a
//! [`FieldMap`]. Responses come back as newline-delimited `KEY=VALUE` text and
//! are decoded into a [`Response`].

mod response;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

pub use response::{Counter, KcEvent, Response, RuleTriggered};

use crate::{RisError, Result};

/// Payment token field.
pub const PTOK: &str = "PTOK";
/// Payment encoding marker field.
pub const PENC: &str = "PENC";
/// Merchant id field.
pub const MERC: &str = "MERC";

/// Marker value for KHASH-obfuscated tokens.
pub const PENC_KHASH: &str = "KHASH";
/// Marker value for masked tokens.
pub const PENC_MASK: &str = "MASK";
/// Marker value for "no encoding".
pub const PENC_NONE: &str = "";

/// Outgoing request fields.
///
/// A key can be present with no value; such keys are still sent, with an
/// empty value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap(BTreeMap<String, Option<String>>);

impl FieldMap {
    /// Create an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), Some(value.into()));
        self
    }

    /// Insert a field that may have no value.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Value of a field. `None` when the field is absent or has no value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    /// Whether the field is present, with or without a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Option<String>> {
        self.0.remove(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }
}

/// Character set used for form encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Charset {
    /// Legacy ISO-8859-1 encoding. Unmappable characters become `?`.
    #[default]
    Latin1,
    /// UTF-8.
    Utf8,
}

impl Charset {
    /// Pick the charset from the force-UTF-8 flag.
    pub fn from_force_utf8(force_utf8: bool) -> Self {
        if force_utf8 {
            Self::Utf8
        } else {
            Self::Latin1
        }
    }

    /// Content-Type header value for a body in this charset.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Latin1 => "application/x-www-form-urlencoded; charset=ISO-8859-1",
            Self::Utf8 => "application/x-www-form-urlencoded; charset=UTF-8",
        }
    }
}

fn latin1_bytes(input: &str) -> Cow<'_, [u8]> {
    if input.is_ascii() {
        return Cow::Borrowed(input.as_bytes());
    }
    Cow::Owned(
        input
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect(),
    )
}

/// Clear the payment encoding marker when there is no token to match it.
///
/// Applies when `PTOK` is absent, or when `PENC` is `KHASH` and `PTOK` has
/// no value.
pub fn guard_payment_encoding(fields: &mut FieldMap) {
    let token_missing = !fields.contains_key(PTOK);
    let khash_without_value = fields.get(PENC) == Some(PENC_KHASH) && fields.get(PTOK).is_none();
    if token_missing || khash_without_value {
        debug!("No payment token to encode, clearing {}", PENC);
        fields.set(PENC, PENC_NONE);
    }
}

/// Serialize fields into a form-urlencoded body.
///
/// The payment encoding guard runs first. Fields without a value are sent
/// as `KEY=`.
pub fn encode_fields(mut fields: FieldMap, charset: Charset) -> String {
    guard_payment_encoding(&mut fields);

    let latin1: &dyn Fn(&str) -> Cow<'_, [u8]> = &latin1_bytes;
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if charset == Charset::Latin1 {
        serializer.encoding_override(Some(latin1));
    }
    for (key, value) in fields.iter() {
        serializer.append_pair(key, value.unwrap_or(""));
    }
    serializer.finish()
}

/// Parse a newline-delimited `KEY=VALUE` stream.
///
/// Lines are split on the first `=`. Lines without one are skipped and a
/// repeated key keeps its last value.
pub fn parse_response<R: BufRead>(reader: R) -> Result<Response> {
    let mut fields = BTreeMap::new();
    for line in reader.lines() {
        let line = line.map_err(RisError::decode)?;
        let line = line.trim_end_matches('\r');
        match line.split_once('=') {
            Some((key, value)) => {
                fields.insert(key.to_string(), value.to_string());
            }
            None if line.is_empty() => {}
            None => debug!(line, "Skipping response line without '='"),
        }
    }
    Ok(Response::from_fields(fields))
}
