//! Record framing for vault-format files.
//!
//! One `NAME=BASE64(value)` pair per line. Values may hold newlines and
//! `=` without escaping. Blank lines and `#` comments are ignored; a bad
//! line is skipped with a warning instead of failing the whole read.
//!
//! Values are opaque bytes. Nothing here assumes they are UTF-8; callers
//! that need text go through [`text`].

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;
use zeroize::Zeroizing;

/// Decrypted name → value map. Sorted by name.
pub type SecretMap = BTreeMap<String, Zeroizing<Vec<u8>>>;

/// Stored form of a text value.
pub fn bytes(value: &str) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(value.as_bytes().to_vec())
}

/// Text view of a stored value. Invalid UTF-8 is replaced, not dropped.
pub fn text(value: &[u8]) -> Zeroizing<String> {
    Zeroizing::new(String::from_utf8_lossy(value).into_owned())
}

/// Base64-encode bytes with the standard padded alphabet.
pub fn encode_value(value: &[u8]) -> String {
    STANDARD.encode(value)
}

/// Decode a standard padded base64 string.
pub fn decode_value(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(encoded.trim())
}

/// Serialize a map to framed text.
pub fn encode(map: &SecretMap) -> Zeroizing<String> {
    let mut out = Zeroizing::new(String::new());
    for (name, value) in map {
        out.push_str(name);
        out.push('=');
        out.push_str(&encode_value(value));
        out.push('\n');
    }
    out
}

/// Parse framed text, skipping malformed lines.
pub fn decode(text: &str) -> SecretMap {
    let mut map = SecretMap::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        match decode_line(line) {
            Some((name, value)) => {
                map.insert(name, value);
            }
            None => warn!(line = idx + 1, "skipping corrupt vault record"),
        }
    }
    map
}

fn decode_line(line: &str) -> Option<(String, Zeroizing<Vec<u8>>)> {
    let (name, encoded) = line.split_once('=')?;
    if name.is_empty() {
        return None;
    }
    let value = Zeroizing::new(decode_value(encoded).ok()?);
    Some((name.to_string(), value))
}
