//! Ascii85 decoding for the encoded configuration key.
//!
//! Accepts the Adobe variant with or without the `<~ ~>` delimiters, the
//! `z` shorthand for an all-zero group, and ignores embedded whitespace.

use crate::{RisError, Result};

const OFFSET: u8 = b'!';
const PAD_DIGIT: u64 = 84;

/// Decode an Ascii85 string into raw bytes.
pub(crate) fn decode(input: &str) -> Result<Vec<u8>> {
    let mut body = input.trim();
    if let Some(stripped) = body.strip_prefix("<~") {
        body = stripped;
    }
    if let Some(stripped) = body.strip_suffix("~>") {
        body = stripped;
    }

    let mut out = Vec::with_capacity(body.len() * 4 / 5 + 4);
    let mut group = [0u8; 5];
    let mut filled = 0usize;

    for c in body.chars().filter(|c| !c.is_whitespace()) {
        if c == 'z' {
            if filled != 0 {
                return Err(invalid("'z' inside a group"));
            }
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !('!'..='u').contains(&c) {
            return Err(invalid(&format!("unexpected character {:?}", c)));
        }
        group[filled] = c as u8 - OFFSET;
        filled += 1;
        if filled == 5 {
            out.extend_from_slice(&group_value(&group, 5)?.to_be_bytes());
            filled = 0;
        }
    }

    match filled {
        0 => {}
        1 => return Err(invalid("dangling final character")),
        n => {
            let bytes = group_value(&group, n)?.to_be_bytes();
            out.extend_from_slice(&bytes[..n - 1]);
        }
    }

    Ok(out)
}

/// Fold the first `filled` digits of a group, padding the rest with `u`.
fn group_value(group: &[u8; 5], filled: usize) -> Result<u32> {
    let value = (0..5).fold(0u64, |acc, i| {
        let digit = if i < filled {
            u64::from(group[i])
        } else {
            PAD_DIGIT
        };
        acc * 85 + digit
    });
    u32::try_from(value).map_err(|_| invalid("group overflows 32 bits"))
}

fn invalid(reason: &str) -> RisError {
    RisError::configuration(format!("configuration key is not valid Ascii85: {}", reason))
}
