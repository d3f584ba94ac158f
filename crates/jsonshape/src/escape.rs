//! JSON string escaping in both directions.

use alloc::vec::Vec;

use crate::{
    encoder::{Encoder, Sink},
    error::{DecodeError, EncodeError, ErrorKind},
};

/// The short escape for `b`, if JSON has one that must be used.
#[inline]
fn short_escape(b: u8) -> Option<&'static [u8; 2]> {
    Some(match b {
        b'"' => br#"\""#,
        b'\\' => br"\\",
        0x08 => br"\b",
        0x0c => br"\f",
        b'\r' => br"\r",
        b'\n' => br"\n",
        b'\t' => br"\t",
        _ => return None,
    })
}

/// Writes `bytes` as string content, without the surrounding quotes.
///
/// Runs that need no escaping are handed to the sink in one piece. A control
/// byte without a short escape fails the whole encode so the output stays
/// valid JSON.
pub(crate) fn write_escaped<S: Sink + ?Sized>(
    bytes: &[u8],
    enc: &mut Encoder<'_, S>,
) -> Result<(), EncodeError> {
    let mut run = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(escape) = short_escape(b) {
            if run < i {
                enc.write(&bytes[run..i])?;
            }
            enc.write(escape)?;
            run = i + 1;
        } else if b < 0x20 {
            return Err(EncodeError::ControlCharacter { byte: b });
        }
    }
    if run < bytes.len() {
        enc.write(&bytes[run..])?;
    }
    Ok(())
}

/// Writes `bytes` wrapped in quotes.
pub(crate) fn write_quoted<S: Sink + ?Sized>(
    bytes: &[u8],
    enc: &mut Encoder<'_, S>,
) -> Result<(), EncodeError> {
    enc.write(b"\"")?;
    write_escaped(bytes, enc)?;
    enc.write(b"\"")
}

fn hex4(bytes: &[u8]) -> Option<u16> {
    let mut acc = 0u16;
    for &b in bytes.get(..4)? {
        let d = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return None,
        };
        acc = (acc << 4) | u16::from(d);
    }
    Some(acc)
}

/// Appends the unescaped form of `raw` to `out`.
///
/// `raw` is string content whose escapes were already validated by the
/// scanner; `base` is its offset in the input and only serves error offsets.
/// `\uXXXX` escapes are decoded to UTF-8, joining surrogate pairs. A lone
/// surrogate is an unexpected symbol.
pub(crate) fn unescape_into(raw: &[u8], base: usize, out: &mut Vec<u8>) -> Result<(), DecodeError> {
    let bad = |at: usize| DecodeError::new(ErrorKind::UnexpectedSymbol, base + at);
    let mut i = 0;
    while i < raw.len() {
        let Some(offset) = raw[i..].iter().position(|&b| b == b'\\') else {
            out.extend_from_slice(&raw[i..]);
            break;
        };
        out.extend_from_slice(&raw[i..i + offset]);
        i += offset;

        let byte = match raw.get(i + 1) {
            Some(b'"') => b'"',
            Some(b'/') => b'/',
            Some(b'\\') => b'\\',
            Some(b'b') => 0x08,
            Some(b'f') => 0x0c,
            Some(b'r') => b'\r',
            Some(b'n') => b'\n',
            Some(b't') => b'\t',
            Some(b'u') => {
                let unit = raw.get(i + 2..).and_then(hex4).ok_or_else(|| bad(i))?;
                let (code, len) = match unit {
                    0xD800..=0xDBFF => {
                        let low = raw
                            .get(i + 6..i + 8)
                            .filter(|p| *p == br"\u")
                            .and_then(|_| hex4(&raw[i + 8..]))
                            .filter(|low| (0xDC00..=0xDFFF).contains(low))
                            .ok_or_else(|| bad(i))?;
                        let high = u32::from(unit - 0xD800);
                        (0x10000 + (high << 10) + u32::from(low - 0xDC00), 12)
                    }
                    0xDC00..=0xDFFF => return Err(bad(i)),
                    _ => (u32::from(unit), 6),
                };
                let ch = char::from_u32(code).ok_or_else(|| bad(i))?;
                out.extend_from_slice(ch.encode_utf8(&mut [0; 4]).as_bytes());
                i += len;
                continue;
            }
            _ => return Err(bad(i)),
        };
        out.push(byte);
        i += 2;
    }
    Ok(())
}
