//! PEM framing.
//!
//! Extracts a DER payload from between `BEGIN`/`END` markers, decoding the
//! base64 body with `data-encoding` rather than pulling in a dedicated PEM
//! crate.

use data_encoding::BASE64;

use crate::error::X509Error;

const BEGIN_MARKER: &str = "-----BEGIN CERTIFICATE-----";
const END_MARKER: &str = "-----END CERTIFICATE-----";

/// True if `buf` contains the PEM begin marker anywhere — matching the
/// original's `strstr(buf, "-----BEGIN CERTIFICATE-----")` substring
/// check exactly, not a line-anchored parse.
pub fn looks_like_pem(buf: &[u8]) -> bool {
    contains(buf, BEGIN_MARKER.as_bytes())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|p| p + from)
}

/// One decoded PEM block: the DER bytes, and how many input bytes (from the
/// start of `buf`) the block (including its markers and trailing newline)
/// consumed.
pub struct Block {
    pub der: Vec<u8>,
    pub consumed: usize,
}

/// Find and decode the next `BEGIN CERTIFICATE` / `END CERTIFICATE` block
/// in `buf`. Returns `Ok(None)` if no `BEGIN` marker is present (the
/// reference implementation's `POLARSSL_ERR_PEM_NO_HEADER_FOOTER_PRESENT`
/// sentinel, modeled here as `Ok(None)` rather than an error so the caller
/// loop in `Chain::append` can distinguish "done scanning" from "malformed
/// block").
pub fn next_block(buf: &[u8]) -> Result<Option<Block>, X509Error> {
    let begin_at = match find(buf, BEGIN_MARKER.as_bytes(), 0) {
        Some(p) => p,
        None => return Ok(None),
    };
    let body_start = begin_at + BEGIN_MARKER.len();
    let end_at = find(buf, END_MARKER.as_bytes(), body_start).ok_or(X509Error::CertUnknownFormat)?;

    let body = &buf[body_start..end_at];
    let cleaned: Vec<u8> = body
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    let der = BASE64
        .decode(&cleaned)
        .map_err(|_| X509Error::CertUnknownFormat)?;

    let mut consumed = end_at + END_MARKER.len();
    if buf[consumed..].first() == Some(&b'\r') {
        consumed += 1;
    }
    if buf[consumed..].first() == Some(&b'\n') {
        consumed += 1;
    }

    Ok(Some(Block { der, consumed }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_pem_marker() {
        assert!(looks_like_pem(b"-----BEGIN CERTIFICATE-----\nAA==\n-----END CERTIFICATE-----\n"));
        assert!(!looks_like_pem(&[0x30, 0x82, 0x01, 0x00]));
    }

    #[test]
    fn decodes_single_block() {
        let der = vec![0x30, 0x03, 0x01, 0x01, 0xff];
        let encoded = BASE64.encode(&der);
        let pem = format!(
            "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
            encoded
        );
        let block = next_block(pem.as_bytes()).unwrap().unwrap();
        assert_eq!(block.der, der);
        assert_eq!(block.consumed, pem.len());
    }

    #[test]
    fn missing_begin_returns_none() {
        assert!(next_block(b"not pem at all").unwrap().is_none());
    }
}
