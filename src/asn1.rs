//! Thin ASN.1/DER primitive layer.
//!
//! Low-level tag/length/primitive decoding is built on `der-parser`/`nom`
//! rather than a hand-rolled byte pusher. Every function here returns
//! `(remaining_input, value)` in the usual `nom` combinator style, but maps
//! failures into this crate's [`Asn1Error`] at the boundary so callers never
//! see a raw `nom::Err`.

use der_parser::ber::{ber_read_element_header, BerObjectContent, BerTag};
use der_parser::der::{parse_der_bitstring, parse_der_bool, parse_der_integer, parse_der_oid, DerObject};
use der_parser::oid::Oid;

use crate::error::Asn1Error;

type R<'a, T> = Result<(&'a [u8], T), Asn1Error>;

fn map_nom_err<'a, T>(r: nom::IResult<&'a [u8], T, der_parser::error::BerError>) -> R<'a, T> {
    r.map_err(|e| match e {
        nom::Err::Incomplete(_) => Asn1Error::OutOfData,
        nom::Err::Error(_) | nom::Err::Failure(_) => Asn1Error::InvalidData,
    })
}

/// A decoded `SEQUENCE` / context-tagged header: byte range of the content
/// and whether the overall TLV consumed exactly `expected_len` of input.
pub struct Header<'a> {
    pub content: &'a [u8],
}

/// Read a `SEQUENCE` tag/length header, returning its content bytes and the
/// remaining bytes after the whole TLV.
pub fn sequence(i: &[u8]) -> R<'_, Header<'_>> {
    let (rem, hdr) = map_nom_err(ber_read_element_header(i))?;
    if !hdr.is_constructed() || hdr.tag() != BerTag::Sequence {
        return Err(Asn1Error::UnexpectedTag);
    }
    let len = hdr.len.definite().map_err(|_| Asn1Error::InvalidLength)?;
    if len > rem.len() {
        return Err(Asn1Error::OutOfData);
    }
    let (content, rest) = rem.split_at(len);
    Ok((rest, Header { content }))
}

/// Read a context-specific constructed tag `[n]` EXPLICIT wrapper, if
/// present. Returns `None` (consuming no input) if the next tag does not
/// match `n` — used for OPTIONAL fields like `version [0]` and
/// `extensions [3]`.
pub fn optional_explicit_context(i: &[u8], n: u8) -> R<'_, Option<&[u8]>> {
    match ber_read_element_header(i) {
        Ok((rem, hdr)) if hdr.is_contextspecific() && hdr.tag() == BerTag(n as u32) => {
            let len = hdr
                .len
                .definite()
                .map_err(|_| Asn1Error::InvalidLength)?;
            if len > rem.len() {
                return Err(Asn1Error::LengthMismatch);
            }
            let (content, rest) = rem.split_at(len);
            Ok((rest, Some(content)))
        }
        Ok(_) | Err(nom::Err::Error(_)) | Err(nom::Err::Failure(_)) => Ok((i, None)),
        Err(nom::Err::Incomplete(_)) => Err(Asn1Error::OutOfData),
    }
}

/// Read a context-specific IMPLICIT primitive/constructed tag `[n]` if
/// present, returning its raw content bytes.
pub fn optional_implicit_context(i: &[u8], n: u8) -> R<'_, Option<&[u8]>> {
    if i.is_empty() {
        return Ok((i, None));
    }
    match ber_read_element_header(i) {
        Ok((rem, hdr)) if hdr.is_contextspecific() && hdr.tag() == BerTag(n as u32) => {
            let len = hdr
                .len
                .definite()
                .map_err(|_| Asn1Error::InvalidLength)?;
            if len > rem.len() {
                return Err(Asn1Error::LengthMismatch);
            }
            let (content, rest) = rem.split_at(len);
            Ok((rest, Some(content)))
        }
        Ok(_) | Err(nom::Err::Error(_)) | Err(nom::Err::Failure(_)) => Ok((i, None)),
        Err(nom::Err::Incomplete(_)) => Err(Asn1Error::OutOfData),
    }
}

/// Read an `INTEGER`, returning its raw big-endian two's-complement bytes
/// (used for serial numbers, where the caller wants the bytes verbatim, not
/// a parsed magnitude).
pub fn integer_bytes(i: &[u8]) -> R<'_, &[u8]> {
    let (rem, obj) = map_nom_err(parse_der_integer(i))?;
    match obj.content {
        BerObjectContent::Integer(b) => Ok((rem, b)),
        _ => Err(Asn1Error::UnexpectedTag),
    }
}

/// Read an `INTEGER` small enough to fit an `i64` (version, path length).
pub fn small_integer(i: &[u8]) -> R<'_, i64> {
    let (rem, obj) = map_nom_err(parse_der_integer(i))?;
    match obj.content {
        BerObjectContent::Integer(b) => Ok((rem, be_bytes_to_i64(b))),
        _ => Err(Asn1Error::UnexpectedTag),
    }
}

fn be_bytes_to_i64(b: &[u8]) -> i64 {
    b.iter().fold(0i64, |v, &byte| (v << 8) | byte as i64)
}

/// Read a `BOOLEAN`.
pub fn boolean(i: &[u8]) -> R<'_, bool> {
    let (rem, obj) = map_nom_err(parse_der_bool(i))?;
    match obj.content {
        BerObjectContent::Boolean(b) => Ok((rem, b)),
        _ => Err(Asn1Error::UnexpectedTag),
    }
}

/// Read a `BIT STRING`, returning its content with the leading
/// unused-bits-count byte stripped.
pub fn bit_string(i: &[u8]) -> R<'_, &[u8]> {
    let (rem, obj) = map_nom_err(parse_der_bitstring(i))?;
    match obj.content {
        BerObjectContent::BitString(_unused_bits, bs) => Ok((rem, bs.data)),
        _ => Err(Asn1Error::UnexpectedTag),
    }
}

/// Read an `OBJECT IDENTIFIER`.
pub fn object_identifier(i: &[u8]) -> R<'_, Oid<'_>> {
    let (rem, obj) = map_nom_err(parse_der_oid(i))?;
    match obj.content {
        BerObjectContent::OID(oid) => Ok((rem, oid)),
        _ => Err(Asn1Error::UnexpectedTag),
    }
}

/// Read an `OCTET STRING`, returning its raw content.
pub fn octet_string(i: &[u8]) -> R<'_, &[u8]> {
    use der_parser::der::parse_der_octetstring;
    let (rem, obj) = map_nom_err(parse_der_octetstring(i))?;
    match obj.content {
        BerObjectContent::OctetString(b) => Ok((rem, b)),
        _ => Err(Asn1Error::UnexpectedTag),
    }
}

/// A generic DER object, for AlgorithmIdentifier parameters which are
/// usually `NULL` but are stored as-is.
pub fn any(i: &[u8]) -> R<'_, DerObject<'_>> {
    use der_parser::der::parse_der;
    map_nom_err(parse_der(i))
}
