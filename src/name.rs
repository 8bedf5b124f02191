//! `Name` (RDN sequences) and the hostname/CN matcher.
//!
//! The `X509Name`/`RelativeDistinguishedName`/`AttributeTypeAndValue` types
//! and their `Display` formatting keep borrowed `&'a [u8]` fields generalized
//! to owned `Vec<u8>` so a `Certificate` can live independently of the
//! buffer it was parsed from (see DESIGN.md). The case-insensitive
//! comparator and wildcard rule are grounded in the reference
//! implementation's `x509_name_cmp` / `x509_wildcard_verify`.

use std::fmt;

use data_encoding::HEXUPPER;
use der_parser::ber::BerObjectContent;
use der_parser::der::DerObject;
use der_parser::oid::Oid;

use crate::asn1;
use crate::error::{Asn1Error, X509Error};
use crate::objects;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeAndValue {
    pub attr_type: Oid<'static>,
    pub attr_value: Vec<u8>,
    /// True if `attr_value` decoded as a printable text string (so the
    /// `Display` impl can render it as text instead of hex).
    pub is_string: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeDistinguishedName {
    pub set: Vec<AttributeTypeAndValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct X509Name {
    pub rdn_seq: Vec<RelativeDistinguishedName>,
    /// Raw encoding of the whole `Name`, used for issuer/subject byte
    /// comparisons in `check_parent`/`verify`.
    pub raw: Vec<u8>,
}

impl X509Name {
    /// All CN (`id-at-commonName`) attribute values, in RDN order.
    pub fn common_names(&self) -> impl Iterator<Item = &[u8]> {
        self.rdn_seq
            .iter()
            .flat_map(|rdn| rdn.set.iter())
            .filter(|atv| objects::oid_is_common_name(&atv.attr_type))
            .map(|atv| atv.attr_value.as_slice())
    }
}

impl fmt::Display for X509Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match x509name_to_string(&self.rdn_seq) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "<X509Error: Invalid X.509 name>"),
        }
    }
}

fn attribute_value_to_string(der: &DerObject) -> (Vec<u8>, bool) {
    match &der.content {
        BerObjectContent::NumericString(s)
        | BerObjectContent::PrintableString(s)
        | BerObjectContent::UTF8String(s)
        | BerObjectContent::IA5String(s) => (s.as_bytes().to_vec(), true),
        _ => match der.as_slice() {
            Ok(bytes) => (HEXUPPER.encode(bytes).into_bytes(), false),
            Err(_) => (Vec::new(), false),
        },
    }
}

fn x509name_to_string(rdn_seq: &[RelativeDistinguishedName]) -> Result<String, X509Error> {
    let rdns: Result<Vec<String>, X509Error> = rdn_seq
        .iter()
        .map(|rdn| {
            let atvs: Vec<String> = rdn
                .set
                .iter()
                .map(|atv| {
                    let val_str = String::from_utf8_lossy(&atv.attr_value).into_owned();
                    let sn = oid_short_name(&atv.attr_type);
                    format!("{}={}", sn, val_str)
                })
                .collect();
            Ok(atvs.join(" + "))
        })
        .collect();
    Ok(rdns?.join(", "))
}

fn oid_short_name(oid: &Oid) -> String {
    if objects::oid_is_common_name(oid) {
        "CN".to_owned()
    } else {
        oid.to_id_string()
    }
}

/// `RDNSequence ::= SEQUENCE OF RelativeDistinguishedName`
/// `RelativeDistinguishedName ::= SET OF AttributeTypeAndValue`
/// `AttributeTypeAndValue ::= SEQUENCE { type OBJECT IDENTIFIER, value ANY }`
///
/// Returns the bytes remaining after the whole `Name` TLV, same calling
/// convention as the rest of this crate's ASN.1 readers, so a caller mid-way
/// through `TBSCertificate` can keep parsing the fields that follow.
pub fn parse_name(i: &[u8]) -> Result<(&[u8], X509Name), X509Error> {
    let (tail, hdr) = asn1::sequence(i).map_err(X509Error::InvalidFormat)?;
    let raw = i[..i.len() - tail.len()].to_vec();

    let mut rest = hdr.content;
    let mut rdn_seq = Vec::new();

    while !rest.is_empty() {
        let (after_set, set_hdr) = parse_set(rest).map_err(X509Error::InvalidFormat)?;
        let mut set_content = set_hdr;
        let mut atvs = Vec::new();

        while !set_content.is_empty() {
            let (after_atv, atv_hdr) = asn1::sequence(set_content).map_err(X509Error::InvalidFormat)?;
            let (after_oid, oid) =
                asn1::object_identifier(atv_hdr.content).map_err(X509Error::InvalidFormat)?;
            let (_, value_obj) = asn1::any(after_oid).map_err(X509Error::InvalidFormat)?;
            let (value, is_string) = attribute_value_to_string(&value_obj);

            atvs.push(AttributeTypeAndValue {
                attr_type: oid.to_owned(),
                attr_value: value,
                is_string,
            });
            set_content = after_atv;
        }

        rdn_seq.push(RelativeDistinguishedName { set: atvs });
        rest = after_set;
    }

    Ok((tail, X509Name { rdn_seq, raw }))
}

/// Read a `SET OF` header the same way `asn1::sequence` reads `SEQUENCE`.
fn parse_set(i: &[u8]) -> Result<(&[u8], &[u8]), Asn1Error> {
    use der_parser::ber::{ber_read_element_header, BerTag};
    let (rem, hdr) = ber_read_element_header(i).map_err(|_| Asn1Error::InvalidData)?;
    if !hdr.is_constructed() || hdr.tag() != BerTag::Set {
        return Err(Asn1Error::UnexpectedTag);
    }
    let len = hdr.len.definite().map_err(|_| Asn1Error::InvalidLength)?;
    if len > rem.len() {
        return Err(Asn1Error::OutOfData);
    }
    let (content, rest) = rem.split_at(len);
    Ok((rest, content))
}

/// Case-insensitive byte comparison: bytes equal, or differ only in bit
/// `0x20` when both lie in an ASCII letter range. Deliberately **not**
/// Unicode-aware — this is the PKIX-pragmatic ASCII lowercase rule from
/// `x509_name_cmp`, not a locale-aware comparison.
pub fn ascii_ci_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(&x, &y)| {
        let diff = x ^ y;
        diff == 0 || (diff == 0x20 && (x.is_ascii_alphabetic() || y.is_ascii_alphabetic()))
    })
}

/// Wildcard rule: `presented` must be `"*." + suffix`; `cn` must contain a
/// `.`; and `cn`'s first-dot-onward suffix must `ascii_ci_eq` `presented`'s
/// suffix. One level of leftmost-label wildcard, no partial-label globs.
/// Grounded in `x509_wildcard_verify`.
pub fn wildcard_verify(cn: &[u8], presented: &[u8]) -> bool {
    if presented.len() < 3 || presented[0] != b'*' || presented[1] != b'.' {
        return false;
    }
    let dot = match cn.iter().position(|&b| b == b'.') {
        Some(idx) if idx != 0 => idx,
        _ => return false,
    };
    ascii_ci_eq(&cn[dot..], &presented[1..])
}

/// True if `presented` (an exact dNSName / CN value) matches `cn`, either
/// by exact case-insensitive equality or by the wildcard rule.
pub fn name_matches(cn: &[u8], presented: &[u8]) -> bool {
    if presented.len() == cn.len() && ascii_ci_eq(presented, cn) {
        return true;
    }
    if presented.len() > 2 && &presented[..2] == b"*." {
        return wildcard_verify(cn, presented);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ci_eq_matches_case_difference() {
        assert!(ascii_ci_eq(b"Example", b"example"));
        assert!(ascii_ci_eq(b"EXAMPLE.COM", b"example.com"));
        assert!(!ascii_ci_eq(b"Example", b"Exampld"));
        assert!(!ascii_ci_eq(b"Example", b"Example2"));
    }

    #[test]
    fn wildcard_one_level() {
        assert!(wildcard_verify(b"foo.example.com", b"*.example.com"));
        assert!(!wildcard_verify(b"foo.bar.example.com", b"*.example.com"));
        assert!(!wildcard_verify(b"example.com", b"*.example.com"));
    }

    #[test]
    fn name_matches_exact_and_wildcard() {
        assert!(name_matches(b"example.com", b"EXAMPLE.COM"));
        assert!(name_matches(b"foo.example.com", b"*.example.com"));
        assert!(!name_matches(b"foo.bar.example.com", b"*.example.com"));
    }
}
