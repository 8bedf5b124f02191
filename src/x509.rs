//! X.509 certificate objects.
//!
//! Based on RFC 5280. `Certificate::from_der` is the Rust counterpart of
//! the reference implementation's `x509_crt_parse_der_core`: it decodes a
//! single DER `Certificate` into an owned, independently-movable value (see
//! DESIGN.md for why this crate stores owned `Vec<u8>` fields rather than
//! borrowing from the input buffer for the lifetime of the certificate).

use der_parser::oid::Oid;
use time::OffsetDateTime;
use zeroize::Zeroize;

use crate::asn1;
use crate::error::{Asn1Error, X509Error};
use crate::extensions::{
    parse_basic_constraints, parse_extended_key_usage, parse_key_usage, parse_ns_cert_type,
    parse_subject_alt_name, KeyUsageMask, NsCertTypeMask,
};
use crate::name::{self, X509Name};
use crate::objects::{self, DigestAlgorithm, ExtensionType, ExtensionTypeMask, PublicKeyAlgorithm};
use crate::pk::{self, PublicKey};
use crate::time::Validity;

/// A parsed X.509 v1/v2/v3 certificate.
///
/// Owns its raw DER encoding; every other field is either derived data
/// (`issuer`, `subject`, parsed extensions) or an owned slice of the raw
/// bytes (`serial`, `tbs`, `sig`, ...). Field names and the `max_pathlen`
/// `+1` encoding match the reference implementation exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub raw: Vec<u8>,
    pub version: u32,
    pub serial: Vec<u8>,
    pub tbs: Vec<u8>,
    pub issuer_raw: Vec<u8>,
    pub subject_raw: Vec<u8>,
    pub issuer: X509Name,
    pub subject: X509Name,
    pub validity: Validity,
    pub pk: PublicKey,
    pub sig_oid1: Oid<'static>,
    pub sig_oid2: Oid<'static>,
    pub sig_md: DigestAlgorithm,
    pub sig_pk: PublicKeyAlgorithm,
    pub sig: Vec<u8>,
    pub issuer_id: Option<Vec<u8>>,
    pub subject_id: Option<Vec<u8>>,
    pub v3_ext: Vec<u8>,
    pub ext_types: ExtensionTypeMask,
    pub ca_istrue: bool,
    pub max_pathlen: u32,
    pub key_usage: KeyUsageMask,
    pub ns_cert_type: NsCertTypeMask,
    pub subject_alt_names: Vec<Vec<u8>>,
    pub ext_key_usage: Vec<Oid<'static>>,
}

impl Certificate {
    /// Parse a single DER-encoded `Certificate`. Equivalent to
    /// `x509_crt_parse_der_core`: any failure discards the partially built
    /// value (Rust ownership does this for free — there is no explicit
    /// `x509_crt_free` call needed on the error path).
    pub fn from_der(buf: &[u8]) -> Result<Certificate, X509Error> {
        let raw = buf.to_vec();

        let (rest_after_cert, outer) = asn1::sequence(buf).map_err(X509Error::InvalidFormat)?;
        if !rest_after_cert.is_empty() {
            return Err(X509Error::InvalidFormat(Asn1Error::LengthMismatch));
        }
        let crt_content = outer.content;

        let (after_tbs, tbs_hdr) = asn1::sequence(crt_content).map_err(X509Error::InvalidFormat)?;
        let tbs_len = crt_content.len() - after_tbs.len();
        let tbs = crt_content[..tbs_len].to_vec();
        let mut p = tbs_hdr.content;

        // version [0] EXPLICIT INTEGER DEFAULT v1
        let (rest, version_tag) =
            asn1::optional_explicit_context(p, 0).map_err(X509Error::InvalidFormat)?;
        p = rest;
        let version_raw: i64 = match version_tag {
            Some(content) => {
                let (trailing, v) = asn1::small_integer(content).map_err(|_| X509Error::InvalidVersion)?;
                if !trailing.is_empty() {
                    return Err(X509Error::InvalidVersion);
                }
                v
            }
            None => 0,
        };
        let version = (version_raw + 1) as u32;
        if version > 3 {
            return Err(X509Error::UnknownVersion(version));
        }

        // serialNumber
        let (rest, serial) = asn1::integer_bytes(p).map_err(|e| X509Error::InvalidFormat(e))?;
        p = rest;

        // signature AlgorithmIdentifier (with explicit NULL parameters allowed)
        let (rest, sig_oid1) = parse_algorithm_identifier(p)?;
        p = rest;
        let (sig_md, sig_pk) = pk::resolve_signature_algorithm(&sig_oid1)?;

        // issuer Name
        let (rest, issuer) = name::parse_name(p).map_err(|_| X509Error::InvalidName)?;
        p = rest;

        // validity
        let (rest, validity) = parse_validity(p)?;
        p = rest;

        // subject Name
        let (rest, subject) = name::parse_name(p).map_err(|_| X509Error::InvalidName)?;
        p = rest;

        // subjectPublicKeyInfo
        let (rest, public_key) = PublicKey::from_der(p)?;
        p = rest;

        // issuerUniqueID [1] IMPLICIT, subjectUniqueID [2] IMPLICIT — only if version >= 2
        let mut issuer_id = None;
        let mut subject_id = None;
        if version >= 2 {
            let (rest, id) =
                asn1::optional_implicit_context(p, 1).map_err(|e| X509Error::InvalidFormat(e))?;
            issuer_id = id.map(|b| b.to_vec());
            p = rest;

            let (rest, id) =
                asn1::optional_implicit_context(p, 2).map_err(|e| X509Error::InvalidFormat(e))?;
            subject_id = id.map(|b| b.to_vec());
            p = rest;
        }

        // extensions [3] EXPLICIT — only if version == 3
        let mut ext_types = ExtensionTypeMask::default();
        let mut ca_istrue = false;
        let mut max_pathlen = 0u32;
        let mut key_usage = KeyUsageMask::default();
        let mut ns_cert_type = NsCertTypeMask::default();
        let mut subject_alt_names = Vec::new();
        let mut ext_key_usage = Vec::new();
        let mut v3_ext = Vec::new();

        if version == 3 {
            let (rest, ext_tag) =
                asn1::optional_explicit_context(p, 3).map_err(|e| X509Error::InvalidExtensions(e))?;
            p = rest;
            if let Some(ext_content) = ext_tag {
                v3_ext = ext_content.to_vec();
                parse_extensions(
                    ext_content,
                    &mut ext_types,
                    &mut ca_istrue,
                    &mut max_pathlen,
                    &mut key_usage,
                    &mut ns_cert_type,
                    &mut subject_alt_names,
                    &mut ext_key_usage,
                )?;
            }
        }

        if !p.is_empty() {
            return Err(X509Error::InvalidFormat(Asn1Error::LengthMismatch));
        }

        // signatureAlgorithm (outer) + signatureValue
        let (rest, sig_oid2) = parse_algorithm_identifier(after_tbs)?;
        if sig_oid1 != sig_oid2 {
            return Err(X509Error::SignatureMismatch);
        }
        let (rest, sig) = asn1::bit_string(rest).map_err(|e| X509Error::InvalidFormat(e))?;
        if !rest.is_empty() {
            return Err(X509Error::InvalidFormat(Asn1Error::LengthMismatch));
        }

        Ok(Certificate {
            raw,
            version,
            serial: serial.to_vec(),
            tbs,
            issuer_raw: issuer.raw.clone(),
            subject_raw: subject.raw.clone(),
            issuer,
            subject,
            validity,
            pk: public_key,
            sig_oid1,
            sig_oid2,
            sig_md,
            sig_pk,
            sig: sig.to_vec(),
            issuer_id,
            subject_id,
            v3_ext,
            ext_types,
            ca_istrue,
            max_pathlen,
            key_usage,
            ns_cert_type,
            subject_alt_names,
            ext_key_usage,
        })
    }

    /// `basicConstraints CA:true`.
    pub fn is_ca(&self) -> bool {
        self.ca_istrue
    }

    /// PKIX `pathLenConstraint`, undoing the `+1` storage encoding. `None`
    /// means unbounded/absent.
    pub fn path_len_constraint(&self) -> Option<u32> {
        if self.max_pathlen == 0 {
            None
        } else {
            Some(self.max_pathlen - 1)
        }
    }

    /// `check_key_usage`: `Ok(())` if the KeyUsage extension is absent (no
    /// restriction), or if present and every requested bit is set.
    pub fn check_key_usage(&self, usage: u8) -> Result<(), X509Error> {
        if self.ext_types.has(ExtensionType::KeyUsage) && (self.key_usage.0 & usage) != usage {
            return Err(X509Error::BadInputData);
        }
        Ok(())
    }

    /// `check_extended_key_usage`: `Ok(())` if the EKU extension is absent,
    /// or the requested OID is present, or `anyExtendedKeyUsage` is present.
    pub fn check_extended_key_usage(&self, usage_oid: &Oid) -> Result<(), X509Error> {
        if !self.ext_types.has(ExtensionType::ExtendedKeyUsage) {
            return Ok(());
        }
        let ok = self.ext_key_usage.iter().any(|oid| {
            oid == usage_oid || objects::oid_is_any_extended_key_usage(oid)
        });
        if ok {
            Ok(())
        } else {
            Err(X509Error::BadInputData)
        }
    }

    pub fn raw_serial_as_string(&self) -> String {
        let mut s = self.serial.iter().fold(
            String::with_capacity(3 * self.serial.len()),
            |a, b| a + &format!("{:02x}:", b),
        );
        s.pop();
        s
    }
}

impl std::fmt::Display for Certificate {
    /// The same line-oriented summary `x509_crt_info` builds: version,
    /// serial, issuer, subject, validity, signature algorithm, then whatever
    /// of BasicConstraints/SubjectAltName/NsCertType/KeyUsage/
    /// ExtendedKeyUsage extensions are present, in that order. A minimal
    /// convenience `Display`, not a formatting engine.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "cert. version     : {}", self.version)?;
        writeln!(f, "serial number     : {}", self.raw_serial_as_string())?;
        writeln!(f, "issuer name       : {}", self.issuer)?;
        writeln!(f, "subject name      : {}", self.subject)?;
        writeln!(
            f,
            "issued  on        : {}",
            self.validity.not_before
        )?;
        writeln!(f, "expires on        : {}", self.validity.not_after)?;
        writeln!(
            f,
            "signed using      : {}",
            objects::signature_algorithm_description(self.sig_md, self.sig_pk)
        )?;
        if self.ext_types.has(ExtensionType::BasicConstraints) {
            write!(f, "basic constraints : CA={}", self.ca_istrue)?;
            if let Some(n) = self.path_len_constraint() {
                write!(f, ", max_pathlen={}", n)?;
            }
            writeln!(f)?;
        }
        if self.ext_types.has(ExtensionType::SubjectAltName) {
            let joined = self
                .subject_alt_names
                .iter()
                .map(|n| String::from_utf8_lossy(n).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "subject alt name  : {}", joined)?;
        }
        if self.ext_types.has(ExtensionType::NsCertType) {
            writeln!(f, "cert. type        : {}", self.ns_cert_type)?;
        }
        if self.ext_types.has(ExtensionType::KeyUsage) {
            writeln!(f, "key usage         : {}", self.key_usage)?;
        }
        if self.ext_types.has(ExtensionType::ExtendedKeyUsage) {
            let joined = self
                .ext_key_usage
                .iter()
                .map(|oid| objects::extended_key_usage_name(oid))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(f, "ext key usage     : {}", joined)?;
        }
        Ok(())
    }
}

/// Scrub the raw DER (and other owned byte buffers derived from it) before
/// the certificate's memory is released. Rust's ownership model already
/// makes the original's explicit `x509_crt_free` walk-and-free
/// unnecessary; this `Drop` impl keeps only the part ownership doesn't
/// give you for free — defense-in-depth against key-material residue in
/// freed memory, grounded in the original's zero-then-free sequence in
/// `x509_crt_free`.
impl Drop for Certificate {
    fn drop(&mut self) {
        self.raw.zeroize();
        self.tbs.zeroize();
        self.serial.zeroize();
        self.sig.zeroize();
        self.v3_ext.zeroize();
        self.pk.raw.zeroize();
        self.issuer_raw.zeroize();
        self.subject_raw.zeroize();
        self.issuer.raw.zeroize();
        self.subject.raw.zeroize();
        if let Some(id) = self.issuer_id.as_mut() {
            id.zeroize();
        }
        if let Some(id) = self.subject_id.as_mut() {
            id.zeroize();
        }
    }
}

fn parse_algorithm_identifier(i: &[u8]) -> Result<(&[u8], Oid<'static>), X509Error> {
    let (rest, hdr) = asn1::sequence(i).map_err(|_| X509Error::InvalidAlgorithm)?;
    let (after_oid, oid) =
        asn1::object_identifier(hdr.content).map_err(|_| X509Error::InvalidAlgorithm)?;
    // Optional explicit NULL (or other) parameters; tolerated and ignored.
    if !after_oid.is_empty() {
        let _ = asn1::any(after_oid).map_err(|_| X509Error::InvalidAlgorithm)?;
    }
    Ok((rest, oid.to_owned()))
}

fn parse_validity(i: &[u8]) -> Result<(&[u8], Validity), X509Error> {
    let (rest, hdr) = asn1::sequence(i).map_err(|_| X509Error::InvalidDate)?;
    let (after_nb, not_before) = parse_time(hdr.content)?;
    let (after_na, not_after) = parse_time(after_nb)?;
    if !after_na.is_empty() {
        return Err(X509Error::InvalidDate);
    }
    Ok((rest, Validity::new(not_before, not_after)))
}

/// `Time ::= CHOICE { utcTime UTCTime, generalTime GeneralizedTime }`
///
/// Delegates the actual UTCTime/GeneralizedTime-to-calendar-instant
/// conversion to `asn1-rs`'s `datetime` feature rather than hand-parsing
/// the text form: `UtcTime`/`GeneralizedTime` decode the TLV, and
/// `ASN1DateTime`'s `TryFrom` impl (gated by that feature) produces the
/// `time::OffsetDateTime`.
pub(crate) fn parse_time(i: &[u8]) -> Result<(&[u8], OffsetDateTime), X509Error> {
    use asn1_rs::{FromBer, GeneralizedTime, UtcTime};
    use std::convert::TryFrom;

    if i.is_empty() {
        return Err(X509Error::InvalidDate);
    }
    match i[0] {
        // UTCTime: two-digit year, adjusted per X.509's 1950/2049 pivot.
        0x17 => {
            let (rest, t) = UtcTime::from_ber(i).map_err(|_| X509Error::InvalidDate)?;
            let dt = OffsetDateTime::try_from(t.utc_adjusted_datetime())
                .map_err(|_| X509Error::InvalidDate)?;
            Ok((rest, dt))
        }
        0x18 => {
            let (rest, t) = GeneralizedTime::from_ber(i).map_err(|_| X509Error::InvalidDate)?;
            let dt = OffsetDateTime::try_from(t.0).map_err(|_| X509Error::InvalidDate)?;
            Ok((rest, dt))
        }
        _ => Err(X509Error::InvalidDate),
    }
}

/// `Extensions ::= SEQUENCE OF Extension`
#[allow(clippy::too_many_arguments)]
fn parse_extensions(
    i: &[u8],
    ext_types: &mut ExtensionTypeMask,
    ca_istrue: &mut bool,
    max_pathlen: &mut u32,
    key_usage: &mut KeyUsageMask,
    ns_cert_type: &mut NsCertTypeMask,
    subject_alt_names: &mut Vec<Vec<u8>>,
    ext_key_usage: &mut Vec<Oid<'static>>,
) -> Result<(), X509Error> {
    let (_, hdr) = asn1::sequence(i).map_err(X509Error::InvalidExtensions)?;
    let mut rest = hdr.content;

    while !rest.is_empty() {
        let (after_ext, ext_hdr) = asn1::sequence(rest).map_err(X509Error::InvalidExtensions)?;
        let mut cursor = ext_hdr.content;

        let (after_oid, oid) =
            asn1::object_identifier(cursor).map_err(X509Error::InvalidExtensions)?;
        cursor = after_oid;

        let (after_crit, critical) = match asn1::boolean(cursor) {
            Ok((r, b)) => (r, b),
            Err(Asn1Error::UnexpectedTag) => (cursor, false),
            Err(e) => return Err(X509Error::InvalidExtensions(e)),
        };
        cursor = after_crit;

        let (after_octets, value) =
            asn1::octet_string(cursor).map_err(X509Error::InvalidExtensions)?;
        if !after_octets.is_empty() {
            return Err(X509Error::InvalidExtensions(Asn1Error::LengthMismatch));
        }

        match objects::oid_to_extension_type(&oid) {
            None => {
                if critical {
                    return Err(X509Error::InvalidExtensions(Asn1Error::UnexpectedTag));
                }
                // unknown, non-critical: skip
            }
            Some(ty) => {
                ext_types.set(ty);
                match ty {
                    ExtensionType::BasicConstraints => {
                        let bc = parse_basic_constraints(value)
                            .map_err(X509Error::InvalidExtensions)?;
                        *ca_istrue = bc.ca;
                        *max_pathlen = bc.max_pathlen;
                    }
                    ExtensionType::KeyUsage => {
                        *key_usage = parse_key_usage(value).map_err(X509Error::InvalidExtensions)?;
                    }
                    ExtensionType::ExtendedKeyUsage => {
                        *ext_key_usage =
                            parse_extended_key_usage(value).map_err(X509Error::InvalidExtensions)?;
                    }
                    ExtensionType::SubjectAltName => {
                        *subject_alt_names =
                            parse_subject_alt_name(value).map_err(X509Error::InvalidExtensions)?;
                    }
                    ExtensionType::NsCertType => {
                        *ns_cert_type =
                            parse_ns_cert_type(value).map_err(X509Error::InvalidExtensions)?;
                    }
                }
            }
        }

        rest = after_ext;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_len_constraint_roundtrip() {
        let mut cert = blank_cert();
        cert.max_pathlen = 0;
        assert_eq!(cert.path_len_constraint(), None);
        cert.max_pathlen = 1;
        assert_eq!(cert.path_len_constraint(), Some(0));
        cert.max_pathlen = 4;
        assert_eq!(cert.path_len_constraint(), Some(3));
    }

    #[test]
    fn key_usage_absent_extension_passes() {
        let cert = blank_cert();
        assert!(cert.check_key_usage(KeyUsageMask::KEY_CERT_SIGN).is_ok());
    }

    #[test]
    fn key_usage_present_but_missing_bit_fails() {
        let mut cert = blank_cert();
        cert.ext_types.set(ExtensionType::KeyUsage);
        cert.key_usage = KeyUsageMask(KeyUsageMask::DIGITAL_SIGNATURE);
        assert!(cert.check_key_usage(KeyUsageMask::KEY_CERT_SIGN).is_err());
    }

    #[test]
    fn display_includes_signature_line_and_present_extensions() {
        let mut cert = blank_cert();
        cert.ext_types.set(ExtensionType::BasicConstraints);
        cert.ca_istrue = true;
        cert.max_pathlen = 1;
        cert.ext_types.set(ExtensionType::KeyUsage);
        cert.key_usage = KeyUsageMask(KeyUsageMask::KEY_CERT_SIGN);

        let rendered = cert.to_string();
        assert!(rendered.contains("signed using      : RSA with SHA256"));
        assert!(rendered.contains("basic constraints : CA=true, max_pathlen=0"));
        assert!(rendered.contains("key usage         : Key Cert Sign"));
        // Extensions not set on this certificate must not appear at all.
        assert!(!rendered.contains("ext key usage"));
    }

    fn blank_cert() -> Certificate {
        use crate::objects::PublicKeyAlgorithm;
        use der_parser::oid::Oid;
        Certificate {
            raw: Vec::new(),
            version: 3,
            serial: vec![1],
            tbs: Vec::new(),
            issuer_raw: Vec::new(),
            subject_raw: Vec::new(),
            issuer: X509Name::default(),
            subject: X509Name::default(),
            validity: Validity::new(OffsetDateTime::now_utc(), OffsetDateTime::now_utc()),
            pk: PublicKey {
                algorithm: PublicKeyAlgorithm::Rsa,
                raw: Vec::new(),
            },
            sig_oid1: Oid::new(std::borrow::Cow::Borrowed(&[])),
            sig_oid2: Oid::new(std::borrow::Cow::Borrowed(&[])),
            sig_md: DigestAlgorithm::Sha256,
            sig_pk: PublicKeyAlgorithm::Rsa,
            sig: Vec::new(),
            issuer_id: None,
            subject_id: None,
            v3_ext: Vec::new(),
            ext_types: ExtensionTypeMask::default(),
            ca_istrue: false,
            max_pathlen: 0,
            key_usage: KeyUsageMask::default(),
            ns_cert_type: NsCertTypeMask::default(),
            subject_alt_names: Vec::new(),
            ext_key_usage: Vec::new(),
        }
    }
}
