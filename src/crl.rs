//! Certificate Revocation Lists.
//!
//! `CertificateRevocationList`/`TbsCertList`/`RevokedCertificate` hold owned
//! storage rather than borrowing from the input buffer. `revoked()` and
//! `check_crl()` are grounded in the reference implementation's
//! `x509_crt_revoked` and `x509_crt_verifycrl`.

use der_parser::oid::Oid;
use time::OffsetDateTime;

use crate::asn1;
use crate::error::{Asn1Error, X509Error};
use crate::extensions::KeyUsageMask;
use crate::name::{self, X509Name};
use crate::objects::{DigestAlgorithm, ExtensionType, PublicKeyAlgorithm};
use crate::pk;
use crate::time as x509_time;
use crate::verify::VerifyFlags;
use crate::x509::{parse_time, Certificate};

/// One entry of a CRL's `revokedCertificates` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokedCertificate {
    pub user_certificate: Vec<u8>,
    pub revocation_date: OffsetDateTime,
}

/// The signed body of a CRL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TbsCertList {
    pub raw: Vec<u8>,
    pub version: u32,
    pub issuer: X509Name,
    pub this_update: OffsetDateTime,
    pub next_update: Option<OffsetDateTime>,
    pub revoked_certificates: Vec<RevokedCertificate>,
}

/// A parsed `CertificateList`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRevocationList {
    pub tbs: TbsCertList,
    pub sig_oid1: Oid<'static>,
    pub sig_oid2: Oid<'static>,
    pub sig_md: DigestAlgorithm,
    pub sig_pk: PublicKeyAlgorithm,
    pub sig: Vec<u8>,
}

impl CertificateRevocationList {
    /// Parse a single DER-encoded `CertificateList`. Equivalent to the
    /// reference implementation's `x509_crl_parse_der`.
    pub fn from_der(buf: &[u8]) -> Result<CertificateRevocationList, X509Error> {
        let (tail, outer) = asn1::sequence(buf).map_err(X509Error::InvalidFormat)?;
        if !tail.is_empty() {
            return Err(X509Error::InvalidFormat(Asn1Error::LengthMismatch));
        }
        let content = outer.content;

        let (after_tbs, tbs_hdr) = asn1::sequence(content).map_err(X509Error::InvalidFormat)?;
        let tbs_len = content.len() - after_tbs.len();
        let raw = content[..tbs_len].to_vec();
        let mut p = tbs_hdr.content;

        // version INTEGER OPTIONAL — only present for v2 CRLs
        let version = match asn1::small_integer(p) {
            Ok((rest, v)) => {
                p = rest;
                (v + 1) as u32
            }
            Err(_) => 1,
        };

        let (rest, sig_oid1) = parse_algorithm_identifier(p)?;
        p = rest;

        let (rest, issuer) = name::parse_name(p).map_err(|_| X509Error::InvalidName)?;
        p = rest;

        let (rest, this_update) = parse_time(p)?;
        p = rest;

        let (rest, next_update) = match parse_time(p) {
            Ok((rest, t)) => (rest, Some(t)),
            Err(_) => (p, None),
        };
        p = rest;

        let mut revoked_certificates = Vec::new();
        if !p.is_empty() {
            if let Ok((rest, hdr)) = asn1::sequence(p) {
                let mut cursor = hdr.content;
                while !cursor.is_empty() {
                    let (after_entry, entry_hdr) =
                        asn1::sequence(cursor).map_err(X509Error::InvalidFormat)?;
                    let (after_serial, serial) =
                        asn1::integer_bytes(entry_hdr.content).map_err(X509Error::InvalidFormat)?;
                    let (after_date, revocation_date) = parse_time(after_serial)?;
                    // crlEntryExtensions, if present, are not interpreted.
                    let _ = after_date;
                    revoked_certificates.push(RevokedCertificate {
                        user_certificate: serial.to_vec(),
                        revocation_date,
                    });
                    cursor = after_entry;
                }
                p = rest;
            }
        }

        let tbs = TbsCertList {
            raw,
            version,
            issuer,
            this_update,
            next_update,
            revoked_certificates,
        };

        // crlExtensions [0] EXPLICIT OPTIONAL — parsed for length only; no
        // extension this crate's CRL checker needs lives here.
        let (rest, _ext) =
            asn1::optional_explicit_context(p, 0).map_err(X509Error::InvalidFormat)?;
        if !rest.is_empty() {
            return Err(X509Error::InvalidFormat(Asn1Error::LengthMismatch));
        }

        let (rest, sig_oid2) = parse_algorithm_identifier(after_tbs)?;
        if sig_oid1 != sig_oid2 {
            return Err(X509Error::SignatureMismatch);
        }
        let (sig_md, sig_pk) = pk::resolve_signature_algorithm(&sig_oid2)?;
        let (rest, sig) = asn1::bit_string(rest).map_err(X509Error::InvalidFormat)?;
        if !rest.is_empty() {
            return Err(X509Error::InvalidFormat(Asn1Error::LengthMismatch));
        }

        Ok(CertificateRevocationList {
            sig_oid1,
            sig_oid2,
            sig_md,
            sig_pk,
            sig: sig.to_vec(),
            tbs,
        })
    }

    /// True if `cert`'s serial number appears in this list's
    /// `revokedCertificates` with a `revocationDate` already in the past.
    /// Matches `x509_crt_revoked`: only the serial is compared, not the
    /// issuer — callers are expected to have already established that this
    /// CRL was issued by `cert`'s issuer.
    pub fn revoked(&self, cert: &Certificate) -> bool {
        self.tbs.revoked_certificates.iter().any(|r| {
            r.user_certificate == cert.serial && x509_time::has_passed(r.revocation_date)
        })
    }
}

/// `x509_crt_verifycrl`: consult every CRL in `crls` for one that covers
/// `child` (i.e. issued by `ca`), folding in `BADCRL_*`/`BADCERT_REVOKED`
/// defects exactly as the reference implementation's loop does.
///
/// Per CRL: a v1 CRL (no CRL version field — `crlEntryExtensions`
/// unsupported) or an issuer mismatch just skips to the next one. Once a
/// CRL matching the issuer is found, a missing `cRLSign` KeyUsage bit on `ca`
/// (when `check_key_usage` is enabled) or a failed/unrecognized signature
/// check sets `CRL_NOT_TRUSTED` and **stops processing entirely** — the
/// original's `break`, not `continue`: a CRL whose authenticity can't be
/// established isn't trusted to assert anything about revocation.
/// Staleness (`CRL_EXPIRED`/`CRL_FUTURE`) does not stop the walk; finding
/// the certificate revoked does (there's nothing more useful to learn).
///
/// Absence of any CRL issued by `ca` is **not** an error: revocation status
/// is simply left unasserted — see DESIGN.md Open Questions.
pub fn check_crl(
    child: &Certificate,
    ca: &Certificate,
    crls: &[CertificateRevocationList],
    check_key_usage: bool,
) -> VerifyFlags {
    let mut flags = VerifyFlags::empty();

    for crl in crls {
        // `tbs.version` here is 1 for an absent version field (v1) and 2
        // for an explicit one (v2), unlike the original's raw 0-indexed
        // ASN.1 value — so "skip v1 CRLs" is `< 2`, not `== 0`.
        if crl.tbs.version < 2 || crl.tbs.issuer.raw != ca.subject_raw {
            continue;
        }

        if check_key_usage
            && ca.ext_types.has(ExtensionType::KeyUsage)
            && !ca.key_usage.has(KeyUsageMask::CRL_SIGN)
        {
            flags.set(VerifyFlags::CRL_NOT_TRUSTED);
            break;
        }

        if !ca.pk.can_verify(crl.sig_pk)
            || ca
                .pk
                .verify_signature(crl.sig_md, &crl.tbs.raw, &crl.sig)
                .is_err()
        {
            flags.set(VerifyFlags::CRL_NOT_TRUSTED);
            break;
        }

        // Validity of the CRL itself does not halt processing.
        if let Some(next_update) = crl.tbs.next_update {
            if x509_time::has_passed(next_update) {
                flags.set(VerifyFlags::CRL_EXPIRED);
            }
        }
        if x509_time::is_in_future(crl.tbs.this_update) {
            flags.set(VerifyFlags::CRL_FUTURE);
        }

        if crl.revoked(child) {
            flags.set(VerifyFlags::REVOKED);
            break;
        }
    }

    flags
}

impl std::fmt::Display for CertificateRevocationList {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "CRL version       : {}", self.tbs.version)?;
        writeln!(f, "CRL issuer        : {}", self.tbs.issuer)?;
        writeln!(f, "this update       : {}", self.tbs.this_update)?;
        if let Some(next_update) = self.tbs.next_update {
            writeln!(f, "next update       : {}", next_update)?;
        }
        writeln!(
            f,
            "revoked certs.    : {}",
            self.tbs.revoked_certificates.len()
        )?;
        Ok(())
    }
}

fn parse_algorithm_identifier(i: &[u8]) -> Result<(&[u8], Oid<'static>), X509Error> {
    let (rest, hdr) = asn1::sequence(i).map_err(|_| X509Error::InvalidAlgorithm)?;
    let (after_oid, oid) =
        asn1::object_identifier(hdr.content).map_err(|_| X509Error::InvalidAlgorithm)?;
    if !after_oid.is_empty() {
        let _ = asn1::any(after_oid).map_err(|_| X509Error::InvalidAlgorithm)?;
    }
    Ok((rest, oid.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::X509Name;
    use crate::objects::PublicKeyAlgorithm;
    use crate::pk::PublicKey;
    use crate::time::Validity;
    use std::borrow::Cow;
    use time::Duration;

    fn blank_certificate(serial: Vec<u8>) -> Certificate {
        Certificate {
            raw: Vec::new(),
            version: 3,
            serial,
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
            sig_oid1: Oid::new(Cow::Borrowed(&[])),
            sig_oid2: Oid::new(Cow::Borrowed(&[])),
            sig_md: DigestAlgorithm::Sha256,
            sig_pk: PublicKeyAlgorithm::Rsa,
            sig: Vec::new(),
            issuer_id: None,
            subject_id: None,
            v3_ext: Vec::new(),
            ext_types: Default::default(),
            ca_istrue: false,
            max_pathlen: 0,
            key_usage: Default::default(),
            ns_cert_type: Default::default(),
            subject_alt_names: Vec::new(),
            ext_key_usage: Vec::new(),
        }
    }

    fn blank_crl(issuer_raw: Vec<u8>, revoked: Vec<u8>) -> CertificateRevocationList {
        let now = OffsetDateTime::now_utc();
        CertificateRevocationList {
            tbs: TbsCertList {
                raw: Vec::new(),
                version: 2,
                issuer: X509Name {
                    rdn_seq: Vec::new(),
                    raw: issuer_raw,
                },
                this_update: now - Duration::days(1),
                next_update: Some(now + Duration::days(30)),
                revoked_certificates: vec![RevokedCertificate {
                    user_certificate: revoked,
                    revocation_date: now - Duration::days(1),
                }],
            },
            sig_oid1: Oid::new(Cow::Borrowed(&[])),
            sig_oid2: Oid::new(Cow::Borrowed(&[])),
            sig_md: DigestAlgorithm::Sha256,
            sig_pk: PublicKeyAlgorithm::Rsa,
            sig: Vec::new(),
        }
    }

    #[test]
    fn revoked_matches_serial_with_past_revocation_date() {
        let crl = blank_crl(vec![9, 9], vec![1, 2, 3]);
        let cert = blank_certificate(vec![1, 2, 3]);
        assert!(crl.revoked(&cert));
        let other = blank_certificate(vec![4, 5, 6]);
        assert!(!crl.revoked(&other));
    }

    #[test]
    fn revoked_ignores_future_revocation_date() {
        let mut crl = blank_crl(vec![9, 9], vec![1, 2, 3]);
        crl.tbs.revoked_certificates[0].revocation_date =
            OffsetDateTime::now_utc() + Duration::days(1);
        let cert = blank_certificate(vec![1, 2, 3]);
        assert!(!crl.revoked(&cert));
    }

    #[test]
    fn check_crl_skips_crl_from_unrelated_issuer() {
        let crl = blank_crl(vec![9, 9], vec![1, 2, 3]);
        let child = blank_certificate(vec![1, 2, 3]);
        let mut ca = blank_certificate(vec![0xAA]);
        ca.subject_raw = vec![1, 1];
        let flags = check_crl(&child, &ca, std::slice::from_ref(&crl), true);
        assert!(flags.is_empty());
    }

    #[test]
    fn check_crl_skips_v1_crl_even_with_matching_issuer() {
        let mut crl = blank_crl(vec![1, 1], vec![1, 2, 3]);
        crl.tbs.version = 1;
        let child = blank_certificate(vec![1, 2, 3]);
        let mut ca = blank_certificate(vec![0xAA]);
        ca.subject_raw = vec![1, 1];

        let flags = check_crl(&child, &ca, std::slice::from_ref(&crl), true);
        assert!(flags.is_empty());
    }

    #[test]
    fn check_crl_not_trusted_when_ca_missing_crl_sign_bit() {
        let crl = blank_crl(vec![1, 1], vec![1, 2, 3]);
        let child = blank_certificate(vec![1, 2, 3]);
        let mut ca = blank_certificate(vec![0xAA]);
        ca.subject_raw = vec![1, 1];
        ca.ext_types.set(ExtensionType::KeyUsage);
        ca.key_usage = KeyUsageMask(KeyUsageMask::KEY_CERT_SIGN); // no CRL_SIGN

        let flags = check_crl(&child, &ca, std::slice::from_ref(&crl), true);
        assert!(flags.has(VerifyFlags::CRL_NOT_TRUSTED));
        assert!(!flags.has(VerifyFlags::REVOKED));
    }

    #[test]
    fn check_crl_ignores_key_usage_when_disabled_but_still_needs_signature_backend() {
        let crl = blank_crl(vec![1, 1], vec![1, 2, 3]);
        let child = blank_certificate(vec![1, 2, 3]);
        let mut ca = blank_certificate(vec![0xAA]);
        ca.subject_raw = vec![1, 1];
        ca.ext_types.set(ExtensionType::KeyUsage);
        ca.key_usage = KeyUsageMask(KeyUsageMask::KEY_CERT_SIGN); // no CRL_SIGN

        // With key-usage enforcement off, the only remaining reason this
        // crate can reject the CRL is an unavailable signature backend
        // (the `verify` feature is off in these tests).
        let flags = check_crl(&child, &ca, std::slice::from_ref(&crl), false);
        assert!(flags.has(VerifyFlags::CRL_NOT_TRUSTED));
    }
}
