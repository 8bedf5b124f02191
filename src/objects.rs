//! OID registry facade.
//!
//! This module is the thin binding onto the external OID registry
//! (`oid-registry`), resolving the OIDs embedded in a certificate into the
//! small set of tags the parser and verifier actually branch on:
//! signature digest/public-key algorithm pairs, the five supported
//! extension types, and Extended Key Usage names.

use der_parser::oid::Oid;
use lazy_static::lazy_static;
use oid_registry::{
    OID_EXTKU_ANY, OID_KEY_TYPE_EC_PUBLIC_KEY, OID_KEY_TYPE_RSA, OID_PKCS1_MD5WITHRSA,
    OID_PKCS1_SHA1WITHRSA, OID_PKCS1_SHA256WITHRSA, OID_PKCS1_SHA384WITHRSA,
    OID_PKCS1_SHA512WITHRSA, OID_SHA1_WITH_RSA, OID_SIG_ECDSA_WITH_SHA256,
    OID_SIG_ECDSA_WITH_SHA384, OID_SIG_ECDSA_WITH_SHA512, OID_X509_COMMON_NAME,
    OID_X509_EXT_BASIC_CONSTRAINTS, OID_X509_EXT_EXTENDED_KEY_USAGE, OID_X509_EXT_KEY_USAGE,
    OID_X509_EXT_NS_CERT_TYPE, OID_X509_EXT_SUBJECT_ALT_NAME,
};

use crate::error::X509Error;

/// Message-digest algorithms this crate knows how to map a signature OID to.
///
/// The actual hashing is an external collaborator; this enum only names
/// which one a certificate asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

/// Public-key algorithms this crate knows how to map a signature OID to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicKeyAlgorithm {
    Rsa,
    Ec,
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Sha1 => "SHA1",
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sha384 => "SHA384",
            DigestAlgorithm::Sha512 => "SHA512",
        };
        write!(f, "{}", s)
    }
}

impl std::fmt::Display for PublicKeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            PublicKeyAlgorithm::Rsa => "RSA",
            PublicKeyAlgorithm::Ec => "ECDSA",
        };
        write!(f, "{}", s)
    }
}

/// The "signed using" description the pretty-printer shows, mirroring the
/// original's `oid_get_sig_alg_desc` short descriptions (e.g. `"RSA with
/// SHA-256"`).
pub fn signature_algorithm_description(md: DigestAlgorithm, pk: PublicKeyAlgorithm) -> String {
    format!("{} with {}", pk, md)
}

/// Extension type tags, one bit per recognized extension in the `ext_types`
/// bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExtensionType {
    BasicConstraints = 0b0000_0001,
    KeyUsage = 0b0000_0010,
    ExtendedKeyUsage = 0b0000_0100,
    SubjectAltName = 0b0000_1000,
    NsCertType = 0b0001_0000,
}

/// OR-combinable mask over [`ExtensionType`], mirroring `crt->ext_types` in
/// the reference implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtensionTypeMask(pub u8);

impl ExtensionTypeMask {
    pub fn set(&mut self, ty: ExtensionType) {
        self.0 |= ty as u8;
    }

    pub fn has(&self, ty: ExtensionType) -> bool {
        self.0 & (ty as u8) != 0
    }
}

/// Resolve an `extnID` OID to the extension type this crate parses, or
/// `None` for any other (unsupported) extension OID.
///
/// Equivalent to the original's `oid_get_x509_ext_type`.
pub fn oid_to_extension_type(oid: &Oid) -> Option<ExtensionType> {
    if oid == &OID_X509_EXT_BASIC_CONSTRAINTS {
        Some(ExtensionType::BasicConstraints)
    } else if oid == &OID_X509_EXT_KEY_USAGE {
        Some(ExtensionType::KeyUsage)
    } else if oid == &OID_X509_EXT_EXTENDED_KEY_USAGE {
        Some(ExtensionType::ExtendedKeyUsage)
    } else if oid == &OID_X509_EXT_SUBJECT_ALT_NAME {
        Some(ExtensionType::SubjectAltName)
    } else if oid == &OID_X509_EXT_NS_CERT_TYPE {
        Some(ExtensionType::NsCertType)
    } else {
        None
    }
}

/// Resolve a `signatureAlgorithm` OID into `(digest, pubkey)` algorithm
/// tags. Equivalent to the original's `oid_get_sig_alg`.
pub fn oid_to_signature_algorithm(
    oid: &Oid,
) -> Result<(DigestAlgorithm, PublicKeyAlgorithm), X509Error> {
    use DigestAlgorithm::*;
    use PublicKeyAlgorithm::*;

    let pair = if oid == &OID_PKCS1_MD5WITHRSA {
        (Md5, Rsa)
    } else if oid == &OID_PKCS1_SHA1WITHRSA || oid == &OID_SHA1_WITH_RSA {
        (Sha1, Rsa)
    } else if oid == &OID_PKCS1_SHA256WITHRSA {
        (Sha256, Rsa)
    } else if oid == &OID_PKCS1_SHA384WITHRSA {
        (Sha384, Rsa)
    } else if oid == &OID_PKCS1_SHA512WITHRSA {
        (Sha512, Rsa)
    } else if oid == &OID_SIG_ECDSA_WITH_SHA256 {
        (Sha256, Ec)
    } else if oid == &OID_SIG_ECDSA_WITH_SHA384 {
        (Sha384, Ec)
    } else if oid == &OID_SIG_ECDSA_WITH_SHA512 {
        (Sha512, Ec)
    } else {
        return Err(X509Error::UnknownSignatureAlgorithm);
    };
    Ok(pair)
}

/// Resolve a `SubjectPublicKeyInfo.algorithm` OID into the key family this
/// crate can verify against. Unknown key types are not an error here —
/// `check_parent`/`verify` simply won't find a usable signature match.
pub fn oid_to_public_key_algorithm(oid: &Oid) -> Option<PublicKeyAlgorithm> {
    if oid == &OID_KEY_TYPE_RSA {
        Some(PublicKeyAlgorithm::Rsa)
    } else if oid == &OID_KEY_TYPE_EC_PUBLIC_KEY {
        Some(PublicKeyAlgorithm::Ec)
    } else {
        None
    }
}

/// `id-at-commonName`, used by the hostname matcher to find CN atoms in a
/// Subject when there is no SubjectAltName extension.
pub fn oid_is_common_name(oid: &Oid) -> bool {
    oid == &OID_X509_COMMON_NAME
}

/// `anyExtendedKeyUsage`, which `check_extended_key_usage` treats as a
/// wildcard match against any requested usage OID.
pub fn oid_is_any_extended_key_usage(oid: &Oid) -> bool {
    oid == &OID_EXTKU_ANY
}

lazy_static! {
    /// Short names for the handful of Extended Key Usage purposes this
    /// crate's pretty-printer bothers to spell out; anything else falls
    /// back to the OID's dotted string, matching the original's `"???"`
    /// fallback in `x509_info_ext_key_usage` (but with the OID instead of a
    /// literal question mark, which is more useful to a Rust caller).
    static ref EKU_NAMES: Vec<(Oid<'static>, &'static str)> = vec![
        (oid_registry::OID_KP_SERVER_AUTH, "TLS Web Server Authentication"),
        (oid_registry::OID_KP_CLIENT_AUTH, "TLS Web Client Authentication"),
        (oid_registry::OID_KP_CODE_SIGNING, "Code Signing"),
        (oid_registry::OID_KP_EMAIL_PROTECTION, "E-mail Protection"),
        (oid_registry::OID_KP_TIME_STAMPING, "Time Stamping"),
        (oid_registry::OID_KP_OCSP_SIGNING, "OCSP Signing"),
    ];
}

pub fn extended_key_usage_name(oid: &Oid) -> String {
    EKU_NAMES
        .iter()
        .find(|(o, _)| o == oid)
        .map(|(_, name)| (*name).to_owned())
        .unwrap_or_else(|| oid.to_id_string())
}
