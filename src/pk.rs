//! `SubjectPublicKeyInfo` and the signature-verification backend.
//!
//! This module decodes the ASN.1 `SubjectPublicKeyInfo` structure (part of
//! the TBSCertificate) and exposes a `verify_signature` method whose
//! implementation is gated behind the `verify` feature and backed by
//! `ring`, an optional dependency used only for that purpose.

use der_parser::oid::Oid;

use crate::asn1;
use crate::error::{Asn1Error, X509Error};
use crate::objects::{self, DigestAlgorithm, PublicKeyAlgorithm};

/// A certificate's `SubjectPublicKeyInfo`, decoded far enough to drive
/// verification, but not interpreted beyond that — this crate is a
/// verifier, not a key-management library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub algorithm: PublicKeyAlgorithm,
    /// Raw `subjectPublicKey` BIT STRING content (unused-bits byte
    /// stripped), e.g. the DER `RSAPublicKey` bytes or the uncompressed EC
    /// point, depending on `algorithm`.
    pub raw: Vec<u8>,
}

impl PublicKey {
    /// Parse a `SubjectPublicKeyInfo ::= SEQUENCE { algorithm
    /// AlgorithmIdentifier, subjectPublicKey BIT STRING }`.
    pub fn from_der(i: &[u8]) -> Result<(&[u8], PublicKey), X509Error> {
        let (rest, hdr) = asn1::sequence(i).map_err(X509Error::InvalidFormat)?;
        let content = hdr.content;

        let (content, alg_hdr) = asn1::sequence(content).map_err(X509Error::InvalidFormat)?;
        let (_, oid) =
            asn1::object_identifier(alg_hdr.content).map_err(X509Error::InvalidFormat)?;

        let algorithm = objects::oid_to_public_key_algorithm(&oid);

        let (content, key_bits) = asn1::bit_string(content).map_err(X509Error::InvalidFormat)?;
        if !content.is_empty() {
            return Err(X509Error::InvalidFormat(Asn1Error::LengthMismatch));
        }

        let algorithm = algorithm.ok_or(X509Error::UnknownSignatureAlgorithm)?;

        Ok((
            rest,
            PublicKey {
                algorithm,
                raw: key_bits.to_vec(),
            },
        ))
    }

    /// True if this key's family can be used to verify a signature that
    /// claims public-key algorithm `pk_alg` — the reference
    /// implementation's `pk_can_do`.
    pub fn can_verify(&self, pk_alg: PublicKeyAlgorithm) -> bool {
        self.algorithm == pk_alg
    }

    /// Verify `signature` over `message` under `digest_alg`, using this
    /// key. Without the `verify` feature this always returns `Err` — a
    /// caller building a verify-only-structure tool (no crypto backend)
    /// still gets all of the structural chain-walking and CRL-matching
    /// logic, it just can't confirm signatures cryptographically.
    pub fn verify_signature(
        &self,
        digest_alg: DigestAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), X509Error> {
        #[cfg(feature = "verify")]
        {
            ring_backend::verify(self, digest_alg, message, signature)
        }
        #[cfg(not(feature = "verify"))]
        {
            let _ = (digest_alg, message, signature);
            Err(X509Error::FeatureUnavailable)
        }
    }
}

#[cfg(feature = "verify")]
mod ring_backend {
    use super::PublicKey;
    use crate::error::X509Error;
    use crate::objects::{DigestAlgorithm, PublicKeyAlgorithm};
    use ring::signature;

    pub(super) fn verify(
        pk: &PublicKey,
        digest_alg: DigestAlgorithm,
        message: &[u8],
        sig: &[u8],
    ) -> Result<(), X509Error> {
        let algorithm: &dyn signature::VerificationAlgorithm = match (pk.algorithm, digest_alg) {
            (PublicKeyAlgorithm::Rsa, DigestAlgorithm::Sha256) => {
                &signature::RSA_PKCS1_2048_8192_SHA256
            }
            (PublicKeyAlgorithm::Rsa, DigestAlgorithm::Sha384) => {
                &signature::RSA_PKCS1_2048_8192_SHA384
            }
            (PublicKeyAlgorithm::Rsa, DigestAlgorithm::Sha512) => {
                &signature::RSA_PKCS1_2048_8192_SHA512
            }
            (PublicKeyAlgorithm::Rsa, DigestAlgorithm::Sha1) => &signature::RSA_PKCS1_2048_8192_SHA1,
            (PublicKeyAlgorithm::Ec, DigestAlgorithm::Sha256) => {
                &signature::ECDSA_P256_SHA256_ASN1
            }
            (PublicKeyAlgorithm::Ec, DigestAlgorithm::Sha384) => {
                &signature::ECDSA_P384_SHA384_ASN1
            }
            _ => return Err(X509Error::UnknownSignatureAlgorithm),
        };

        let public_key = match pk.algorithm {
            // RSA subjectPublicKey is the DER RSAPublicKey SEQUENCE itself;
            // ring's RSA verification takes the raw modulus/exponent
            // encoding via UnparsedPublicKey over that same DER, matching
            // how the reference implementation's pk_verify treats `pk` as
            // an opaque, already-parsed handle.
            PublicKeyAlgorithm::Rsa | PublicKeyAlgorithm::Ec => {
                signature::UnparsedPublicKey::new(algorithm, &pk.raw)
            }
        };

        public_key
            .verify(message, sig)
            .map_err(|_| X509Error::SignatureMismatch)
    }
}

/// Which signature OID a certificate declared — resolved eagerly at parse
/// time, matching the original's `oid_get_sig_alg` call in
/// `x509_crt_parse_der_core`.
pub fn resolve_signature_algorithm(
    oid: &Oid,
) -> Result<(DigestAlgorithm, PublicKeyAlgorithm), X509Error> {
    objects::oid_to_signature_algorithm(oid)
}
