//! X.509 objects, parser, and PKIX chain verifier.
//!
//! Based on RFC 5280. Given a DER-encoded certificate, or a PEM stream of
//! one or more of them, [`Chain::parse`] decodes the ASN.1 structure into
//! owned [`Certificate`] values, and [`verify::verify`] walks a candidate
//! chain against a caller-supplied set of locally trusted roots — checking
//! issuer/subject linkage, `BasicConstraints` path length, `KeyUsage`
//! discipline, certificate revocation lists, and (optionally) a target
//! hostname against Subject/SubjectAltName with wildcard support.
//!
//! Low-level ASN.1/DER primitives are a thin layer over [`der_parser`] and
//! [`asn1_rs`] rather than a hand-rolled byte pusher; the OID registry is
//! [`oid_registry`]; signature verification (behind the `verify` feature)
//! is [`ring`]. See DESIGN.md for the full grounding of each module.

pub mod asn1;
pub mod chain;
pub mod crl;
pub mod error;
pub mod extensions;
pub mod name;
pub mod objects;
pub mod pem;
pub mod pk;
pub mod time;
pub mod verify;
pub mod x509;

pub use chain::{Chain, ParseOutcome};
pub use crl::CertificateRevocationList;
pub use error::{Asn1Error, X509Error, X509Result};
pub use name::X509Name;
pub use pk::PublicKey;
pub use verify::{check_parent, verify, VerifyAbort, VerifyCallback, VerifyConfig, VerifyFlags};
pub use x509::Certificate;
