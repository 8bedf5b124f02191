//! X.509 v3 extension body parsers.
//!
//! Each parser receives the contents of an extension's `OCTET STRING` (the
//! extension envelope — `extnID`, `critical`, `extnValue` — is handled by
//! [`crate::x509`]). Grounded in the reference implementation's
//! `x509_get_basic_constraints` / `x509_get_key_usage` /
//! `x509_get_ext_key_usage` / `x509_get_subject_alt_name` /
//! `x509_get_ns_cert_type`.

mod basic_constraints;
mod ext_key_usage;
mod key_usage;
mod ns_cert_type;
mod subject_alt_name;

pub use basic_constraints::{parse_basic_constraints, BasicConstraints};
pub use ext_key_usage::parse_extended_key_usage;
pub use key_usage::{parse_key_usage, KeyUsageMask};
pub use ns_cert_type::{parse_ns_cert_type, NsCertTypeMask};
pub use subject_alt_name::parse_subject_alt_name;
