//! Error types
//!
//! Errors are layered: a low-level [`Asn1Error`] describes what went wrong
//! at the tag/length/primitive level, and [`X509Error`] describes what
//! went wrong at the certificate-semantics level, optionally wrapping the
//! `Asn1Error` that caused it.

use thiserror::Error;

/// Errors from the underlying ASN.1/DER decoding layer.
///
/// These mirror the `POLARSSL_ERR_ASN1_*` family from the reference
/// implementation, without the arithmetic offset composition: callers that
/// need the lower-level cause of a higher `X509Error` variant get it as an
/// embedded value instead of having to subtract a base constant.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Asn1Error {
    #[error("unexpected ASN.1 tag")]
    UnexpectedTag,
    #[error("ran out of data while decoding")]
    OutOfData,
    #[error("invalid ASN.1 length")]
    InvalidLength,
    #[error("decoded length does not match available data")]
    LengthMismatch,
    #[error("invalid ASN.1 data")]
    InvalidData,
}

/// Errors produced while parsing or verifying an X.509 certificate or CRL.
#[derive(Debug, Error)]
pub enum X509Error {
    #[error("ASN.1 error: {0}")]
    Asn1(#[from] Asn1Error),

    #[error("invalid certificate format: {0}")]
    InvalidFormat(Asn1Error),

    #[error("invalid version field")]
    InvalidVersion,

    #[error("unknown or out-of-range version: {0}")]
    UnknownVersion(u32),

    #[error("invalid serial number")]
    InvalidSerial,

    #[error("invalid AlgorithmIdentifier")]
    InvalidAlgorithm,

    #[error("invalid Name")]
    InvalidName,

    #[error("invalid date/time value")]
    InvalidDate,

    #[error("invalid signature value")]
    InvalidSignatureValue,

    #[error("invalid extensions: {0}")]
    InvalidExtensions(Asn1Error),

    #[error("unknown signature algorithm")]
    UnknownSignatureAlgorithm,

    #[error("outer and inner signature algorithm identifiers do not match")]
    SignatureMismatch,

    #[error("unsupported / unrecognized feature")]
    FeatureUnavailable,

    #[error("invalid input data")]
    BadInputData,

    #[error("file I/O error: {0}")]
    FileIo(#[from] std::io::Error),

    #[error("buffer is neither a recognized DER certificate nor PEM text")]
    CertUnknownFormat,

    #[error("certificate chain failed verification")]
    CertVerifyFailed,
}

impl X509Error {
    /// True for the sentinel PEM error that simply means "no BEGIN/END
    /// markers were found at this offset" — callers scanning a PEM stream
    /// for multiple blocks treat this differently from a real parse error.
    pub(crate) fn is_no_header_footer(&self) -> bool {
        matches!(self, X509Error::CertUnknownFormat)
    }
}

pub type X509Result<T> = Result<T, X509Error>;
