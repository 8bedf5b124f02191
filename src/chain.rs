//! Chain assembly: turning a DER buffer, a PEM stream, a file, or a
//! directory of files into an ordered `Vec<Certificate>`.
//!
//! Grounded in the reference implementation's `x509_crt_parse_der`/
//! `x509_crt_parse`/`x509_crt_parse_file`/`x509_crt_parse_path`, rebuilt as
//! an arena-backed `Vec<Certificate>` instead of a linked list with a raw
//! `next` pointer. Index 0 is the leaf; each `append` pushes onto the tail,
//! same order the original links onto.

use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use crate::error::X509Error;
use crate::pem;
use crate::x509::Certificate;

/// How many certificates an `append`/`parse_file`/`parse_path` call added,
/// and how many it skipped because they failed to parse.
///
/// The original's `x509_crt_parse` returns `0` on full success, a positive
/// count of failures if at least one certificate still parsed, or a
/// negative error code if none did. This type keeps that "partial success
/// is not fatal" policy without the sign-overloading: if nothing parsed,
/// `Chain::parse` returns `Err` with the first failure instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOutcome {
    pub parsed: usize,
    pub failed: usize,
}

/// An ordered sequence of certificates, leaf-first. A thin newtype over
/// `Vec<Certificate>` so the parsing entry points below have somewhere to
/// live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain(Vec<Certificate>);

impl Chain {
    pub fn new() -> Self {
        Chain(Vec::new())
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.0
    }

    /// The certificate at index 0, by convention the leaf being verified.
    pub fn leaf(&self) -> Option<&Certificate> {
        self.0.first()
    }

    /// Append exactly one DER-encoded `Certificate`. `x509_crt_parse_der`.
    pub fn append_der(&mut self, buf: &[u8]) -> Result<(), X509Error> {
        let cert = Certificate::from_der(buf)?;
        self.0.push(cert);
        Ok(())
    }

    /// Append every certificate found in `buf`: a PEM stream of one or more
    /// `BEGIN/END CERTIFICATE` blocks, or (if no PEM marker is present) a
    /// single raw DER certificate. `x509_crt_parse`.
    pub fn parse(&mut self, buf: &[u8]) -> Result<ParseOutcome, X509Error> {
        if !pem::looks_like_pem(buf) {
            self.append_der(buf)?;
            return Ok(ParseOutcome {
                parsed: 1,
                failed: 0,
            });
        }

        let mut cursor = buf;
        let mut outcome = ParseOutcome::default();
        let mut first_error = None;

        loop {
            let block = match pem::next_block(cursor) {
                Ok(Some(block)) => block,
                Ok(None) => break,
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    outcome.failed += 1;
                    break;
                }
            };

            match Certificate::from_der(&block.der) {
                Ok(cert) => {
                    self.0.push(cert);
                    outcome.parsed += 1;
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    outcome.failed += 1;
                }
            }

            cursor = &cursor[block.consumed..];
        }

        if outcome.parsed == 0 {
            return Err(first_error.unwrap_or(X509Error::CertUnknownFormat));
        }
        Ok(outcome)
    }

    /// Read `path` and append every certificate it contains.
    /// `x509_crt_parse_file`.
    pub fn parse_file(&mut self, path: &Path) -> Result<ParseOutcome, X509Error> {
        let buf = fs::read(path)?;
        self.parse(&buf)
    }

    /// Append every certificate in every regular file directly under
    /// `dir` (non-recursive, matching the original's single-level
    /// `FindFirstFile`/`readdir` walk — substituted here with
    /// `std::fs::read_dir` since there is no portable Win32 `FindFirstFileW`
    /// equivalent in std). `x509_crt_parse_path`.
    pub fn parse_path(&mut self, dir: &Path) -> Result<ParseOutcome, X509Error> {
        let mut outcome = ParseOutcome::default();
        let mut first_error = None;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            match self.parse_file(&entry.path()) {
                Ok(o) => {
                    outcome.parsed += o.parsed;
                    outcome.failed += o.failed;
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    outcome.failed += 1;
                }
            }
        }

        if outcome.parsed == 0 {
            if let Some(e) = first_error {
                return Err(e);
            }
        }
        Ok(outcome)
    }
}

impl Deref for Chain {
    type Target = [Certificate];
    fn deref(&self) -> &[Certificate] {
        &self.0
    }
}

impl DerefMut for Chain {
    fn deref_mut(&mut self) -> &mut [Certificate] {
        &mut self.0
    }
}

impl FromIterator<Certificate> for Chain {
    fn from_iter<I: IntoIterator<Item = Certificate>>(iter: I) -> Self {
        Chain(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn append_der_rejects_garbage() {
        let mut chain = Chain::new();
        assert!(chain.append_der(&[0xff, 0xff]).is_err());
        assert!(chain.certificates().is_empty());
    }

    #[test]
    fn parse_raw_der_with_no_pem_marker_is_single_attempt() {
        let mut chain = Chain::new();
        let err = chain.parse(&[0x30, 0x03, 0x02, 0x01, 0x01]).unwrap_err();
        assert!(matches!(err, X509Error::InvalidFormat(_) | X509Error::InvalidAlgorithm));
    }

    #[test]
    fn parse_pem_with_only_broken_blocks_errs() {
        let mut chain = Chain::new();
        let pem = b"-----BEGIN CERTIFICATE-----\nAA==\n-----END CERTIFICATE-----\n";
        assert!(chain.parse(pem).is_err());
        assert_eq!(chain.certificates().len(), 0);
    }

    #[test]
    fn parse_path_aggregates_failures_across_files() {
        let dir = std::env::temp_dir().join(format!("x509-chain-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        for name in ["a.pem", "b.pem"] {
            let mut f = fs::File::create(dir.join(name)).unwrap();
            f.write_all(b"not a certificate").unwrap();
        }

        let mut chain = Chain::new();
        let result = chain.parse_path(&dir);
        let _ = fs::remove_dir_all(&dir);

        assert!(result.is_err());
    }
}
