//! `BasicConstraints ::= SEQUENCE { cA BOOLEAN DEFAULT FALSE,
//!   pathLenConstraint INTEGER (0..MAX) OPTIONAL }`
//!
//! Grounded in `x509_get_basic_constraints` in the reference
//! implementation, including its tolerance for encoders that emit an
//! INTEGER where a BOOLEAN `cA` belongs.

use crate::asn1;
use crate::error::Asn1Error;

/// Decoded `BasicConstraints`. `max_pathlen` carries a `+1` offset:
/// `0` means absent/unbounded, `n > 0` means PKIX
/// `pathLenConstraint = n - 1`. Callers must not "fix" this offset away —
/// it is load-bearing throughout `verify::verify_top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BasicConstraints {
    pub ca: bool,
    pub max_pathlen: u32,
}

pub fn parse_basic_constraints(i: &[u8]) -> Result<BasicConstraints, Asn1Error> {
    let (_, hdr) = asn1::sequence(i)?;
    let mut rest = hdr.content;

    let mut bc = BasicConstraints::default();

    if rest.is_empty() {
        return Ok(bc);
    }

    match asn1::boolean(rest) {
        Ok((r, ca)) => {
            bc.ca = ca;
            rest = r;
        }
        Err(Asn1Error::UnexpectedTag) => {
            // Tolerate cA mis-encoded as an INTEGER, matching the
            // reference implementation's fallback.
            let (r, v) = asn1::small_integer(rest)?;
            bc.ca = v != 0;
            rest = r;
        }
        Err(e) => return Err(e),
    }

    if rest.is_empty() {
        return Ok(bc);
    }

    let (rest, path_len) = asn1::small_integer(rest)?;
    if !rest.is_empty() {
        return Err(Asn1Error::LengthMismatch);
    }
    if path_len < 0 {
        return Err(Asn1Error::InvalidData);
    }
    bc.max_pathlen = path_len as u32 + 1;

    Ok(bc)
}
