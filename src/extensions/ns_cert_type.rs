//! Netscape Certificate Type — `BIT STRING`, same shape as `KeyUsage`.
//!
//! Grounded in `x509_get_ns_cert_type` in the reference implementation.

use crate::asn1;
use crate::error::Asn1Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NsCertTypeMask(pub u8);

impl NsCertTypeMask {
    pub const SSL_CLIENT: u8 = 0x80;
    pub const SSL_SERVER: u8 = 0x40;
    pub const EMAIL: u8 = 0x20;
    pub const OBJECT_SIGNING: u8 = 0x10;
    pub const RESERVED: u8 = 0x08;
    pub const SSL_CA: u8 = 0x04;
    pub const EMAIL_CA: u8 = 0x02;
    pub const OBJECT_SIGNING_CA: u8 = 0x01;

    pub fn has(self, bit: u8) -> bool {
        self.0 & bit == bit
    }
}

impl std::fmt::Display for NsCertTypeMask {
    /// `x509_info_cert_type`'s comma-joined purpose list.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        const NAMED: &[(u8, &str)] = &[
            (NsCertTypeMask::SSL_CLIENT, "SSL Client"),
            (NsCertTypeMask::SSL_SERVER, "SSL Server"),
            (NsCertTypeMask::EMAIL, "Email"),
            (NsCertTypeMask::OBJECT_SIGNING, "Object Signing"),
            (NsCertTypeMask::RESERVED, "Reserved"),
            (NsCertTypeMask::SSL_CA, "SSL CA"),
            (NsCertTypeMask::EMAIL_CA, "Email CA"),
            (NsCertTypeMask::OBJECT_SIGNING_CA, "Object Signing CA"),
        ];
        let mut sep = "";
        for (bit, name) in NAMED {
            if self.has(*bit) {
                write!(f, "{}{}", sep, name)?;
                sep = ", ";
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod display_tests {
    use super::*;

    #[test]
    fn joins_set_bits_in_fixed_order() {
        let nc = NsCertTypeMask(NsCertTypeMask::SSL_SERVER | NsCertTypeMask::SSL_CA);
        assert_eq!(nc.to_string(), "SSL Server, SSL CA");
    }
}

pub fn parse_ns_cert_type(i: &[u8]) -> Result<NsCertTypeMask, Asn1Error> {
    let (_, bits) = asn1::bit_string(i)?;
    if bits.len() != 1 {
        return Err(Asn1Error::InvalidLength);
    }
    Ok(NsCertTypeMask(bits[0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_multi_byte_bitstring() {
        let der = [0x03, 0x03, 0x00, 0x80, 0x00];
        assert_eq!(parse_ns_cert_type(&der), Err(Asn1Error::InvalidLength));
    }

    #[test]
    fn decodes_ssl_server() {
        let der = [0x03, 0x02, 0x00, 0x40];
        let nc = parse_ns_cert_type(&der).unwrap();
        assert!(nc.has(NsCertTypeMask::SSL_SERVER));
    }
}
