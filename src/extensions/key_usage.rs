//! `KeyUsage ::= BIT STRING` — decoded into an 8-bit mask
//! (`DIGITAL_SIGNATURE` .. `CRL_SIGN`).
//!
//! Grounded in `x509_get_key_usage` in the reference implementation.

use crate::asn1;
use crate::error::Asn1Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyUsageMask(pub u8);

impl KeyUsageMask {
    pub const DIGITAL_SIGNATURE: u8 = 0x80;
    pub const NON_REPUDIATION: u8 = 0x40;
    pub const KEY_ENCIPHERMENT: u8 = 0x20;
    pub const DATA_ENCIPHERMENT: u8 = 0x10;
    pub const KEY_AGREEMENT: u8 = 0x08;
    pub const KEY_CERT_SIGN: u8 = 0x04;
    pub const CRL_SIGN: u8 = 0x02;

    pub fn has(self, bit: u8) -> bool {
        self.0 & bit == bit
    }
}

impl std::fmt::Display for KeyUsageMask {
    /// `x509_info_key_usage`'s comma-joined purpose list.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        const NAMED: &[(u8, &str)] = &[
            (KeyUsageMask::DIGITAL_SIGNATURE, "Digital Signature"),
            (KeyUsageMask::NON_REPUDIATION, "Non Repudiation"),
            (KeyUsageMask::KEY_ENCIPHERMENT, "Key Encipherment"),
            (KeyUsageMask::DATA_ENCIPHERMENT, "Data Encipherment"),
            (KeyUsageMask::KEY_AGREEMENT, "Key Agreement"),
            (KeyUsageMask::KEY_CERT_SIGN, "Key Cert Sign"),
            (KeyUsageMask::CRL_SIGN, "CRL Sign"),
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


pub fn parse_key_usage(i: &[u8]) -> Result<KeyUsageMask, Asn1Error> {
    let (_, bits) = asn1::bit_string(i)?;
    if bits.is_empty() {
        return Err(Asn1Error::InvalidLength);
    }
    Ok(KeyUsageMask(bits[0]))
}
