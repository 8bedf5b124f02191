//! `ExtKeyUsageSyntax ::= SEQUENCE SIZE (1..MAX) OF KeyPurposeId`
//!
//! Grounded in `x509_get_ext_key_usage` in the reference implementation.

use der_parser::oid::Oid;

use crate::asn1;
use crate::error::Asn1Error;

pub fn parse_extended_key_usage(i: &[u8]) -> Result<Vec<Oid<'static>>, Asn1Error> {
    let (_, hdr) = asn1::sequence(i)?;
    let mut rest = hdr.content;
    let mut oids = Vec::new();

    while !rest.is_empty() {
        let (r, oid) = asn1::object_identifier(rest)?;
        oids.push(oid.to_owned());
        rest = r;
    }

    if oids.is_empty() {
        return Err(Asn1Error::InvalidLength);
    }

    Ok(oids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn empty_sequence_rejects() {
        let der = [0x30, 0x00];
        assert_eq!(parse_extended_key_usage(&der), Err(Asn1Error::InvalidLength));
    }

    #[test]
    fn parses_one_oid() {
        // SEQUENCE { OID 1.3.6.1.5.5.7.3.1 (serverAuth) }
        let der = hex!("30 09 06 07 2b 06 01 05 05 07 03 01");
        let oids = parse_extended_key_usage(&der).unwrap();
        assert_eq!(oids.len(), 1);
    }

    #[test]
    fn parses_two_oids() {
        // SEQUENCE { OID serverAuth, OID clientAuth (1.3.6.1.5.5.7.3.2) }
        let der = hex!("30 12 06 07 2b 06 01 05 05 07 03 01 06 07 2b 06 01 05 05 07 03 02");
        let oids = parse_extended_key_usage(&der).unwrap();
        assert_eq!(oids.len(), 2);
    }
}
