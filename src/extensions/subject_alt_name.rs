//! `SubjectAltName ::= GeneralNames`
//!
//! Only the `[2]` (`dNSName`) `GeneralName` variant is retained; every
//! other tag is length-skipped. This is a deliberate, preserved limitation
//! inherited from the reference implementation, whose own comment reads:
//! "NOTE: PolarSSL only parses and uses dNSName at this point."

use der_parser::ber::ber_read_element_header;

use crate::error::Asn1Error;

const CONTEXT_SPECIFIC: u8 = 0x80;
const DNS_NAME_TAG: u8 = CONTEXT_SPECIFIC | 2;

pub fn parse_subject_alt_name(i: &[u8]) -> Result<Vec<Vec<u8>>, Asn1Error> {
    use crate::asn1;

    let (_, hdr) = asn1::sequence(i)?;
    let mut rest = hdr.content;
    let mut names = Vec::new();

    while !rest.is_empty() {
        let (after_hdr, elem_hdr) =
            ber_read_element_header(rest).map_err(|_| Asn1Error::OutOfData)?;

        if !elem_hdr.is_contextspecific() {
            return Err(Asn1Error::UnexpectedTag);
        }

        let len = elem_hdr
            .len
            .definite()
            .map_err(|_| Asn1Error::InvalidLength)?;
        if len > after_hdr.len() {
            return Err(Asn1Error::LengthMismatch);
        }
        let (content, tail) = after_hdr.split_at(len);

        let raw_tag = CONTEXT_SPECIFIC | (elem_hdr.tag().0 as u8);
        if raw_tag == DNS_NAME_TAG {
            names.push(content.to_vec());
        }

        rest = tail;
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retains_only_dns_name() {
        // SEQUENCE {
        //   [1] IA5String "bob@example.com"   (rfc822Name, skipped)
        //   [2] IA5String "example.com"       (dNSName, retained)
        // }
        let rfc822 = b"bob@example.com";
        let dns = b"example.com";
        let mut der = vec![0x30u8, (4 + rfc822.len() + dns.len()) as u8];
        der.push(0x81);
        der.push(rfc822.len() as u8);
        der.extend_from_slice(rfc822);
        der.push(0x82);
        der.push(dns.len() as u8);
        der.extend_from_slice(dns);

        let names = parse_subject_alt_name(&der).unwrap();
        assert_eq!(names, vec![dns.to_vec()]);
    }

    #[test]
    fn non_context_specific_tag_rejects() {
        // SEQUENCE { UTF8String "x" } — universal tag 0x0c, not context-specific
        let der = [0x30, 0x03, 0x0c, 0x01, b'x'];
        assert_eq!(
            parse_subject_alt_name(&der),
            Err(Asn1Error::UnexpectedTag)
        );
    }
}
