//! ASN.1 `Time` (UTCTime / GeneralizedTime) handling.
//!
//! `Validity` is the decoded `notBefore`/`notAfter` pair from a
//! `TBSCertificate`, or `thisUpdate`/`nextUpdate` from a `TBSCertList`.

use time::OffsetDateTime;

/// A decoded X.509 `Validity` (or CRL update) time pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    pub fn new(not_before: OffsetDateTime, not_after: OffsetDateTime) -> Self {
        Validity {
            not_before,
            not_after,
        }
    }

    /// True if `now` is strictly after `not_after` (the reference
    /// implementation's `x509_time_expired`).
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.not_after
    }

    /// True if `now` is strictly before `not_before` (the reference
    /// implementation's `x509_time_future`).
    pub fn is_not_yet_valid(&self, now: OffsetDateTime) -> bool {
        now < self.not_before
    }

    /// The duration left before expiration, or `None` if the certificate is
    /// not currently valid (not yet valid, or already expired).
    pub fn time_to_expiration(&self) -> Option<std::time::Duration> {
        let now = OffsetDateTime::now_utc();
        if now < self.not_before {
            return None;
        }
        if now >= self.not_after {
            return None;
        }
        (self.not_after - now).try_into().ok()
    }
}

/// True if `when` is strictly in the past relative to now.
///
/// Used for CRL entry `revocationDate` checks and CRL `nextUpdate`/
/// `thisUpdate` checks where only one side of the pair is available.
pub fn has_passed(when: OffsetDateTime) -> bool {
    OffsetDateTime::now_utc() > when
}

pub fn is_in_future(when: OffsetDateTime) -> bool {
    OffsetDateTime::now_utc() < when
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn check_validity_expiration() {
        let now = OffsetDateTime::now_utc();
        let mut v = Validity::new(now, now);
        assert_eq!(v.time_to_expiration(), None);

        v.not_after = v.not_after + Duration::minutes(1);
        assert!(v.time_to_expiration().is_some());
        assert!(v.time_to_expiration().unwrap() <= std::time::Duration::from_secs(60));
        assert!(v.time_to_expiration().unwrap() > std::time::Duration::from_secs(50));
    }

    #[test]
    fn not_yet_valid_has_no_time_to_expiration() {
        let now = OffsetDateTime::now_utc();
        let v = Validity::new(now + Duration::days(1), now + Duration::days(2));
        assert_eq!(v.time_to_expiration(), None);
        assert!(v.is_not_yet_valid(now));
        assert!(!v.is_expired(now));
    }
}
