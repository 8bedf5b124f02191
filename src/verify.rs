//! Chain verification: the core PKIX algorithm.
//!
//! `verify` is the Rust counterpart of the reference implementation's
//! `x509_crt_verify`, built from the same mutually recursive
//! `verify_child`/`verify_top` shape and the same `check_parent`
//! parent-suitability test (see DESIGN.md). Chain traversal walks the
//! caller-supplied certificate slices by index rather than a linked `next`
//! pointer, but the algorithm itself — defect accumulation, CRL
//! consultation, the per-hop callback, the locally-trusted-root
//! exceptions — is unchanged.

use time::OffsetDateTime;

use crate::crl::{self, CertificateRevocationList};
use crate::extensions::KeyUsageMask;
use crate::name;
use crate::objects::ExtensionType;
use crate::x509::Certificate;

/// Verification defect bitmask. Bits are OR-combined as the chain walk
/// accumulates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerifyFlags(pub u16);

impl VerifyFlags {
    pub const EXPIRED: u16 = 0x0001;
    pub const REVOKED: u16 = 0x0002;
    pub const CN_MISMATCH: u16 = 0x0004;
    pub const NOT_TRUSTED: u16 = 0x0008;
    pub const FUTURE: u16 = 0x0010;
    pub const CRL_NOT_TRUSTED: u16 = 0x0020;
    pub const CRL_EXPIRED: u16 = 0x0040;
    pub const CRL_FUTURE: u16 = 0x0080;

    pub fn empty() -> Self {
        VerifyFlags(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn set(&mut self, bit: u16) {
        self.0 |= bit;
    }

    pub fn clear(&mut self, bit: u16) {
        self.0 &= !bit;
    }

    pub fn has(&self, bit: u16) -> bool {
        self.0 & bit != 0
    }
}

impl std::ops::BitOr for VerifyFlags {
    type Output = VerifyFlags;
    fn bitor(self, rhs: VerifyFlags) -> VerifyFlags {
        VerifyFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for VerifyFlags {
    fn bitor_assign(&mut self, rhs: VerifyFlags) {
        self.0 |= rhs.0;
    }
}

/// The verify callback returned a non-zero status, aborting verification
/// immediately. Distinct from "verification completed with defects" —
/// `verify` surfaces defects through the returned [`VerifyFlags`], never
/// through `Err`, except for this callback-abort path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyAbort(pub i32);

/// `f_vrfy(user_ctx, cert, depth, &mut flags)`: invoked bottom-up at every
/// hop, leaf at depth 0. May inspect and mutate `flags`; returning
/// `Err(VerifyAbort(_))` aborts verification with that status.
pub type VerifyCallback<'a> =
    dyn FnMut(&Certificate, usize, &mut VerifyFlags) -> Result<(), VerifyAbort> + 'a;

/// Runtime knobs the reference implementation selected via
/// `#define POLARSSL_X509_CHECK_KEY_USAGE` and friends.
#[derive(Debug, Clone, Copy)]
pub struct VerifyConfig {
    /// Enforce `keyCertSign`/`cRLSign` KeyUsage bits on CA certificates.
    pub check_key_usage: bool,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        VerifyConfig {
            check_key_usage: true,
        }
    }
}

/// `x509_crt_check_parent`: is `parent` a suitable issuer for `child`?
///
/// `top` means `parent` is drawn from the locally trusted root set rather
/// than another certificate in the candidate chain; `bottom` means `child`
/// is the leaf end-entity certificate (`path_cnt == 0` at the call site).
pub fn check_parent(
    child: &Certificate,
    parent: &Certificate,
    top: bool,
    bottom: bool,
    config: &VerifyConfig,
) -> bool {
    if child.issuer_raw != parent.subject_raw {
        return false;
    }

    let mut need_ca_bit = true;

    // Exception: v1/v2 certificates that are locally trusted need not
    // carry BasicConstraints at all.
    if top && parent.version < 3 {
        need_ca_bit = false;
    }

    // Exception: a self-signed end-entity cert explicitly handed in as a
    // trust anchor.
    if top && bottom && child.raw == parent.raw {
        need_ca_bit = false;
    }

    if need_ca_bit && !parent.ca_istrue {
        return false;
    }

    if need_ca_bit
        && config.check_key_usage
        && parent
            .check_key_usage(KeyUsageMask::KEY_CERT_SIGN)
            .is_err()
    {
        return false;
    }

    true
}

/// The `verify_top`/`verify_top`-and-`verify_child` self-match test: does
/// `trust_ca` appear to be the same certificate as `child` (the top of the
/// chain is itself a trusted root)?
///
/// NOTE: the reference implementation compares `child.subject_raw` against
/// `trust_ca.subject_raw` for only `child.issuer_raw.len()` bytes, not the
/// full `child.subject_raw.len()`. This looks like a bug, but chain
/// verifiers built against it rely on its exact output, so it is preserved
/// here rather than "fixed" — see DESIGN.md Open Questions. The comparison
/// length is additionally capped at `child.subject_raw.len()` so this
/// cannot panic on a slice-length mismatch in safe Rust; the original's
/// unchecked `memcmp` would read past the shorter buffer instead, which
/// is undefined behavior, not a meaningful semantic to reproduce.
fn top_matches_trust_subject(child: &Certificate, trust_ca: &Certificate) -> bool {
    if child.subject_raw.len() != trust_ca.subject_raw.len() {
        return false;
    }
    let cmp_len = child.issuer_raw.len().min(child.subject_raw.len());
    child.subject_raw[..cmp_len] == trust_ca.subject_raw[..cmp_len]
}

/// Locate the first certificate in `candidates` that is a suitable parent
/// for `child`, returning it along with the remainder of `candidates`
/// following it (for a further grandparent search). `x509_crt_verify`'s
/// `for (parent = crt->next; ...)` loop, by index instead of by `next`.
fn find_parent<'a>(
    child: &Certificate,
    candidates: &'a [Certificate],
    top: bool,
    bottom: bool,
    config: &VerifyConfig,
) -> Option<(&'a Certificate, &'a [Certificate])> {
    candidates
        .iter()
        .position(|cand| check_parent(child, cand, top, bottom, config))
        .map(|i| (&candidates[i], &candidates[i + 1..]))
}

/// §4.4: does `crt` present `cn` as a Subject-CN or SubjectAltName
/// dNSName? If a SubjectAltName extension is present, **only** its
/// dNSName entries are consulted (Subject CN is not a fallback); otherwise
/// every Subject RDN atom with OID `id-at-commonName` is tried.
fn check_hostname(crt: &Certificate, cn: &str, flags: &mut VerifyFlags) {
    let target = cn.as_bytes();
    let matched = if crt.ext_types.has(ExtensionType::SubjectAltName) {
        crt.subject_alt_names
            .iter()
            .any(|dns| name::name_matches(target, dns))
    } else {
        crt.subject
            .common_names()
            .any(|value| name::name_matches(target, value))
    };
    if !matched {
        flags.set(VerifyFlags::CN_MISMATCH);
    }
}

/// Top-level entry point. `chain` is the candidate chain to verify, leaf
/// first (`chain[0]`); `chain[1..]` are candidate intermediates supplied
/// alongside the leaf, searched the same way the original walks
/// `crt->next`. `trust_ca` is the separate, caller-maintained set of
/// locally trusted roots. `cn`, if given, is matched against the leaf's
/// Subject/SubjectAltName per §4.4.
///
/// Returns `Ok(flags)` always — `flags.is_empty()` is the "all clean"
/// case, any other value names the accumulated defects — except when
/// `f_vrfy` aborts, which surfaces as `Err(VerifyAbort)`.
pub fn verify(
    chain: &[Certificate],
    trust_ca: &[Certificate],
    crl_list: &[CertificateRevocationList],
    cn: Option<&str>,
    config: &VerifyConfig,
    f_vrfy: Option<&mut VerifyCallback>,
) -> Result<VerifyFlags, VerifyAbort> {
    let mut flags = VerifyFlags::empty();

    let crt = match chain.first() {
        Some(c) => c,
        None => {
            flags.set(VerifyFlags::NOT_TRUSTED);
            return Ok(flags);
        }
    };
    let remaining = &chain[1..];

    if let Some(cn) = cn {
        check_hostname(crt, cn, &mut flags);
    }

    let mut f_vrfy = f_vrfy;
    let path_cnt = 0usize;

    match find_parent(crt, remaining, false, path_cnt == 0, config) {
        Some((parent, grandparents)) => {
            verify_child(
                crt,
                parent,
                grandparents,
                trust_ca,
                crl_list,
                config,
                path_cnt,
                &mut flags,
                &mut f_vrfy,
            )?;
        }
        None => {
            verify_top(
                crt, trust_ca, crl_list, config, path_cnt, &mut flags, &mut f_vrfy,
            )?;
        }
    }

    Ok(flags)
}

/// `x509_crt_verify_child`: `child` is issued by `parent`, which is itself
/// a member of the candidate chain (not yet a trusted root). Verifies the
/// signature, consults any applicable CRL, then recurses upward to
/// establish that `parent` in turn chains to a trusted root.
#[allow(clippy::too_many_arguments)]
fn verify_child(
    child: &Certificate,
    parent: &Certificate,
    grandparent_candidates: &[Certificate],
    trust_ca: &[Certificate],
    crl_list: &[CertificateRevocationList],
    config: &VerifyConfig,
    path_cnt: usize,
    flags: &mut VerifyFlags,
    f_vrfy: &mut Option<&mut VerifyCallback>,
) -> Result<(), VerifyAbort> {
    let now = OffsetDateTime::now_utc();
    if child.validity.is_expired(now) {
        flags.set(VerifyFlags::EXPIRED);
    }
    if child.validity.is_not_yet_valid(now) {
        flags.set(VerifyFlags::FUTURE);
    }

    if !parent.pk.can_verify(child.sig_pk)
        || parent
            .pk
            .verify_signature(child.sig_md, &child.tbs, &child.sig)
            .is_err()
    {
        flags.set(VerifyFlags::NOT_TRUSTED);
    }

    *flags |= crl::check_crl(child, parent, crl_list, config.check_key_usage);

    let mut parent_flags = VerifyFlags::empty();
    match find_parent(
        parent,
        grandparent_candidates,
        false,
        path_cnt == 0,
        config,
    ) {
        Some((grandparent, great_grandparents)) => {
            verify_child(
                parent,
                grandparent,
                great_grandparents,
                trust_ca,
                crl_list,
                config,
                path_cnt + 1,
                &mut parent_flags,
                f_vrfy,
            )?;
        }
        None => {
            verify_top(
                parent,
                trust_ca,
                crl_list,
                config,
                path_cnt + 1,
                &mut parent_flags,
                f_vrfy,
            )?;
        }
    }

    if let Some(cb) = f_vrfy.as_mut() {
        cb(child, path_cnt, flags)?;
    }
    *flags |= parent_flags;

    Ok(())
}

/// `x509_crt_verify_top`: `child` has no suitable parent left in the
/// candidate chain, so it must chain directly to one of `trust_ca`.
fn verify_top(
    child: &Certificate,
    trust_ca: &[Certificate],
    crl_list: &[CertificateRevocationList],
    config: &VerifyConfig,
    path_cnt: usize,
    flags: &mut VerifyFlags,
    f_vrfy: &mut Option<&mut VerifyCallback>,
) -> Result<(), VerifyAbort> {
    let now = OffsetDateTime::now_utc();
    if child.validity.is_expired(now) {
        flags.set(VerifyFlags::EXPIRED);
    }
    if child.validity.is_not_yet_valid(now) {
        flags.set(VerifyFlags::FUTURE);
    }

    flags.set(VerifyFlags::NOT_TRUSTED);

    // `check_path_cnt` is shared mutable state across loop iterations in
    // the original (not reset per candidate); a signed type sidesteps the
    // underflow panic an unsigned counter would risk if more than one
    // trust anchor happens to share the child's subject.
    let mut check_path_cnt: i64 = path_cnt as i64 + 1;
    let mut matched_root: Option<&Certificate> = None;

    for root in trust_ca {
        if !check_parent(child, root, true, path_cnt == 0, config) {
            continue;
        }

        if top_matches_trust_subject(child, root) {
            check_path_cnt -= 1;
        }

        if root.max_pathlen > 0 && (root.max_pathlen as i64) < check_path_cnt {
            continue;
        }

        if !root.pk.can_verify(child.sig_pk)
            || root
                .pk
                .verify_signature(child.sig_md, &child.tbs, &child.sig)
                .is_err()
        {
            continue;
        }

        flags.clear(VerifyFlags::NOT_TRUSTED);
        matched_root = Some(root);
        break;
    }

    let mut ca_flags = VerifyFlags::empty();
    if let Some(root) = matched_root {
        if !top_matches_trust_subject(child, root) {
            *flags |= crl::check_crl(child, root, crl_list, config.check_key_usage);

            if root.validity.is_expired(now) {
                ca_flags.set(VerifyFlags::EXPIRED);
            }
            if root.validity.is_not_yet_valid(now) {
                ca_flags.set(VerifyFlags::FUTURE);
            }

            if let Some(cb) = f_vrfy.as_mut() {
                cb(root, path_cnt + 1, &mut ca_flags)?;
            }
        }
    }

    if let Some(cb) = f_vrfy.as_mut() {
        cb(child, path_cnt, flags)?;
    }
    *flags |= ca_flags;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::NsCertTypeMask;
    use crate::name::X509Name;
    use crate::objects::{DigestAlgorithm, ExtensionTypeMask, PublicKeyAlgorithm};
    use crate::pk::PublicKey;
    use crate::time::Validity;
    use der_parser::oid::Oid;
    use std::borrow::Cow;

    fn blank_cert() -> Certificate {
        Certificate {
            raw: Vec::new(),
            version: 3,
            serial: vec![1],
            tbs: Vec::new(),
            issuer_raw: Vec::new(),
            subject_raw: Vec::new(),
            issuer: X509Name::default(),
            subject: X509Name::default(),
            validity: Validity::new(OffsetDateTime::now_utc(), OffsetDateTime::now_utc()),
            pk: PublicKey {
                algorithm: PublicKeyAlgorithm::Rsa,
                raw: Vec::new(),
            },
            sig_oid1: Oid::new(Cow::Borrowed(&[])),
            sig_oid2: Oid::new(Cow::Borrowed(&[])),
            sig_md: DigestAlgorithm::Sha256,
            sig_pk: PublicKeyAlgorithm::Rsa,
            sig: Vec::new(),
            issuer_id: None,
            subject_id: None,
            v3_ext: Vec::new(),
            ext_types: ExtensionTypeMask::default(),
            ca_istrue: false,
            max_pathlen: 0,
            key_usage: KeyUsageMask::default(),
            ns_cert_type: NsCertTypeMask::default(),
            subject_alt_names: Vec::new(),
            ext_key_usage: Vec::new(),
        }
    }

    #[test]
    fn check_parent_requires_issuer_subject_match() {
        let mut child = blank_cert();
        let mut parent = blank_cert();
        parent.ca_istrue = true;
        child.issuer_raw = vec![1, 2, 3];
        parent.subject_raw = vec![9, 9, 9];
        let config = VerifyConfig::default();
        assert!(!check_parent(&child, &parent, false, false, &config));

        parent.subject_raw = vec![1, 2, 3];
        assert!(check_parent(&child, &parent, false, false, &config));
    }

    #[test]
    fn check_parent_requires_ca_bit_unless_locally_trusted_v1() {
        let mut child = blank_cert();
        let mut parent = blank_cert();
        child.issuer_raw = vec![1];
        parent.subject_raw = vec![1];
        parent.ca_istrue = false;
        let config = VerifyConfig::default();

        // Not top: CA bit is mandatory.
        assert!(!check_parent(&child, &parent, false, false, &config));

        // Top and v1: CA bit exception applies.
        parent.version = 1;
        assert!(check_parent(&child, &parent, true, false, &config));

        // Top and v3 without CA bit: still rejected.
        parent.version = 3;
        assert!(!check_parent(&child, &parent, true, false, &config));
    }

    #[test]
    fn check_parent_self_signed_trusted_leaf_exception() {
        let mut child = blank_cert();
        child.raw = vec![1, 2, 3];
        child.issuer_raw = vec![5];
        let mut parent = child.clone();
        parent.subject_raw = vec![5];
        parent.ca_istrue = false;
        let config = VerifyConfig::default();

        assert!(check_parent(&child, &parent, true, true, &config));
        // Without "bottom" the exception does not apply.
        assert!(!check_parent(&child, &parent, true, false, &config));
    }

    #[test]
    fn check_parent_enforces_key_cert_sign_when_configured() {
        let mut child = blank_cert();
        let mut parent = blank_cert();
        child.issuer_raw = vec![7];
        parent.subject_raw = vec![7];
        parent.ca_istrue = true;
        parent.ext_types.set(ExtensionType::KeyUsage);
        parent.key_usage = KeyUsageMask(KeyUsageMask::DIGITAL_SIGNATURE);

        let config = VerifyConfig {
            check_key_usage: true,
        };
        assert!(!check_parent(&child, &parent, false, false, &config));

        let config = VerifyConfig {
            check_key_usage: false,
        };
        assert!(check_parent(&child, &parent, false, false, &config));
    }

    #[test]
    fn top_subject_match_uses_issuer_len_not_subject_len() {
        // Pinning the preserved idiosyncrasy: the comparison only examines
        // `child.issuer_raw.len()` bytes of the two (equal-length)
        // subjects, so a trust anchor whose subject differs only *after*
        // that many bytes is still treated as "the same" certificate.
        let mut child = blank_cert();
        child.issuer_raw = vec![0xAA, 0xAA, 0xAA]; // len 3
        child.subject_raw = vec![1, 2, 3, 4, 5]; // len 5

        let mut trust_ca = blank_cert();
        trust_ca.subject_raw = vec![1, 2, 3, 0xFF, 0xFF]; // differs after byte 3

        assert!(top_matches_trust_subject(&child, &trust_ca));

        // A full-length comparison would have rejected this pair.
        assert_ne!(child.subject_raw, trust_ca.subject_raw);
    }

    #[test]
    fn top_subject_match_requires_equal_subject_length() {
        let mut child = blank_cert();
        child.issuer_raw = vec![1];
        child.subject_raw = vec![1, 2, 3];
        let mut trust_ca = blank_cert();
        trust_ca.subject_raw = vec![1, 2];
        assert!(!top_matches_trust_subject(&child, &trust_ca));
    }

    #[test]
    fn hostname_exact_and_wildcard_match() {
        let mut crt = blank_cert();
        crt.subject.rdn_seq = vec![crate::name::RelativeDistinguishedName {
            set: vec![crate::name::AttributeTypeAndValue {
                attr_type: oid_registry::OID_X509_COMMON_NAME,
                attr_value: b"Example.com".to_vec(),
                is_string: true,
            }],
        }];

        let mut flags = VerifyFlags::empty();
        check_hostname(&crt, "example.com", &mut flags);
        assert!(flags.is_empty());

        let mut flags = VerifyFlags::empty();
        check_hostname(&crt, "not-example.com", &mut flags);
        assert!(flags.has(VerifyFlags::CN_MISMATCH));
    }

    #[test]
    fn hostname_san_present_ignores_subject_cn() {
        let mut crt = blank_cert();
        crt.ext_types.set(ExtensionType::SubjectAltName);
        crt.subject_alt_names = vec![b"*.example.com".to_vec()];
        crt.subject.rdn_seq = vec![crate::name::RelativeDistinguishedName {
            set: vec![crate::name::AttributeTypeAndValue {
                attr_type: oid_registry::OID_X509_COMMON_NAME,
                attr_value: b"example.com".to_vec(),
                is_string: true,
            }],
        }];

        // Subject CN would match "example.com" exactly, but SAN presence
        // means only SAN entries are consulted, and none match exactly.
        let mut flags = VerifyFlags::empty();
        check_hostname(&crt, "example.com", &mut flags);
        assert!(flags.has(VerifyFlags::CN_MISMATCH));

        let mut flags = VerifyFlags::empty();
        check_hostname(&crt, "foo.example.com", &mut flags);
        assert!(flags.is_empty());
    }

    #[test]
    fn verify_empty_chain_is_not_trusted() {
        let config = VerifyConfig::default();
        let flags = verify(&[], &[], &[], None, &config, None).unwrap();
        assert!(flags.has(VerifyFlags::NOT_TRUSTED));
    }

    #[test]
    fn verify_top_flags_expired_leaf_with_no_trust_anchor() {
        let mut leaf = blank_cert();
        let now = OffsetDateTime::now_utc();
        leaf.validity = Validity::new(now - time::Duration::days(30), now - time::Duration::days(1));

        let config = VerifyConfig::default();
        let flags = verify(&[leaf], &[], &[], None, &config, None).unwrap();
        assert!(flags.has(VerifyFlags::EXPIRED));
        assert!(flags.has(VerifyFlags::NOT_TRUSTED));
    }

    #[test]
    fn verify_callback_abort_short_circuits() {
        let leaf = blank_cert();
        let config = VerifyConfig::default();
        let mut cb = |_crt: &Certificate, _depth: usize, _flags: &mut VerifyFlags| {
            Err(VerifyAbort(42))
        };
        let result = verify(&[leaf], &[], &[], None, &config, Some(&mut cb));
        assert_eq!(result.unwrap_err(), VerifyAbort(42));
    }
}
