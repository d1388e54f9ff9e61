//! Key encoding for the store's column families.
//!
//! Primary buckets (Concepts, Descriptions, Relationships, ReferenceSetItems)
//! are keyed by the component's own SCTID, encoded big-endian so that
//! RocksDB's lexicographic ordering matches numeric ordering. Derived buckets
//! use composite big-endian keys so a prefix scan over the leading id yields
//! every associated value.

use snomed_types::SctId;

/// Encodes a single SCTID as an 8-byte big-endian key.
pub fn sctid_key(id: SctId) -> [u8; 8] {
    id.to_be_bytes()
}

/// Encodes a pair of SCTIDs as a 16-byte composite key: `lead` first so a
/// prefix scan on `sctid_key(lead)` finds every entry for it.
pub fn pair_key(lead: SctId, trail: SctId) -> [u8; 16] {
    let mut buf = [0u8; 16];
    buf[0..8].copy_from_slice(&lead.to_be_bytes());
    buf[8..16].copy_from_slice(&trail.to_be_bytes());
    buf
}

/// Encodes a refset/component/member composite key used by `ComponentsByRefset`:
/// `refsetId || componentId || memberId`.
pub fn triple_key(refset_id: SctId, component_id: SctId, member_id: SctId) -> [u8; 24] {
    let mut buf = [0u8; 24];
    buf[0..8].copy_from_slice(&refset_id.to_be_bytes());
    buf[8..16].copy_from_slice(&component_id.to_be_bytes());
    buf[16..24].copy_from_slice(&member_id.to_be_bytes());
    buf
}

/// Encodes a `MapTargetIndex` key: `refsetId || mapTarget || 0x00 || componentId`.
///
/// The null byte separates the variable-length map target string from the
/// fixed-width component id so a prefix scan on `refsetId || mapTarget || 0x00`
/// finds every component mapped to that target without over-matching a target
/// that is itself a prefix of another (e.g. `"G35"` vs `"G35X"`).
pub fn map_target_key(refset_id: SctId, map_target: &str, component_id: SctId) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + map_target.len() + 1 + 8);
    buf.extend_from_slice(&refset_id.to_be_bytes());
    buf.extend_from_slice(map_target.as_bytes());
    buf.push(0u8);
    buf.extend_from_slice(&component_id.to_be_bytes());
    buf
}

/// Encodes a `MapTargetIndex` prefix for scanning all components mapped to a
/// given target within a refset.
pub fn map_target_prefix(refset_id: SctId, map_target: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + map_target.len() + 1);
    buf.extend_from_slice(&refset_id.to_be_bytes());
    buf.extend_from_slice(map_target.as_bytes());
    buf.push(0u8);
    buf
}

/// Encodes a `SearchTokens` key: `lowercasedToken || 0x00 || descriptionId`.
pub fn token_key(token: &str, description_id: SctId) -> Vec<u8> {
    let mut buf = Vec::with_capacity(token.len() + 1 + 8);
    buf.extend_from_slice(token.as_bytes());
    buf.push(0u8);
    buf.extend_from_slice(&description_id.to_be_bytes());
    buf
}

/// Encodes a `SearchTokens` prefix for scanning every description carrying a token.
pub fn token_prefix(token: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(token.len() + 1);
    buf.extend_from_slice(token.as_bytes());
    buf.push(0u8);
    buf
}

/// Decodes the trailing 8-byte big-endian SCTID from a composite key whose
/// last 8 bytes are the id. Panics if `key` is shorter than 8 bytes, which
/// would indicate corrupt store state rather than a caller error.
pub fn trailing_sctid(key: &[u8]) -> SctId {
    let start = key.len() - 8;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&key[start..]);
    SctId::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sctid_key_round_trips_ordering() {
        let low = sctid_key(138875005);
        let high = sctid_key(404684003);
        assert!(low < high);
    }

    #[test]
    fn pair_key_groups_by_leading_id() {
        let a = pair_key(404684003, 1);
        let b = pair_key(404684003, 2);
        let c = pair_key(405684003, 1);
        assert_eq!(&a[0..8], &b[0..8]);
        assert_ne!(&a[0..8], &c[0..8]);
    }

    #[test]
    fn map_target_prefix_is_a_prefix_of_the_full_key() {
        let full = map_target_key(999002271000000101, "G35X", 24700007);
        let prefix = map_target_prefix(999002271000000101, "G35X");
        assert!(full.starts_with(&prefix));
    }

    #[test]
    fn map_target_prefix_does_not_over_match_longer_targets() {
        let short_full = map_target_key(1, "G35", 1);
        let long_prefix = map_target_prefix(1, "G35X");
        assert!(!short_full.starts_with(&long_prefix));
    }

    #[test]
    fn trailing_sctid_recovers_the_last_eight_bytes() {
        let key = pair_key(1, 404684003);
        assert_eq!(trailing_sctid(&key), 404684003);
    }
}
