//! BCP-47 language-tag matching over the available language reference sets.
//!
//! RF2 does not itself carry a language-refset-to-BCP-47-tag mapping; that
//! association is realm configuration. This module holds the mapping as
//! data (a small built-in default plus room for callers to supply their
//! own) and the matcher that picks the best available refset for a ranked
//! list of caller preferences.

use snomed_types::SctId;

/// A language reference set together with the BCP-47 tag it realises.
#[derive(Debug, Clone, Copy)]
pub struct LanguageRefset {
    /// The BCP-47 language tag this reference set represents (e.g. `"en-US"`).
    pub tag: &'static str,
    /// The reference set's SCTID.
    pub refset_id: SctId,
}

/// The international-release language reference sets shipped with every
/// SNOMED CT edition.
pub const DEFAULT_LANGUAGE_REFSETS: &[LanguageRefset] = &[
    LanguageRefset {
        tag: "en-US",
        refset_id: 900000000000509007,
    },
    LanguageRefset {
        tag: "en-GB",
        refset_id: 900000000000508004,
    },
];

/// Picks the best-matching language reference set for a ranked list of
/// caller language preferences, per the rule: first by BCP-47 matcher, then
/// by refset-id order among equally good matches.
///
/// The matcher tries, in preference order: an exact (case-insensitive) tag
/// match, then falling back to a primary-subtag match (e.g. `"en"` matches
/// `"en-GB"`). `available` is searched in order, so the caller's ordering
/// of `available` breaks ties between equally good tag matches.
pub fn match_language_refset(
    preferences: &[String],
    available: &[LanguageRefset],
) -> Option<SctId> {
    for pref in preferences {
        if let Some(found) = available
            .iter()
            .find(|lr| lr.tag.eq_ignore_ascii_case(pref))
        {
            return Some(found.refset_id);
        }
    }

    for pref in preferences {
        let primary = pref.split('-').next().unwrap_or(pref);
        if let Some(found) = available.iter().find(|lr| {
            let lr_primary = lr.tag.split('-').next().unwrap_or(lr.tag);
            lr_primary.eq_ignore_ascii_case(primary)
        }) {
            return Some(found.refset_id);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_tag_match_wins() {
        let refset = match_language_refset(
            &["en-GB".to_string()],
            DEFAULT_LANGUAGE_REFSETS,
        );
        assert_eq!(refset, Some(900000000000508004));
    }

    #[test]
    fn primary_subtag_falls_back_when_no_exact_match() {
        let refset = match_language_refset(&["en".to_string()], DEFAULT_LANGUAGE_REFSETS);
        assert_eq!(refset, Some(900000000000509007));
    }

    #[test]
    fn unmatched_preference_yields_none() {
        let refset = match_language_refset(&["fr".to_string()], DEFAULT_LANGUAGE_REFSETS);
        assert_eq!(refset, None);
    }

    #[test]
    fn earlier_preference_takes_priority() {
        let refset = match_language_refset(
            &["en-GB".to_string(), "en-US".to_string()],
            DEFAULT_LANGUAGE_REFSETS,
        );
        assert_eq!(refset, Some(900000000000508004));
    }
}
