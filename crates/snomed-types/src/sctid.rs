//! SNOMED CT Identifier (SCTID) type, check-digit validation and partition
//! classification.
//!
//! SCTIDs are decimal strings of up to 18 digits: an item identifier,
//! followed by a two-digit partition identifier, followed by a single
//! Verhoeff check digit. This module provides the [`Verhoeff`] check-digit
//! algorithm and [`Partition`] classification used across the rest of the
//! workspace to validate identifiers read from RF2 files and from
//! compositional-grammar expressions.

use thiserror::Error;

/// A SNOMED CT identifier (SCTID).
///
/// SCTIDs are 64-bit unsigned integers that uniquely identify components
/// within SNOMED CT. They follow a specific structure with check digits.
///
/// # Examples
///
/// ```
/// use snomed_types::SctId;
///
/// let concept_id: SctId = 73211009; // Diabetes mellitus
/// let is_a_type: SctId = 116680003; // IS_A relationship type
/// ```
pub type SctId = u64;

/// The component kind encoded by an SCTID's partition identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Partition `00`/`10`: identifies a Concept.
    Concept,
    /// Partition `01`/`11`: identifies a Description.
    Description,
    /// Partition `02`/`12`: identifies a Relationship.
    Relationship,
}

/// Why an identifier string failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SctIdError {
    /// The string contained non-digit characters or was too short.
    #[error("'{0}' is not a valid SCTID: not numeric or too short")]
    NotNumeric(String),

    /// The Verhoeff check digit did not match the rest of the identifier.
    #[error("'{0}' failed the Verhoeff checksum")]
    ChecksumFailed(String),

    /// The two-digit partition identifier is not one SNOMED CT defines.
    #[error("'{0}' has an unrecognized partition identifier")]
    UnknownPartition(String),
}

/// Parses and validates an SCTID string, returning the numeric identifier.
///
/// Validates both the Verhoeff check digit and that the partition
/// identifier is one of the six SNOMED CT defines.
///
/// # Examples
///
/// ```
/// use snomed_types::sctid;
///
/// assert!(sctid::parse("24700007").is_ok());
/// assert!(sctid::parse("24700001").is_err());
/// ```
pub fn parse(value: &str) -> Result<SctId, SctIdError> {
    validate(value)?;
    value
        .parse::<SctId>()
        .map_err(|_| SctIdError::NotNumeric(value.to_string()))
}

/// Validates an SCTID string without returning the parsed value.
pub fn validate(value: &str) -> Result<(), SctIdError> {
    if value.len() < 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SctIdError::NotNumeric(value.to_string()));
    }

    if !verhoeff::is_valid(value) {
        return Err(SctIdError::ChecksumFailed(value.to_string()));
    }

    partition(value)?;
    Ok(())
}

/// Classifies the partition identifier of an SCTID string.
///
/// The partition identifier is the two digits preceding the trailing check
/// digit: `00`/`10` for concepts, `01`/`11` for descriptions, `02`/`12` for
/// relationships. This does not itself verify the check digit; call
/// [`validate`] first if that matters.
pub fn partition(value: &str) -> Result<Partition, SctIdError> {
    if value.len() < 3 {
        return Err(SctIdError::NotNumeric(value.to_string()));
    }
    let len = value.len();
    let partition_id = &value[len - 3..len - 1];
    match partition_id {
        "00" | "10" => Ok(Partition::Concept),
        "01" | "11" => Ok(Partition::Description),
        "02" | "12" => Ok(Partition::Relationship),
        _ => Err(SctIdError::UnknownPartition(value.to_string())),
    }
}

/// The Verhoeff check-digit algorithm, used by SNOMED CT identifiers.
///
/// See <https://en.wikipedia.org/wiki/Verhoeff_algorithm>. The dihedral
/// group D5 multiplication/permutation/inverse tables below are the
/// standard fixed tables for the algorithm; they are not SNOMED-specific.
mod verhoeff {
    const MULTIPLICATION: [[u8; 10]; 10] = [
        [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
        [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
        [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
        [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
        [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
        [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
        [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
        [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
        [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
        [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
    ];

    const PERMUTATION: [[u8; 10]; 8] = [
        [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
        [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
        [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
        [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
        [9, 4, 5, 3, 1, 2, 6, 8, 7, 0],
        [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
        [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
        [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
    ];

    /// Returns true if `digits` (the full identifier, check digit last)
    /// satisfies the Verhoeff checksum.
    pub fn is_valid(digits: &str) -> bool {
        let mut c: u8 = 0;
        for (i, ch) in digits.bytes().rev().enumerate() {
            let digit = (ch - b'0') as usize;
            c = MULTIPLICATION[c as usize][PERMUTATION[i % 8][digit] as usize];
        }
        c == 0
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_concept_ids() {
        assert!(parse("24700007").is_ok());
        assert_eq!(partition("24700007").unwrap(), Partition::Concept);
        assert!(parse("1234567890").is_ok());
        assert!(parse("14567894").is_ok());
    }

    #[test]
    fn invalid_checksum_rejected() {
        assert!(matches!(
            parse("1234567892"),
            Err(SctIdError::ChecksumFailed(_))
        ));
        assert!(matches!(
            parse("14567895"),
            Err(SctIdError::ChecksumFailed(_))
        ));
        assert!(matches!(
            parse("24700001"),
            Err(SctIdError::ChecksumFailed(_))
        ));
    }

    #[test]
    fn valid_description_and_relationship_ids() {
        assert_eq!(
            partition("724699017").unwrap(),
            Partition::Description
        );
        assert!(parse("724699017").is_ok());

        assert_eq!(partition("1399025").unwrap(), Partition::Relationship);
        assert!(parse("1399025").is_ok());
    }

    #[test]
    fn non_numeric_rejected() {
        assert!(matches!(parse("abc"), Err(SctIdError::NotNumeric(_))));
        assert!(matches!(parse(""), Err(SctIdError::NotNumeric(_))));
    }

    #[test]
    fn unknown_partition_rejected() {
        // "99" is not a defined partition-id.
        assert!(matches!(
            partition("1239902"),
            Err(SctIdError::UnknownPartition(_)) | Err(SctIdError::NotNumeric(_))
        ));
    }
}
