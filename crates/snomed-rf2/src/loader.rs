//! RF2 file discovery, classification, and loading utilities.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::types::{Rf2Error, Rf2Files, Rf2Result};

/// The eleven RF2 file kinds this workspace classifies by filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rf2FileKind {
    /// `sct2_Concept_*`.
    Concept,
    /// `sct2_Description_*` / `sct2_TextDefinition_*`.
    Description,
    /// `sct2_Relationship_*` / `sct2_StatedRelationship_*`.
    Relationship,
    /// `der2_cciRefset_RefsetDescriptor*`.
    RefsetDescriptor,
    /// `der2_cRefset_Language*`.
    LanguageRefset,
    /// `der2_Refset_Simple*`.
    SimpleRefset,
    /// `der2_sRefset_SimpleMap*` / `der2_iRefset_SimpleMap*`.
    SimpleMap,
    /// `der2_iissscRefset_ExtendedMap*` / `der2_iissscRefset_Extended*`.
    ExtendedMap,
    /// `der2_iisssccRefset_ComplexMap*` / `der2_cRefset_ComplexMap*`.
    ComplexMap,
    /// `der2_cRefset_AttributeValue*`.
    AttributeValue,
    /// `der2_cRefset_Association*`.
    Association,
}

/// `(regex, kind)` classification table for the eleven supported RF2 file
/// kinds, matched against a file's base name (without directory or `.txt`
/// extension is not stripped; the patterns anchor on the leading prefix).
pub fn rf2_file_kinds() -> &'static [(Regex, Rf2FileKind)] {
    static TABLE: OnceLock<Vec<(Regex, Rf2FileKind)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            (Regex::new(r"^sct2_Concept_").unwrap(), Rf2FileKind::Concept),
            (
                Regex::new(r"^sct2_(Description|TextDefinition)_").unwrap(),
                Rf2FileKind::Description,
            ),
            (
                Regex::new(r"^sct2_(Stated)?Relationship_").unwrap(),
                Rf2FileKind::Relationship,
            ),
            (
                Regex::new(r"^der2_cciRefset_RefsetDescriptor").unwrap(),
                Rf2FileKind::RefsetDescriptor,
            ),
            (
                Regex::new(r"^der2_cRefset_Language").unwrap(),
                Rf2FileKind::LanguageRefset,
            ),
            (
                Regex::new(r"^der2_Refset_Simple").unwrap(),
                Rf2FileKind::SimpleRefset,
            ),
            (
                Regex::new(r"^der2_[si]Refset_SimpleMap").unwrap(),
                Rf2FileKind::SimpleMap,
            ),
            (
                Regex::new(r"^der2_iissscRefset_ExtendedMap").unwrap(),
                Rf2FileKind::ExtendedMap,
            ),
            (
                Regex::new(r"^der2_(iisssc|c)Refset_ComplexMap").unwrap(),
                Rf2FileKind::ComplexMap,
            ),
            (
                Regex::new(r"^der2_cRefset_AttributeValue").unwrap(),
                Rf2FileKind::AttributeValue,
            ),
            (
                Regex::new(r"^der2_cRefset_Association").unwrap(),
                Rf2FileKind::Association,
            ),
        ]
    })
}

/// Classifies a base filename (e.g. `sct2_Concept_Snapshot_INT_20250101.txt`)
/// into one of the eleven known RF2 file kinds, or `None` if it matches
/// none of them.
pub fn classify_filename(name: &str) -> Option<Rf2FileKind> {
    rf2_file_kinds()
        .iter()
        .find(|(re, _)| re.is_match(name))
        .map(|(_, kind)| *kind)
}

/// Discovers RF2 files in a SNOMED CT release directory.
///
/// Searches for the Snapshot/Terminology and Snapshot/Refset directories
/// and classifies every `.txt` file found by filename via
/// [`classify_filename`].
pub fn discover_rf2_files<P: AsRef<Path>>(path: P) -> Rf2Result<Rf2Files> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Rf2Error::DirectoryNotFound {
            path: path.display().to_string(),
        });
    }

    let terminology_dir = find_terminology_dir(path)?;
    let mut files = Rf2Files::new();

    classify_directory(&terminology_dir, &mut files)?;

    if let Some(snapshot_dir) = terminology_dir.parent() {
        let refset_dir = snapshot_dir.join("Refset");
        if refset_dir.exists() {
            for entry in walk_txt_files(&refset_dir)? {
                classify_one(&entry, &mut files);
            }
        }
    }

    if !files.has_required_files() {
        let missing = files.missing_files();
        return Err(Rf2Error::RequiredFileMissing {
            file_type: missing.join(", "),
            directory: terminology_dir.display().to_string(),
        });
    }

    Ok(files)
}

fn classify_directory(dir: &Path, files: &mut Rf2Files) -> Rf2Result<()> {
    for entry in walk_txt_files(dir)? {
        classify_one(&entry, files);
    }
    Ok(())
}

fn walk_txt_files(dir: &Path) -> Rf2Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            out.extend(walk_txt_files(&entry.path())?);
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(".txt") {
            out.push(entry.path());
        }
    }
    Ok(out)
}

fn classify_one(path: &Path, files: &mut Rf2Files) {
    let filename = match path.file_name() {
        Some(f) => f.to_string_lossy().into_owned(),
        None => return,
    };

    let Some(kind) = classify_filename(&filename) else {
        return;
    };

    match kind {
        Rf2FileKind::Concept => {
            files.concept_file = Some(path.to_path_buf());
            if let Some(date) = extract_release_date(&filename) {
                files.release_date = Some(date);
            }
        }
        Rf2FileKind::Description => {
            if filename.starts_with("sct2_TextDefinition_") {
                files.text_definition_file = Some(path.to_path_buf());
            } else {
                files.description_file = Some(path.to_path_buf());
            }
        }
        Rf2FileKind::Relationship => {
            if filename.starts_with("sct2_StatedRelationship_") {
                files.stated_relationship_file = Some(path.to_path_buf());
            } else {
                files.relationship_file = Some(path.to_path_buf());
            }
        }
        Rf2FileKind::RefsetDescriptor => files.refset_descriptor_files.push(path.to_path_buf()),
        Rf2FileKind::LanguageRefset => files.language_refset_files.push(path.to_path_buf()),
        Rf2FileKind::SimpleRefset => files.simple_refset_files.push(path.to_path_buf()),
        Rf2FileKind::SimpleMap => files.simple_map_refset_files.push(path.to_path_buf()),
        Rf2FileKind::ExtendedMap => files.extended_map_refset_files.push(path.to_path_buf()),
        Rf2FileKind::ComplexMap => files.complex_map_refset_files.push(path.to_path_buf()),
        Rf2FileKind::AttributeValue => files.attribute_value_refset_files.push(path.to_path_buf()),
        Rf2FileKind::Association => files.association_refset_files.push(path.to_path_buf()),
    }
}

/// Finds the Terminology directory within an RF2 release structure.
fn find_terminology_dir(base: &Path) -> Rf2Result<PathBuf> {
    if base.ends_with("Terminology") && base.is_dir() {
        return Ok(base.to_path_buf());
    }

    let snapshot_term = base.join("Snapshot").join("Terminology");
    if snapshot_term.exists() {
        return Ok(snapshot_term);
    }

    let term = base.join("Terminology");
    if term.exists() {
        return Ok(term);
    }

    for entry in fs::read_dir(base)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            let subdir = entry.path();

            let sub_snapshot_term = subdir.join("Snapshot").join("Terminology");
            if sub_snapshot_term.exists() {
                return Ok(sub_snapshot_term);
            }

            let sub_term = subdir.join("Terminology");
            if sub_term.exists() {
                return Ok(sub_term);
            }
        }
    }

    Err(Rf2Error::DirectoryNotFound {
        path: format!("Terminology directory not found in {}", base.display()),
    })
}

/// Extracts release date from RF2 filename.
///
/// RF2 files have names like `sct2_Concept_Snapshot_INT_20251201.txt`
fn extract_release_date(filename: &str) -> Option<String> {
    let without_ext = filename.trim_end_matches(".txt");
    let parts: Vec<&str> = without_ext.split('_').collect();

    if let Some(&last) = parts.last() {
        if last.len() == 8 && last.chars().all(|c| c.is_ascii_digit()) {
            return Some(last.to_string());
        }
    }

    None
}

/// Formats a byte count as a human-readable string.
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    const GB: usize = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_release_date() {
        assert_eq!(
            extract_release_date("sct2_Concept_Snapshot_INT_20251201.txt"),
            Some("20251201".to_string())
        );
        assert_eq!(
            extract_release_date("sct2_Description_Snapshot-en_INT_20251201.txt"),
            Some("20251201".to_string())
        );
        assert_eq!(extract_release_date("invalid_filename.txt"), None);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500 bytes");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GB");
    }

    #[test]
    fn test_classify_filename_covers_all_eleven_kinds() {
        assert_eq!(
            classify_filename("sct2_Concept_Snapshot_INT_20250101.txt"),
            Some(Rf2FileKind::Concept)
        );
        assert_eq!(
            classify_filename("sct2_Description_Snapshot-en_INT_20250101.txt"),
            Some(Rf2FileKind::Description)
        );
        assert_eq!(
            classify_filename("sct2_TextDefinition_Snapshot-en_INT_20250101.txt"),
            Some(Rf2FileKind::Description)
        );
        assert_eq!(
            classify_filename("sct2_Relationship_Snapshot_INT_20250101.txt"),
            Some(Rf2FileKind::Relationship)
        );
        assert_eq!(
            classify_filename("sct2_StatedRelationship_Snapshot_INT_20250101.txt"),
            Some(Rf2FileKind::Relationship)
        );
        assert_eq!(
            classify_filename("der2_cciRefset_RefsetDescriptorSnapshot_INT_20250101.txt"),
            Some(Rf2FileKind::RefsetDescriptor)
        );
        assert_eq!(
            classify_filename("der2_cRefset_LanguageSnapshot-en_INT_20250101.txt"),
            Some(Rf2FileKind::LanguageRefset)
        );
        assert_eq!(
            classify_filename("der2_Refset_SimpleSnapshot_INT_20250101.txt"),
            Some(Rf2FileKind::SimpleRefset)
        );
        assert_eq!(
            classify_filename("der2_sRefset_SimpleMapSnapshot_INT_20250101.txt"),
            Some(Rf2FileKind::SimpleMap)
        );
        assert_eq!(
            classify_filename("der2_iissscRefset_ExtendedMapSnapshot_INT_20250101.txt"),
            Some(Rf2FileKind::ExtendedMap)
        );
        assert_eq!(
            classify_filename("der2_iisssccRefset_ComplexMapSnapshot_INT_20250101.txt"),
            Some(Rf2FileKind::ComplexMap)
        );
        assert_eq!(
            classify_filename("der2_cRefset_AttributeValueSnapshot_INT_20250101.txt"),
            Some(Rf2FileKind::AttributeValue)
        );
        assert_eq!(
            classify_filename("der2_cRefset_AssociationSnapshot_INT_20250101.txt"),
            Some(Rf2FileKind::Association)
        );
        assert_eq!(classify_filename("readme.txt"), None);
    }
}
