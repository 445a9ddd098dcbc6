// src/core/archiver.rs

use super::models::{BundleUnit, DecodePolicy};
use crate::core::path_utils::relative_forward_slash;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const HEADER_RULE_WIDTH: usize = 100;
const FILE_RULE_WIDTH: usize = 90;
const UTF8_BOM: char = '\u{feff}';

/*
 * Why a file's content could not be placed in a bundle. Both variants are
 * recorded inline in the bundle text; neither aborts the bundle.
 */
#[derive(Debug)]
pub enum FileReadError {
    Io(io::Error),
    Decode(std::string::FromUtf8Error),
}

impl fmt::Display for FileReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileReadError::Io(e) => write!(f, "{e}"),
            FileReadError::Decode(e) => write!(f, "invalid UTF-8: {e}"),
        }
    }
}

impl std::error::Error for FileReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileReadError::Io(e) => Some(e),
            FileReadError::Decode(e) => Some(e),
        }
    }
}

// The assembled text of one bundle plus how many sections it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleContent {
    pub text: String,
    pub files_included: usize,
    pub files_failed: usize,
}

// Reads a file and decodes it according to `policy`, dropping a leading BOM.
pub fn read_file_text(path: &Path, policy: DecodePolicy) -> Result<String, FileReadError> {
    let bytes = fs::read(path).map_err(FileReadError::Io)?;
    let text = match policy {
        DecodePolicy::Strict => String::from_utf8(bytes).map_err(FileReadError::Decode)?,
        DecodePolicy::Lossy => String::from_utf8_lossy(&bytes).into_owned(),
    };
    Ok(match text.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/*
 * Creates the text of one bundle from the unit's files.
 *
 * The bundle starts with a header naming the unit and its root path. Each file
 * in `files` (in the given order) then gets a section: a blank line and a rule
 * of `=`, `# FILE: relative/path` (forward slashes, relative to the unit root),
 * another rule, the file's text with trailing whitespace trimmed (or
 * `# [ERROR] reason` when it cannot be read or decoded), and a blank line.
 *
 * Lines are joined with `\n`. A failed file is counted in `files_failed` and
 * processing carries on with the next one.
 */
pub fn create_bundle_content(
    unit: &BundleUnit,
    files: &[PathBuf],
    title: &str,
    policy: DecodePolicy,
) -> BundleContent {
    let header_rule = "=".repeat(HEADER_RULE_WIDTH);
    let file_rule = "=".repeat(FILE_RULE_WIDTH);

    let mut lines: Vec<String> = vec![
        header_rule.clone(),
        format!("# {title}: {}", unit.name),
        format!("# ROOT PATH: {}", unit.root.display()),
        header_rule,
        String::new(),
    ];

    let mut files_failed = 0;
    for path in files {
        let display_path = relative_forward_slash(path, &unit.root)
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        lines.push(format!("\n{file_rule}"));
        lines.push(format!("# FILE: {display_path}"));
        lines.push(file_rule.clone());

        match read_file_text(path, policy) {
            Ok(content) => lines.push(content.trim_end().to_string()),
            Err(e) => {
                log::warn!("Archiver: Could not include {path:?} in '{}': {e}", unit.name);
                files_failed += 1;
                lines.push(format!("# [ERROR] {e}"));
            }
        }

        lines.push(String::new());
    }

    BundleContent {
        text: lines.join("\n"),
        files_included: files.len(),
        files_failed,
    }
}
