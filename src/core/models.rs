use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/*
 * A declarative rule for a top-level directory of the bundling root.
 * Directories whose rule has `decompose` set are split into one bundle per
 * immediate subdirectory instead of being bundled whole.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRule {
    pub name: String,
    #[serde(default)]
    pub decompose: bool,
}

impl DirectoryRule {
    pub fn decompose(name: &str) -> Self {
        DirectoryRule {
            name: name.to_string(),
            decompose: true,
        }
    }
}

/*
 * How file bytes are turned into bundle text. `Strict` records invalid UTF-8
 * as an inline error, `Lossy` substitutes U+FFFD for invalid sequences.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    #[default]
    Strict,
    Lossy,
}

// A directory whose recursive contents end up in one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleUnit {
    pub name: String,
    pub root: PathBuf,
}

impl BundleUnit {
    pub fn new(name: String, root: PathBuf) -> Self {
        BundleUnit { name, root }
    }

    // Unit produced by decomposing a special top-level directory.
    pub fn decomposed(parent_name: &str, sub_name: &str, root: PathBuf) -> Self {
        BundleUnit {
            name: format!("{parent_name}__{sub_name}"),
            root,
        }
    }

    pub fn output_file_name(&self) -> String {
        format!("{}.txt", self.name)
    }
}

/*
 * The include-by-suffix and exclude-by-directory-name rules that decide which
 * files make it into a bundle. Extensions are stored lower-cased and
 * dot-prefixed (".ts").
 */
#[derive(Debug, Clone, Default)]
pub struct EligibilityFilter {
    include_extensions: HashSet<String>,
    exclude_dir_names: HashSet<String>,
}

impl EligibilityFilter {
    pub fn new<I, J, S, T>(include_extensions: I, exclude_dir_names: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: Into<String>,
    {
        EligibilityFilter {
            include_extensions: include_extensions
                .into_iter()
                .filter_map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
            exclude_dir_names: exclude_dir_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded_dir_name(&self, name: &str) -> bool {
        self.exclude_dir_names.contains(name)
    }

    /*
     * Checks the lower-cased suffix of the file name against the include set.
     * The suffix is the part after the last dot; dotfiles such as `.eslintrc`
     * and names without a dot have no suffix and are never included.
     */
    pub fn is_included_file(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if !ext.is_empty() => self
                .include_extensions
                .contains(&format!(".{}", ext.to_lowercase())),
            _ => false,
        }
    }
}

/*
 * Accepts "ts", ".ts" or ".TS" and returns ".ts". Blank entries are dropped.
 */
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(format!(".{}", trimmed.to_lowercase()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOutcome {
    pub name: String,
    pub output_path: PathBuf,
    pub files_included: usize,
    pub files_failed: usize,
    pub token_estimate: usize,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub bundles: Vec<BundleOutcome>,
}

impl RunSummary {
    pub fn total_files(&self) -> usize {
        self.bundles.iter().map(|b| b.files_included).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.bundles.iter().map(|b| b.files_failed).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decomposed_unit_name() {
        let unit = BundleUnit::decomposed("features", "videos", PathBuf::from("/r/features/videos"));
        assert_eq!(unit.name, "features__videos");
        assert_eq!(unit.output_file_name(), "features__videos.txt");
    }

    #[test]
    fn test_normalize_extension_variants() {
        assert_eq!(normalize_extension("ts"), Some(".ts".to_string()));
        assert_eq!(normalize_extension(".TSX"), Some(".tsx".to_string()));
        assert_eq!(normalize_extension("  .Json "), Some(".json".to_string()));
        assert_eq!(normalize_extension(""), None);
        assert_eq!(normalize_extension("."), None);
    }

    #[test]
    fn test_filter_matches_suffix_case_insensitively() {
        let filter = EligibilityFilter::new([".ts", ".json"], ["node_modules"]);
        assert!(filter.is_included_file(Path::new("a/b/App.ts")));
        assert!(filter.is_included_file(Path::new("PACKAGE.JSON")));
        assert!(filter.is_included_file(Path::new("types.d.ts")));
        assert!(!filter.is_included_file(Path::new("main.rs")));
        assert!(!filter.is_included_file(Path::new("Makefile")));
    }

    #[test]
    fn test_filter_ignores_dotfiles_without_suffix() {
        let filter = EligibilityFilter::new([".env", ".ts"], Vec::<String>::new());
        // ".env" is a stem, not a suffix.
        assert!(!filter.is_included_file(Path::new(".env")));
        assert!(filter.is_included_file(Path::new(".hidden.ts")));
    }

    #[test]
    fn test_filter_excluded_dir_names_are_exact() {
        let filter = EligibilityFilter::new(Vec::<String>::new(), ["dist", ".git"]);
        assert!(filter.is_excluded_dir_name("dist"));
        assert!(filter.is_excluded_dir_name(".git"));
        assert!(!filter.is_excluded_dir_name("distribution"));
        assert!(!filter.is_excluded_dir_name("Dist"));
    }

    #[test]
    fn test_run_summary_totals() {
        let outcome = |name: &str, ok, failed| BundleOutcome {
            name: name.to_string(),
            output_path: PathBuf::from(format!("{name}.txt")),
            files_included: ok,
            files_failed: failed,
            token_estimate: 0,
        };
        let summary = RunSummary {
            output_dir: PathBuf::from("out"),
            bundles: vec![outcome("a", 3, 1), outcome("b", 2, 0)],
        };
        assert_eq!(summary.total_files(), 5);
        assert_eq!(summary.total_failed(), 1);
    }
}
