/*
 * Orchestrates a bundling run. `TreeBundler` validates the root, works out the
 * bundle units (one per top-level directory, or one per subdirectory for
 * directories marked for decomposition), assembles each unit's text through
 * the archiver and writes it to `{output_dir}/{name}.txt`.
 *
 * Only root-level problems are fatal: a missing root, an unlistable top level
 * or an output file that cannot be written. Unreadable or undecodable source
 * files end up as inline error markers inside their bundle.
 */
use super::archiver::create_bundle_content;
use super::config::BundlerConfig;
use super::file_system::{
    CoreFileSystemScanner, FileSystemError, FileSystemScannerOperations,
};
use super::models::{BundleOutcome, BundleUnit, EligibilityFilter, RunSummary};
use super::tokenizer_utils::{CoreTikTokenCounter, TokenCounterOperations};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum BundleError {
    Configuration(PathBuf),
    Scan(FileSystemError),
    Io(PathBuf, io::Error),
}

impl From<FileSystemError> for BundleError {
    fn from(err: FileSystemError) -> Self {
        BundleError::Scan(err)
    }
}

impl std::fmt::Display for BundleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundleError::Configuration(root) => {
                write!(f, "Bundle root not found or not a directory: {root:?}")
            }
            BundleError::Scan(e) => write!(f, "Failed to scan bundle root: {e}"),
            BundleError::Io(path, e) => write!(f, "Failed to write {path:?}: {e}"),
        }
    }
}

impl std::error::Error for BundleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BundleError::Configuration(_) => None,
            BundleError::Scan(e) => Some(e),
            BundleError::Io(_, e) => Some(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, BundleError>;

pub struct TreeBundler<'a> {
    config: &'a BundlerConfig,
    scanner: &'a dyn FileSystemScannerOperations,
    token_counter: &'a dyn TokenCounterOperations,
}

impl<'a> TreeBundler<'a> {
    pub fn new(
        config: &'a BundlerConfig,
        scanner: &'a dyn FileSystemScannerOperations,
        token_counter: &'a dyn TokenCounterOperations,
    ) -> Self {
        TreeBundler {
            config,
            scanner,
            token_counter,
        }
    }

    /*
     * Validates and canonicalizes the configured root. Fails with
     * `BundleError::Configuration` before anything is written.
     */
    pub fn resolve_root(&self) -> Result<PathBuf> {
        let root = &self.config.root;
        if !root.is_dir() {
            return Err(BundleError::Configuration(root.clone()));
        }
        fs::canonicalize(root).map_err(|_| BundleError::Configuration(root.clone()))
    }

    /*
     * Lists the bundle units below `root` in name order. A top-level directory
     * named by a decomposing rule yields one `{name}__{sub}` unit per
     * non-excluded subdirectory and no unit of its own.
     *
     * Only listing `root` itself is fatal. A decomposed directory that cannot
     * be listed is skipped with a warning. Unit names must be unique because
     * they name the output files; a later unit whose name was already planned
     * is skipped with a warning naming both directories.
     */
    pub fn plan_units(&self, root: &Path, filter: &EligibilityFilter) -> Result<Vec<BundleUnit>> {
        let decomposed = self.config.decomposed_names();
        let mut candidates = Vec::new();

        for child in self.scanner.list_subdirectories(root, filter)? {
            if decomposed.contains(&child.name) {
                log::debug!("TreeBundler: Decomposing '{}' into subdirectories.", child.name);
                let subdirs = match self.scanner.list_subdirectories(&child.path, filter) {
                    Ok(subdirs) => subdirs,
                    Err(e) => {
                        log::warn!(
                            "TreeBundler: Cannot list '{}', no bundles for it: {e}",
                            child.name
                        );
                        continue;
                    }
                };
                for sub in subdirs {
                    candidates.push(BundleUnit::decomposed(&child.name, &sub.name, sub.path));
                }
            } else {
                candidates.push(BundleUnit::new(child.name, child.path));
            }
        }

        let mut planned: HashMap<String, PathBuf> = HashMap::new();
        let mut units = Vec::with_capacity(candidates.len());
        for unit in candidates {
            if let Some(first) = planned.get(&unit.name) {
                log::warn!(
                    "TreeBundler: Bundle name '{}' is used by both {first:?} and {:?}, skipping the latter.",
                    unit.name,
                    unit.root
                );
                continue;
            }
            planned.insert(unit.name.clone(), unit.root.clone());
            units.push(unit);
        }
        Ok(units)
    }

    pub fn run(&self) -> Result<RunSummary> {
        let root = self.resolve_root()?;
        let output_dir = self.config.output_dir.clone();
        fs::create_dir_all(&output_dir).map_err(|e| BundleError::Io(output_dir.clone(), e))?;

        let filter = self.config.eligibility_filter();
        let units = self.plan_units(&root, &filter)?;
        log::info!(
            "TreeBundler: {} bundle units under {}.",
            units.len(),
            root.display()
        );

        let mut bundles = Vec::with_capacity(units.len());
        for unit in &units {
            let outcome = self.write_bundle(unit, &output_dir, &filter)?;
            log::info!("[OK] dumped {}", outcome.name);
            bundles.push(outcome);
        }

        let output_dir = fs::canonicalize(&output_dir).unwrap_or(output_dir);
        Ok(RunSummary {
            output_dir,
            bundles,
        })
    }

    fn write_bundle(
        &self,
        unit: &BundleUnit,
        output_dir: &Path,
        filter: &EligibilityFilter,
    ) -> Result<BundleOutcome> {
        let files = self.scanner.collect_eligible_files(&unit.root, filter);
        let content = create_bundle_content(
            unit,
            &files,
            &self.config.bundle_title,
            self.config.decode_policy,
        );

        let output_path = output_dir.join(unit.output_file_name());
        fs::write(&output_path, content.text.as_bytes())
            .map_err(|e| BundleError::Io(output_path.clone(), e))?;

        if content.files_failed > 0 {
            log::warn!(
                "TreeBundler: '{}' has {} of {} files recorded as errors.",
                unit.name,
                content.files_failed,
                content.files_included
            );
        }

        Ok(BundleOutcome {
            name: unit.name.clone(),
            output_path,
            files_included: content.files_included,
            files_failed: content.files_failed,
            token_estimate: self.token_counter.count_tokens(&content.text),
        })
    }
}

// Runs a bundling pass with the real file system scanner and tiktoken counts.
pub fn bundle(config: &BundlerConfig) -> Result<RunSummary> {
    let scanner = CoreFileSystemScanner::new();
    let token_counter = CoreTikTokenCounter::new();
    TreeBundler::new(config, &scanner, &token_counter).run()
}
