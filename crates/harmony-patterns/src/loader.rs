//! Loading a `PatternCatalogue` from a directory of `<family>/<id>.json`
//! pattern files, with schema and duplicate-id validation (§4.4).

use crate::error::{PatternError, PatternResult};
use crate::pattern::Pattern;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The loaded, validated set of patterns the matcher runs against.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalogue {
    patterns: HashMap<String, Pattern>,
    sources: HashMap<String, PathBuf>,
}

impl PatternCatalogue {
    /// An empty catalogue, useful for incremental/test construction.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert a single already-parsed pattern, checking for duplicate ids.
    pub fn insert(&mut self, pattern: Pattern, source: PathBuf) -> PatternResult<()> {
        pattern
            .validate()
            .map_err(|reason| PatternError::SchemaViolation {
                path: source.clone(),
                reason,
            })?;

        if let Some(existing_source) = self.sources.get(&pattern.id) {
            return Err(PatternError::DuplicateId {
                id: pattern.id,
                first_path: existing_source.clone(),
                second_path: source,
            });
        }

        self.sources.insert(pattern.id.clone(), source);
        self.patterns.insert(pattern.id.clone(), pattern);
        Ok(())
    }

    /// Load every `*.json` pattern file under `root`, recursively, enforcing
    /// the `<family>/<id>.json` path-naming convention and rejecting
    /// duplicate ids and catalogues over `max_patterns`.
    pub fn load(root: &Path, max_patterns: u32) -> PatternResult<Self> {
        let mut catalogue = Self::empty();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let entries = std::fs::read_dir(&dir).map_err(|e| PatternError::Io(e.to_string()))?;
            for entry in entries {
                let entry = entry.map_err(|e| PatternError::Io(e.to_string()))?;
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                catalogue.load_file(&path)?;
            }
        }

        if catalogue.patterns.len() > max_patterns as usize {
            return Err(PatternError::CatalogueTooLarge {
                max: max_patterns,
                actual: catalogue.patterns.len(),
            });
        }

        info!("loaded {} patterns from {}", catalogue.patterns.len(), root.display());
        Ok(catalogue)
    }

    fn load_file(&mut self, path: &Path) -> PatternResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| PatternError::Io(e.to_string()))?;
        let pattern: Pattern =
            serde_json::from_str(&contents).map_err(|e| PatternError::MalformedJson {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let family_dir = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str());
        if let Some(dir_name) = family_dir {
            if dir_name != pattern.family {
                warn!(
                    "{}: directory '{}' does not match declared family '{}'",
                    path.display(),
                    dir_name,
                    pattern.family
                );
                return Err(PatternError::PathNamingMismatch {
                    path: path.to_path_buf(),
                    family: pattern.family.clone(),
                });
            }
        }

        debug!("loaded pattern '{}' from {}", pattern.id, path.display());
        self.insert(pattern, path.to_path_buf())
    }

    /// Iterate over all patterns in the catalogue.
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.values()
    }

    /// Number of patterns currently loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the catalogue holds no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Look up a pattern by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns.get(id)
    }

    /// All patterns whose `window_length()` does not exceed `max_len`.
    pub fn within_window(&self, max_len: usize) -> impl Iterator<Item = &Pattern> {
        self.patterns.values().filter(move |p| p.window_length() <= max_len)
    }
}
