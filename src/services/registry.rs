use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Destination subtree a file lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Jpg,
    Pdf,
    Png,
    Others,
}

impl StorageClass {
    pub fn dir_name(&self) -> &'static str {
        match self {
            StorageClass::Jpg => "jpg",
            StorageClass::Pdf => "pdf",
            StorageClass::Png => "png",
            StorageClass::Others => "others",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Maps a bare filename to `<root>/<class dir>/<filename>`.
///
/// Strategies hold no mutable state, so the same filename always resolves to
/// the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStrategy {
    class: StorageClass,
    root: PathBuf,
}

impl StorageStrategy {
    pub fn new(class: StorageClass, media_root: impl AsRef<Path>) -> Self {
        Self {
            class,
            root: media_root.as_ref().join(class.dir_name()),
        }
    }

    pub fn class(&self) -> StorageClass {
        self.class
    }

    /// Subtree root this strategy writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn destination(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}

/// Extension-keyed strategy table, built once at startup and shared
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct StorageRegistry {
    strategies: HashMap<String, StorageStrategy>,
    default: StorageStrategy,
}

impl StorageRegistry {
    pub fn new(default: StorageStrategy) -> Self {
        Self {
            strategies: HashMap::new(),
            default,
        }
    }

    /// `.jpg`/`.jpeg` → jpg, `.pdf` → pdf, `.png` → png, anything else → others.
    pub fn standard(media_root: impl AsRef<Path>) -> Self {
        let root = media_root.as_ref();
        let mut registry = Self::new(StorageStrategy::new(StorageClass::Others, root));
        registry.register(".jpg", StorageStrategy::new(StorageClass::Jpg, root));
        registry.register(".jpeg", StorageStrategy::new(StorageClass::Jpg, root));
        registry.register(".pdf", StorageStrategy::new(StorageClass::Pdf, root));
        registry.register(".png", StorageStrategy::new(StorageClass::Png, root));
        registry
    }

    /// Registers (or replaces) the strategy for `key`. The key is normalized
    /// the same way [`classification_key`] produces keys.
    pub fn register(&mut self, key: &str, strategy: StorageStrategy) {
        self.strategies.insert(normalize_key(key), strategy);
    }

    /// Exact lookup; unknown or empty keys get the default strategy.
    pub fn resolve(&self, key: &str) -> &StorageStrategy {
        self.strategies.get(key).unwrap_or(&self.default)
    }

    /// Distinct subtree roots, default included.
    pub fn roots(&self) -> Vec<&Path> {
        let mut roots: Vec<&Path> = self.strategies.values().map(|s| s.root()).collect();
        roots.push(self.default.root());
        roots.sort();
        roots.dedup();
        roots
    }
}

/// Lower-cases `key` and ensures a leading dot, so "JPG", ".jpg" and "jpg"
/// all register the same entry.
pub fn normalize_key(key: &str) -> String {
    let key = key.trim().to_lowercase();
    if key.is_empty() || key.starts_with('.') {
        key
    } else {
        format!(".{}", key)
    }
}

/// Lower-cased extension of `filename` including the dot, or "" when there
/// is none.
///
/// Only the last suffix counts (`a.tar.gz` → `.gz`) and leading dots do not
/// start an extension (`.bashrc` → "").
pub fn classification_key(filename: &str) -> String {
    let stem_start = filename.len() - filename.trim_start_matches('.').len();
    match filename[stem_start..].rfind('.') {
        Some(dot) => filename[stem_start + dot..].to_lowercase(),
        None => String::new(),
    }
}
