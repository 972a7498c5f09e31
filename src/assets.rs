// ABOUTME: Asset resolution and caching for project-relative references
// ABOUTME: Turns safe relative paths into embeddable data URIs, reusing cached payloads

use base64::Engine;
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::paths;
use crate::project::ProjectHandle;

/// File access seam for the resolver. Production reads from disk; tests
/// substitute a counting stub to observe cache behavior.
pub trait AssetReader: Send + Sync {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Default reader backed by the filesystem.
pub struct FsAssetReader;

impl AssetReader for FsAssetReader {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// MIME type for an asset path, by extension.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Process-wide asset cache plus resolver.
///
/// Constructed once by the application context and passed by reference into
/// the preview pipeline. Entries are keyed by `project::relative` and are
/// immutable for the life of the process: content is assumed static for the
/// session and is never evicted or re-checked against disk.
pub struct AssetCache {
    reader: Box<dyn AssetReader>,
    entries: Mutex<HashMap<String, String>>,
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetCache {
    pub fn new() -> Self {
        Self::with_reader(Box::new(FsAssetReader))
    }

    pub fn with_reader(reader: Box<dyn AssetReader>) -> Self {
        Self {
            reader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached payloads.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Resolve a raw asset reference to a loadable source string.
    ///
    /// External, unsafe, or unreadable references come back as the original
    /// string unchanged, so broken links render as-is instead of failing the
    /// whole pass. Successful reads are embedded as data URIs and cached.
    pub fn resolve(&self, project: &ProjectHandle, raw: &str) -> String {
        let Some(relative) = paths::sanitize(raw) else {
            return raw.to_string();
        };

        let key = format!("{}::{}", project.path.display(), relative);
        if let Some(cached) = self.entries.lock().get(&key) {
            debug!("Asset cache hit: {}", key);
            return cached.clone();
        }

        let Some(resolved) = paths::resolve_relative_path(&project.path, &relative) else {
            return raw.to_string();
        };

        let bytes = match self.reader.read(&resolved) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read asset {:?}: {}", resolved, e);
                return raw.to_string();
            }
        };

        let mime_type = mime_type_for_path(&resolved);
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let payload = format!("data:{};base64,{}", mime_type, encoded);

        // Two threads racing on the same key write identical payloads; the
        // first insert wins and the duplicate is dropped.
        self.entries
            .lock()
            .entry(key)
            .or_insert_with(|| payload.clone());
        payload
    }
}
