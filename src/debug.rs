use std::path::{Path, PathBuf};

use anyhow::Result;
use image::DynamicImage;

/// Receives intermediate bitmaps. Must never influence the scan result.
pub trait DebugSink {
    /// Offer an intermediate image under a `/`-separated label
    fn record(&self, label: &str, image: &DynamicImage);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DebugSink for NoopSink {
    fn record(&self, _label: &str, _image: &DynamicImage) {}
}

/// Prefixes every label with `prefix/` before passing it on
pub struct Scoped<'a> {
    inner: &'a dyn DebugSink,
    prefix: String,
}

impl<'a> Scoped<'a> {
    pub fn new(inner: &'a dyn DebugSink, prefix: impl Into<String>) -> Self {
        Self { inner, prefix: prefix.into() }
    }
}

impl DebugSink for Scoped<'_> {
    fn record(&self, label: &str, image: &DynamicImage) {
        self.inner.record(&format!("{}/{}", self.prefix, label), image);
    }
}

/// Writes `<root>/<label>.png`
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// The directory must be empty or non-existent
    pub fn new(root: PathBuf) -> Result<Self> {
        if root.exists() {
            let entries = std::fs::read_dir(&root)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!("Debug directory is not empty: {}", root.display()));
            }
        } else {
            std::fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn save(&self, label: &str, image: &DynamicImage) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for part in label.split('/').filter(|p| !p.is_empty()) {
            path.push(part.to_lowercase().replace(' ', "_"));
        }
        path.set_extension("png");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        image
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
        Ok(path)
    }
}

impl DebugSink for DirectorySink {
    fn record(&self, label: &str, image: &DynamicImage) {
        match self.save(label, image) {
            Ok(path) => tracing::debug!("saved {}", path.display()),
            Err(e) => tracing::warn!("debug image {label} not saved: {e:#}"),
        }
    }
}
