use std::path::{Path, PathBuf};

/// File extensions the renderer can decode, lower case.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "gif", "webp"];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Replace characters that are invalid in file names on any supported
/// platform with underscores.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect()
}

/// Local library of imported overlay images.
pub struct MediaGallery {
    dir: PathBuf,
}

impl MediaGallery {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Library under the user's home directory, created on first use.
    pub fn default_location() -> anyhow::Result<Self> {
        let home = dirs_next::home_dir()
            .ok_or_else(|| anyhow::anyhow!("could not determine home directory"))?;
        Ok(Self::new(home.join(".any_overlay_overlays")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All supported media in the library, sorted by file name.
    pub fn list(&self) -> anyhow::Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_supported(path))
            .collect();
        entries.sort();
        Ok(entries)
    }

    /// Copy `source` into the library under a sanitized, collision-free
    /// name and return the new path.
    pub fn import(&self, source: &Path) -> anyhow::Result<PathBuf> {
        if !is_supported(source) {
            anyhow::bail!("unsupported media type: {}", source.display());
        }
        std::fs::create_dir_all(&self.dir)?;

        let file_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("source has no usable file name"))?;
        let sanitized = sanitize_file_name(file_name);
        let target = self.unique_target(&sanitized);

        std::fs::copy(source, &target)?;
        tracing::info!("imported {} as {}", source.display(), target.display());
        Ok(target)
    }

    /// Remove a library entry. Paths outside the library are refused.
    pub fn delete(&self, path: &Path) -> anyhow::Result<()> {
        if path.parent() != Some(self.dir.as_path()) {
            anyhow::bail!("{} is not inside the media library", path.display());
        }
        std::fs::remove_file(path)?;
        tracing::info!("deleted {}", path.display());
        Ok(())
    }

    // Appends _1, _2, ... before the extension until the name is free.
    fn unique_target(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }
        let path = Path::new(file_name);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        let ext = path.extension().and_then(|e| e.to_str());
        for n in 1.. {
            let name = match ext {
                Some(ext) => format!("{stem}_{n}.{ext}"),
                None => format!("{stem}_{n}"),
            };
            let candidate = self.dir.join(name);
            if !candidate.exists() {
                return candidate;
            }
        }
        unreachable!()
    }
}
