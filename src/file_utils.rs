use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

// @module: File and path utilities for pipeline artifacts

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @returns: Lowercased extension of a path, if any
    pub fn extension_of<P: AsRef<Path>>(path: P) -> Option<String> {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }

    // @generates: Path of the sliced clip for a 1-based chunk index
    pub fn slice_output_path<P: AsRef<Path>>(
        output_dir: P,
        index: usize,
        container: &str,
    ) -> PathBuf {
        output_dir
            .as_ref()
            .join(format!("slice_{}.{}", index, container))
    }

    // @generates: Subtitled clip path from its slice path
    // @example: slice_1.mp4 -> slice_1_subtitled.mp4
    pub fn subtitled_output_path<P: AsRef<Path>>(slice_path: P) -> PathBuf {
        let slice_path = slice_path.as_ref();
        let stem = slice_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let file_name = match slice_path.extension() {
            Some(extension) => {
                format!("{}_subtitled.{}", stem, extension.to_string_lossy())
            }
            None => format!("{}_subtitled", stem),
        };

        match slice_path.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    // @writes: Ordered artifact list as a JSON manifest
    pub fn write_manifest<P: AsRef<Path>>(paths: &[PathBuf], manifest_path: P) -> Result<()> {
        #[derive(Serialize)]
        struct Manifest<'a> {
            artifacts: &'a [PathBuf],
        }

        let manifest_path = manifest_path.as_ref();
        if let Some(parent) = manifest_path.parent() {
            if !parent.as_os_str().is_empty() {
                Self::ensure_dir(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&Manifest { artifacts: paths })
            .context("Failed to serialize artifact manifest")?;
        fs::write(manifest_path, json)
            .with_context(|| format!("Failed to write manifest: {}", manifest_path.display()))?;
        Ok(())
    }
}
