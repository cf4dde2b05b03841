/*!
 * Extension-validated media byte loaders.
 *
 * Whole-file loaders for the video and audio inputs. The extension is
 * checked against a per-kind allow-list before anything is read. A
 * missing path or an unsupported extension always fails; a read error
 * fails too unless `silent_errors` is set, in which case the error
 * text is returned as data instead of raised. That silent mode exists
 * only here and never leaks into the pipelines.
 */

use std::path::Path;

use bytes::Bytes;
use log::{debug, warn};

use crate::errors::LoaderError;
use crate::file_utils::FileManager;

/// Video container extensions accepted by `load_video`
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov"];

/// Audio container extensions accepted by `load_audio`
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a"];

/// Loader outcome; `Failed` only occurs in silent-errors mode
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedMedia {
    /// The file's full contents
    Bytes(Bytes),
    /// Swallowed read error, carried as data
    Failed(String),
}

impl LoadedMedia {
    /// Unwrap into bytes, turning a swallowed error back into text
    pub fn into_bytes(self) -> Result<Bytes, String> {
        match self {
            LoadedMedia::Bytes(bytes) => Ok(bytes),
            LoadedMedia::Failed(message) => Err(message),
        }
    }
}

/// Load a video file into memory
pub fn load_video<P: AsRef<Path>>(
    path: P,
    silent_errors: bool,
) -> Result<LoadedMedia, LoaderError> {
    load_media(path.as_ref(), "video", VIDEO_EXTENSIONS, silent_errors)
}

/// Load an audio file into memory
pub fn load_audio<P: AsRef<Path>>(
    path: P,
    silent_errors: bool,
) -> Result<LoadedMedia, LoaderError> {
    load_media(path.as_ref(), "audio", AUDIO_EXTENSIONS, silent_errors)
}

fn load_media(
    path: &Path,
    kind: &'static str,
    allowed: &[&str],
    silent_errors: bool,
) -> Result<LoadedMedia, LoaderError> {
    if path.as_os_str().is_empty() {
        return Err(LoaderError::MissingPath);
    }

    let extension = FileManager::extension_of(path).unwrap_or_default();
    if !allowed.contains(&extension.as_str()) {
        return Err(LoaderError::UnsupportedType { kind, extension });
    }

    if !FileManager::file_exists(path) {
        return Err(LoaderError::NotFound(path.to_path_buf()));
    }

    match std::fs::read(path) {
        Ok(data) => {
            debug!("Loaded {} file {} ({} bytes)", kind, path.display(), data.len());
            Ok(LoadedMedia::Bytes(Bytes::from(data)))
        }
        Err(error) if silent_errors => {
            warn!(
                "Swallowing {} read error for {}: {}",
                kind,
                path.display(),
                error
            );
            Ok(LoadedMedia::Failed(format!("Error: {}", error)))
        }
        Err(error) => Err(LoaderError::Io(error)),
    }
}
