// ============================================================================
// seqconv-core/src/external/locator.rs
// ============================================================================
//
// ENGINE LOCATOR: Finding the ffmpeg Executable
//
// Probes a fixed list of conventional install locations, then the search
// path. The result of the default probe is computed once per process and
// cached; absence is only an error once a conversion is attempted.
//
// AI-ASSISTANT-INFO: ffmpeg executable discovery and version probing

use crate::error::{CoreError, CoreResult};
use once_cell::sync::Lazy;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Name looked up on the search path when no conventional location matches.
pub const ENGINE_BINARY_NAME: &str = "ffmpeg";

/// Install locations probed before the search path, in order.
pub const CONVENTIONAL_LOCATIONS: &[&str] = &[
    "/usr/local/bin/ffmpeg",
    "/opt/homebrew/bin/ffmpeg",
    "/usr/bin/ffmpeg",
];

static CACHED_ENGINE_PATH: Lazy<Option<PathBuf>> = Lazy::new(|| {
    let located = locate_engine();
    match &located {
        Some(path) => log::debug!("Located ffmpeg at {}", path.display()),
        None => log::warn!("ffmpeg was not found in conventional locations or on PATH"),
    }
    located
});

/// Returns the first candidate that exists as a regular file.
#[must_use]
pub fn locate_from<I, P>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    candidates
        .into_iter()
        .map(|candidate| candidate.as_ref().to_path_buf())
        .find(|candidate| candidate.is_file())
}

/// Probes the conventional locations, then the search path. Not cached.
#[must_use]
pub fn locate_engine() -> Option<PathBuf> {
    locate_from(CONVENTIONAL_LOCATIONS)
        .or_else(|| which::which(ENGINE_BINARY_NAME).ok())
        .filter(|path| path.is_file())
}

/// Cached result of [`locate_engine`] for the lifetime of the process.
#[must_use]
pub fn cached_engine_path() -> Option<&'static Path> {
    CACHED_ENGINE_PATH.as_deref()
}

/// Runs `<path> -version` and returns the first line of its output.
pub fn probe_engine_version(path: &Path) -> CoreResult<String> {
    let output = Command::new(path)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                log::warn!("Engine '{}' not found.", path.display());
                CoreError::EngineNotFound
            } else {
                log::error!("Failed to run '{} -version': {}", path.display(), e);
                CoreError::CommandStart(e.to_string())
            }
        })?;

    if !output.status.success() {
        return Err(CoreError::OperationFailed(format!(
            "'{} -version' exited with {}",
            path.display(),
            output.status
        )));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .ok_or_else(|| {
            CoreError::OperationFailed(format!("'{} -version' printed nothing", path.display()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_locate_from_first_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing/ffmpeg");
        let present = dir.path().join("ffmpeg");
        let later = dir.path().join("ffmpeg-other");
        File::create(&present).unwrap();
        File::create(&later).unwrap();

        assert_eq!(
            locate_from([&missing, &present, &later]),
            Some(present.clone())
        );
    }

    #[test]
    fn test_locate_from_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("ffmpeg");
        std::fs::create_dir(&nested).unwrap();

        assert_eq!(locate_from([&nested]), None);
        assert_eq!(locate_from(Vec::<PathBuf>::new()), None);
    }

    #[test]
    fn test_probe_missing_engine_is_not_found() {
        let err = probe_engine_version(Path::new("/nonexistent/seqconv/ffmpeg")).unwrap_err();
        assert!(matches!(err, CoreError::EngineNotFound));
    }
}
