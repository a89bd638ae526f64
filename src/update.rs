use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::LauncherConfig;
use crate::release::{ReleaseError, ReleaseSource};

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Release(#[from] ReleaseError),
    #[error("couldn't find asset {0:?} in the release manifest")]
    AssetNotFound(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    UpToDate,
    Updated { from: Option<String>, to: String },
}

/// Reports the version embedded in an installed executable.
pub trait VersionSource {
    fn version(&self, path: &Path) -> Option<String>;
}

/// Asks the executable itself: `yt-dlp --version` prints the release tag.
pub struct CommandVersion;

impl VersionSource for CommandVersion {
    fn version(&self, path: &Path) -> Option<String> {
        if !path.exists() {
            return None;
        }
        let output = std::process::Command::new(path)
            .arg("--version")
            .output()
            .inspect_err(|e| tracing::warn!("could not run {}: {}", path.display(), e))
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!version.is_empty()).then_some(version)
    }
}

/// Bring `config.ytdlp_path` to the latest published release.
///
/// Downloads only when the release tag differs from the installed version,
/// including when nothing is installed yet.
pub fn update_ytdlp(
    config: &LauncherConfig,
    source: &dyn ReleaseSource,
    versions: &dyn VersionSource,
) -> Result<UpdateOutcome, UpdateError> {
    let path = &config.ytdlp_path;
    let installed = versions.version(path);
    let release = source.latest_release(&config.ytdlp_releases_url)?;

    if installed.as_deref() == Some(release.tag.as_str()) {
        tracing::debug!("yt-dlp {} is current", release.tag);
        return Ok(UpdateOutcome::UpToDate);
    }

    tracing::info!("downloading new yt-dlp version {} ...", release.tag);
    let asset = release
        .asset_named(&config.ytdlp_asset)
        .ok_or_else(|| UpdateError::AssetNotFound(config.ytdlp_asset.clone()))?;

    let mut body = source.download(&asset.url)?;
    replace_file(path, &mut body).map_err(|source| UpdateError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(UpdateOutcome::Updated {
        from: installed,
        to: release.tag,
    })
}

/// Stream `body` into `<path>.new`, mark it executable, then rename over `path`.
/// The temp file is removed if anything fails before the rename.
pub fn replace_file(path: &Path, body: &mut dyn std::io::Read) -> std::io::Result<()> {
    let mut new_name = path.as_os_str().to_owned();
    new_name.push(".new");
    let new_path = PathBuf::from(new_name);

    let written = write_executable(&new_path, body);
    if written.is_err() {
        let _ = std::fs::remove_file(&new_path);
        return written;
    }

    std::fs::rename(&new_path, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&new_path);
    })
}

fn write_executable(path: &Path, body: &mut dyn std::io::Read) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    std::io::copy(body, &mut file)?;
    file.sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
