use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::read::read_zipfile_from_stream;
use zip::result::ZipError;

use crate::config::{LauncherConfig, FFMPEG_FILE};
use crate::release::{ReleaseError, ReleaseSource};
use crate::update::replace_file;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Release(#[from] ReleaseError),
    #[error("couldn't find an asset matching {0:?} in the release manifest")]
    AssetNotFound(String),
    #[error("couldn't find {0} in the archive")]
    EntryNotFound(String),
    #[error("unreadable archive: {0}")]
    Archive(#[from] ZipError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum SetupOutcome {
    AlreadyPresent,
    /// No build archive is known for this platform.
    NoAsset,
    Installed { asset: String },
}

/// Ensure ffmpeg sits next to yt-dlp.
///
/// Presence alone is enough: an existing binary is never version-checked and
/// no request is made. Otherwise the latest build archive is streamed and
/// only the ffmpeg entry is written out.
pub fn ensure_ffmpeg(
    config: &LauncherConfig,
    source: &dyn ReleaseSource,
) -> Result<SetupOutcome, SetupError> {
    if config.ffmpeg_path.exists() {
        return Ok(SetupOutcome::AlreadyPresent);
    }
    let Some(pattern) = &config.ffmpeg_asset else {
        tracing::debug!("no ffmpeg asset for this platform, set YT_DL_FFMPEG_ASSET to install one");
        return Ok(SetupOutcome::NoAsset);
    };

    tracing::info!("downloading ffmpeg...this may take a moment");
    let release = source.latest_release(&config.ffmpeg_releases_url)?;
    let asset = release
        .asset_matching(pattern)
        .ok_or_else(|| SetupError::AssetNotFound(pattern.as_str().to_string()))?;

    let body = source.download(&asset.url)?;
    extract_entry(body, FFMPEG_FILE, &config.ffmpeg_path)?;

    Ok(SetupOutcome::Installed {
        asset: asset.name.clone(),
    })
}

/// Read a zip from a forward-only stream and write the first entry whose
/// file name (last path component) is `entry_name` to `dest`.
///
/// Entries are walked through their local headers, so the archive is never
/// held in memory or spooled to disk.
pub fn extract_entry<R: Read>(
    mut reader: R,
    entry_name: &str,
    dest: &Path,
) -> Result<(), SetupError> {
    while let Some(mut entry) = read_zipfile_from_stream(&mut reader)? {
        if entry.is_dir() || file_name(entry.name()) != entry_name {
            continue;
        }
        tracing::debug!("extracting {} ({} bytes)", entry.name(), entry.size());
        return replace_file(dest, &mut entry).map_err(|source| SetupError::Io {
            path: dest.to_path_buf(),
            source,
        });
    }
    Err(SetupError::EntryNotFound(entry_name.to_string()))
}

fn file_name(entry: &str) -> &str {
    entry.rsplit(['/', '\\']).next().unwrap_or(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::fake::{asset, FakeSource};
    use crate::config::WIN64_FFMPEG_ASSET;
    use crate::release::Release;
    use regex::Regex;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const ZIP_URL: &str = "https://example.invalid/ffmpeg.zip";
    const ZIP_NAME: &str = "ffmpeg-N-118000-g1234abcd-win64-gpl.zip";

    fn make_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
        }
        zip.finish().unwrap().into_inner()
    }

    fn ffmpeg_zip() -> Vec<u8> {
        let root = "ffmpeg-N-118000-g1234abcd-win64-gpl";
        make_zip(&[
            (format!("{root}/").as_str(), ""),
            (format!("{root}/LICENSE.txt").as_str(), "GPL"),
            (format!("{root}/bin/ffplay{}", suffix()).as_str(), "not this one"),
            (format!("{root}/bin/{FFMPEG_FILE}").as_str(), "\x7fELF ffmpeg payload"),
            (format!("{root}/bin/ffprobe{}", suffix()).as_str(), "nor this one"),
            (format!("{root}/doc/{FFMPEG_FILE}").as_str(), "second match is ignored"),
        ])
    }

    fn suffix() -> &'static str {
        if cfg!(windows) {
            ".exe"
        } else {
            ""
        }
    }

    fn ffmpeg_release(asset_name: &str) -> Release {
        Release {
            tag: "latest".to_string(),
            assets: vec![
                asset("checksums.sha256", "https://example.invalid/sums"),
                asset("ffmpeg-N-118000-g1234abcd-win64-lgpl.zip", "https://example.invalid/lgpl"),
                asset(asset_name, ZIP_URL),
            ],
        }
    }

    fn win64_config(dir: &Path) -> LauncherConfig {
        let mut config = LauncherConfig::for_dir(dir).unwrap();
        config.ffmpeg_asset = Some(Regex::new(WIN64_FFMPEG_ASSET).unwrap());
        config
    }

    #[test]
    fn existing_binary_makes_no_requests() {
        let dir = tempdir().unwrap();
        let config = LauncherConfig::for_dir(dir.path()).unwrap();
        std::fs::write(&config.ffmpeg_path, "old build").unwrap();
        let source = FakeSource::default();

        let outcome = ensure_ffmpeg(&config, &source).unwrap();

        assert_eq!(outcome, SetupOutcome::AlreadyPresent);
        assert!(source.requests.borrow().is_empty());
        assert_eq!(std::fs::read_to_string(&config.ffmpeg_path).unwrap(), "old build");
    }

    #[test]
    fn installs_only_the_ffmpeg_entry() {
        let dir = tempdir().unwrap();
        let config = win64_config(dir.path());
        let source = FakeSource::default()
            .with_release(&config.ffmpeg_releases_url, ffmpeg_release(ZIP_NAME))
            .with_file(ZIP_URL, &ffmpeg_zip());

        let outcome = ensure_ffmpeg(&config, &source).unwrap();

        assert_eq!(
            outcome,
            SetupOutcome::Installed {
                asset: ZIP_NAME.to_string()
            }
        );
        assert_eq!(std::fs::read(&config.ffmpeg_path).unwrap(), b"\x7fELF ffmpeg payload");
        let mut files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        files.sort();
        assert_eq!(files, vec![std::ffi::OsString::from(FFMPEG_FILE)]);
    }

    #[test]
    fn no_matching_asset_is_error() {
        let dir = tempdir().unwrap();
        let config = win64_config(dir.path());
        let source = FakeSource::default()
            .with_release(
                &config.ffmpeg_releases_url,
                ffmpeg_release("ffmpeg-N-118000-g1234abcd-linux64-gpl.tar.xz"),
            )
            .with_file(ZIP_URL, &ffmpeg_zip());

        let result = ensure_ffmpeg(&config, &source);

        assert!(matches!(result, Err(SetupError::AssetNotFound(_))));
        assert_eq!(source.downloads(), 0);
    }

    #[cfg(not(windows))]
    #[test]
    fn default_config_skips_download_off_windows() {
        let dir = tempdir().unwrap();
        let config = LauncherConfig::for_dir(dir.path()).unwrap();
        let source = FakeSource::default()
            .with_release(&config.ffmpeg_releases_url, ffmpeg_release(ZIP_NAME))
            .with_file(ZIP_URL, &ffmpeg_zip());

        let outcome = ensure_ffmpeg(&config, &source).unwrap();

        assert_eq!(outcome, SetupOutcome::NoAsset);
        assert!(source.requests.borrow().is_empty());
        assert!(!config.ffmpeg_path.exists());
    }

    #[test]
    fn archive_without_ffmpeg_is_error() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join(FFMPEG_FILE);
        let bytes = make_zip(&[("bin/ffprobe", "probe"), ("README.txt", "hi")]);

        let result = extract_entry(Cursor::new(bytes), FFMPEG_FILE, &dest);

        assert!(
            matches!(&result, Err(SetupError::EntryNotFound(name)) if name == FFMPEG_FILE),
            "unexpected result: {result:?}"
        );
        assert!(!dest.exists());
    }

    #[test]
    fn entry_name_must_match_exactly() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("ffmpeg");
        let bytes = make_zip(&[("bin/ffmpeg-static", "wrong"), ("bin/ffmpeg", "right")]);

        extract_entry(Cursor::new(bytes), "ffmpeg", &dest).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"right");
    }

    #[test]
    fn garbage_body_is_archive_error() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("ffmpeg");
        let result = extract_entry(Cursor::new(b"<html>502</html>".to_vec()), "ffmpeg", &dest);
        assert!(
            matches!(result, Err(SetupError::Archive(_))),
            "unexpected result: {result:?}"
        );
        assert!(!dest.exists());
    }

    #[test]
    fn file_name_takes_last_component() {
        assert_eq!(file_name("a/b/ffmpeg.exe"), "ffmpeg.exe");
        assert_eq!(file_name("a\\b\\ffmpeg.exe"), "ffmpeg.exe");
        assert_eq!(file_name("ffmpeg.exe"), "ffmpeg.exe");
        assert_eq!(file_name("bin/"), "");
    }
}
