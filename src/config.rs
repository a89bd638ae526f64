use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

pub const YTDLP_RELEASES_URL: &str = "https://api.github.com/repos/yt-dlp/yt-dlp/releases/latest";
pub const FFMPEG_RELEASES_URL: &str =
    "https://api.github.com/repos/BtbN/FFmpeg-Builds/releases/latest";

/// BtbN nightly Windows build, e.g. `ffmpeg-N-118000-gabcdef-win64-gpl.zip`.
pub const WIN64_FFMPEG_ASSET: &str = r"ffmpeg-N-.+-win64-gpl\.zip";

/// BtbN only ships zips for Windows; elsewhere the asset must be configured.
pub const DEFAULT_FFMPEG_ASSET: Option<&str> = if cfg!(windows) {
    Some(WIN64_FFMPEG_ASSET)
} else {
    None
};

/// File name of the wrapped downloader next to the launcher.
pub const YTDLP_FILE: &str = if cfg!(windows) { "yt-dlp.exe" } else { "yt-dlp" };

/// Release asset that holds the standalone build for this platform.
pub const YTDLP_ASSET: &str = if cfg!(windows) {
    "yt-dlp.exe"
} else if cfg!(target_os = "macos") {
    "yt-dlp_macos"
} else {
    "yt-dlp_linux"
};

pub const FFMPEG_FILE: &str = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };

#[derive(Debug)]
pub struct LauncherConfig {
    pub install_dir: PathBuf, // directory of the launcher (or YT_DL_INSTALL_DIR)
    pub ytdlp_path: PathBuf,  // install_dir/yt-dlp(.exe)
    pub ytdlp_asset: String,
    pub ytdlp_releases_url: String,
    pub ffmpeg_path: PathBuf, // install_dir/ffmpeg(.exe)
    pub ffmpeg_asset: Option<Regex>, // YT_DL_FFMPEG_ASSET
    pub ffmpeg_releases_url: String,
    pub skip_update: bool, // YT_DL_NO_UPDATE_CHECK=1
    pub no_dialog: bool,   // YT_DL_NO_DIALOG=1
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate the launcher executable: {0}")]
    NoExePath(#[from] std::io::Error),
    #[error("launcher executable has no parent directory")]
    NoExeDir,
    #[error("invalid ffmpeg asset pattern {pattern:?}: {source}")]
    BadAssetPattern {
        pattern: String,
        source: regex::Error,
    },
}

impl LauncherConfig {
    /// Configuration rooted at `install_dir` with every other setting at its default.
    pub fn for_dir(install_dir: &Path) -> Result<Self, ConfigError> {
        Ok(LauncherConfig {
            install_dir: install_dir.to_path_buf(),
            ytdlp_path: install_dir.join(YTDLP_FILE),
            ytdlp_asset: YTDLP_ASSET.to_string(),
            ytdlp_releases_url: YTDLP_RELEASES_URL.to_string(),
            ffmpeg_path: install_dir.join(FFMPEG_FILE),
            ffmpeg_asset: DEFAULT_FFMPEG_ASSET.map(asset_pattern).transpose()?,
            ffmpeg_releases_url: FFMPEG_RELEASES_URL.to_string(),
            skip_update: false,
            no_dialog: false,
        })
    }
}

fn asset_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::BadAssetPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Directory containing the running launcher.
pub fn launcher_dir() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or(ConfigError::NoExeDir)
}

pub fn launcher_config() -> Result<LauncherConfig, ConfigError> {
    let install_dir = match std::env::var_os("YT_DL_INSTALL_DIR") {
        Some(v) => PathBuf::from(v),
        None => launcher_dir()?,
    };

    let mut config = LauncherConfig::for_dir(&install_dir)?;

    if let Ok(pattern) = std::env::var("YT_DL_FFMPEG_ASSET") {
        config.ffmpeg_asset = Some(asset_pattern(&pattern)?);
    }

    config.skip_update = flag_set("YT_DL_NO_UPDATE_CHECK");
    config.no_dialog = flag_set("YT_DL_NO_DIALOG");

    Ok(config)
}

fn flag_set(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}
