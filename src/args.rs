use crate::desktop::ClipboardSource;

pub const MP3: &str = "--mp3";
pub const MP4: &str = "--mp4";
pub const OPEN: &str = "--open";
pub const NO_FFMPEG: &str = "--no-ffmpeg";
pub const NO_ADD_PATH: &str = "--no-add-path";

/// Passed to yt-dlp on every run.
const ALWAYS: [&str; 2] = ["--no-check-certificates", "--no-mtime"];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Translated {
    pub args: Vec<String>,
    pub open_folder: bool,
}

pub fn skip_ffmpeg(raw: &[String]) -> bool {
    raw.iter().any(|a| a == NO_FFMPEG)
}

pub fn skip_add_path(raw: &[String]) -> bool {
    raw.iter().any(|a| a == NO_ADD_PATH)
}

/// Rewrite launcher flags into yt-dlp flags, keeping everything else in order.
///
/// When no positional argument was given, a URL on the clipboard is used.
pub fn translate(raw: &[String], clipboard: &dyn ClipboardSource) -> Translated {
    let mut out = Translated {
        args: ALWAYS.iter().map(|s| s.to_string()).collect(),
        open_folder: false,
    };

    for arg in raw {
        match arg.as_str() {
            MP3 => out.args.extend(
                ["--extract-audio", "--embed-thumbnail", "--audio-format=mp3"]
                    .map(String::from),
            ),
            MP4 => out.args.push("--recode-video=mp4".to_string()),
            OPEN => out.open_folder = true,
            NO_FFMPEG | NO_ADD_PATH => {}
            _ => out.args.push(arg.clone()),
        }
    }

    if raw.iter().all(|a| a.starts_with('-')) {
        if let Some(url) = clipboard.text().filter(|t| is_url(t)) {
            tracing::info!("using URL from clipboard: {}", url);
            out.args.push(url);
        }
    }

    out
}

fn is_url(text: &str) -> bool {
    text.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("http"))
}
