// main.rs — orchestration only: setup steps in order, then hand over to yt-dlp.
mod args;
mod config;
mod desktop;
mod exec;
mod path_env;
mod release;
mod setup;
mod update;

use config::{launcher_config, launcher_dir, LauncherConfig};
use desktop::{notifier, open_folder, DialogNotifier, Notifier, SystemClipboard};
use exec::{Invocation, LAUNCH_FAILURE_EXIT_CODE};
use release::GitHubClient;
use setup::{ensure_ffmpeg, SetupOutcome};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use update::{update_ytdlp, CommandVersion, UpdateOutcome};

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("YT_DL_LOG")
        .from_env_lossy();

    // stdout belongs to yt-dlp.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Run a best-effort setup step. A failure is reported through `notifier`
/// and swallowed so the download itself still happens.
fn run_step<T>(
    notifier: &dyn Notifier,
    title: &str,
    step: impl FnOnce() -> anyhow::Result<T>,
) -> Option<T> {
    match step() {
        Ok(v) => Some(v),
        Err(e) => {
            notifier.error(title, &format!("{e:#}"));
            None
        }
    }
}

fn setup(config: &LauncherConfig, raw: &[String], notifier: &dyn Notifier) {
    tracing::debug!("tools directory {}", config.install_dir.display());
    if config.skip_update {
        tracing::debug!("update check disabled");
    } else if let Some(UpdateOutcome::Updated { from, to }) =
        run_step(notifier, "Error updating yt-dlp", || {
            Ok(update_ytdlp(config, &GitHubClient::new()?, &CommandVersion)?)
        })
    {
        tracing::info!(
            "updated yt-dlp {} -> {} in {}",
            from.as_deref().unwrap_or("(none)"),
            to,
            config.install_dir.display()
        );
    }

    if !args::skip_ffmpeg(raw) {
        if let Some(SetupOutcome::Installed { asset }) =
            run_step(notifier, "Error installing ffmpeg", || {
                Ok(ensure_ffmpeg(config, &GitHubClient::new()?)?)
            })
        {
            tracing::info!("installed ffmpeg from {}", asset);
        }
    }

    if !args::skip_add_path(raw) {
        run_step(notifier, "Error adding yt-dl to PATH", || {
            let store = path_env::user_store()?;
            Ok(path_env::add_to_path(store.as_ref(), &launcher_dir()?)?)
        });
    }
}

fn launch(config: &LauncherConfig, raw: &[String], notifier: &dyn Notifier) -> i32 {
    let working_dir = match std::env::current_dir() {
        Ok(d) => d,
        Err(e) => {
            notifier.error("Error running yt-dlp", &format!("no working directory: {e}"));
            return LAUNCH_FAILURE_EXIT_CODE;
        }
    };

    let translated = args::translate(raw, &SystemClipboard);
    let invocation = Invocation {
        working_dir,
        executable: config.ytdlp_path.clone(),
        args: translated.args,
    };

    let code = match exec::run(&invocation, &mut std::io::stdout().lock()) {
        Ok(code) => code,
        Err(e) => {
            notifier.error("Error running yt-dlp", &e.to_string());
            return LAUNCH_FAILURE_EXIT_CODE;
        }
    };

    if translated.open_folder {
        open_folder(&invocation.working_dir);
    }
    code
}

fn main() {
    init_tracing();
    let raw: Vec<String> = std::env::args().skip(1).collect();

    let config = match launcher_config() {
        Ok(c) => c,
        Err(e) => {
            DialogNotifier.error("Error starting yt-dl", &e.to_string());
            std::process::exit(LAUNCH_FAILURE_EXIT_CODE);
        }
    };
    let notifier = notifier(config.no_dialog);

    setup(&config, &raw, notifier.as_ref());
    std::process::exit(launch(&config, &raw, notifier.as_ref()));
}
