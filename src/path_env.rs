use std::path::{Path, PathBuf};

use thiserror::Error;

pub const PATH_VAR: &str = "PATH";

#[cfg(windows)]
pub const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_SEPARATOR: char = ':';

#[derive(Debug, Error)]
pub enum PathError {
    #[error("environment store: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not determine the user config directory")]
    NoConfigDir,
    #[error("{0} is not valid unicode")]
    NonUnicode(PathBuf),
}

/// The user's persistent environment, as opposed to this process's.
pub trait EnvStore {
    fn get(&self, name: &str) -> Result<Option<String>, PathError>;
    fn set(&self, name: &str, value: &str) -> Result<(), PathError>;
}

/// Make `dir` reachable from future shells by appending it to the user's
/// persistent `PATH`. Returns true when the stored value was rewritten.
pub fn add_to_path(store: &dyn EnvStore, dir: &Path) -> Result<bool, PathError> {
    let dir = dir
        .to_str()
        .ok_or_else(|| PathError::NonUnicode(dir.to_path_buf()))?;
    let current = store.get(PATH_VAR)?.unwrap_or_default();

    match append_path_entry(&current, dir) {
        Some(updated) => {
            store.set(PATH_VAR, &updated)?;
            tracing::info!("added {} to the user PATH", dir);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// `current` with `dir` appended, or `None` when `dir` is already present.
///
/// Presence is a plain substring test, so `C:\tools` counts as present when
/// only `C:\tools2` is listed.
pub fn append_path_entry(current: &str, dir: &str) -> Option<String> {
    if current.contains(dir) {
        return None;
    }
    let mut updated = String::with_capacity(current.len() + dir.len() + 1);
    updated.push_str(current);
    if !current.is_empty() && !current.ends_with(PATH_SEPARATOR) {
        updated.push(PATH_SEPARATOR);
    }
    updated.push_str(dir);
    Some(updated)
}

/// The store for the current platform.
#[cfg(windows)]
pub fn user_store() -> Result<Box<dyn EnvStore>, PathError> {
    Ok(Box::new(RegistryStore))
}

#[cfg(not(windows))]
pub fn user_store() -> Result<Box<dyn EnvStore>, PathError> {
    Ok(Box::new(EnvironmentDStore::for_user()?))
}

/// `HKEY_CURRENT_USER\Environment`.
#[cfg(windows)]
pub struct RegistryStore;

#[cfg(windows)]
impl EnvStore for RegistryStore {
    fn get(&self, name: &str) -> Result<Option<String>, PathError> {
        use winreg::enums::HKEY_CURRENT_USER;
        use winreg::RegKey;

        let env = RegKey::predef(HKEY_CURRENT_USER).open_subkey("Environment")?;
        match env.get_value::<String, _>(name) {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<(), PathError> {
        use winreg::enums::HKEY_CURRENT_USER;
        use winreg::RegKey;

        let (env, _) = RegKey::predef(HKEY_CURRENT_USER).create_subkey("Environment")?;
        env.set_value(name, &value.to_string())?;
        Ok(())
    }
}

/// A systemd `environment.d` drop-in owned by the launcher.
///
/// Until the drop-in defines a variable, reads fall back to this process's
/// environment so the first write starts from the inherited `PATH`.
#[cfg(not(windows))]
pub struct EnvironmentDStore {
    file: PathBuf,
}

#[cfg(not(windows))]
impl EnvironmentDStore {
    pub fn new(file: PathBuf) -> Self {
        EnvironmentDStore { file }
    }

    pub fn for_user() -> Result<Self, PathError> {
        let file = dirs::config_dir()
            .ok_or(PathError::NoConfigDir)?
            .join("environment.d")
            .join("60-yt-dl.conf");
        Ok(EnvironmentDStore::new(file))
    }

    fn lines(&self) -> Result<Vec<String>, PathError> {
        match std::fs::read_to_string(&self.file) {
            Ok(s) => Ok(s.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(not(windows))]
impl EnvStore for EnvironmentDStore {
    fn get(&self, name: &str) -> Result<Option<String>, PathError> {
        let prefix = format!("{name}=");
        let stored = self
            .lines()?
            .into_iter()
            .rev()
            .find_map(|l| l.strip_prefix(&prefix).map(str::to_string));
        Ok(stored.or_else(|| std::env::var(name).ok()))
    }

    fn set(&self, name: &str, value: &str) -> Result<(), PathError> {
        let prefix = format!("{name}=");
        let mut lines: Vec<String> = self
            .lines()?
            .into_iter()
            .filter(|l| !l.starts_with(&prefix))
            .collect();
        lines.push(format!("{prefix}{value}"));

        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.file, lines.join("\n") + "\n")?;
        Ok(())
    }
}
