use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    /// Fixed seed for reply selection; entropy when unset.
    pub(crate) seed: Option<u64>,
    pub(crate) muted: bool,
    /// Program run with the reply text as its last argument, e.g. `espeak`.
    pub(crate) speech_command: Option<String>,
    /// How long the pet "thinks" before answering.
    pub(crate) reply_delay_ms: u64,
    pub(crate) enable_color: bool,
    pub(crate) fps_cap: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            muted: false,
            speech_command: None,
            reply_delay_ms: 800,
            enable_color: true,
            fps_cap: 30,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Paths {
    pub(crate) dir: PathBuf,
    pub(crate) store_path: PathBuf,
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

impl Paths {
    pub(crate) fn in_dir(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            store_path: dir.join("pet.json"),
            settings_path: dir.join("settings.json"),
            log_path: dir.join("petpal.log"),
        })
    }
}

/// Resolves the data directory, honouring an explicit override.
pub(crate) fn project_paths(data_dir: Option<&Path>) -> Result<Paths> {
    match data_dir {
        Some(dir) => Paths::in_dir(dir),
        None => {
            let proj = ProjectDirs::from("com", "petpal", "PetPal")
                .context("could not resolve project directories")?;
            Paths::in_dir(proj.data_local_dir())
        }
    }
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    if let Ok(s) = fs::read_to_string(path) {
        match serde_json::from_str::<Settings>(&s) {
            Ok(v) => return v,
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "bad settings file, using defaults"),
        }
    }
    Settings::default()
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename over an existing file is atomic on the same filesystem on unix;
    // windows needs the target gone first
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
        .with_context(|| format!("renaming {} to {}", from.display(), to.display()))?;
    Ok(())
}
