use std::path::PathBuf;
use std::{env, fs, io};

use anyhow::{bail, Context, Result};
use clap::Args;
use log::warn;
use serde::de::DeserializeOwned;

use crate::dirs::ensure_dir_exists;

/// Resolved filesystem locations for configuration and data.
pub struct PathSet {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl PathSet {
    pub fn new(config_dir: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let is_root = unsafe { libc::geteuid() == 0 };

        let config_dir = if let Some(path) = config_dir {
            path
        } else if let Ok(path) = env::var("NOVEDADES_CONFIG") {
            PathBuf::from(path)
        } else if is_root {
            PathBuf::from("/etc/novedades")
        } else {
            Self::home_dir()?.join(".config").join("novedades")
        };

        let data_dir = if let Some(path) = data_dir {
            path
        } else if let Ok(path) = env::var("NOVEDADES_DATA") {
            PathBuf::from(path)
        } else if is_root {
            PathBuf::from("/var/lib/novedades")
        } else {
            Self::home_dir()?
                .join(".local")
                .join("share")
                .join("novedades")
        };

        ensure_dir_exists(&config_dir)
            .with_context(|| format!("ensure config directory: {}", config_dir.display()))?;
        ensure_dir_exists(&data_dir)
            .with_context(|| format!("ensure data directory: {}", data_dir.display()))?;

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn load_config<T>(&self, name: &str) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
    {
        let path = self.config_dir.join(format!("{name}.toml"));
        let mut cfg: T = match fs::read_to_string(&path) {
            Ok(s) => toml::from_str(&s).context("parse config toml")?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("Config file for {name} not found, using defaults");
                T::default()
            }
            Err(err) => {
                return Err(err).context(format!("read config file: {}", path.display()));
            }
        };

        cfg.complete(self).context("validate config")?;
        Ok(cfg)
    }

    fn home_dir() -> Result<PathBuf> {
        let dir = env::var_os("HOME").map(PathBuf::from);
        match dir {
            Some(dir) => Ok(dir),
            None => {
                bail!("could not determine home directory, please specify config path manually")
            }
        }
    }
}

/// Implemented by every config section. `complete` validates the section and
/// fills in paths derived from the [`PathSet`].
pub trait CommonConfig {
    fn default() -> Self;
    fn complete(&mut self, ps: &PathSet) -> Result<()>;
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration directory, defaults to $NOVEDADES_CONFIG or
    /// ~/.config/novedades (/etc/novedades when running as root).
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Data directory, defaults to $NOVEDADES_DATA or
    /// ~/.local/share/novedades (/var/lib/novedades when running as root).
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load<T>(&self, name: &str) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
    {
        let ps = PathSet::new(self.config_dir.clone(), self.data_dir.clone())?;
        ps.load_config(name)
    }
}
