use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::reconcile::{DEFAULT_BRANCH, DivergePolicy, SyncSettings};

/// Environment variable that overrides `upstream_url` from the config file.
pub const UPSTREAM_URL_ENV: &str = "FORKUP_UPSTREAM_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_diverge: Option<DivergePolicy>,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg: Config = serde_yaml_ng::from_str(&data)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg)
    }

    /// Writes the config through a temp file in the same directory so a
    /// crash never leaves a half-written file behind.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let dir = path.parent().context("config path has no parent directory")?;
        fs::create_dir_all(dir)?;

        let data = serde_yaml_ng::to_string(self)?;
        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).context("creating temp file for atomic save")?;
        tmp.write_all(data.as_bytes())
            .context("writing config to temp file")?;
        tmp.persist(path).context("renaming temp file to config")?;
        Ok(())
    }

    pub fn default_branch(&self) -> &str {
        self.default_branch
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BRANCH)
    }

    /// The upstream URL, preferring `env_value` (from [`UPSTREAM_URL_ENV`])
    /// over the file.
    pub fn upstream_url_with(&self, env_value: Option<&str>) -> Option<String> {
        env_value
            .filter(|s| !s.is_empty())
            .map(String::from)
            .or_else(|| self.upstream_url.clone())
    }

    pub fn upstream_url(&self) -> Option<String> {
        self.upstream_url_with(std::env::var(UPSTREAM_URL_ENV).ok().as_deref())
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            branch: self.default_branch().to_string(),
            upstream_url: self.upstream_url(),
            on_diverge: self.on_diverge.unwrap_or_default(),
        }
    }
}

pub struct Paths {
    pub config_path: PathBuf,
}

impl Paths {
    /// Resolve paths from environment (XDG_CONFIG_HOME / HOME). Called once at startup.
    pub fn resolve() -> Result<Paths> {
        let dir = config_dir()?;
        Ok(Paths {
            config_path: dir.join("config.yaml"),
        })
    }
}

/// Resolves the forkup config directory. Accepts injectable overrides for testing.
pub fn config_dir_with(xdg_config_home: Option<&str>, home: Option<&Path>) -> Result<PathBuf> {
    if let Some(xdg) = xdg_config_home.filter(|s| !s.is_empty()) {
        return Ok(PathBuf::from(xdg).join("forkup"));
    }
    let home = home.context("cannot determine home directory")?;
    Ok(home.join(".config").join("forkup"))
}

fn config_dir() -> Result<PathBuf> {
    config_dir_with(
        std::env::var("XDG_CONFIG_HOME").ok().as_deref(),
        dirs::home_dir().as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_xdg_set() {
        let dir = config_dir_with(Some("/custom/config"), None).unwrap();
        assert_eq!(dir, PathBuf::from("/custom/config/forkup"));
    }

    #[test]
    fn test_config_dir_xdg_empty_falls_back_to_home() {
        let dir = config_dir_with(Some(""), Some(Path::new("/home/user"))).unwrap();
        assert_eq!(dir, PathBuf::from("/home/user/.config/forkup"));
    }

    #[test]
    fn test_config_dir_no_home_errors() {
        assert!(config_dir_with(None, None).is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&tmp.path().join("config.yaml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.default_branch(), "master");
        assert_eq!(cfg.on_diverge.unwrap_or_default(), DivergePolicy::Rebase);
    }

    #[test]
    fn test_load_save_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg_path = tmp.path().join("nested").join("config.yaml");

        let cfg = Config {
            upstream_url: Some("git@github.com:them/tool.git".into()),
            default_branch: Some("main".into()),
            on_diverge: Some(DivergePolicy::Fail),
        };
        cfg.save_to(&cfg_path).unwrap();

        let data = std::fs::read_to_string(&cfg_path).unwrap();
        assert!(data.contains("on_diverge: fail"), "{}", data);

        let cfg2 = Config::load_from(&cfg_path).unwrap();
        assert_eq!(cfg2, cfg);
    }

    #[test]
    fn test_load_rejects_unknown_policy() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg_path = tmp.path().join("config.yaml");
        std::fs::write(&cfg_path, "on_diverge: merge\n").unwrap();
        let err = Config::load_from(&cfg_path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing"), "{:#}", err);
    }

    #[test]
    fn test_upstream_url_env_wins() {
        let cfg = Config {
            upstream_url: Some("file-url".into()),
            ..Config::default()
        };
        assert_eq!(cfg.upstream_url_with(Some("env-url")).unwrap(), "env-url");
        assert_eq!(cfg.upstream_url_with(Some("")).unwrap(), "file-url");
        assert_eq!(cfg.upstream_url_with(None).unwrap(), "file-url");
        assert!(Config::default().upstream_url_with(None).is_none());
    }

    #[test]
    fn test_empty_default_branch_falls_back() {
        let cfg = Config {
            default_branch: Some(String::new()),
            ..Config::default()
        };
        assert_eq!(cfg.default_branch(), "master");
    }
}
