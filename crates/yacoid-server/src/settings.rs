//! Runtime configuration, layered from `config.toml` and `YACOID_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use yacoid_api::ApiConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  #[serde(default = "default_listing_size")]
  pub default_page_size: usize,
  #[serde(default = "default_listing_size")]
  pub newest_limit:      usize,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("yacoid.db") }
fn default_listing_size() -> usize { 4 }

impl ServerConfig {
  /// Read `path` (if it exists) and overlay `YACOID_*` variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("YACOID"))
      .build()
      .context("failed to read config file")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  fn validate(&self) -> anyhow::Result<()> {
    anyhow::ensure!(self.default_page_size > 0, "default_page_size must be at least 1");
    Ok(())
  }

  pub fn api(&self) -> ApiConfig {
    ApiConfig {
      default_page_size: self.default_page_size,
      newest_limit:      self.newest_limit,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn store_path(&self) -> PathBuf {
    let s = self.store_path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/")
      && let Ok(home) = std::env::var("HOME")
    {
      return PathBuf::from(home).join(rest);
    }
    self.store_path.clone()
  }
}

#[cfg(test)]
mod tests {
  use config::{Config, File, FileFormat};

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn missing_keys_fall_back_to_defaults() {
    let cfg = parse("port = 9000");
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.default_page_size, 4);
    assert_eq!(cfg.newest_limit, 4);
    assert_eq!(cfg.address(), "127.0.0.1:9000");
  }

  #[test]
  fn listing_sizes_reach_the_api() {
    let cfg = parse("default_page_size = 10\nnewest_limit = 2");
    let api = cfg.api();
    assert_eq!(api.default_page_size, 10);
    assert_eq!(api.newest_limit, 2);
  }

  #[test]
  fn zero_page_size_is_refused() {
    assert!(parse("default_page_size = 0").validate().is_err());
  }

  #[test]
  fn absolute_store_path_is_untouched() {
    let cfg = parse("store_path = \"/var/lib/yacoid.db\"");
    assert_eq!(cfg.store_path(), PathBuf::from("/var/lib/yacoid.db"));
  }
}
