//! Locale context and its configuration.
//!
//! The engine never discovers locales itself. Callers thread a
//! [`LocaleContext`] through every read and write; [`LocaleSettings`] is the
//! usual way to build one from a config file and the environment.

use std::path::Path;

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Environment variables with this prefix override file settings, e.g.
/// `POLYGLOT_LOCALE=el`.
pub const ENV_PREFIX: &str = "POLYGLOT";

/// Locale used when nothing is configured.
pub const DEFAULT_LOCALE: &str = "en";

/// The locale a resolution is attempted in and the one tried on a miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleContext {
  pub locale:   String,
  pub fallback: Option<String>,
}

impl LocaleContext {
  pub fn new(locale: impl Into<String>) -> Self {
    Self {
      locale:   locale.into(),
      fallback: None,
    }
  }

  pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
    self.fallback = Some(fallback.into());
    self
  }

  pub fn fallback(&self) -> Option<&str> { self.fallback.as_deref() }
}

impl Default for LocaleContext {
  fn default() -> Self { Self::new(DEFAULT_LOCALE) }
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LocaleSettings {
  pub locale:          String,
  #[serde(default)]
  pub fallback_locale: Option<String>,
}

impl LocaleSettings {
  /// Read settings from an optional TOML file, then `POLYGLOT_*` variables.
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let mut builder = Self::defaults()?;
    if let Some(path) = path {
      builder = builder.add_source(File::from(path).required(false));
    }
    let builder = builder.add_source(Environment::with_prefix(ENV_PREFIX));
    Ok(builder.build()?.try_deserialize()?)
  }

  /// Read settings from a TOML document only.
  pub fn parse(toml: &str) -> Result<Self> {
    let builder = Self::defaults()?.add_source(File::from_str(toml, FileFormat::Toml));
    Ok(builder.build()?.try_deserialize()?)
  }

  pub fn context(&self) -> LocaleContext {
    LocaleContext {
      locale:   self.locale.clone(),
      fallback: self.fallback_locale.clone(),
    }
  }

  fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder().set_default("locale", DEFAULT_LOCALE)?)
  }
}
