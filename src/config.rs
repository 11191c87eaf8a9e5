use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub services: ServicesConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  /// Organization whose products are listed on startup
  pub organization_uuid: Option<String>,
  /// Product selected last session; preferred when the product list loads
  pub active_product: Option<String>,
}

/// Base URLs of the backend services.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicesConfig {
  pub api_url: String,
  pub product_service_url: Option<String>,
  pub release_service_url: Option<String>,
  pub collabhub_url: Option<String>,
  pub feedback_sheet: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Seconds before a cached list is refetched
  #[serde(default = "default_stale_seconds")]
  pub stale_seconds: i64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_seconds: default_stale_seconds(),
    }
  }
}

fn default_stale_seconds() -> i64 {
  30
}

/// A backend a request can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceTarget {
  /// The API gateway fronting every service
  Main,
  Product,
  Release,
  CollabHub,
  /// External feedback spreadsheet, not behind the gateway
  FeedbackSheet,
}

impl ServiceTarget {
  /// Route prefix the gateway uses for this service, if it proxies it.
  pub fn gateway_prefix(self) -> Option<&'static str> {
    match self {
      Self::Product => Some("product"),
      Self::Release => Some("release"),
      Self::CollabHub => Some("collabhub"),
      Self::Main | Self::FeedbackSheet => None,
    }
  }

  /// Environment variable that overrides this service's base URL.
  pub fn env_var(self) -> &'static str {
    match self {
      Self::Main => "API_URL",
      Self::Product => "PRODUCT_SERVICE_URL",
      Self::Release => "RELEASE_SERVICE_URL",
      Self::CollabHub => "COLLABHUB_URL",
      Self::FeedbackSheet => "FEEDBACK_SHEET",
    }
  }

  /// Every target besides the main API
  const SERVICES: [ServiceTarget; 4] = [
    Self::Product,
    Self::Release,
    Self::CollabHub,
    Self::FeedbackSheet,
  ];
}

/// Base URLs resolved once at startup.
///
/// Services without a configured URL are reached through the gateway at
/// `<api_url><prefix>/`.
#[derive(Debug, Clone)]
pub struct ServiceTable {
  api: Url,
  urls: BTreeMap<ServiceTarget, Url>,
}

impl ServiceTable {
  pub fn from_config(services: &ServicesConfig) -> Result<Self> {
    let api = parse_base_url(&services.api_url)?;
    let mut urls = BTreeMap::new();

    for target in ServiceTarget::SERVICES {
      let configured = match target {
        ServiceTarget::Main => None,
        ServiceTarget::Product => services.product_service_url.as_deref(),
        ServiceTarget::Release => services.release_service_url.as_deref(),
        ServiceTarget::CollabHub => services.collabhub_url.as_deref(),
        ServiceTarget::FeedbackSheet => services.feedback_sheet.as_deref(),
      };

      let url = match (configured, target.gateway_prefix()) {
        (Some(raw), _) if !raw.trim().is_empty() => parse_base_url(raw)?,
        (_, Some(prefix)) => api
          .join(&format!("{}/", prefix))
          .map_err(|e| eyre!("Invalid gateway route for {:?}: {}", target, e))?,
        _ => continue,
      };
      urls.insert(target, url);
    }

    Ok(Self { api, urls })
  }

  /// Base URL for a service, `None` when it is neither configured nor proxied.
  pub fn base(&self, target: ServiceTarget) -> Option<&Url> {
    match target {
      ServiceTarget::Main => Some(&self.api),
      other => self.urls.get(&other),
    }
  }

  pub fn api_url(&self) -> &Url {
    &self.api
  }
}

/// Parse a base URL, making sure it ends with a slash so joins append.
fn parse_base_url(raw: &str) -> Result<Url> {
  let trimmed = raw.trim();
  let normalized = if trimmed.ends_with('/') {
    trimmed.to_string()
  } else {
    format!("{}/", trimmed)
  };
  Url::parse(&normalized).map_err(|e| eyre!("Invalid base URL '{}': {}", raw, e))
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./buildly.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/buildly/config.yaml
  ///
  /// Service URLs from the environment override the file.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::from_env_only()?,
    };
    config.apply_env_overrides(|name| std::env::var(name).ok());

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("buildly.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("buildly").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Without a file, API_URL must come from the environment.
  fn from_env_only() -> Result<Self> {
    let api_url = std::env::var(ServiceTarget::Main.env_var()).map_err(|_| {
      eyre!(
        "No configuration file found. Create one at ~/.config/buildly/config.yaml \
         or set API_URL."
      )
    })?;

    Ok(Self {
      services: ServicesConfig {
        api_url,
        ..ServicesConfig::default()
      },
      cache: CacheConfig::default(),
      organization_uuid: None,
      active_product: None,
    })
  }

  fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    let services = &mut self.services;
    if let Some(v) = lookup(ServiceTarget::Main.env_var()) {
      services.api_url = v;
    }
    for (target, slot) in [
      (ServiceTarget::Product, &mut services.product_service_url),
      (ServiceTarget::Release, &mut services.release_service_url),
      (ServiceTarget::CollabHub, &mut services.collabhub_url),
      (ServiceTarget::FeedbackSheet, &mut services.feedback_sheet),
    ] {
      if let Some(v) = lookup(target.env_var()) {
        *slot = Some(v);
      }
    }
  }

  /// Get the access token from environment variables.
  ///
  /// Checks BUILDLY_ACCESS_TOKEN first, then BUILDLY_TOKEN as fallback.
  pub fn get_access_token() -> Result<String> {
    std::env::var("BUILDLY_ACCESS_TOKEN")
      .or_else(|_| std::env::var("BUILDLY_TOKEN"))
      .map_err(|_| {
        eyre!("Access token not found. Set BUILDLY_ACCESS_TOKEN or BUILDLY_TOKEN environment variable.")
      })
  }
}
