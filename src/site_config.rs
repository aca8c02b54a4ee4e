//! Site configuration, read from `site.toml` in the site root.
//!
//! Settings are layered file → environment → CLI. A missing file yields the
//! defaults, which match the layout the demo site ships with.
//!
//! # Configuration File Format
//!
//! ```toml
//! # Searched in order for `/{slug}` pages.
//! sections = ["subpages", "subpage", "content", "games"]
//!
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//!
//! [paths]
//! templates = "templates"
//! data = "data"
//! public = "public"
//! data_file = "page.json"
//! main_template = "main.hbs"
//!
//! [[pages]]
//! path = "/policy"
//! template = "policy.hbs"
//!
//! [[pages]]
//! path = "/about-us"
//! template = "subpages/about-us.hbs"
//! data = "subpages/about-us.json"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the site configuration inside the site root.
pub const CONFIG_FILE: &str = "site.toml";

const ENV_HOST: &str = "SITEPRESS_HOST";
const ENV_PORT: &str = "SITEPRESS_PORT";

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Directory layout, relative to the site root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsSection {
    /// Handlebars templates
    #[serde(default = "default_templates")]
    pub templates: String,
    /// JSON data files
    #[serde(default = "default_data")]
    pub data: String,
    /// Static files (admin page, images)
    #[serde(default = "default_public")]
    pub public: String,
    /// Main data document edited by the admin form, inside `data`
    #[serde(default = "default_data_file")]
    pub data_file: String,
    /// Home page template, inside `templates`; overwritten by `POST /save`
    #[serde(default = "default_main_template")]
    pub main_template: String,
}

fn default_templates() -> String {
    "templates".to_string()
}

fn default_data() -> String {
    "data".to_string()
}

fn default_public() -> String {
    "public".to_string()
}

fn default_data_file() -> String {
    "page.json".to_string()
}

fn default_main_template() -> String {
    "main.hbs".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            templates: default_templates(),
            data: default_data(),
            public: default_public(),
            data_file: default_data_file(),
            main_template: default_main_template(),
        }
    }
}

/// A fixed route rendering one template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRoute {
    /// Request path, e.g. `/policy`
    pub path: String,
    /// Template file, relative to the templates directory
    pub template: String,
    /// Data file relative to the data directory. When absent the main data
    /// document is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl PageRoute {
    fn new(path: &str, template: &str) -> Self {
        Self {
            path: path.to_string(),
            template: template.to_string(),
            data: None,
        }
    }
}

/// Route table used when `site.toml` has no `[[pages]]`.
pub fn default_pages() -> Vec<PageRoute> {
    vec![
        PageRoute::new("/privacy-policy", "policy.hbs"),
        PageRoute::new("/policy", "policy.hbs"),
        PageRoute::new("/all-review", "all-review.hbs"),
        PageRoute::new("/terms-and-conditions", "terms-and-conditions.hbs"),
        PageRoute::new("/Ausfreepokies", "Ausfreepokies.hbs"),
        PageRoute {
            path: "/about-us".to_string(),
            template: "subpages/about-us.hbs".to_string(),
            data: Some("subpages/about-us.json".to_string()),
        },
    ]
}

/// Template sections searched for slug pages, in priority order.
pub fn default_sections() -> Vec<String> {
    ["subpages", "subpage", "content", "games"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// The complete site.toml structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteToml {
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default = "default_pages")]
    pub pages: Vec<PageRoute>,
}

impl Default for SiteToml {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            server: ServerSection::default(),
            paths: PathsSection::default(),
            pages: default_pages(),
        }
    }
}

impl SiteToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse site.toml")
    }

    /// Load `site.toml` from the site root, or the defaults when it is absent.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize site.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Listener host (env overrides file).
    pub fn host(&self) -> String {
        std::env::var(ENV_HOST).unwrap_or_else(|_| self.server.host.clone())
    }

    /// Listener port (env overrides file). An unparsable env value is ignored.
    pub fn port(&self) -> u16 {
        match std::env::var(ENV_PORT) {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "ignoring invalid {}", ENV_PORT);
                self.server.port
            }),
            Err(_) => self.server.port,
        }
    }
}

/// Resolved configuration for one site root.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub root: PathBuf,
    pub toml: SiteToml,
    cli_host: Option<String>,
    cli_port: Option<u16>,
}

impl SiteConfig {
    /// Load the configuration of the site rooted at `root`.
    pub fn new(root: PathBuf) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve site root {}", root.display()))?;
        let toml = SiteToml::load_or_default(&root)?;
        Ok(Self::from_parts(root, toml))
    }

    /// Build a config from an already-parsed `site.toml`.
    pub fn from_parts(root: PathBuf, toml: SiteToml) -> Self {
        Self {
            root,
            toml,
            cli_host: None,
            cli_port: None,
        }
    }

    /// Create a SiteConfig with CLI overrides.
    pub fn with_cli_args(root: PathBuf, host: Option<String>, port: Option<u16>) -> Result<Self> {
        let mut config = Self::new(root)?;
        config.cli_host = host;
        config.cli_port = port;
        Ok(config)
    }

    /// Listener host (CLI → env → file → default).
    pub fn host(&self) -> String {
        self.cli_host.clone().unwrap_or_else(|| self.toml.host())
    }

    /// Listener port (CLI → env → file → default).
    pub fn port(&self) -> u16 {
        self.cli_port.unwrap_or_else(|| self.toml.port())
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(&self.toml.paths.templates)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(&self.toml.paths.data)
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join(&self.toml.paths.public)
    }

    /// The main data document.
    pub fn data_file(&self) -> PathBuf {
        self.data_dir().join(&self.toml.paths.data_file)
    }

    /// The home page template.
    pub fn main_template(&self) -> PathBuf {
        self.templates_dir().join(&self.toml.paths.main_template)
    }

    pub fn pages(&self) -> &[PageRoute] {
        &self.toml.pages
    }

    pub fn sections(&self) -> &[String] {
        &self.toml.sections
    }
}
