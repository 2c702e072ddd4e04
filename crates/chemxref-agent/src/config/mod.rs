//! Configuration loading for chemxref.
//! Reads chemxref.toml from the current directory or the path in the CHEMXREF_CONFIG env var.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chemxref_common::entities::IdentifierKind;
use chemxref_similarity::{MissingPolicy, MorganCapability};
use chemxref_sources::chembl::CHEMBL_API_URL;
use chemxref_sources::drugbank::DRUGBANK_URL;
use chemxref_sources::pubchem::PUBCHEM_URL;
use chemxref_sources::unichem::UNICHEM_URL;
use chemxref_sources::webdriver::{WebDriverOptions, DEFAULT_WEBDRIVER_URL};
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "CHEMXREF_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "chemxref.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
    /// Extra `bad = "good"` ChEMBL corrections on top of the built-in ones.
    #[serde(default)]
    pub remap: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_drugbank_url")]
    pub drugbank_url: String,
    #[serde(default = "default_unichem_url")]
    pub unichem_url: String,
    #[serde(default = "default_chembl_url")]
    pub chembl_url: String,
    #[serde(default = "default_pubchem_url")]
    pub pubchem_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_drugbank_url() -> String { DRUGBANK_URL.to_string() }
fn default_unichem_url()  -> String { UNICHEM_URL.to_string() }
fn default_chembl_url()   -> String { CHEMBL_API_URL.to_string() }
fn default_pubchem_url()  -> String { PUBCHEM_URL.to_string() }
fn default_timeout_secs() -> u64    { 30 }

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            drugbank_url: default_drugbank_url(),
            unichem_url: default_unichem_url(),
            chembl_url: default_chembl_url(),
            pubchem_url: default_pubchem_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// When false the interactive DrugBank search is never attempted.
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "bool_true")]
    pub headless: bool,
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,
}

fn bool_true()                  -> bool   { true }
fn default_webdriver_url()      -> String { DEFAULT_WEBDRIVER_URL.to_string() }
fn default_navigation_timeout() -> u64    { 15 }

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webdriver_url: default_webdriver_url(),
            headless: true,
            navigation_timeout_secs: default_navigation_timeout(),
        }
    }
}

impl BrowserConfig {
    pub fn webdriver_options(&self, home_url: &str) -> WebDriverOptions {
        WebDriverOptions {
            webdriver_url: self.webdriver_url.clone(),
            home_url: home_url.to_string(),
            headless: self.headless,
            navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    #[serde(default)]
    pub policy: MissingPolicy,
    #[serde(default = "default_radius")]
    pub radius: usize,
    #[serde(default = "default_nbits")]
    pub nbits: usize,
}

fn default_radius() -> usize { 2 }
fn default_nbits()  -> usize { 2048 }

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self { policy: MissingPolicy::default(), radius: default_radius(), nbits: default_nbits() }
    }
}

impl SimilarityConfig {
    pub fn capability(&self) -> MorganCapability {
        MorganCapability { radius: self.radius, nbits: self.nbits }
    }
}


impl Config {
    /// Load configuration from chemxref.toml.
    /// `explicit` wins, then the CHEMXREF_CONFIG env var, then the current directory.
    /// A missing file is not an error: defaults are used and a warning logged.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => std::env::var(CONFIG_ENV)
                .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
                .into(),
        };

        if !path.exists() {
            tracing::warn!(
                "Config file not found: {}. Using defaults \
                 (copy chemxref.example.toml to chemxref.toml to customise).",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.similarity.nbits == 0 {
            anyhow::bail!("similarity.nbits must be greater than zero");
        }
        if self.sources.timeout_secs == 0 {
            anyhow::bail!("sources.timeout_secs must be greater than zero");
        }
        for (bad, good) in &self.remap {
            for id in [bad, good] {
                if IdentifierKind::detect(id) != Some(IdentifierKind::Chembl) {
                    anyhow::bail!("remap entry {bad} = {good}: '{id}' is not a ChEMBL id");
                }
            }
        }
        Ok(())
    }
}
