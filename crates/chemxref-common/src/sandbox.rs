use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::XrefError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("chemxref/", env!("CARGO_PKG_VERSION"));

/// An HTTP client that only allows requests to approved catalog domains.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a new SandboxClient with the default allowlist of drug catalogs.
    pub fn new() -> Result<Self, XrefError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Same as [`SandboxClient::new`] with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, XrefError> {
        let mut allowlist = HashSet::new();
        let domains = vec![
            "go.drugbank.com",            // DrugBank (current)
            "www.drugbank.ca",            // DrugBank (legacy)
            "www.drugbank.com",           // DrugBank (redirect target)
            "www.ebi.ac.uk",              // ChEMBL, UniChem
            "pubchem.ncbi.nlm.nih.gov",   // PubChem PUG REST
            "localhost",                  // WebDriver
            "127.0.0.1",                  // WebDriver alt
        ];

        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| XrefError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Allows the host of `url`, if it has one. Used for configured base URLs.
    pub fn allow_url_host(&mut self, url: &str) {
        if let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(String::from)) {
            self.allowlist.insert(host);
        }
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Check exact match or if it's a subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    fn check(&self, url: &str) -> Result<(), XrefError> {
        if !self.is_allowed(url) {
            tracing::warn!(url, "Blocked request outside the sandbox allowlist");
            return Err(XrefError::SecurityError(format!(
                "Network capabilities capped: domain not in allowlist for URL {}",
                url
            )));
        }
        Ok(())
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, XrefError> {
        self.check(url)?;
        Ok(self.client.get(url))
    }

    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, XrefError> {
        self.check(url)?;
        Ok(self.client.post(url))
    }

    pub fn delete(&self, url: &str) -> Result<reqwest::RequestBuilder, XrefError> {
        self.check(url)?;
        Ok(self.client.delete(url))
    }
}
