use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Directory to serve. Required; canonicalized once at startup.
    #[serde(rename = "HomeDirectory", alias = "home_directory", default)]
    pub home_directory: Option<PathBuf>,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// URL prefix every route is nested under. Empty or `/` mounts at the root.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: usize,
    #[serde(default)]
    pub tls: TlsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5120))
}

fn default_route_prefix() -> String {
    "/test".to_string()
}

fn default_max_upload_size_mb() -> usize {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            home_directory: None,
            bind_addr: default_bind_addr(),
            route_prefix: default_route_prefix(),
            max_upload_size_mb: default_max_upload_size_mb(),
            tls: TlsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads the config file named by `DIRSERVE_CONFIG` (if any) and applies
    /// `DIRSERVE_*` environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::load`], reading variables through `env`.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = match env("DIRSERVE_CONFIG") {
            Some(path) => {
                let contents = std::fs::read_to_string(&path)?;
                Self::from_toml(&contents)?
            }
            None => ServerConfig::default(),
        };

        if let Some(home) = env("DIRSERVE_HOME_DIRECTORY") {
            config.home_directory = Some(PathBuf::from(home));
        }

        if let Some(addr) = env("DIRSERVE_BIND_ADDR") {
            config.bind_addr = addr.parse()?;
        }

        if let Some(prefix) = env("DIRSERVE_ROUTE_PREFIX") {
            config.route_prefix = prefix;
        }

        if let Some(val) = env("DIRSERVE_MAX_UPLOAD_SIZE_MB") {
            match val.parse::<usize>() {
                Ok(mb) => config.max_upload_size_mb = mb,
                Err(_) => tracing::warn!("Ignoring invalid DIRSERVE_MAX_UPLOAD_SIZE_MB: {val}"),
            }
        }

        if let Some(cert) = env("DIRSERVE_TLS_CERT") {
            config.tls.cert_path = Some(cert);
        }
        if let Some(key) = env("DIRSERVE_TLS_KEY") {
            config.tls.key_path = Some(key);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let Some(home) = &self.home_directory else {
            anyhow::bail!(
                "HomeDirectory is not configured. \
                 Set it in the config file or via DIRSERVE_HOME_DIRECTORY."
            );
        };
        if !home.is_absolute() {
            anyhow::bail!("HomeDirectory must be an absolute path: {}", home.display());
        }
        Ok(())
    }

    /// Route prefix with a leading `/` and no trailing `/`; empty for the root.
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.route_prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls.cert_path.is_some() && self.tls.key_path.is_some()
    }
}
