//! Enforcement service configuration.
//!
//! # Purpose
//! Loads settings from `EMILOCK_*` environment variables, then applies an
//! optional YAML override file named by `EMILOCK_CONFIG`.
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_SESSION_ISSUER: &str = "emilock-auth";
pub const DEFAULT_COUNTRY_CODE: &str = "+91";
pub const DEFAULT_PROJECT_ID: &str = "emilocker-a9f98";
pub const DEFAULT_AGENT_COMPONENT: &str = "com.emilocker.mdm/.receiver.DeviceAdminReceiver";
pub const DEFAULT_AGENT_PACKAGE_URL: &str =
    "https://storage.googleapis.com/emilocker-assets/latest-agent.apk";
pub const DEFAULT_OVERLAY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_SESSION_LEEWAY_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

/// Who counts as a platform owner (SuperAdmin).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerConfig {
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    /// Treat anonymous sessions as SuperAdmin. Off unless explicitly enabled.
    #[serde(default)]
    pub allow_anonymous_admin: bool,
    pub default_country_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub leeway_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningConfig {
    pub server_origin: String,
    pub project_id: String,
    pub admin_component: String,
    pub package_url: String,
    pub signature_checksum: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverlayConfig {
    pub url: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone)]
pub struct EnforcerConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub session: SessionConfig,
    pub owners: OwnerConfig,
    pub provisioning: ProvisioningConfig,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Deserialize)]
struct EnforcerConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<StorageBackend>,
    postgres: Option<PostgresConfig>,
    session: Option<SessionConfig>,
    owners: Option<OwnerConfig>,
    provisioning: Option<ProvisioningConfig>,
    overlay: Option<OverlayConfig>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}

fn parse_storage(raw: &str) -> Result<StorageBackend> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(StorageBackend::Memory),
        "postgres" => Ok(StorageBackend::Postgres),
        other => bail!("unknown storage backend: {other}"),
    }
}

impl EnforcerConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("EMILOCK_BIND", "0.0.0.0:8443")
            .parse()
            .with_context(|| "parse EMILOCK_BIND")?;
        let metrics_bind = env_or("EMILOCK_METRICS_BIND", "0.0.0.0:8080")
            .parse()
            .with_context(|| "parse EMILOCK_METRICS_BIND")?;
        let storage = parse_storage(&env_or("EMILOCK_STORAGE", "memory"))?;
        let postgres = match std::env::var("EMILOCK_PG_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse("EMILOCK_PG_MAX_CONNECTIONS", 10)?,
                connect_timeout_ms: env_parse("EMILOCK_PG_CONNECT_TIMEOUT_MS", 5_000)?,
                acquire_timeout_ms: env_parse("EMILOCK_PG_ACQUIRE_TIMEOUT_MS", 5_000)?,
            }),
            Err(_) => None,
        };
        let bind_port = env_or("EMILOCK_BIND", "0.0.0.0:8443")
            .rsplit(':')
            .next()
            .unwrap_or("8443")
            .to_string();
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            session: SessionConfig {
                secret: env_or("EMILOCK_SESSION_SECRET", ""),
                issuer: env_or("EMILOCK_SESSION_ISSUER", DEFAULT_SESSION_ISSUER),
                leeway_secs: env_parse("EMILOCK_SESSION_LEEWAY_SECS", DEFAULT_SESSION_LEEWAY_SECS)?,
            },
            owners: OwnerConfig {
                phones: env_list("EMILOCK_ADMIN_PHONES"),
                emails: env_list("EMILOCK_ADMIN_EMAILS"),
                allow_anonymous_admin: env_parse("EMILOCK_ALLOW_ANONYMOUS_ADMIN", false)?,
                default_country_code: env_or("EMILOCK_DEFAULT_COUNTRY_CODE", DEFAULT_COUNTRY_CODE),
            },
            provisioning: ProvisioningConfig {
                server_origin: env_or(
                    "EMILOCK_SERVER_ORIGIN",
                    &format!("http://localhost:{bind_port}"),
                ),
                project_id: env_or("EMILOCK_PROJECT_ID", DEFAULT_PROJECT_ID),
                admin_component: env_or("EMILOCK_AGENT_COMPONENT", DEFAULT_AGENT_COMPONENT),
                package_url: env_or("EMILOCK_AGENT_PACKAGE_URL", DEFAULT_AGENT_PACKAGE_URL),
                signature_checksum: env_or("EMILOCK_AGENT_SIGNATURE_CHECKSUM", ""),
            },
            overlay: OverlayConfig {
                url: std::env::var("EMILOCK_OVERLAY_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
                timeout_ms: env_parse("EMILOCK_OVERLAY_TIMEOUT_MS", DEFAULT_OVERLAY_TIMEOUT_MS)?,
            },
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("EMILOCK_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read EMILOCK_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: EnforcerConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse enforcer config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = value;
        }
        if let Some(value) = override_cfg.postgres {
            self.postgres = Some(value);
        }
        if let Some(value) = override_cfg.session {
            self.session = value;
        }
        if let Some(value) = override_cfg.owners {
            self.owners = value;
        }
        if let Some(value) = override_cfg.provisioning {
            self.provisioning = value;
        }
        if let Some(value) = override_cfg.overlay {
            self.overlay = value;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.session.secret.len() < 16 {
            bail!("EMILOCK_SESSION_SECRET must be at least 16 bytes");
        }
        if self.storage == StorageBackend::Postgres && self.postgres.is_none() {
            bail!("postgres storage selected but EMILOCK_PG_URL is not set");
        }
        Ok(())
    }
}
