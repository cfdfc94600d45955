use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dockwatch_core::AllowList;
use dockwatch_core::container::DEFAULT_EXCLUDED_NAME;
use dockwatch_core::docker::DEFAULT_LOG_LINES;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_IDENTITY_HEADER: &str = "x-auth-request-user";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid {var} '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Permanently authorized usernames. Must not be empty.
    pub allowed_users: AllowList,
    pub remote: RemoteConfig,
    pub poll_interval: Duration,
    /// Log lines fetched per container.
    pub log_tail_lines: usize,
    /// Upper bound on any single remote command.
    pub command_timeout: Duration,
    /// Containers whose name contains this substring are hidden.
    pub excluded_name: String,
    /// Request header carrying the username set by the auth proxy.
    pub identity_header: String,
    /// Expose the arbitrary command endpoint to allow-listed users.
    pub enable_execute: bool,
}

/// Where container commands run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteConfig {
    /// `sh -c` on the dashboard host itself.
    Local,
    Ssh(SshConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshConfig {
    pub host: String,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<PathBuf>,
    /// Directory for the multiplexing control socket.
    pub control_dir: PathBuf,
}

impl SshConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: None,
            identity_file: None,
            control_dir: std::env::temp_dir(),
        }
    }

    /// `user@host`, or just `host`.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            allowed_users: AllowList::default(),
            remote: RemoteConfig::Local,
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_tail_lines: DEFAULT_LOG_LINES,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            excluded_name: DEFAULT_EXCLUDED_NAME.to_string(),
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
            enable_execute: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from a variable lookup. Unset and blank
    /// variables fall back to defaults, except `ALLOWED_USERS`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(bind) = get("DOCKWATCH_BIND") {
            cfg.bind = parse_var("DOCKWATCH_BIND", &bind)?;
        } else if let Some(port) = get("PORT") {
            let port: u16 = parse_var("PORT", &port)?;
            cfg.bind.set_port(port);
        }

        let allowed = get("ALLOWED_USERS").ok_or(ConfigError::Missing("ALLOWED_USERS"))?;
        cfg.allowed_users = AllowList::parse(&allowed);
        if cfg.allowed_users.is_empty() {
            return Err(ConfigError::Missing("ALLOWED_USERS"));
        }

        if let Some(host) = get("REMOTE_HOST") {
            let mut ssh = SshConfig::new(host.trim());
            ssh.user = get("REMOTE_USER").map(|u| u.trim().to_string());
            ssh.identity_file = get("REMOTE_SSH_KEY").map(PathBuf::from);
            if let Some(port) = get("REMOTE_PORT") {
                ssh.port = Some(parse_var("REMOTE_PORT", &port)?);
            }
            if let Some(dir) = get("REMOTE_CONTROL_DIR") {
                ssh.control_dir = PathBuf::from(dir);
            }
            cfg.remote = RemoteConfig::Ssh(ssh);
        }

        if let Some(secs) = get("POLL_INTERVAL_SECS") {
            cfg.poll_interval = positive_secs("POLL_INTERVAL_SECS", &secs)?;
        }
        if let Some(secs) = get("COMMAND_TIMEOUT_SECS") {
            cfg.command_timeout = positive_secs("COMMAND_TIMEOUT_SECS", &secs)?;
        }
        if let Some(lines) = get("LOG_TAIL_LINES") {
            cfg.log_tail_lines = parse_var("LOG_TAIL_LINES", &lines)?;
        }
        if let Some(name) = lookup("EXCLUDE_NAME") {
            cfg.excluded_name = name.trim().to_string();
        }
        if let Some(header) = get("IDENTITY_HEADER") {
            cfg.identity_header = header.trim().to_ascii_lowercase();
        }
        if let Some(flag) = get("ENABLE_EXECUTE") {
            cfg.enable_execute = parse_bool("ENABLE_EXECUTE", &flag)?;
        }
        Ok(cfg)
    }
}

fn parse_var<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn positive_secs(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_var(var, raw)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected a boolean".into(),
        }),
    }
}
