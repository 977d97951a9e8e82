// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration.
//!
//! TOML file with a `[Runtime]` table; key names contain dots and are
//! quoted in the file, e.g. `"Reap.Expiry" = 45`. Every key is optional;
//! directory defaults derive from `$HOME`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use scopes_core::{Error, Result};
use scopes_wire::Endpoint;

const RUNTIME_GROUP: &str = "Runtime";

const REGISTRY_IDENTITY_KEY: &str = "Registry.Identity";
const REGISTRY_CONFIGFILE_KEY: &str = "Registry.ConfigFile";
const DEFAULT_MIDDLEWARE_KEY: &str = "Default.Middleware";
const MIDDLEWARE_CONFIGFILE_SUFFIX: &str = ".ConfigFile";
const REAP_EXPIRY_KEY: &str = "Reap.Expiry";
const REAP_INTERVAL_KEY: &str = "Reap.Interval";
const CACHE_DIR_KEY: &str = "CacheDir";
const APP_DIR_KEY: &str = "AppDir";
const CONFIG_DIR_KEY: &str = "ConfigDir";
const LOG_DIR_KEY: &str = "LogDir";
const MAX_LOG_FILE_SIZE_KEY: &str = "MaxLogFileSize";
const MAX_LOG_DIR_SIZE_KEY: &str = "MaxLogDirSize";

const DFLT_REGISTRY_IDENTITY: &str = "Registry";
const DFLT_MIDDLEWARE: &str = "socket";
const DFLT_REAP_EXPIRY: i64 = 45;
const DFLT_REAP_INTERVAL: i64 = 10;
const DFLT_MAX_LOG_FILE_SIZE: i64 = 1024 * 1024;
const DFLT_MAX_LOG_DIR_SIZE: i64 = 10 * 1024 * 1024;

/// The sentinel value that disables reaping.
pub const REAP_DISABLED: i64 = -1;

/// Parsed runtime configuration. Reap intervals are in seconds, with −1
/// meaning disabled.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub registry_identity: String,
    pub registry_configfile: Option<PathBuf>,
    pub default_middleware: String,
    pub middleware_configfile: Option<PathBuf>,
    pub reap_expiry: i64,
    pub reap_interval: i64,
    pub cache_dir: PathBuf,
    pub app_dir: PathBuf,
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
    pub max_log_file_size: u64,
    pub max_log_dir_size: u64,
}

impl RuntimeConfig {
    /// Load from a file, or build the all-defaults configuration when no
    /// path is given.
    pub fn load(configfile: Option<&Path>) -> Result<Self> {
        match configfile {
            Some(path) => Self::from_file(path),
            None => Self::defaults(),
        }
    }

    fn defaults() -> Result<Self> {
        let cache_dir = default_cache_dir()?;
        let log_dir = cache_dir.join("logs");
        Ok(Self {
            registry_identity: DFLT_REGISTRY_IDENTITY.into(),
            registry_configfile: None,
            default_middleware: DFLT_MIDDLEWARE.into(),
            middleware_configfile: None,
            reap_expiry: DFLT_REAP_EXPIRY,
            reap_interval: DFLT_REAP_INTERVAL,
            cache_dir,
            app_dir: default_app_dir()?,
            config_dir: default_config_dir()?,
            log_dir,
            max_log_file_size: DFLT_MAX_LOG_FILE_SIZE as u64,
            max_log_dir_size: DFLT_MAX_LOG_DIR_SIZE as u64,
        })
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::ResourceError(format!("cannot read config {:?}: {}", path.display(), e))
        })?;
        let value: toml::Value = toml::from_str(&text).map_err(|e| {
            Error::InvalidArgument(format!("malformed config {:?}: {}", path.display(), e))
        })?;
        let group = Group::new(&value, RUNTIME_GROUP);

        let reap_expiry = group.int(REAP_EXPIRY_KEY, DFLT_REAP_EXPIRY)?;
        if reap_expiry < 1 && reap_expiry != REAP_DISABLED {
            return Err(illegal_value(reap_expiry, REAP_EXPIRY_KEY));
        }
        let reap_interval = group.int(REAP_INTERVAL_KEY, DFLT_REAP_INTERVAL)?;
        if reap_interval < 1 && reap_interval != REAP_DISABLED {
            return Err(illegal_value(reap_interval, REAP_INTERVAL_KEY));
        }

        let max_log_file_size = group.int(MAX_LOG_FILE_SIZE_KEY, DFLT_MAX_LOG_FILE_SIZE)?;
        if max_log_file_size < 1024 {
            return Err(Error::InvalidArgument(format!(
                "illegal value ({}) for {}: value must be >= 1024",
                max_log_file_size, MAX_LOG_FILE_SIZE_KEY
            )));
        }
        let max_log_dir_size = group.int(MAX_LOG_DIR_SIZE_KEY, DFLT_MAX_LOG_DIR_SIZE)?;
        if max_log_dir_size <= max_log_file_size {
            return Err(Error::InvalidArgument(format!(
                "illegal value ({}) for {}: value must be > {}",
                max_log_dir_size, MAX_LOG_DIR_SIZE_KEY, MAX_LOG_FILE_SIZE_KEY
            )));
        }

        let default_middleware =
            group.string(DEFAULT_MIDDLEWARE_KEY)?.unwrap_or_else(|| DFLT_MIDDLEWARE.into());
        if default_middleware.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "illegal empty value for {}",
                DEFAULT_MIDDLEWARE_KEY
            )));
        }
        let middleware_configfile_key =
            format!("{}{}", default_middleware, MIDDLEWARE_CONFIGFILE_SUFFIX);
        let middleware_configfile =
            group.string(&middleware_configfile_key)?.map(PathBuf::from);

        let cache_dir = match group.string(CACHE_DIR_KEY)? {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_cache_dir()?,
        };
        let app_dir = match group.string(APP_DIR_KEY)? {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_app_dir()?,
        };
        let config_dir = match group.string(CONFIG_DIR_KEY)? {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => default_config_dir()?,
        };
        let log_dir = match group.string(LOG_DIR_KEY)? {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => cache_dir.join("logs"),
        };

        Ok(Self {
            registry_identity: group
                .string(REGISTRY_IDENTITY_KEY)?
                .unwrap_or_else(|| DFLT_REGISTRY_IDENTITY.into()),
            registry_configfile: group.string(REGISTRY_CONFIGFILE_KEY)?.map(PathBuf::from),
            default_middleware,
            middleware_configfile,
            reap_expiry,
            reap_interval,
            cache_dir,
            app_dir,
            config_dir,
            log_dir,
            max_log_file_size: max_log_file_size as u64,
            max_log_dir_size: max_log_dir_size as u64,
        })
    }

    /// Reaper intervals, or `None` when reaping is disabled by sentinel.
    pub fn reaper_intervals(&self) -> Option<(Duration, Duration)> {
        if self.reap_expiry == REAP_DISABLED || self.reap_interval == REAP_DISABLED {
            return None;
        }
        Some((
            Duration::from_secs(self.reap_interval as u64),
            Duration::from_secs(self.reap_expiry as u64),
        ))
    }

    /// Directory holding the per-identity Unix sockets.
    pub fn endpoints_dir(&self) -> PathBuf {
        self.cache_dir.join("endpoints")
    }

    /// Endpoint at which an identity publishes itself.
    pub fn endpoint_for(&self, identity: &str) -> Endpoint {
        Endpoint::Unix(self.endpoints_dir().join(format!("{}.sock", identity)))
    }

    /// Endpoint of the registry.
    pub fn registry_endpoint(&self) -> Endpoint {
        self.endpoint_for(&self.registry_identity)
    }
}

fn illegal_value(value: i64, key: &str) -> Error {
    Error::InvalidArgument(format!("illegal value ({}) for {}: value must be > 0", value, key))
}

/// One named table in the config file; missing table means all defaults.
struct Group<'a> {
    table: Option<&'a toml::value::Table>,
    group: &'a str,
}

impl<'a> Group<'a> {
    fn new(value: &'a toml::Value, group: &'a str) -> Self {
        Self { table: value.get(group).and_then(|v| v.as_table()), group }
    }

    fn string(&self, key: &str) -> Result<Option<String>> {
        match self.table.and_then(|t| t.get(key)) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.type_error(key, "a string", other)),
        }
    }

    fn int(&self, key: &str, default: i64) -> Result<i64> {
        match self.table.and_then(|t| t.get(key)) {
            None => Ok(default),
            Some(toml::Value::Integer(i)) => Ok(*i),
            Some(other) => Err(self.type_error(key, "an integer", other)),
        }
    }

    fn type_error(&self, key: &str, wanted: &str, got: &toml::Value) -> Error {
        Error::InvalidArgument(format!(
            "{}.{} must be {}, found {}",
            self.group,
            key,
            wanted,
            got.type_str()
        ))
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| Error::ResourceError("cannot determine home directory ($HOME not set)".into()))
}

fn default_cache_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(".cache").join("scopes"))
}

fn default_app_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(".local").join("share").join("scopes"))
}

fn default_config_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join(".config").join("scopes"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
