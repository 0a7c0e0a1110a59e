use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::fetch::DEFAULT_UNIT_CONCURRENCY;

pub const DEFAULT_URL: &str = "https://gisco-services.ec.europa.eu/distribution/v2/";
pub const DEFAULT_PARAM_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the distribution API.
    pub url: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
    /// Per-request timeout applied by the transport.
    pub timeout: Duration,
    /// Unit fetches allowed in flight at once within a batch.
    pub unit_concurrency: usize,
    /// Generic parameterized fetches allowed in flight at once.
    pub param_concurrency: usize,
    /// Show a progress bar for file downloads.
    pub progress: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            verify: true,
            timeout: DEFAULT_TIMEOUT,
            unit_concurrency: DEFAULT_UNIT_CONCURRENCY,
            param_concurrency: DEFAULT_PARAM_CONCURRENCY,
            progress: false,
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RcConfig {
    url: Option<String>,
    verify: Option<bool>,
    timeout: Option<Duration>,
    concurrency: Option<usize>,
}

impl RcConfig {
    fn or(self, other: RcConfig) -> RcConfig {
        RcConfig {
            url: self.url.or(other.url),
            verify: self.verify.or(other.verify),
            timeout: self.timeout.or(other.timeout),
            concurrency: self.concurrency.or(other.concurrency),
        }
    }
}

/// Resolves configuration from (in order of precedence):
/// - explicit `url`/`verify` arguments
/// - environment variables `GISCO_URL`, `GISCO_VERIFY`, `GISCO_TIMEOUT`, `GISCO_CONCURRENCY`
/// - config file from `GISCO_RC` or `.giscorc`
/// - built-in defaults
pub(crate) fn load_config(url: Option<String>, verify: Option<bool>) -> Result<ClientConfig> {
    let explicit = RcConfig {
        url,
        verify,
        ..RcConfig::default()
    };
    let env = env_config(|k| std::env::var(k).ok())?;
    let mut merged = explicit.or(env);

    let incomplete = merged.url.is_none()
        || merged.verify.is_none()
        || merged.timeout.is_none()
        || merged.concurrency.is_none();
    if let Some(path) = rc_path().filter(|p| incomplete && p.exists()) {
        let file = read_rc(&path)?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        merged = merged.or(file);
    }

    Ok(resolve(merged))
}

fn resolve(rc: RcConfig) -> ClientConfig {
    let defaults = ClientConfig::default();
    ClientConfig {
        url: rc.url.unwrap_or(defaults.url),
        verify: rc.verify.unwrap_or(defaults.verify),
        timeout: rc.timeout.unwrap_or(defaults.timeout),
        unit_concurrency: rc.concurrency.unwrap_or(defaults.unit_concurrency),
        ..defaults
    }
}

fn env_config(var: impl Fn(&str) -> Option<String>) -> Result<RcConfig> {
    Ok(RcConfig {
        url: var("GISCO_URL").filter(|v| !v.trim().is_empty()),
        verify: var("GISCO_VERIFY").map(|v| parse_bool(&v)),
        timeout: var("GISCO_TIMEOUT")
            .map(|v| parse_secs("GISCO_TIMEOUT", &v))
            .transpose()?,
        concurrency: var("GISCO_CONCURRENCY")
            .map(|v| parse_count("GISCO_CONCURRENCY", &v))
            .transpose()?,
    })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_rc(&text).map_err(|e| {
        Error::Config(format!(
            "failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })
}

fn parse_rc(text: &str) -> Result<RcConfig> {
    let mut cfg = RcConfig::default();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // `url: https://...` contains more than one colon, so split on the first.
        let Some((k, v)) = line.split_once(':') else {
            continue;
        };
        let v = unquote(v.trim());
        if v.is_empty() {
            continue;
        }
        match k.trim() {
            "url" => cfg.url = Some(v.to_string()),
            "verify" => cfg.verify = Some(parse_bool(v)),
            "timeout" => cfg.timeout = Some(parse_secs("timeout", v)?),
            "concurrency" => cfg.concurrency = Some(parse_count("concurrency", v)?),
            _ => {}
        }
    }

    Ok(cfg)
}

fn parse_bool(v: &str) -> bool {
    !matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn parse_secs(key: &str, v: &str) -> Result<Duration> {
    v.trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| {
            Error::Config(format!("{key} must be a positive number of seconds, got {v:?}"))
        })
}

fn parse_count(key: &str, v: &str) -> Result<usize> {
    v.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| Error::Config(format!("{key} must be a positive integer, got {v:?}")))
}

/// Value of an rc line with one pair of matching quotes removed.
fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q))
        .unwrap_or(value)
}

/// `GISCO_RC` if set, otherwise the first `.giscorc` found in the working or home directory.
fn rc_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("GISCO_RC") {
        return Some(PathBuf::from(path));
    }
    [std::env::current_dir().ok(), dirs::home_dir()]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(".giscorc"))
        .find(|path| path.exists())
}
