use std::env;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tracing::debug;

use crate::error::ConfigError;
use crate::render::DisplayLayout;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_OUTPUT_DIR: &str = "annotated";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base url; `recognize` and reply image paths are resolved against it.
    pub endpoint: Url,
    pub request_timeout: Duration,
    pub display: DisplayLayout,
    pub output_dir: PathBuf,
}

impl Settings {
    /// Reads `THREADFINDER_*` variables, after loading `.env` if one exists.
    pub fn from_env() -> Result<Settings, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("loaded {}", path.display());
        }
        Settings::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = DisplayLayout::default();
        Ok(Settings {
            endpoint: parse_endpoint(&lookup("THREADFINDER_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()))?,
            request_timeout: Duration::from_secs(parse_or(&lookup, "THREADFINDER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?),
            display: DisplayLayout {
                max_width: parse_or(&lookup, "THREADFINDER_DISPLAY_WIDTH", defaults.max_width)?,
                max_height: parse_or(&lookup, "THREADFINDER_DISPLAY_HEIGHT", defaults.max_height)?,
            },
            output_dir: lookup("THREADFINDER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        })
    }
}

/// Parses an endpoint, adding the trailing slash `Url::join` needs to keep a path prefix.
pub fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let with_slash = if raw.ends_with('/') { raw.to_owned() } else { format!("{raw}/") };
    let url = Url::parse(&with_slash).map_err(|err| ConfigError::Endpoint {
        url: raw.to_owned(),
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Endpoint {
            url: raw.to_owned(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(pairs: &[(&'static str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<_, _> = pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(settings.request_timeout, Duration::from_secs(60));
        assert_eq!(settings.display, DisplayLayout { max_width: 1024, max_height: 768 });
        assert_eq!(settings.output_dir, PathBuf::from("annotated"));
    }

    #[test]
    fn overrides_are_applied() {
        let settings = settings(&[
            ("THREADFINDER_ENDPOINT", "https://faces.example/app"),
            ("THREADFINDER_TIMEOUT_SECS", "5"),
            ("THREADFINDER_DISPLAY_WIDTH", " 640 "),
            ("THREADFINDER_DISPLAY_HEIGHT", "0"),
            ("THREADFINDER_OUTPUT_DIR", "/tmp/out"),
        ])
        .unwrap();
        assert_eq!(settings.endpoint.as_str(), "https://faces.example/app/");
        assert_eq!(settings.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.display, DisplayLayout { max_width: 640, max_height: 0 });
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn bad_values_are_reported() {
        let err = settings(&[("THREADFINDER_DISPLAY_WIDTH", "wide")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "THREADFINDER_DISPLAY_WIDTH", .. }));

        assert!(matches!(
            settings(&[("THREADFINDER_ENDPOINT", "ftp://faces")]),
            Err(ConfigError::Endpoint { .. })
        ));
        assert!(matches!(
            settings(&[("THREADFINDER_ENDPOINT", "not a url")]),
            Err(ConfigError::Endpoint { .. })
        ));
    }
}
