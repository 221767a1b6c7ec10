//! API-version overlay: a parallel per-version tree namespace consulted
//! only after the main tree misses.

use crate::context::RequestInfo;
use crate::error::VersioningConfigError;
use crate::registry::TreeRegistry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// Per-version deprecation metadata, consulted before invoking the handler
/// chain for a request that resolved to a non-default version.
#[derive(Debug, Clone, Default)]
pub struct VersionLifecycle {
    pub deprecated: bool,
    pub sunset: Option<SystemTime>,
    pub migration_docs_url: Option<String>,
}

impl VersionLifecycle {
    /// Whether the current wall-clock time is at or past `sunset`.
    pub fn is_sunset(&self, now: SystemTime) -> bool {
        self.sunset.is_some_and(|s| now >= s)
    }
}

/// A detection strategy tried in a fixed priority order: path prefix,
/// header, accept-header media type, query parameter, custom callback. The
/// first detector to return `Some` wins.
pub enum Detector {
    /// Template containing a `{version}` placeholder matched against the
    /// leading path segments, e.g. `/v{version}/`.
    PathPrefix(String),
    Header(String),
    /// Template containing a `{version}` placeholder matched against the
    /// `Accept` header, e.g. `application/vnd.api.{version}+json`.
    AcceptMediaType(String),
    Query(String),
    Custom(Box<dyn Fn(&RequestInfo) -> Option<String> + Send + Sync>),
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detector::PathPrefix(t) => write!(f, "PathPrefix({t})"),
            Detector::Header(h) => write!(f, "Header({h})"),
            Detector::AcceptMediaType(t) => write!(f, "AcceptMediaType({t})"),
            Detector::Query(q) => write!(f, "Query({q})"),
            Detector::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

fn template_prefix_and_suffix(template: &str) -> Option<(&str, &str)> {
    let idx = template.find("{version}")?;
    Some((&template[..idx], &template[idx + "{version}".len()..]))
}

impl Detector {
    fn validate(&self) -> Result<(), VersioningConfigError> {
        match self {
            Detector::PathPrefix(t) if template_prefix_and_suffix(t).is_none() => {
                Err(VersioningConfigError::InvalidPathTemplate { template: t.clone() })
            }
            Detector::AcceptMediaType(t) if template_prefix_and_suffix(t).is_none() => {
                Err(VersioningConfigError::InvalidAcceptTemplate { template: t.clone() })
            }
            _ => Ok(()),
        }
    }

    /// Attempt detection. For `PathPrefix`, also returns the path with the
    /// version segment stripped — stripping happens regardless of whether
    /// the extracted segment is a known version, so the version tree
    /// always sees the canonical path.
    fn detect(&self, req: &RequestInfo) -> Option<(String, Option<String>)> {
        match self {
            Detector::PathPrefix(template) => {
                let (prefix, suffix) = template_prefix_and_suffix(template)?;
                let rest = req.path.strip_prefix(prefix)?;
                let end = rest.find(suffix.chars().next().unwrap_or('/')).unwrap_or(rest.len());
                let (version, after) = rest.split_at(end);
                let stripped = format!("{prefix}{after}").replacen(prefix, "", 1);
                let stripped = if stripped.is_empty() { "/".to_string() } else { stripped };
                Some((version.to_string(), Some(stripped)))
            }
            Detector::Header(name) => req
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| (v.to_string(), None)),
            Detector::AcceptMediaType(template) => {
                let (prefix, suffix) = template_prefix_and_suffix(template)?;
                let accept = req.headers.get(http::header::ACCEPT)?.to_str().ok()?;
                let rest = accept.strip_prefix(prefix)?;
                let version = rest.strip_suffix(suffix)?;
                Some((version.to_string(), None))
            }
            Detector::Query(key) => {
                let pair = req
                    .raw_query
                    .split('&')
                    .find_map(|kv| kv.split_once('=').filter(|(k, _)| *k == key));
                pair.map(|(_, v)| (v.to_string(), None))
            }
            Detector::Custom(f) => f(req).map(|v| (v, None)),
        }
    }
}

/// Callbacks invoked synchronously during version detection. Implementors
/// must be non-blocking: these run on the hot path.
pub trait VersionObserver: Send + Sync {
    fn on_detected(&self, _version: &str, _method: &http::Method) {}
    fn on_missing(&self) {}
    fn on_invalid(&self, _attempted: &str) {}
}

/// Validated configuration for the version overlay.
pub struct VersioningOptions {
    pub detectors: Vec<Detector>,
    pub default_version: String,
    pub whitelist: Vec<String>,
    pub emit_headers: bool,
    pub enforce_sunset: bool,
    pub observer: Option<Arc<dyn VersionObserver>>,
}

impl VersioningOptions {
    pub fn validate(&self) -> Result<(), VersioningConfigError> {
        if self.detectors.is_empty() {
            return Err(VersioningConfigError::NoDetectorConfigured);
        }
        for d in &self.detectors {
            d.validate()?;
        }
        if !self.whitelist.is_empty() && !self.whitelist.contains(&self.default_version) {
            return Err(VersioningConfigError::DefaultNotInWhitelist {
                default: self.default_version.clone(),
            });
        }
        Ok(())
    }
}

/// `version -> tree registry` map, each published with the same
/// copy-on-write discipline as the main registry, plus per-version
/// lifecycle metadata.
pub struct VersionRegistry {
    trees: HashMap<String, TreeRegistry>,
    lifecycles: HashMap<String, VersionLifecycle>,
    options: VersioningOptions,
}

impl VersionRegistry {
    pub fn new(options: VersioningOptions) -> Result<Self, VersioningConfigError> {
        options.validate()?;
        Ok(Self {
            trees: HashMap::new(),
            lifecycles: HashMap::new(),
            options,
        })
    }

    /// Panics on invalid configuration, mirroring the donor crate's
    /// fail-fast `MustNew` convention.
    pub fn must_new(options: VersioningOptions) -> Self {
        match Self::new(options) {
            Ok(r) => r,
            Err(e) => panic!("invalid versioning configuration: {e}"),
        }
    }

    pub fn tree(&self, version: &str) -> Option<&TreeRegistry> {
        self.trees.get(version)
    }

    pub fn tree_or_insert(&mut self, version: &str) -> &TreeRegistry {
        self.trees
            .entry(version.to_string())
            .or_insert_with(TreeRegistry::new)
    }

    pub fn set_lifecycle(&mut self, version: impl Into<String>, lifecycle: VersionLifecycle) {
        self.lifecycles.insert(version.into(), lifecycle);
    }

    pub fn lifecycle(&self, version: &str) -> Option<&VersionLifecycle> {
        self.lifecycles.get(version)
    }

    pub fn default_version(&self) -> &str {
        &self.options.default_version
    }

    /// Run the detector chain and fire observer callbacks. Returns the
    /// detected version (or the configured default) and, for path-based
    /// detection, the path with the version segment stripped.
    pub fn detect(&self, req: &RequestInfo, method: &http::Method) -> (String, Option<String>) {
        for detector in &self.options.detectors {
            if let Some((version, stripped_path)) = detector.detect(req) {
                let accepted = self.whitelist_admits(&version);
                if accepted {
                    if let Some(o) = &self.options.observer {
                        o.on_detected(&version, method);
                    }
                    return (version, stripped_path);
                }
                if let Some(o) = &self.options.observer {
                    o.on_invalid(&version);
                }
                return (self.options.default_version.clone(), stripped_path);
            }
        }
        if let Some(o) = &self.options.observer {
            o.on_missing();
        }
        (self.options.default_version.clone(), None)
    }

    fn whitelist_admits(&self, version: &str) -> bool {
        self.options.whitelist.is_empty() || self.options.whitelist.iter().any(|v| v == version)
    }

    pub fn emit_headers(&self) -> bool {
        self.options.emit_headers
    }

    pub fn enforce_sunset(&self) -> bool {
        self.options.enforce_sunset
    }
}

/// Format a `SystemTime` as an RFC 7231 HTTP-date, e.g.
/// `Tue, 15 Nov 1994 08:12:31 GMT`. Hand-rolled rather than pulling in a
/// date/time crate for a single header value.
pub fn http_date(time: SystemTime) -> String {
    const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    let secs = time
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let days_since_epoch = secs / 86_400;
    let time_of_day = secs % 86_400;
    let (hour, minute, second) = (time_of_day / 3600, (time_of_day % 3600) / 60, time_of_day % 60);

    // Civil-from-days algorithm (Howard Hinnant's public-domain formula).
    let z = days_since_epoch as i64 + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { y + 1 } else { y };

    let weekday = ((days_since_epoch as i64 + 4).rem_euclid(7)) as usize;

    format!(
        "{}, {:02} {} {} {:02}:{:02}:{:02} GMT",
        DAYS[weekday],
        day,
        MONTHS[(month - 1) as usize],
        year,
        hour,
        minute,
        second
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, HeaderValue, Method};

    fn req(path: &str) -> RequestInfo {
        RequestInfo {
            method: Method::GET,
            path: path.to_string(),
            headers: HeaderMap::new(),
            raw_query: String::new(),
            cookie_header: None,
        }
    }

    #[test]
    fn rejects_empty_detector_list() {
        let opts = VersioningOptions {
            detectors: vec![],
            default_version: "v1".into(),
            whitelist: vec![],
            emit_headers: true,
            enforce_sunset: true,
            observer: None,
        };
        assert_eq!(opts.validate().unwrap_err(), VersioningConfigError::NoDetectorConfigured);
    }

    #[test]
    fn rejects_default_outside_whitelist() {
        let opts = VersioningOptions {
            detectors: vec![Detector::Header("X-Api-Version".into())],
            default_version: "v9".into(),
            whitelist: vec!["v1".into(), "v2".into()],
            emit_headers: true,
            enforce_sunset: true,
            observer: None,
        };
        assert!(matches!(
            opts.validate().unwrap_err(),
            VersioningConfigError::DefaultNotInWhitelist { .. }
        ));
    }

    #[test]
    fn path_prefix_detection_strips_the_version_segment() {
        let detector = Detector::PathPrefix("/v{version}/".into());
        let (version, stripped) = detector.detect(&req("/v2/users/1")).unwrap();
        assert_eq!(version, "2");
        assert_eq!(stripped.as_deref(), Some("/users/1"));
    }

    #[test]
    fn header_detection_reads_the_configured_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-version", HeaderValue::from_static("3"));
        let mut r = req("/users");
        r.headers = headers;
        let detector = Detector::Header("x-api-version".into());
        let (version, stripped) = detector.detect(&r).unwrap();
        assert_eq!(version, "3");
        assert!(stripped.is_none());
    }

    #[test]
    fn unknown_version_falls_back_to_default_and_fires_on_invalid() {
        struct Observed(std::sync::Mutex<Option<String>>);
        impl VersionObserver for Observed {
            fn on_invalid(&self, attempted: &str) {
                *self.0.lock().unwrap() = Some(attempted.to_string());
            }
        }
        let observer = Arc::new(Observed(std::sync::Mutex::new(None)));
        let registry = VersionRegistry::new(VersioningOptions {
            detectors: vec![Detector::Header("x-api-version".into())],
            default_version: "v1".into(),
            whitelist: vec!["v1".into()],
            emit_headers: true,
            enforce_sunset: true,
            observer: Some(observer.clone()),
        })
        .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-api-version", HeaderValue::from_static("v99"));
        let mut r = req("/users");
        r.headers = headers;

        let (version, _) = registry.detect(&r, &Method::GET);
        assert_eq!(version, "v1");
        assert_eq!(observer.0.lock().unwrap().as_deref(), Some("v99"));
    }

    #[test]
    fn sunset_check_compares_against_supplied_instant() {
        let lifecycle = VersionLifecycle {
            deprecated: true,
            sunset: Some(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1000)),
            migration_docs_url: None,
        };
        assert!(lifecycle.is_sunset(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(2000)));
        assert!(!lifecycle.is_sunset(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(500)));
    }

    #[test]
    fn http_date_matches_known_instant() {
        // 1994-11-15T08:12:31Z is the canonical RFC 7231 example.
        let t = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(784_887_151);
        assert_eq!(http_date(t), "Tue, 15 Nov 1994 08:12:31 GMT");
    }
}
