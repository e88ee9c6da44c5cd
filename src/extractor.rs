//! Identifier Extractor
//!
//! Classifies one log record: is it an update-check API call, and if so,
//! which stable per-installation key (if any) does it carry?
//!
//! The key depends on the protocol version reported in the request query:
//!
//! - `1.0.0-alpha*` / `1.0.0-beta*` clients sent their site URL directly in
//!   the user agent; the key is a SHA-1 digest of the normalized URL.
//! - `1.0.0-rc1` / `1.0.0-rc2` clients sent no identifier at all.
//! - All later clients embed an anonymous identifier in a `site` query
//!   parameter of a URL carried in the user agent.
//!
//! Classification is pure apart from the diagnostic counters on [`RunStats`],
//! which the caller owns.

use crate::models::{ApiCall, Classification, LogRecord, RunStats};
use regex::Regex;
use sha1::{Digest, Sha1};
use std::sync::OnceLock;
use url::Url;

/// Update-check endpoint: `/upgrade/<name>.json?<query>`.
fn endpoint_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/upgrade/[^/]+\.json\?(.*)$").expect("valid pattern"))
}

/// Site URL embedded in a user agent after the last `; http:`/`; https:`
/// marker, with the scheme stripped.
fn legacy_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^.*; https?:(.*)$").expect("valid pattern"))
}

/// Same marker, but keeping the scheme so the fragment parses as a full URL.
fn anonymous_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^.*; (https?:.*)$").expect("valid pattern"))
}

/// Classify one record. Increments the API-call and parse-failure counters
/// on `stats`; estimation math never depends on them.
pub fn classify(record: &LogRecord, stats: &mut RunStats) -> Classification {
    let Some(query) = endpoint_query(&record.url) else {
        return Classification::NotApiCall;
    };
    let Some(version) = query_param(query, "version") else {
        return Classification::NotApiCall;
    };

    // Build metadata (`+...`) never affects protocol classification.
    let version_base = version.split('+').next().unwrap_or_default();

    let site_key = if version_base.starts_with("1.0.0-alpha")
        || version_base.starts_with("1.0.0-beta")
    {
        // These protocol versions sent the site URL directly.
        legacy_site_key(&record.user_agent)
    } else if version_base == "1.0.0-rc1" || version_base == "1.0.0-rc2" {
        // These protocol versions sent no site identifier.
        None
    } else {
        // Later protocol versions send an anonymous site identifier.
        match anonymous_site_key(&record.user_agent) {
            Ok(key) => key,
            Err(_) => {
                stats.failed_records += 1;
                None
            }
        }
    };

    stats.api_records += 1;
    Classification::ApiCall(ApiCall {
        ip: record.remote_host.clone(),
        site_key,
    })
}

/// The query string of an update-check URL, or `None` for any other path.
fn endpoint_query(url: &str) -> Option<&str> {
    endpoint_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Content-derived key for legacy clients: SHA-1 of the scheme-stripped,
/// trailing-slash-stripped, lower-cased site URL. A user agent without the
/// URL marker yields no key.
fn legacy_site_key(user_agent: &str) -> Option<String> {
    let raw = legacy_url_pattern()
        .captures(user_agent)
        .and_then(|caps| caps.get(1))?
        .as_str();
    let normalized = raw.trim_end_matches('/').to_lowercase();

    let mut hasher = Sha1::new();
    hasher.update(normalized.as_bytes());
    Some(format!("{:x}", hasher.finalize()))
}

/// Anonymous key: the `site` query parameter of the URL embedded in the user
/// agent. An unparseable fragment is an error (counted by the caller); a
/// parseable URL without a non-empty `site` parameter simply has no key.
fn anonymous_site_key(user_agent: &str) -> Result<Option<String>, url::ParseError> {
    let candidate = anonymous_url_pattern()
        .captures(user_agent)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(user_agent);

    let parsed = Url::parse(candidate)?;
    Ok(parsed
        .query_pairs()
        .find(|(key, _)| key == "site")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty()))
}
