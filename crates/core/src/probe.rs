//! Best-effort liveness checks for URL fields.

use std::{fmt, time::Duration};

use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::{config::AppConfig, models::Entry, models::Field};

/// Timeout applied to each probe unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client identifier sent with every probe.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; games-editor/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Why a URL was not considered reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// The server answered with a non-success status.
    Status(u16),
    /// The request never completed: DNS, connect, TLS or timeout.
    Transport(String),
    /// Anything else, such as a URL that cannot be parsed.
    Unexpected(String),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Status(code) => write!(f, "HTTP error {code}"),
            ProbeFailure::Transport(reason) => write!(f, "connection failed: {reason}"),
            ProbeFailure::Unexpected(reason) => write!(f, "unexpected error: {reason}"),
        }
    }
}

/// Result of probing one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlStatus {
    /// The server answered with a success status.
    Valid(u16),
    /// The URL could not be confirmed.
    Invalid(ProbeFailure),
}

impl UrlStatus {
    /// Whether the probe succeeded.
    pub fn is_valid(&self) -> bool {
        matches!(self, UrlStatus::Valid(_))
    }
}

/// Probe outcome for one field of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProbe {
    /// Field that held the URL.
    pub field: Field,
    /// URL that was requested.
    pub url: String,
    /// What happened.
    pub status: UrlStatus,
}

impl fmt::Display for FieldProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            UrlStatus::Valid(code) => write!(f, "{}: OK ({code}) {}", self.field.label(), self.url),
            UrlStatus::Invalid(reason) => {
                write!(f, "{}: {reason} {}", self.field.label(), self.url)
            }
        }
    }
}

/// Aggregated probe results for an entry, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// Number of URLs requested.
    pub total_checked: usize,
    /// Number that answered with a success status.
    pub valid_count: usize,
    /// Per-field outcomes.
    pub results: Vec<FieldProbe>,
}

impl ProbeReport {
    /// Assemble a report from per-field outcomes.
    pub fn from_results(results: Vec<FieldProbe>) -> Self {
        let valid_count = results.iter().filter(|r| r.status.is_valid()).count();
        Self {
            total_checked: results.len(),
            valid_count,
            results,
        }
    }

    /// True when nothing failed, including when nothing was checked.
    pub fn all_valid(&self) -> bool {
        self.valid_count == self.total_checked
    }

    /// One line per probed field, suitable for a confirmation prompt.
    pub fn lines(&self) -> Vec<String> {
        self.results.iter().map(ToString::to_string).collect()
    }

    /// Short `valid/total` summary.
    pub fn summary(&self) -> String {
        format!(
            "{}/{} URLs reachable",
            self.valid_count, self.total_checked
        )
    }
}

/// Something that can confirm whether a URL answers.
pub trait UrlChecker {
    /// Probe a single URL.
    fn check(&self, url: &str) -> UrlStatus;

    /// Probe every non-empty URL field of `entry` in field order.
    fn check_all(&self, entry: &Entry) -> ProbeReport {
        let results = entry
            .url_fields()
            .into_iter()
            .map(|(field, url)| {
                let url = url.trim().to_string();
                let status = self.check(&url);
                if let UrlStatus::Invalid(reason) = &status {
                    warn!(field = %field, url = %url, %reason, "URL probe failed");
                }
                FieldProbe { field, url, status }
            })
            .collect();
        ProbeReport::from_results(results)
    }
}

/// Blocking HTTP checker backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpUrlChecker {
    client: Client,
}

impl HttpUrlChecker {
    /// Build a checker with an explicit timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Build a checker from the probe settings in `config`.
    pub fn from_config(config: &AppConfig) -> reqwest::Result<Self> {
        Self::new(config.probe_timeout(), &config.user_agent)
    }
}

impl UrlChecker for HttpUrlChecker {
    fn check(&self, url: &str) -> UrlStatus {
        match self.client.get(url).send() {
            Ok(response) => {
                let status = response.status();
                debug!(url, status = status.as_u16(), "URL probe answered");
                if status.is_success() {
                    UrlStatus::Valid(status.as_u16())
                } else {
                    UrlStatus::Invalid(ProbeFailure::Status(status.as_u16()))
                }
            }
            Err(err) => UrlStatus::Invalid(classify_error(&err)),
        }
    }
}

fn classify_error(err: &reqwest::Error) -> ProbeFailure {
    if let Some(status) = err.status() {
        ProbeFailure::Status(status.as_u16())
    } else if err.is_timeout() {
        ProbeFailure::Transport("timed out".to_string())
    } else if err.is_connect() || err.is_request() || err.is_redirect() {
        ProbeFailure::Transport(err.to_string())
    } else {
        ProbeFailure::Unexpected(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, collections::HashMap};

    struct Scripted {
        answers: HashMap<String, UrlStatus>,
        seen: RefCell<Vec<String>>,
    }

    impl UrlChecker for Scripted {
        fn check(&self, url: &str) -> UrlStatus {
            self.seen.borrow_mut().push(url.to_string());
            self.answers
                .get(url)
                .cloned()
                .unwrap_or(UrlStatus::Invalid(ProbeFailure::Status(404)))
        }
    }

    #[test]
    fn check_all_probes_url_fields_in_order() {
        let entry = Entry {
            name: "Probe".to_string(),
            url: " https://example.com/a.zip ".to_string(),
            build_file: "a.exe".to_string(),
            githuburl: "https://github.com/example/a".to_string(),
            markdown: "https://example.com/a.md".to_string(),
            ..Entry::default()
        };
        let checker = Scripted {
            answers: HashMap::from([
                ("https://example.com/a.zip".to_string(), UrlStatus::Valid(200)),
                ("https://github.com/example/a".to_string(), UrlStatus::Valid(200)),
            ]),
            seen: RefCell::new(Vec::new()),
        };

        let report = checker.check_all(&entry);
        assert_eq!(
            checker.seen.borrow().as_slice(),
            [
                "https://example.com/a.zip",
                "https://github.com/example/a",
                "https://example.com/a.md"
            ]
        );
        assert_eq!(report.total_checked, 3);
        assert_eq!(report.valid_count, 2);
        assert!(!report.all_valid());
        assert_eq!(report.results[2].field, Field::Markdown);
        assert_eq!(report.summary(), "2/3 URLs reachable");
        assert!(report.lines()[2].contains("HTTP error 404"));
    }

    #[test]
    fn entry_without_urls_is_trivially_valid() {
        let checker = Scripted {
            answers: HashMap::new(),
            seen: RefCell::new(Vec::new()),
        };
        let report = checker.check_all(&Entry::default());
        assert_eq!(report.total_checked, 0);
        assert!(report.all_valid());
        assert!(checker.seen.borrow().is_empty());
    }

    #[test]
    fn unparseable_url_is_unexpected_failure() -> anyhow::Result<()> {
        let checker = HttpUrlChecker::new(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)?;
        match checker.check("not a url") {
            UrlStatus::Invalid(ProbeFailure::Unexpected(_)) => {}
            other => panic!("expected an unexpected failure, got {other:?}"),
        }
        Ok(())
    }
}
