//! URL detection

use regex::Regex;
use serde_json::Value;

use super::{metadata, Detector};
use crate::types::{PatternMatch, PatternType};

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '\'', '"'];

#[derive(Debug, Clone, Copy)]
enum UrlForm {
    Scheme,
    Www,
    Bare,
}

impl UrlForm {
    fn confidence(&self) -> f64 {
        match self {
            UrlForm::Scheme => 0.95,
            UrlForm::Www => 0.85,
            UrlForm::Bare => 0.8,
        }
    }
}

pub struct UrlDetector {
    patterns: Vec<(Regex, UrlForm)>,
    host: Regex,
    threshold: f64,
}

impl UrlDetector {
    pub fn new(threshold: f64) -> Result<Self, regex::Error> {
        let patterns = vec![
            (
                Regex::new(r#"(?i)\b(https?)://([^\s/?#<>"']+)([^\s<>"']*)"#)?,
                UrlForm::Scheme,
            ),
            (
                Regex::new(r#"(?i)\bwww\.[a-z0-9-]+(?:\.[a-z0-9-]+)+(?::\d{1,5})?(?:[/?#][^\s<>"']*)?"#)?,
                UrlForm::Www,
            ),
            (
                Regex::new(
                    r#"(?i)\b[a-z0-9-]+(?:\.[a-z0-9-]+)*\.(?:com|org|net|io|dev|edu|gov|app|ai|co)\b(?:/[^\s<>"']*)?"#,
                )?,
                UrlForm::Bare,
            ),
        ];

        Ok(Self {
            patterns,
            host: Regex::new(r"(?i)^(?:[a-z0-9-]+(?:\.[a-z0-9-]+)+|localhost)(?::\d{1,5})?$")?,
            threshold,
        })
    }
}

impl Detector for UrlDetector {
    fn name(&self) -> &'static str {
        "url"
    }

    fn pattern_type(&self) -> PatternType {
        PatternType::Url
    }

    fn detect(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::new();

        for (pattern, form) in &self.patterns {
            for m in pattern.find_iter(text) {
                let start = m.start();
                if matches!(form, UrlForm::Bare) && glued_to_other_token(text, start) {
                    continue;
                }

                let candidate = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
                let end = start + candidate.len();

                let Some(parts) = split_url(candidate) else {
                    continue;
                };
                if !self.host.is_match(parts.host) {
                    continue;
                }

                let confidence = form.confidence();
                if confidence < self.threshold {
                    continue;
                }

                let mut meta = metadata([
                    ("host", Value::from(parts.host.to_lowercase())),
                    ("path", Value::from(parts.path)),
                    ("secure", Value::from(parts.scheme == Some("https"))),
                ]);
                if let Some(scheme) = parts.scheme {
                    meta.insert("scheme".into(), Value::from(scheme));
                }

                matches.push(PatternMatch::new(
                    PatternType::Url,
                    candidate.to_string(),
                    confidence,
                    start,
                    end,
                    meta,
                ));
            }
        }

        matches
    }
}

/// Bare domains inside emails (`a@b.com`) or paths belong to another token.
fn glued_to_other_token(text: &str, start: usize) -> bool {
    matches!(text[..start].chars().next_back(), Some('@' | '.' | '/' | ':'))
}

struct UrlParts<'a> {
    scheme: Option<&'static str>,
    host: &'a str,
    path: &'a str,
}

fn split_url(url: &str) -> Option<UrlParts<'_>> {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    let (scheme, rest) = if lower.starts_with("https://") {
        (Some("https"), &url[8..])
    } else if lower.starts_with("http://") {
        (Some("http"), &url[7..])
    } else {
        (None, url)
    };

    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let host = &rest[..host_end];
    if host.is_empty() {
        return None;
    }

    Some(UrlParts {
        scheme,
        host,
        path: &rest[host_end..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> UrlDetector {
        UrlDetector::new(0.8).unwrap()
    }

    #[test]
    fn test_explicit_scheme_scores_highest() {
        let found = detector().detect("see https://docs.rs/regex/latest.");
        let first = &found[0];
        assert_eq!(first.text, "https://docs.rs/regex/latest");
        assert_eq!(first.meta_str("host"), Some("docs.rs"));
        assert_eq!(first.meta_str("path"), Some("/regex/latest"));
        assert_eq!(first.metadata["secure"], true);
        assert!(first.confidence > 0.9);
    }

    #[test]
    fn test_bare_scheme_rejected() {
        assert!(detector().detect("http:// nothing here").is_empty());
    }

    #[test]
    fn test_www_and_bare_domains() {
        let found = detector().detect("www.example.org or rust-lang.org/learn");
        assert!(found.iter().any(|m| m.text == "www.example.org"));
        assert!(found.iter().any(|m| m.text == "rust-lang.org/learn"));
    }

    #[test]
    fn test_email_domain_is_not_a_url() {
        assert!(detector().detect("test@example.com").is_empty());
    }
}
