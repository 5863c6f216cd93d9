use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
}

/// Subject id that grants access to every authenticated user; never hashed
const WILDCARD_SUBJECT: &str = "*";

/// Redaction settings applied to log fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub hash_subject_ids: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            hash_subject_ids: true,
        }
    }
}

impl RedactionConfig {
    /// Pass everything through unchanged
    pub fn disabled() -> Self {
        Self {
            redact_emails: false,
            hash_subject_ids: false,
        }
    }
}

/// Redacts user identifiers before they are written to logs.
///
/// Hashed ids stay stable across log lines, so a single subject can still be
/// followed through a request without the raw id being recorded.
#[derive(Debug, Clone, Default)]
pub struct LogRedactor {
    config: RedactionConfig,
}

impl LogRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::default()
        } else {
            Self::new(RedactionConfig::disabled())
        }
    }

    /// Render a subject id for a log field
    pub fn subject(&self, subject_id: &str) -> String {
        if self.config.hash_subject_ids && subject_id != WILDCARD_SUBJECT {
            format!("SUBJ[{}]", subject_fingerprint(subject_id))
        } else {
            subject_id.to_string()
        }
    }

    /// Mask e-mail addresses embedded in free text
    pub fn redact(&self, text: &str) -> String {
        if !self.config.redact_emails {
            return text.to_string();
        }

        EMAIL_REGEX
            .replace_all(text, |caps: &regex::Captures| {
                format!("EMAIL[{}]", subject_fingerprint(&caps[0]))
            })
            .to_string()
    }
}

/// Short, stable correlation hash: base64 of the first 8 bytes of SHA-256
pub fn subject_fingerprint(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    general_purpose::STANDARD.encode(&digest[..8])
}
