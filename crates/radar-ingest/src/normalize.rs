use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use radar_core::model::{Signal, SignalId};

use crate::error::IngestError;
use crate::record::RawRecord;
use crate::topics::extract_topics;

const SUMMARY_MAX_CHARS: usize = 200;

/// Result of normalizing one batch.
#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    /// Ordered by `observed_at`, then input order.
    pub signals: Vec<Signal>,
    /// Records dropped for missing or invalid fields.
    pub rejected: usize,
    /// Records dropped because an earlier record had the same id.
    pub duplicates: usize,
}

/// Canonicalize raw records into signals. Bad records are logged and skipped.
pub fn normalize(records: &[RawRecord]) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();
    let mut seen: HashSet<SignalId> = HashSet::new();

    for (index, record) in records.iter().enumerate() {
        match normalize_record(record, index) {
            Ok(signal) => {
                if seen.insert(signal.id.clone()) {
                    outcome.signals.push(signal);
                } else {
                    tracing::debug!("Dropping duplicate {}", record.describe(index));
                    outcome.duplicates += 1;
                }
            }
            Err(e) => {
                tracing::warn!("Rejected record: {e}");
                outcome.rejected += 1;
            }
        }
    }

    outcome.signals.sort_by_key(|s| s.observed_at);
    tracing::info!(
        "Normalized {} signals ({} rejected, {} duplicates)",
        outcome.signals.len(),
        outcome.rejected,
        outcome.duplicates
    );
    outcome
}

/// Normalize a single record.
pub fn normalize_record(record: &RawRecord, index: usize) -> Result<Signal, IngestError> {
    let describe = || record.describe(index);

    let subject = record.subject().ok_or_else(|| IngestError::MissingField {
        record: describe(),
        field: "subject",
    })?;
    let raw_ts = record.observed_at().ok_or_else(|| IngestError::MissingField {
        record: describe(),
        field: "observed_at",
    })?;
    let observed_at = parse_timestamp(raw_ts).ok_or_else(|| IngestError::InvalidTimestamp {
        record: describe(),
        value: raw_ts.to_string(),
    })?;

    let magnitude = record.raw_magnitude();
    if !magnitude.is_finite() || magnitude < 0.0 {
        return Err(IngestError::InvalidMagnitude {
            record: describe(),
            value: magnitude,
        });
    }

    let source = record.source();
    let url = record.url().map(str::trim).filter(|u| !u.is_empty());

    Ok(Signal {
        id: SignalId::derive(source, subject, &observed_at, url),
        source,
        subject: subject.to_string(),
        observed_at,
        magnitude,
        topics: extract_topics(record.topic_text()),
        url: url.map(str::to_string),
        authority_hint: record.authority_hint(),
        summary: record.summary().map(truncate_summary),
    })
}

/// RFC 3339, or a bare `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn truncate_summary(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RepositoryRecord, SocialRecord, ValueFlowRecord};
    use radar_core::model::SignalSource;

    fn repo(name: &str, ts: &str, description: &str) -> RawRecord {
        RawRecord::RepositoryActivity(RepositoryRecord {
            name: Some(name.into()),
            description: Some(description.into()),
            star_delta: Some(30.0),
            observed_at: Some(ts.into()),
            url: Some(format!("https://github.com/{name}")),
            ..Default::default()
        })
    }

    #[test]
    fn test_normalize_populates_signal() {
        let outcome = normalize(&[repo(
            "acme/lend",
            "2026-02-10T08:00:00Z",
            "A DeFi lending vault",
        )]);
        assert_eq!(outcome.signals.len(), 1);
        let signal = &outcome.signals[0];
        assert_eq!(signal.source, SignalSource::RepositoryActivity);
        assert_eq!(signal.magnitude, 30.0);
        assert!(signal.topics.contains("defi"));
        assert_eq!(signal.summary.as_deref(), Some("A DeFi lending vault"));
    }

    #[test]
    fn test_missing_subject_or_timestamp_rejected() {
        let records = vec![
            RawRecord::SocialMention(SocialRecord {
                content: Some("staking is back".into()),
                observed_at: Some("2026-02-10T00:00:00Z".into()),
                ..Default::default()
            }),
            RawRecord::ValueFlow(ValueFlowRecord {
                name: Some("Jito".into()),
                ..Default::default()
            }),
            repo("acme/ok", "2026-02-10", "tooling"),
        ];
        let outcome = normalize(&records);
        assert_eq!(outcome.rejected, 2);
        assert_eq!(outcome.signals.len(), 1);
        assert_eq!(outcome.signals[0].subject, "acme/ok");
    }

    #[test]
    fn test_invalid_timestamp_and_magnitude() {
        let bad_ts = repo("acme/x", "last tuesday", "");
        assert!(matches!(
            normalize_record(&bad_ts, 0),
            Err(IngestError::InvalidTimestamp { .. })
        ));

        let negative = RawRecord::SocialMention(SocialRecord {
            subject: Some("Jito".into()),
            mentions: Some(-3.0),
            observed_at: Some("2026-02-10T00:00:00Z".into()),
            ..Default::default()
        });
        assert!(matches!(
            normalize_record(&negative, 1),
            Err(IngestError::InvalidMagnitude { .. })
        ));
    }

    #[test]
    fn test_duplicates_dropped() {
        let record = repo("acme/dup", "2026-02-10T00:00:00Z", "dex");
        let outcome = normalize(&[record.clone(), record]);
        assert_eq!(outcome.signals.len(), 1);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.rejected, 0);
    }

    #[test]
    fn test_signals_sorted_by_observed_at() {
        let outcome = normalize(&[
            repo("acme/late", "2026-02-12T00:00:00Z", ""),
            repo("acme/early", "2026-02-01T00:00:00Z", ""),
        ]);
        let subjects: Vec<&str> = outcome.signals.iter().map(|s| s.subject.as_str()).collect();
        assert_eq!(subjects, vec!["acme/early", "acme/late"]);
    }

    #[test]
    fn test_no_topics_still_passes() {
        let outcome = normalize(&[repo("acme/misc", "2026-02-10T00:00:00Z", "hello world")]);
        assert_eq!(outcome.signals.len(), 1);
        assert!(outcome.signals[0].topics.is_empty());
    }

    #[test]
    fn test_summary_truncated() {
        let long = "x".repeat(500);
        let outcome = normalize(&[repo("acme/long", "2026-02-10T00:00:00Z", &long)]);
        let summary = outcome.signals[0].summary.as_deref().unwrap();
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS + 3);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2026-02-10T08:00:00+02:00").is_some());
        assert!(parse_timestamp("2026-02-10").is_some());
        assert!(parse_timestamp("10/02/2026").is_none());
    }
}
