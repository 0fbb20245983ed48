use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use radar_core::model::{
    ClusteringMethod, FadedNarrative, Narrative, Report, Signal, SignalSource, SignalSummary,
};

/// Run identity and batch-level counts gathered as the pipeline runs.
#[derive(Debug, Clone)]
pub struct RunMeta {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub raw_records: usize,
    pub rejected_records: usize,
    pub passing_signals: usize,
}

/// Per-source counts of normalized signals. Every source is listed, even at zero.
pub fn count_by_source(signals: &[Signal]) -> BTreeMap<SignalSource, usize> {
    let mut counts: BTreeMap<SignalSource, usize> =
        SignalSource::ALL.iter().map(|s| (*s, 0)).collect();
    for signal in signals {
        *counts.entry(signal.source).or_default() += 1;
    }
    counts
}

/// Wrap ranked narratives into the immutable run report.
pub fn assemble(
    meta: RunMeta,
    narratives: Vec<Narrative>,
    faded: Vec<FadedNarrative>,
    normalized: &[Signal],
    clustering: ClusteringMethod,
    fallback_reason: Option<String>,
) -> Report {
    Report {
        run_id: meta.run_id,
        generated_at: meta.generated_at,
        version: env!("CARGO_PKG_VERSION").to_string(),
        narratives,
        faded,
        summary: SignalSummary {
            raw_records: meta.raw_records,
            rejected_records: meta.rejected_records,
            normalized_signals: normalized.len(),
            by_source: count_by_source(normalized),
            passing_signals: meta.passing_signals,
        },
        clustering,
        fallback_reason,
    }
}
