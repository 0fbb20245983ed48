use radar_core::model::ScoredSignal;

/// Signals that cleared the significance cutoff, and how many did not.
#[derive(Debug, Clone, Default)]
pub struct GateOutcome {
    pub passed: Vec<ScoredSignal>,
    pub dropped: usize,
}

/// A score passes iff it is at or above the threshold. NaN never passes.
pub fn passes(score: f64, threshold: f64) -> bool {
    score >= threshold
}

/// Split scored signals into passing and dropped, preserving order.
pub fn apply(scored: Vec<ScoredSignal>, threshold: f64) -> GateOutcome {
    let mut outcome = GateOutcome::default();
    for s in scored {
        if passes(s.score, threshold) {
            outcome.passed.push(s);
        } else {
            tracing::debug!(
                "Dropping {} below threshold ({:.1} < {threshold})",
                s.signal.subject,
                s.score
            );
            outcome.dropped += 1;
        }
    }
    tracing::info!(
        "Threshold {threshold}: {} passed, {} dropped",
        outcome.passed.len(),
        outcome.dropped
    );
    outcome
}
