use radar_core::history::RunRecord;
use radar_core::model::{Narrative, Report, ScoredSignal};
use radar_engine::gate;

use super::OutputFormat;

/// Members listed per narrative in text and markdown output.
const MEMBERS_SHOWN: usize = 5;

pub fn format_report(report: &Report, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => super::to_json(report),
        OutputFormat::Text => format_report_text(report),
        OutputFormat::Markdown => format_report_markdown(report),
    }
}

fn format_report_text(report: &Report) -> String {
    let mut out = String::new();
    let s = &report.summary;

    out.push_str(&format!("Run:      {}\n", report.run_id));
    out.push_str(&format!(
        "Date:     {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("Method:   {}", report.clustering));
    if let Some(reason) = &report.fallback_reason {
        out.push_str(&format!(" (fallback: {reason})"));
    }
    out.push('\n');
    out.push_str(&format!(
        "Signals:  {} raw, {} rejected, {} normalized, {} passing\n",
        s.raw_records, s.rejected_records, s.normalized_signals, s.passing_signals
    ));
    let by_source: Vec<String> = s
        .by_source
        .iter()
        .map(|(source, count)| format!("{source} {count}"))
        .collect();
    out.push_str(&format!("Sources:  {}\n", by_source.join(", ")));

    if report.narratives.is_empty() {
        out.push_str("\nNo narratives detected.\n");
    }

    for (rank, n) in report.narratives.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {} [{} / {}] avg {:.1}, {} signal{}\n",
            rank + 1,
            n.name,
            n.confidence,
            n.direction,
            n.aggregate_score,
            n.member_signals.len(),
            if n.member_signals.len() == 1 { "" } else { "s" }
        ));
        out.push_str(&format!("   {}\n", n.explanation));
        for m in n.top_members(MEMBERS_SHOWN) {
            out.push_str(&format!(
                "   \u{25c6} {:>5.1}  {}  ({})\n",
                m.score, m.signal.subject, m.signal.source
            ));
        }
        for idea in &n.ideas {
            out.push_str(&format!("   \u{2192} {} [{}]\n", idea.name, idea.complexity));
        }
    }

    if !report.faded.is_empty() {
        out.push_str("\nFaded:\n");
        for f in &report.faded {
            out.push_str(&format!(
                "  - {} (last seen {})\n",
                f.name,
                f.last_seen.format("%Y-%m-%d")
            ));
        }
    }
    out
}

fn format_report_markdown(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# Narrative Radar, {}\n\n",
        report.generated_at.format("%Y-%m-%d")
    ));
    out.push_str(&format!(
        "{} narratives from {} passing signals (clustering: {}).\n",
        report.narratives.len(),
        report.summary.passing_signals,
        report.clustering
    ));
    if let Some(reason) = &report.fallback_reason {
        out.push_str(&format!("\n> Fell back to rule-based clustering: {reason}\n"));
    }

    for n in &report.narratives {
        out.push_str(&narrative_markdown(n));
    }

    if !report.faded.is_empty() {
        out.push_str("\n## Faded\n\n");
        for f in &report.faded {
            out.push_str(&format!(
                "- {} (last seen {})\n",
                f.name,
                f.last_seen.format("%Y-%m-%d")
            ));
        }
    }
    out
}

fn narrative_markdown(n: &Narrative) -> String {
    let sources: Vec<&str> = n.sources().iter().map(|s| s.as_str()).collect();
    let mut out = format!(
        "\n## {}\n\n**Confidence:** {} | **Direction:** {} | **Score:** {:.1}\n\n\
         **Sources:** {}\n\n{}\n\n",
        n.name,
        n.confidence,
        n.direction,
        n.aggregate_score,
        sources.join(", "),
        n.explanation
    );
    out.push_str("| Score | Subject | Source |\n|---:|---|---|\n");
    for m in n.top_members(MEMBERS_SHOWN) {
        out.push_str(&format!(
            "| {:.1} | {} | {} |\n",
            m.score, m.signal.subject, m.signal.source
        ));
    }
    if !n.ideas.is_empty() {
        out.push_str("\n### Ideas\n\n");
        for idea in &n.ideas {
            out.push_str(&format!(
                "- **{}** ({}): {}",
                idea.name, idea.complexity, idea.description
            ));
            if let Some(user) = &idea.target_user {
                out.push_str(&format!(" _For: {user}_"));
            }
            out.push('\n');
        }
    }
    out
}

pub fn format_scores(scored: &[ScoredSignal], threshold: f64, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => super::to_json(scored),
        OutputFormat::Text | OutputFormat::Markdown => format_scores_text(scored, threshold),
    }
}

fn format_scores_text(scored: &[ScoredSignal], threshold: f64) -> String {
    if scored.is_empty() {
        return "No signals scored.".to_string();
    }

    let mut out = format!(
        "{:<5} {:>6} {:>5} {:>5} {:>5} {:>5}  {:<20} SUBJECT\n",
        "GATE", "SCORE", "VEL", "CONV", "NOV", "AUTH", "SOURCE"
    );
    for s in scored {
        let mark = if gate::passes(s.score, threshold) { "pass" } else { "-" };
        let f = &s.factors;
        out.push_str(&format!(
            "{:<5} {:>6.1} {:>5.0} {:>5.0} {:>5.0} {:>5.0}  {:<20} {}\n",
            mark,
            s.score,
            f.velocity,
            f.convergence,
            f.novelty,
            f.authority,
            s.signal.source.as_str(),
            s.signal.subject
        ));
    }
    out
}

pub fn format_history(runs: &[&RunRecord], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => super::to_json(runs),
        OutputFormat::Text | OutputFormat::Markdown => format_history_text(runs),
    }
}

fn format_history_text(runs: &[&RunRecord]) -> String {
    if runs.is_empty() {
        return "No runs recorded.".to_string();
    }

    let mut out = String::new();
    for run in runs {
        let id = run.run_id.to_string();
        let short_id = &id[..8];
        let names: Vec<&str> = run.narratives.iter().map(|n| n.name.as_str()).collect();
        out.push_str(&format!(
            "\u{25c6} {short_id}  {}  {} narratives: {}\n",
            run.run_at.format("%Y-%m-%d %H:%M"),
            run.narratives.len(),
            if names.is_empty() {
                "(none)".to_string()
            } else {
                names.join(", ")
            }
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use radar_core::model::{ClusteringMethod, SignalSummary};
    use uuid::Uuid;

    fn empty_report() -> Report {
        Report {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            version: "0.1.0".into(),
            narratives: Vec::new(),
            faded: Vec::new(),
            summary: SignalSummary::default(),
            clustering: ClusteringMethod::RuleBased,
            fallback_reason: Some("LLM call timed out after 20s".into()),
        }
    }

    #[test]
    fn test_text_report_mentions_fallback() {
        let text = format_report(&empty_report(), OutputFormat::Text);
        assert!(text.contains("Method:   rule_based (fallback: LLM call timed out"));
        assert!(text.contains("No narratives detected."));
    }

    #[test]
    fn test_markdown_report_heading() {
        let md = format_report(&empty_report(), OutputFormat::Markdown);
        assert!(md.starts_with("# Narrative Radar, "));
        assert!(md.contains("> Fell back to rule-based clustering"));
    }

    #[test]
    fn test_empty_scores_and_history() {
        assert_eq!(format_scores(&[], 40.0, OutputFormat::Text), "No signals scored.");
        assert_eq!(format_history(&[], OutputFormat::Text), "No runs recorded.");
        assert_eq!(format_history(&[], OutputFormat::Json), "[]");
    }
}
