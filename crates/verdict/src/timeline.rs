use chrono::Duration;

use crate::aggregate::Aggregation;
use crate::schema::{Claim, Evidence, SourceType, Verdict};
use crate::trust::TrustTable;

/// Chronological view of an evidence set: stable ascending sort by
/// timestamp, so same-instant items keep their input order. Idempotent.
pub fn build_timeline(evidence: &[Evidence]) -> Vec<Evidence> {
    let mut timeline = evidence.to_vec();
    timeline.sort_by_key(|ev| ev.timestamp);
    timeline
}

/// Render the deterministic, operator-facing justification for a verdict.
/// Identical inputs produce identical text. Elapsed time is reported in
/// whole days and hours only, never as locale-formatted timestamps.
pub fn explain(
    claim: &Claim,
    aggregation: &Aggregation,
    timeline: &[Evidence],
    trust: &TrustTable,
) -> String {
    let pct = (aggregation.confidence * 100.0).round() as i64;
    let mut out = format!(
        "Claim {} is assessed as {} with {}% confidence.",
        claim.id,
        aggregation.verdict.label(),
        pct
    );

    if timeline.is_empty() {
        out.push_str(" No evidence was available for review.");
        return out;
    }

    out.push(' ');
    out.push_str(&source_counts(timeline));

    let first = &timeline[0];
    let last = &timeline[timeline.len() - 1];
    let span = last.timestamp - first.timestamp;
    if span > Duration::days(1) {
        let decisive = decisive_item(timeline, trust);
        out.push_str(&format!(
            " Coverage spans {}: the earliest report came from {} and the latest from {}; the decisive item is the {} report from {}.",
            span_text(span),
            first.source,
            last.source,
            decisive.source_type.label(),
            decisive.source
        ));
    }

    if aggregation.conflict_detected {
        out.push(' ');
        out.push_str(&conflict_clause(aggregation));
    }

    out
}

/// One line of per-source-type counts, in trust order.
fn source_counts(timeline: &[Evidence]) -> String {
    let mut parts = Vec::new();
    for st in SourceType::ALL {
        let n = timeline.iter().filter(|ev| ev.source_type == st).count();
        if n > 0 {
            let noun = if n == 1 { "source" } else { "sources" };
            parts.push(format!("{n} {} {noun}", st.label()));
        }
    }
    format!("Based on {}.", parts.join(", "))
}

/// The most recent item, highest trust weight breaking timestamp ties.
fn decisive_item<'a>(timeline: &'a [Evidence], trust: &TrustTable) -> &'a Evidence {
    let mut best = &timeline[0];
    for ev in timeline {
        let newer = ev.timestamp > best.timestamp;
        let same_instant_more_trusted = ev.timestamp == best.timestamp
            && trust.weight_of(ev.source_type) > trust.weight_of(best.source_type);
        if newer || same_instant_more_trusted {
            best = ev;
        }
    }
    best
}

fn conflict_clause(aggregation: &Aggregation) -> String {
    let Some((leading, runner_up)) = aggregation.contested else {
        return "Conflicting accounts were detected, reducing confidence.".into();
    };
    if aggregation.verdict == Verdict::Unverifiable {
        format!(
            "Conflicting accounts were detected: evidence splits between {} and {}, and no verdict holds a majority.",
            leading.label(),
            runner_up.label()
        )
    } else {
        let rival = if leading == aggregation.verdict {
            runner_up
        } else {
            leading
        };
        format!(
            "Conflicting accounts were detected: reports asserting {} contested the prevailing {} verdict, reducing confidence.",
            rival.label(),
            aggregation.verdict.label()
        )
    }
}

fn span_text(span: Duration) -> String {
    let days = span.num_days();
    let hours = span.num_hours() - days * 24;
    match (days, hours) {
        (0, h) => format!("{h} {}", plural(h, "hour")),
        (d, 0) => format!("{d} {}", plural(d, "day")),
        (d, h) => format!(
            "{d} {} and {h} {}",
            plural(d, "day"),
            plural(h, "hour")
        ),
    }
}

fn plural(n: i64, noun: &str) -> String {
    if n == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, Policy};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn ev(source: &str, st: SourceType, secs: i64, verdict: Verdict, confidence: f64) -> Evidence {
        Evidence::new(source, st, at(secs), verdict, confidence)
    }

    #[test]
    fn timeline_sorts_ascending_and_is_idempotent() {
        let evidence = vec![
            ev("c", SourceType::SocialMedia, 300, Verdict::True, 0.5),
            ev("a", SourceType::Official, 0, Verdict::True, 0.9),
            ev("b", SourceType::MajorNews, 120, Verdict::True, 0.7),
        ];
        let once = build_timeline(&evidence);
        assert!(once.windows(2).all(|p| p[0].timestamp <= p[1].timestamp));
        let twice = build_timeline(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn timeline_sort_is_stable_for_equal_timestamps() {
        let evidence = vec![
            ev("first", SourceType::MajorNews, 0, Verdict::True, 0.5),
            ev("second", SourceType::SocialMedia, 0, Verdict::True, 0.5),
        ];
        let timeline = build_timeline(&evidence);
        assert_eq!(timeline[0].source, "first");
        assert_eq!(timeline[1].source, "second");
    }

    #[test]
    fn explanation_is_deterministic() {
        let claim = Claim::new("c-1", "the dam failed", "event");
        let trust = TrustTable::default();
        let evidence = vec![
            ev("somebody", SourceType::SocialMedia, 0, Verdict::True, 0.7),
            ev("ministry", SourceType::Official, 4 * 3600, Verdict::False, 0.9),
        ];
        let agg = aggregate(&trust, &Policy::default(), &evidence);
        let timeline = build_timeline(&evidence);
        let a = explain(&claim, &agg, &timeline, &trust);
        let b = explain(&claim, &agg, &timeline, &trust);
        assert_eq!(a, b);
        assert!(a.contains("c-1"));
        assert!(a.contains("% confidence"));
    }

    #[test]
    fn conflict_clause_names_both_verdicts() {
        let claim = Claim::new("c-2", "the dam failed", "event");
        let trust = TrustTable::default();
        let evidence = vec![
            ev("somebody", SourceType::SocialMedia, 0, Verdict::True, 0.7),
            ev("ministry", SourceType::Official, 4 * 3600, Verdict::False, 0.9),
        ];
        let agg = aggregate(&trust, &Policy::default(), &evidence);
        assert!(agg.conflict_detected);
        let text = explain(&claim, &agg, &build_timeline(&evidence), &trust);
        assert!(text.contains("Conflicting accounts"));
        assert!(text.contains("true"));
        assert!(text.contains("false"));
    }

    #[test]
    fn multi_day_coverage_names_earliest_latest_and_decisive() {
        let claim = Claim::new("c-3", "the bridge reopened", "event");
        let trust = TrustTable::default();
        let evidence = vec![
            ev("somebody", SourceType::SocialMedia, 0, Verdict::True, 0.6),
            ev("daily", SourceType::MajorNews, 24 * 3600, Verdict::True, 0.8),
            ev("ministry", SourceType::Official, 3 * 24 * 3600 + 5 * 3600, Verdict::True, 0.9),
        ];
        let agg = aggregate(&trust, &Policy::default(), &evidence);
        let text = explain(&claim, &agg, &build_timeline(&evidence), &trust);
        assert!(text.contains("3 days and 5 hours"));
        assert!(text.contains("earliest report came from somebody"));
        assert!(text.contains("latest from ministry"));
        assert!(text.contains("decisive item is the official report from ministry"));
    }

    #[test]
    fn empty_timeline_notes_missing_evidence() {
        let claim = Claim::new("c-4", "nothing here", "misc");
        let trust = TrustTable::default();
        let agg = aggregate(&trust, &Policy::default(), &[]);
        let text = explain(&claim, &agg, &[], &trust);
        assert!(text.contains("unverifiable with 0% confidence"));
        assert!(text.contains("No evidence was available"));
    }
}
