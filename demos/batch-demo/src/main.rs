//! Batch demo: many claims through the draft intake at once.
//!
//! One claim carries clean evidence, one carries a mix of good and broken
//! records, one is pure garbage. The batch keeps its order and the garbage
//! claim degrades without touching its siblings.

use verdict::{Claim, Engine, EvidenceDraft, SourceType, Verdict};

fn draft(
    source: &str,
    source_type: SourceType,
    timestamp: &str,
    verdict: Verdict,
    confidence: f64,
) -> EvidenceDraft {
    EvidenceDraft {
        source: Some(source.into()),
        source_type: Some(source_type),
        timestamp: Some(timestamp.into()),
        verdict: Some(verdict),
        confidence: Some(confidence),
        ..Default::default()
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Batch Review Demo ===\n");

    let clean = (
        Claim::new("batch-1", "The mayor signed the transit bill.", "person"),
        vec![
            draft("City Hall Press Office", SourceType::Official, "2025-06-02T09:00:00Z", Verdict::True, 0.95),
            draft("Metro Daily", SourceType::MajorNews, "2025-06-02T10:30:00Z", Verdict::True, 0.8),
        ],
    );

    let mixed = (
        Claim::new("batch-2", "The stadium roof collapsed during the storm.", "event"),
        vec![
            draft("@stormwatcher", SourceType::SocialMedia, "2025-06-02T01:10:00Z", Verdict::True, 0.6),
            EvidenceDraft {
                source: Some("anonymous tip line".into()),
                timestamp: Some("last night".into()),
                ..Default::default()
            },
            draft("County Emergency Services", SourceType::Official, "2025-06-02T07:45:00Z", Verdict::PartiallyTrue, 0.85),
        ],
    );

    let garbage = (
        Claim::new("batch-3", "The comet will be visible tonight.", "misc"),
        vec![
            EvidenceDraft::default(),
            EvidenceDraft {
                source: Some("forum post".into()),
                confidence: Some(0.3),
                ..Default::default()
            },
        ],
    );

    let engine = Engine::new();
    let outcomes = engine.review_draft_batch(vec![clean, mixed, garbage]);

    for outcome in &outcomes {
        let report = &outcome.report;
        println!("--- {} ---", report.claim_id);
        println!("  claim:      {}", report.claim_text);
        println!("  verdict:    {}", report.verdict.label());
        println!("  confidence: {:.1}%", report.confidence * 100.0);
        println!("  evidence:   {} kept, {} skipped", report.evidence.len(), outcome.skipped.len());
        for skip in &outcome.skipped {
            println!("    skipped {}: {}", skip.source, skip.reason);
        }
        for note in &report.notes {
            println!("  note: {note}");
        }
        match report.digest_hex() {
            Ok(digest) => println!("  digest:     {digest}"),
            Err(e) => println!("  digest:     unavailable ({e})"),
        }
        println!();
    }

    println!("Reports returned: {} (same order as submitted)", outcomes.len());
}
