//! Review demo: a social-media rumor overtaken by an official correction.
//!
//! Walks one claim through the engine: chatter first, a fact-check in the
//! middle, the ministry statement last, and shows how the conflict is
//! detected, penalized and explained.

use chrono::{TimeZone, Utc};
use verdict::{Claim, Engine, Evidence, SourceType, Verdict};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Claim Review Demo: Late Official Correction ===\n");

    let claim = Claim::new("demo-001", "The reservoir dam failed overnight.", "event");
    let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 6, 0, 0).unwrap();

    let mut chatter = Evidence::new(
        "@eyewitness_04",
        SourceType::SocialMedia,
        t0,
        Verdict::True,
        0.7,
    );
    chatter.summary = Some("Video of water over the spillway, claims the dam broke.".into());

    let mut echo = Evidence::new(
        "@local_scanner",
        SourceType::SocialMedia,
        t0 + chrono::Duration::minutes(25),
        Verdict::True,
        0.6,
    );
    echo.summary = Some("Reposts the same video, adds evacuation rumors.".into());

    let mut factcheck = Evidence::new(
        "RiverWatch Fact Desk",
        SourceType::FactCheckOrg,
        t0 + chrono::Duration::hours(2),
        Verdict::PartiallyTrue,
        0.75,
    );
    factcheck.summary = Some("Spillway overflow is real; no structural failure confirmed.".into());

    let mut correction = Evidence::new(
        "Ministry of Water Resources",
        SourceType::Official,
        t0 + chrono::Duration::hours(4),
        Verdict::False,
        0.9,
    );
    correction.summary = Some("Inspection complete: the dam is intact, spillway gates were opened.".into());

    println!("--- Evidence feed (as retrieved) ---");
    for ev in [&chatter, &echo, &factcheck, &correction] {
        println!(
            "  [{}] {} says {} (score {:.2})",
            ev.source_type.label(),
            ev.source,
            ev.verdict.label(),
            ev.confidence
        );
    }

    let engine = Engine::new();
    let report = engine.review(&claim, vec![chatter, echo, factcheck, correction]);

    println!("\n--- Verdict ---");
    println!("  Verdict:    {}", report.verdict.label());
    println!("  Confidence: {:.1}%", report.confidence * 100.0);
    println!("  Contested:  {}", report.conflict_detected);

    println!("\n--- Confidence breakdown ---");
    for entry in &report.breakdown {
        println!(
            "  {:<24} weight {:.2}  mean score {:.2}  contribution {:.4}",
            entry.source_type.label(),
            entry.weight,
            entry.score,
            entry.contribution
        );
    }

    println!("\n--- Chronology ---");
    for ev in &report.timeline {
        println!(
            "  {}  [{}] {}: {}",
            ev.timestamp.to_rfc3339(),
            ev.source_type.label(),
            ev.source,
            ev.verdict.label()
        );
    }

    println!("\n--- Explanation ---");
    println!("  {}", report.explanation);

    println!("\n--- Operator text form ---");
    println!("{}", report.to_text());
}
