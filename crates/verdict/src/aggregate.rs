use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::schema::{BreakdownEntry, Evidence, SourceType, Verdict};
use crate::trust::TrustTable;
use crate::{EngineError, Result};

/// Tunable aggregation policy. The defaults encode the house rules for
/// resolving claims reported differently over time; they can be adjusted,
/// but `validate` keeps them inside sane ranges.
#[derive(Clone, Debug, PartialEq)]
pub struct Policy {
    /// Recency decay applied to older evidence, relative to the set's span.
    pub decay_rate: f64,
    /// Multiplier for a latest official/fact-check item that contradicts
    /// the older majority.
    pub override_boost: f64,
    /// Hard cap on the boosted recency product.
    pub boost_cap: f64,
    /// Runner-up / leader assertion-mass ratio above which the claim is
    /// considered contested.
    pub conflict_ratio: f64,
    /// Maximum fraction shaved off every bucket on conflict.
    pub conflict_penalty: f64,
    /// Share of weighted mass the leading bucket must strictly exceed to
    /// win the final verdict.
    pub majority_share: f64,
    /// Window within which matching records collapse to one.
    pub dedup_window_secs: i64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            decay_rate: 1.0,
            override_boost: 1.25,
            boost_cap: 1.5,
            conflict_ratio: 0.4,
            conflict_penalty: 0.3,
            majority_share: 0.5,
            dedup_window_secs: 60,
        }
    }
}

impl Policy {
    /// Fail fast on nonsensical tuning.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.decay_rate >= 0.0, "decay_rate must be >= 0"),
            (self.override_boost >= 1.0, "override_boost must be >= 1"),
            (self.boost_cap >= 1.0, "boost_cap must be >= 1"),
            (
                self.conflict_ratio > 0.0 && self.conflict_ratio <= 1.0,
                "conflict_ratio must be in (0,1]",
            ),
            (
                (0.0..1.0).contains(&self.conflict_penalty),
                "conflict_penalty must be in [0,1)",
            ),
            (
                (0.5..1.0).contains(&self.majority_share),
                "majority_share must be in [0.5,1)",
            ),
            (self.dedup_window_secs >= 0, "dedup_window_secs must be >= 0"),
        ];
        for (ok, msg) in checks {
            if !ok {
                return Err(EngineError::Policy(msg.into()));
            }
        }
        for v in [
            self.decay_rate,
            self.override_boost,
            self.boost_cap,
            self.conflict_ratio,
            self.conflict_penalty,
            self.majority_share,
        ] {
            if !v.is_finite() {
                return Err(EngineError::Policy("policy values must be finite".into()));
            }
        }
        Ok(())
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::seconds(self.dedup_window_secs)
    }
}

/// Outcome of weighing one claim's evidence set.
#[derive(Clone, Debug)]
pub struct Aggregation {
    pub verdict: Verdict,
    pub confidence: f64,
    pub breakdown: Vec<BreakdownEntry>,
    pub conflict_detected: bool,
    /// Leading and runner-up asserted verdicts when the claim is contested.
    pub contested: Option<(Verdict, Verdict)>,
}

impl Aggregation {
    fn unverifiable() -> Self {
        Self {
            verdict: Verdict::Unverifiable,
            confidence: 0.0,
            breakdown: vec![],
            conflict_detected: false,
            contested: None,
        }
    }
}

/// Weigh an evidence set into a single verdict and calibrated confidence.
///
/// Each item contributes `trust_weight * confidence * recency`, where
/// recency decays with age relative to the set's time span. A latest
/// official or fact-check item that contradicts the older majority gets a
/// capped recency boost, so a late correction can outweigh an earlier
/// higher-volume narrative. Contributions are bucketed by verdict;
/// disagreement between buckets is detected on the trust-agnostic
/// assertion mass (what sources claim, not who they are) and penalizes
/// every bucket, while trust decides which bucket wins. The winner must
/// strictly exceed the majority share or the claim stays unverifiable.
/// Confidence is normalized against a same-size lineup of top-trust
/// sources, so a single low-trust item can never look authoritative.
pub fn aggregate(trust: &TrustTable, policy: &Policy, evidence: &[Evidence]) -> Aggregation {
    if evidence.is_empty() {
        return Aggregation::unverifiable();
    }

    let newest = max_timestamp(evidence);
    let oldest = min_timestamp(evidence);
    let span_ms = (newest - oldest).num_milliseconds() as f64;
    let older_majority = majority_of_older(evidence, newest);

    // Per-item raw contribution: weight * score * recency (+ override boost).
    let raws: Vec<f64> = evidence
        .iter()
        .map(|ev| {
            let mut recency = if span_ms <= 0.0 {
                1.0
            } else {
                let age = (newest - ev.timestamp).num_milliseconds() as f64;
                1.0 / (1.0 + policy.decay_rate * (age / span_ms))
            };
            if is_override(ev, newest, older_majority) {
                recency = (recency * policy.override_boost).min(policy.boost_cap);
            }
            trust.weight_of(ev.source_type) * ev.confidence * recency
        })
        .collect();

    // Bucket weighted mass by verdict, and assertion mass (score only) for
    // conflict detection.
    let mut weighted = [0.0f64; Verdict::ALL.len()];
    let mut asserted = [0.0f64; Verdict::ALL.len()];
    for (ev, raw) in evidence.iter().zip(&raws) {
        let i = verdict_index(ev.verdict);
        weighted[i] += raw;
        asserted[i] += ev.confidence;
    }

    // Contest check: runner-up asserted verdict close enough to the leader.
    let mut top: Option<(usize, f64)> = None;
    let mut second: Option<(usize, f64)> = None;
    for (i, v) in Verdict::ALL.iter().enumerate() {
        if *v == Verdict::Unverifiable || asserted[i] <= 0.0 {
            continue;
        }
        if top.map_or(true, |(_, m)| asserted[i] > m) {
            second = top;
            top = Some((i, asserted[i]));
        } else if second.map_or(true, |(_, m)| asserted[i] > m) {
            second = Some((i, asserted[i]));
        }
    }

    let mut conflict_detected = false;
    let mut contested = None;
    if let (Some((ti, tm)), Some((si, sm))) = (top, second) {
        let ratio = sm / tm;
        if ratio >= policy.conflict_ratio {
            conflict_detected = true;
            contested = Some((Verdict::ALL[ti], Verdict::ALL[si]));
            let penalty = 1.0 - policy.conflict_penalty * ratio.min(1.0);
            for b in weighted.iter_mut() {
                *b *= penalty;
            }
        }
    }

    // Final verdict: leading bucket, provided it strictly holds a majority
    // of the weighted mass.
    let total: f64 = weighted.iter().sum();
    if total <= 0.0 {
        let mut out = Aggregation::unverifiable();
        out.breakdown = breakdown(trust, evidence, &raws, 0.0);
        out.conflict_detected = conflict_detected;
        out.contested = contested;
        return out;
    }
    let winner = (0..Verdict::ALL.len())
        .max_by(|&a, &b| weighted[a].total_cmp(&weighted[b]))
        .unwrap_or(0);
    let share = weighted[winner] / total;

    let (verdict, winning_mass) = if share > policy.majority_share {
        (Verdict::ALL[winner], weighted[winner])
    } else {
        // No majority: the claim itself is unverifiable; only evidence that
        // says so contributes to the reported confidence.
        (
            Verdict::Unverifiable,
            weighted[verdict_index(Verdict::Unverifiable)],
        )
    };

    // Normalize against the best possible lineup of the same size.
    let ceiling = evidence.len() as f64 * trust.max_weight();
    let confidence = (winning_mass / ceiling).clamp(0.0, 1.0);

    let breakdown = breakdown(trust, evidence, &raws, confidence);
    debug_assert!(
        (breakdown.iter().map(|b| b.contribution).sum::<f64>() - confidence).abs() <= 1e-6,
        "breakdown contributions must sum to the confidence score"
    );

    debug!(
        verdict = verdict.label(),
        confidence,
        conflict = conflict_detected,
        items = evidence.len(),
        "aggregated evidence set"
    );

    Aggregation {
        verdict,
        confidence,
        breakdown,
        conflict_detected,
        contested,
    }
}

fn max_timestamp(evidence: &[Evidence]) -> DateTime<Utc> {
    evidence
        .iter()
        .map(|e| e.timestamp)
        .max()
        .unwrap_or_else(Utc::now)
}

fn min_timestamp(evidence: &[Evidence]) -> DateTime<Utc> {
    evidence
        .iter()
        .map(|e| e.timestamp)
        .min()
        .unwrap_or_else(Utc::now)
}

fn verdict_index(v: Verdict) -> usize {
    Verdict::ALL.iter().position(|x| *x == v).unwrap_or(0)
}

/// Count-majority verdict among items strictly older than the newest
/// timestamp. Ties mean there is no majority to override.
fn majority_of_older(evidence: &[Evidence], newest: DateTime<Utc>) -> Option<Verdict> {
    let mut counts = [0usize; Verdict::ALL.len()];
    for ev in evidence.iter().filter(|e| e.timestamp < newest) {
        counts[verdict_index(ev.verdict)] += 1;
    }
    let best = *counts.iter().max()?;
    if best == 0 {
        return None;
    }
    let mut winners = counts.iter().enumerate().filter(|(_, c)| **c == best);
    let (i, _) = winners.next()?;
    if winners.next().is_some() {
        return None; // tied, no majority
    }
    Some(Verdict::ALL[i])
}

/// A latest official or fact-check item contradicting the older majority
/// earns the override boost.
fn is_override(ev: &Evidence, newest: DateTime<Utc>, older_majority: Option<Verdict>) -> bool {
    ev.timestamp == newest
        && matches!(
            ev.source_type,
            SourceType::Official | SourceType::FactCheckOrg
        )
        && older_majority.is_some_and(|m| m != ev.verdict)
}

/// Per-source-type audit view: table weight, mean item score, and share of
/// the final confidence. Source types are visited in declaration order so
/// float accumulation is stable across platforms; the result is then
/// sorted by contribution, largest first.
fn breakdown(
    trust: &TrustTable,
    evidence: &[Evidence],
    raws: &[f64],
    confidence: f64,
) -> Vec<BreakdownEntry> {
    let total_mass: f64 = raws.iter().sum();
    let mut entries = Vec::new();

    for st in SourceType::ALL {
        let mut count = 0usize;
        let mut score_sum = 0.0;
        let mut mass = 0.0;
        for (ev, raw) in evidence.iter().zip(raws) {
            if ev.source_type == st {
                count += 1;
                score_sum += ev.confidence;
                mass += raw;
            }
        }
        if count == 0 {
            continue;
        }
        let contribution = if total_mass > 0.0 {
            confidence * (mass / total_mass)
        } else {
            0.0
        };
        entries.push(BreakdownEntry {
            source_type: st,
            weight: trust.weight_of(st),
            score: score_sum / count as f64,
            contribution,
        });
    }

    entries.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn ev(
        source: &str,
        st: SourceType,
        secs: i64,
        verdict: Verdict,
        confidence: f64,
    ) -> Evidence {
        Evidence::new(source, st, at(secs), verdict, confidence)
    }

    fn run(evidence: &[Evidence]) -> Aggregation {
        aggregate(&TrustTable::default(), &Policy::default(), evidence)
    }

    #[test]
    fn empty_set_is_unverifiable() {
        let agg = run(&[]);
        assert_eq!(agg.verdict, Verdict::Unverifiable);
        assert_eq!(agg.confidence, 0.0);
        assert!(agg.breakdown.is_empty());
        assert!(!agg.conflict_detected);
    }

    #[test]
    fn single_official_item_scores_weight_times_confidence() {
        let agg = run(&[ev("ministry", SourceType::Official, 0, Verdict::True, 0.9)]);
        assert_eq!(agg.verdict, Verdict::True);
        assert!((agg.confidence - 0.9).abs() < 1e-12);
        assert!(!agg.conflict_detected);
    }

    #[test]
    fn single_social_item_is_capped_by_trust() {
        let agg = run(&[ev("somebody", SourceType::SocialMedia, 0, Verdict::True, 0.9)]);
        assert_eq!(agg.verdict, Verdict::True);
        assert!((agg.confidence - 0.4 * 0.9).abs() < 1e-12);
    }

    #[test]
    fn breakdown_contributions_sum_to_confidence() {
        let agg = run(&[
            ev("ministry", SourceType::Official, 7200, Verdict::False, 0.9),
            ev("daily", SourceType::MajorNews, 3600, Verdict::False, 0.7),
            ev("somebody", SourceType::SocialMedia, 0, Verdict::True, 0.8),
            ev("factcheck", SourceType::FactCheckOrg, 5400, Verdict::False, 0.85),
        ]);
        let sum: f64 = agg.breakdown.iter().map(|b| b.contribution).sum();
        assert!((sum - agg.confidence).abs() < 1e-6);
        // sorted largest first
        for pair in agg.breakdown.windows(2) {
            assert!(pair[0].contribution >= pair[1].contribution);
        }
    }

    #[test]
    fn newer_identical_item_contributes_more() {
        let old = run(&[
            ev("a", SourceType::MajorNews, 0, Verdict::True, 0.8),
            ev("anchor", SourceType::Unknown, 7200, Verdict::Unverifiable, 0.1),
        ]);
        let new = run(&[
            ev("a", SourceType::MajorNews, 7200, Verdict::True, 0.8),
            ev("anchor", SourceType::Unknown, 0, Verdict::Unverifiable, 0.1),
        ]);
        assert!(new.confidence > old.confidence);
    }

    #[test]
    fn lone_dissenting_tweet_does_not_trigger_conflict() {
        let agg = run(&[
            ev("daily", SourceType::MajorNews, 0, Verdict::True, 0.8),
            ev("herald", SourceType::MajorNews, 600, Verdict::True, 0.7),
            ev("tribune", SourceType::MajorNews, 1200, Verdict::True, 0.6),
            ev("somebody", SourceType::SocialMedia, 900, Verdict::False, 0.5),
        ]);
        assert!(!agg.conflict_detected);
        assert_eq!(agg.verdict, Verdict::True);
    }

    #[test]
    fn contested_claim_is_penalized() {
        let calm = run(&[
            ev("ministry", SourceType::Official, 0, Verdict::False, 0.9),
            ev("daily", SourceType::MajorNews, 60, Verdict::False, 0.8),
        ]);
        let contested = run(&[
            ev("ministry", SourceType::Official, 0, Verdict::False, 0.9),
            ev("daily", SourceType::MajorNews, 60, Verdict::False, 0.8),
            ev("herald", SourceType::MajorNews, 30, Verdict::True, 0.8),
        ]);
        assert!(contested.conflict_detected);
        assert_eq!(contested.verdict, Verdict::False);
        assert!(contested.confidence < calm.confidence);
    }

    #[test]
    fn even_split_yields_unverifiable() {
        let agg = run(&[
            ev("ministry", SourceType::Official, 0, Verdict::True, 0.8),
            ev("agency", SourceType::Official, 0, Verdict::False, 0.8),
        ]);
        assert!(agg.conflict_detected);
        assert_eq!(agg.verdict, Verdict::Unverifiable);
        assert_eq!(agg.confidence, 0.0);
    }

    #[test]
    fn latest_official_agreeing_with_majority_gets_no_boost() {
        // Same shape twice, once with the official item arriving last and
        // agreeing: confidence must equal the plain weighted computation.
        let evidence = [
            ev("daily", SourceType::MajorNews, 0, Verdict::True, 0.8),
            ev("herald", SourceType::MajorNews, 1800, Verdict::True, 0.7),
            ev("ministry", SourceType::Official, 3600, Verdict::True, 0.9),
        ];
        let boosted_policy = Policy::default();
        let no_boost_policy = Policy {
            override_boost: 1.0,
            ..Policy::default()
        };
        let trust = TrustTable::default();
        let a = aggregate(&trust, &boosted_policy, &evidence);
        let b = aggregate(&trust, &no_boost_policy, &evidence);
        assert!((a.confidence - b.confidence).abs() < 1e-12);
    }

    #[test]
    fn all_zero_scores_resolve_to_unverifiable() {
        let agg = run(&[
            ev("a", SourceType::MajorNews, 0, Verdict::True, 0.0),
            ev("b", SourceType::MajorNews, 60, Verdict::False, 0.0),
        ]);
        assert_eq!(agg.verdict, Verdict::Unverifiable);
        assert_eq!(agg.confidence, 0.0);
    }

    #[test]
    fn policy_validation_rejects_bad_tuning() {
        let bad = Policy {
            conflict_penalty: 1.5,
            ..Policy::default()
        };
        assert!(bad.validate().is_err());
        let bad = Policy {
            majority_share: 0.2,
            ..Policy::default()
        };
        assert!(bad.validate().is_err());
        assert!(Policy::default().validate().is_ok());
    }
}
