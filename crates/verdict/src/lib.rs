//! Evidence aggregation and conflict resolution for claim review.
//!
//! Weighs timestamped, source-typed evidence about a claim into a single
//! verdict, a calibrated confidence score and an auditable report. Pure and
//! stateless per call: the only long-lived piece is the read-only trust
//! table, so batches can be fanned out across threads freely.

mod aggregate;
mod normalize;
mod report;
mod schema;
mod timeline;
mod trust;

pub use aggregate::{aggregate, Aggregation, Policy};
pub use normalize::{normalize, screen, SkippedEvidence};
pub use report::{Rendered, Report};
pub use schema::{BreakdownEntry, Claim, Evidence, EvidenceDraft, SourceType, Verdict};
pub use timeline::{build_timeline, explain};
pub use trust::TrustTable;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum EngineError {
    /// One evidence record was unusable. Carried per item in skip lists;
    /// never aborts the claim it belongs to.
    #[error("malformed evidence from {source}: {reason}")]
    MalformedEvidence { source: String, reason: String },

    #[error("invalid policy: {0}")]
    Policy(String),

    #[error("serialization error: {0}")]
    Ser(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Review result plus the records screening had to drop.
#[derive(Clone, Debug)]
pub struct ReviewOutcome {
    pub report: Report,
    pub skipped: Vec<SkippedEvidence>,
}

/// The review engine: a trust table and an aggregation policy.
///
/// All methods take `&self`; an `Engine` can be shared across worker
/// threads and reviews never touch shared mutable state.
pub struct Engine {
    trust: TrustTable,
    policy: Policy,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            trust: TrustTable::default(),
            policy: Policy::default(),
        }
    }

    /// Build with tuned policy. Fails fast instead of reviewing claims
    /// under nonsensical tuning.
    pub fn with_policy(trust: TrustTable, policy: Policy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { trust, policy })
    }

    pub fn trust(&self) -> &TrustTable {
        &self.trust
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Review one claim against already-typed evidence.
    pub fn review(&self, claim: &Claim, evidence: Vec<Evidence>) -> Report {
        let kept = normalize::normalize(evidence, self.policy.dedup_window());
        let aggregation = aggregate::aggregate(&self.trust, &self.policy, &kept);
        let timeline = timeline::build_timeline(&kept);
        let explanation = timeline::explain(claim, &aggregation, &timeline, &self.trust);

        debug!(
            claim = %claim.id,
            verdict = aggregation.verdict.label(),
            confidence = aggregation.confidence,
            "claim reviewed"
        );

        Report {
            claim_id: claim.id.clone(),
            claim_text: claim.text.clone(),
            verdict: aggregation.verdict,
            confidence: aggregation.confidence,
            evidence: kept,
            breakdown: aggregation.breakdown,
            timeline,
            explanation,
            conflict_detected: aggregation.conflict_detected,
            notes: vec![],
        }
    }

    /// Review one claim against wire drafts. Malformed records are skipped
    /// individually; if nothing survives, the claim degrades to an
    /// unverifiable report with a diagnostic note rather than an error.
    pub fn review_drafts(&self, claim: &Claim, drafts: Vec<EvidenceDraft>) -> ReviewOutcome {
        let (evidence, skipped) = normalize::screen(drafts);
        let mut report = self.review(claim, evidence);
        if report.evidence.is_empty() && !skipped.is_empty() {
            report.notes.push(format!(
                "all {} evidence records were malformed; the claim could not be assessed",
                skipped.len()
            ));
        }
        ReviewOutcome { report, skipped }
    }

    /// Review many claims. Output order matches input order, and one
    /// claim's evidence can never abort its siblings.
    pub fn review_batch(&self, batch: Vec<(Claim, Vec<Evidence>)>) -> Vec<Report> {
        batch
            .into_iter()
            .map(|(claim, evidence)| self.review(&claim, evidence))
            .collect()
    }

    /// Batch form of [`Engine::review_drafts`], same ordering guarantee.
    pub fn review_draft_batch(
        &self,
        batch: Vec<(Claim, Vec<EvidenceDraft>)>,
    ) -> Vec<ReviewOutcome> {
        batch
            .into_iter()
            .map(|(claim, drafts)| self.review_drafts(&claim, drafts))
            .collect()
    }
}
