use serde::{Deserialize, Serialize};

use crate::schema::{BreakdownEntry, Evidence, Verdict};
use crate::{EngineError, Result};

/// Final, immutable review result for one claim. Serialization is a
/// projection only: nothing here is ever recomputed on export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub claim_id: String,
    pub claim_text: String,
    pub verdict: Verdict,
    pub confidence: f64,
    /// Evidence the scores were computed from (post-normalization).
    pub evidence: Vec<Evidence>,
    pub breakdown: Vec<BreakdownEntry>,
    /// Same evidence, chronologically sorted for display.
    pub timeline: Vec<Evidence>,
    pub explanation: String,
    pub conflict_detected: bool,
    /// Diagnostics, e.g. when every evidence record was malformed.
    pub notes: Vec<String>,
}

/// Both serialized forms, for callers that archive and display at once.
#[derive(Clone, Debug, PartialEq)]
pub struct Rendered {
    pub json: String,
    pub text: String,
}

impl Report {
    /// Machine-readable form, full field fidelity. Parsing and
    /// re-serializing yields byte-identical output.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| EngineError::Ser(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::Ser(e.to_string()))
    }

    /// Operator-readable summary.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Claim {}: {}\n", self.claim_id, self.claim_text));
        out.push_str(&format!("Verdict: {}\n", self.verdict.label()));
        out.push_str(&format!(
            "Confidence: {}%\n",
            (self.confidence * 100.0).round() as i64
        ));
        out.push_str("Evidence:\n");
        if self.timeline.is_empty() {
            out.push_str("  (none)\n");
        }
        for ev in &self.timeline {
            out.push_str(&format!(
                "  - [{}] {} at {}: {} (score {:.2})",
                ev.source_type.label(),
                ev.source,
                ev.timestamp.to_rfc3339(),
                ev.verdict.label(),
                ev.confidence
            ));
            if let Some(title) = &ev.title {
                out.push_str(&format!(" ({title})"));
            }
            out.push('\n');
        }
        for note in &self.notes {
            out.push_str(&format!("Note: {note}\n"));
        }
        out.push('\n');
        out.push_str(&self.explanation);
        out.push('\n');
        out
    }

    pub fn render(&self) -> Result<Rendered> {
        Ok(Rendered {
            json: self.to_json()?,
            text: self.to_text(),
        })
    }

    /// Deterministic content hash over canonical bytes, for archival dedup.
    pub fn digest(&self) -> Result<[u8; 32]> {
        let bytes = bincode::serialize(self).map_err(|e| EngineError::Ser(e.to_string()))?;
        Ok(blake3::hash(&bytes).into())
    }

    pub fn digest_hex(&self) -> Result<String> {
        Ok(hex::encode(self.digest()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Claim, SourceType};
    use crate::Engine;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn sample_report() -> Report {
        let claim = Claim::new("c-9", "the dam failed", "event");
        let evidence = vec![
            Evidence::new("somebody", SourceType::SocialMedia, at(0), Verdict::True, 0.7),
            Evidence::new(
                "ministry",
                SourceType::Official,
                at(4 * 3600),
                Verdict::False,
                0.9,
            ),
        ];
        Engine::new().review(&claim, evidence)
    }

    #[test]
    fn json_round_trip_is_byte_identical() {
        let report = sample_report();
        let json = report.to_json().unwrap();
        let parsed = Report::from_json(&json).unwrap();
        assert_eq!(parsed, report);
        assert_eq!(parsed.to_json().unwrap(), json);
    }

    #[test]
    fn serialization_does_not_mutate_scores() {
        let report = sample_report();
        let before = report.confidence;
        let _ = report.render().unwrap();
        assert_eq!(report.confidence, before);
        assert_eq!(report, sample_report());
    }

    #[test]
    fn text_form_has_verdict_and_confidence_lines() {
        let report = sample_report();
        let text = report.to_text();
        assert!(text.contains("Verdict: false"));
        assert!(text.contains("Confidence:"));
        assert!(text.contains("  - [official] ministry"));
        assert!(text.ends_with(&format!("{}\n", report.explanation)));
    }

    #[test]
    fn digest_tracks_content() {
        let report = sample_report();
        assert_eq!(report.digest().unwrap(), sample_report().digest().unwrap());

        let mut tampered = report.clone();
        tampered.confidence = 0.99;
        assert_ne!(report.digest().unwrap(), tampered.digest().unwrap());
        assert_eq!(report.digest_hex().unwrap().len(), 64);
    }
}
