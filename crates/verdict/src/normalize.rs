use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::schema::{Evidence, EvidenceDraft};
use crate::{EngineError, Result};

/// A draft that failed screening, with the reason it was dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkippedEvidence {
    pub source: String,
    pub reason: String,
}

/// Validate wire drafts one by one. A bad record is skipped with a reason;
/// its siblings are unaffected.
pub fn screen(drafts: Vec<EvidenceDraft>) -> (Vec<Evidence>, Vec<SkippedEvidence>) {
    let mut kept = Vec::with_capacity(drafts.len());
    let mut skipped = Vec::new();

    for draft in drafts {
        let source = draft.source.clone().unwrap_or_else(|| "<unknown>".into());
        match screen_one(draft) {
            Ok(ev) => kept.push(ev),
            Err(e) => {
                warn!(source = %source, error = %e, "skipping malformed evidence");
                skipped.push(SkippedEvidence {
                    source,
                    reason: e.to_string(),
                });
            }
        }
    }

    (kept, skipped)
}

fn screen_one(draft: EvidenceDraft) -> Result<Evidence> {
    let malformed = |source: &Option<String>, reason: &str| EngineError::MalformedEvidence {
        source: source.clone().unwrap_or_else(|| "<unknown>".into()),
        reason: reason.into(),
    };

    let Some(source) = draft.source.clone().filter(|s| !s.trim().is_empty()) else {
        return Err(malformed(&draft.source, "missing source"));
    };
    let Some(source_type) = draft.source_type else {
        return Err(malformed(&draft.source, "missing source type"));
    };
    let Some(raw_ts) = draft.timestamp.as_deref() else {
        return Err(malformed(&draft.source, "missing timestamp"));
    };
    let timestamp: DateTime<Utc> = match DateTime::parse_from_rfc3339(raw_ts) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            return Err(malformed(
                &draft.source,
                &format!("unparseable timestamp {raw_ts:?}: {e}"),
            ))
        }
    };
    let Some(verdict) = draft.verdict else {
        return Err(malformed(&draft.source, "missing verdict"));
    };
    let Some(confidence) = draft.confidence else {
        return Err(malformed(&draft.source, "missing confidence score"));
    };
    if confidence.is_nan() {
        return Err(malformed(&draft.source, "confidence score is not a number"));
    }

    Ok(Evidence {
        source,
        source_type,
        timestamp,
        verdict,
        confidence,
        title: draft.title,
        summary: draft.summary,
    })
}

/// Clamp scores into [0,1] and collapse near-duplicate records.
///
/// Two items are duplicates when source, source type and verdict all match
/// and their timestamps fall within `dedup_window`; the higher-confidence
/// one survives. Output order follows input order and is otherwise
/// unsorted: scoring and display each sort for their own purposes.
pub fn normalize(evidence: Vec<Evidence>, dedup_window: Duration) -> Vec<Evidence> {
    let mut kept: Vec<Evidence> = Vec::with_capacity(evidence.len());
    let mut by_fingerprint: HashMap<[u8; 32], Vec<usize>> = HashMap::new();

    'records: for mut ev in evidence {
        ev.confidence = clamp_score(ev.confidence);

        let fp = fingerprint(&ev);
        if let Some(indices) = by_fingerprint.get(&fp) {
            for &i in indices {
                let gap = (kept[i].timestamp - ev.timestamp).abs();
                if gap <= dedup_window {
                    debug!(source = %ev.source, "collapsing duplicate evidence");
                    if ev.confidence > kept[i].confidence {
                        // keep the timestamp slot, take the stronger record
                        kept[i] = ev;
                    }
                    continue 'records;
                }
            }
        }

        by_fingerprint.entry(fp).or_default().push(kept.len());
        kept.push(ev);
    }

    kept
}

fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Duplicate fingerprint over the identity fields only; timestamp and
/// score are compared separately.
fn fingerprint(ev: &Evidence) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(ev.source.as_bytes());
    hasher.update(b"\x00");
    hasher.update(ev.source_type.label().as_bytes());
    hasher.update(b"\x00");
    hasher.update(ev.verdict.label().as_bytes());
    *hasher.finalize().as_bytes()
}
