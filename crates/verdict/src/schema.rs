use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trust category of an evidence source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Official,
    MajorNews,
    FactCheckOrg,
    SocialMedia,
    Unknown,
}

impl SourceType {
    /// Fixed iteration order for grouping and float accumulation.
    pub const ALL: [SourceType; 5] = [
        SourceType::Official,
        SourceType::MajorNews,
        SourceType::FactCheckOrg,
        SourceType::SocialMedia,
        SourceType::Unknown,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SourceType::Official => "official",
            SourceType::MajorNews => "major news",
            SourceType::FactCheckOrg => "fact-check organization",
            SourceType::SocialMedia => "social media",
            SourceType::Unknown => "unknown",
        }
    }
}

/// Truth classification carried by a piece of evidence or a final report.
///
/// There is deliberately no ordering here; disagreement between verdicts
/// is resolved by weighted mass, not by comparing variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    True,
    False,
    PartiallyTrue,
    Unverifiable,
}

impl Verdict {
    /// Fixed iteration order for bucketing.
    pub const ALL: [Verdict; 4] = [
        Verdict::True,
        Verdict::False,
        Verdict::PartiallyTrue,
        Verdict::Unverifiable,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Verdict::True => "true",
            Verdict::False => "false",
            Verdict::PartiallyTrue => "partially true",
            Verdict::Unverifiable => "unverifiable",
        }
    }
}

/// A single sourced, timestamped observation about a claim.
///
/// Immutable once produced by the retrieval layer; the engine only ever
/// clamps `confidence` into [0,1] during normalization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub source: String,
    pub source_type: SourceType,
    pub timestamp: DateTime<Utc>,
    pub verdict: Verdict,
    pub confidence: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Evidence {
    pub fn new(
        source: impl Into<String>,
        source_type: SourceType,
        timestamp: DateTime<Utc>,
        verdict: Verdict,
        confidence: f64,
    ) -> Self {
        Self {
            source: source.into(),
            source_type,
            timestamp,
            verdict,
            confidence,
            title: None,
            summary: None,
        }
    }
}

/// Wire-shaped evidence record as delivered by the retrieval layer.
///
/// Everything is optional because upstream feeds are unreliable; screening
/// turns a draft into an [`Evidence`] or rejects that one record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvidenceDraft {
    pub source: Option<String>,
    pub source_type: Option<SourceType>,
    /// RFC 3339 timestamp string.
    pub timestamp: Option<String>,
    pub verdict: Option<Verdict>,
    pub confidence: Option<f64>,
    pub title: Option<String>,
    pub summary: Option<String>,
}

/// An atomic factual assertion extracted upstream. Read-only input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    pub text: String,
    pub entity_type: String,
}

impl Claim {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            entity_type: entity_type.into(),
        }
    }
}

/// Per-source-type slice of the final confidence score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub source_type: SourceType,
    /// Trust-table weight for this source type.
    pub weight: f64,
    /// Mean confidence of this source type's evidence items.
    pub score: f64,
    /// This source type's share of the final confidence score.
    pub contribution: f64,
}
