use crate::schema::SourceType;
use crate::{EngineError, Result};

/// Process-wide base trust weights, one per source type.
///
/// Built once at startup and shared read-only with every review call.
/// Weights must stay within [0,1] and non-increasing along the trust order
/// official >= fact-check org >= major news >= social media >= unknown, so a
/// tuned table can never rank chatter above an official statement.
#[derive(Clone, Debug, PartialEq)]
pub struct TrustTable {
    official: f64,
    fact_check_org: f64,
    major_news: f64,
    social_media: f64,
    unknown: f64,
}

impl Default for TrustTable {
    fn default() -> Self {
        Self {
            official: 1.0,
            fact_check_org: 0.85,
            major_news: 0.8,
            social_media: 0.4,
            unknown: 0.3,
        }
    }
}

impl TrustTable {
    /// Build a tuned table. Fails fast on out-of-range or non-monotonic
    /// weights instead of surfacing bad policy at lookup time.
    pub fn new(
        official: f64,
        fact_check_org: f64,
        major_news: f64,
        social_media: f64,
        unknown: f64,
    ) -> Result<Self> {
        let table = Self {
            official,
            fact_check_org,
            major_news,
            social_media,
            unknown,
        };

        for st in SourceType::ALL {
            let w = table.weight_of(st);
            if !w.is_finite() || !(0.0..=1.0).contains(&w) {
                return Err(EngineError::Policy(format!(
                    "trust weight for {} must be in [0,1], got {w}",
                    st.label()
                )));
            }
        }
        if !(official >= fact_check_org
            && fact_check_org >= major_news
            && major_news >= social_media
            && social_media >= unknown)
        {
            return Err(EngineError::Policy(
                "trust weights must be non-increasing along the trust order".into(),
            ));
        }

        Ok(table)
    }

    /// Pure lookup; the enum is closed so there is no failure mode.
    pub fn weight_of(&self, source_type: SourceType) -> f64 {
        match source_type {
            SourceType::Official => self.official,
            SourceType::MajorNews => self.major_news,
            SourceType::FactCheckOrg => self.fact_check_org,
            SourceType::SocialMedia => self.social_media,
            SourceType::Unknown => self.unknown,
        }
    }

    /// Largest weight in the table (the official weight, by the monotonic
    /// construction invariant). Used to normalize confidence against the
    /// best possible source lineup of the same size.
    pub fn max_weight(&self) -> f64 {
        self.official
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_follow_trust_order() {
        let t = TrustTable::default();
        assert_eq!(t.weight_of(SourceType::Official), 1.0);
        assert_eq!(t.weight_of(SourceType::FactCheckOrg), 0.85);
        assert_eq!(t.weight_of(SourceType::MajorNews), 0.8);
        assert_eq!(t.weight_of(SourceType::SocialMedia), 0.4);
        assert_eq!(t.weight_of(SourceType::Unknown), 0.3);
        assert_eq!(t.max_weight(), 1.0);
    }

    #[test]
    fn non_monotonic_table_rejected() {
        // social media above major news
        let res = TrustTable::new(1.0, 0.85, 0.5, 0.7, 0.3);
        assert!(res.is_err());
    }

    #[test]
    fn out_of_range_weight_rejected() {
        assert!(TrustTable::new(1.2, 0.85, 0.8, 0.4, 0.3).is_err());
        assert!(TrustTable::new(1.0, 0.85, 0.8, 0.4, -0.1).is_err());
    }

    #[test]
    fn tuned_table_accepted() {
        let t = TrustTable::new(0.9, 0.9, 0.7, 0.2, 0.1).unwrap();
        assert_eq!(t.weight_of(SourceType::MajorNews), 0.7);
    }
}
