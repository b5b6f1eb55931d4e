//! Analyse simulée: aucun calcul ne dépend du contenu de l'image.
//!
//! C'est ici qu'un vrai classifieur viendrait se brancher, en implémentant
//! [`Analyzer`]. Le reste du pipeline ne voit que [`AnalysisResult`].

use std::ops::Range;

use chrono::Utc;
use rand::Rng;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::imaging::ImagePayload;
use crate::models::{AnalysisResult, DeficiencyType, Severity};

pub trait Analyzer {
    fn analyze(&mut self, image: &ImagePayload) -> AnalysisResult;
}

/// Comment le type et la sévérité sont choisis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPolicy {
    /// Type et sévérité tirés uniformément
    Random,
    /// Type et sévérité imposés
    Fixed(DeficiencyType, Severity),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid confidence range {start}..{end}")]
pub struct InvalidConfidenceRange {
    pub start: u8,
    pub end: u8,
}

/// Tire des résultats au hasard, selon une politique donnée
pub struct RandomAnalyzer<R> {
    policy: AnalysisPolicy,
    confidence: Range<u8>,
    rng: R,
}

impl RandomAnalyzer<rand::rngs::ThreadRng> {
    pub fn new(
        policy: AnalysisPolicy,
        confidence: Range<u8>,
    ) -> Result<Self, InvalidConfidenceRange> {
        Self::with_rng(policy, confidence, rand::thread_rng())
    }
}

impl<R: Rng> RandomAnalyzer<R> {
    /// La plage de confiance est semi-ouverte, non vide et bornée à 100.
    pub fn with_rng(
        policy: AnalysisPolicy,
        confidence: Range<u8>,
        rng: R,
    ) -> Result<Self, InvalidConfidenceRange> {
        if confidence.is_empty() || confidence.end > 101 {
            return Err(InvalidConfidenceRange {
                start: confidence.start,
                end: confidence.end,
            });
        }

        Ok(Self {
            policy,
            confidence,
            rng,
        })
    }

    fn pick<T: IntoEnumIterator + Copy>(&mut self) -> T {
        let all: Vec<T> = T::iter().collect();
        all[self.rng.gen_range(0..all.len())]
    }
}

impl<R: Rng> Analyzer for RandomAnalyzer<R> {
    fn analyze(&mut self, _image: &ImagePayload) -> AnalysisResult {
        let (deficiency_type, severity) = match self.policy {
            AnalysisPolicy::Random => (self.pick(), self.pick()),
            AnalysisPolicy::Fixed(kind, severity) => (kind, severity),
        };

        AnalysisResult {
            deficiency_type,
            severity,
            confidence: self.rng.gen_range(self.confidence.clone()),
            analysis_date: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::tests::PNG_MAGIC;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn image() -> ImagePayload {
        ImagePayload::from_bytes(PNG_MAGIC).unwrap()
    }

    #[test]
    fn test_confidence_stays_in_range() {
        let mut analyzer =
            RandomAnalyzer::with_rng(AnalysisPolicy::Random, 70..100, StdRng::seed_from_u64(7))
                .unwrap();

        for _ in 0..500 {
            let result = analyzer.analyze(&image());
            assert!(
                (70..100).contains(&result.confidence),
                "Confidence {} out of range",
                result.confidence
            );
        }
    }

    #[test]
    fn test_random_policy_covers_all_types() {
        let mut analyzer =
            RandomAnalyzer::with_rng(AnalysisPolicy::Random, 0..101, StdRng::seed_from_u64(1))
                .unwrap();

        let kinds: HashSet<DeficiencyType> =
            (0..500).map(|_| analyzer.analyze(&image()).deficiency_type).collect();
        let severities: HashSet<Severity> =
            (0..500).map(|_| analyzer.analyze(&image()).severity).collect();

        assert_eq!(kinds.len(), 5);
        assert_eq!(severities.len(), 3);
    }

    #[test]
    fn test_fixed_policy() {
        let policy = AnalysisPolicy::Fixed(DeficiencyType::A, Severity::Moderate);
        let mut analyzer =
            RandomAnalyzer::with_rng(policy, 50..80, StdRng::seed_from_u64(3)).unwrap();

        for _ in 0..50 {
            let result = analyzer.analyze(&image());
            assert_eq!(result.deficiency_type, DeficiencyType::A);
            assert_eq!(result.severity, Severity::Moderate);
        }
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(RandomAnalyzer::new(AnalysisPolicy::Random, 80..80).is_err());
        assert!(RandomAnalyzer::new(AnalysisPolicy::Random, 90..70).is_err());
        assert!(RandomAnalyzer::new(AnalysisPolicy::Random, 0..102).is_err());
        assert!(RandomAnalyzer::new(AnalysisPolicy::Random, 0..101).is_ok());
    }
}
