//! Keyword-driven symptom classification.

use carefind_core::{normalize_locale, Classification, Specialization, SpecializationId};

use crate::catalog::SpecializationCatalog;
use crate::lexicon::detect_urgency;
use crate::recommend::{generic_recommendation, recommendations};
use crate::text::{contains_phrase, normalize_text};

/// Maps free text to an urgency tier and ranked specializations.
///
/// Never fails: text with no recognizable keyword is `medium` urgency with no
/// specializations and a generic recommendation.
#[derive(Debug, Clone)]
pub struct SymptomClassifier {
    catalog: SpecializationCatalog,
}

impl Default for SymptomClassifier {
    fn default() -> Self {
        Self::new(SpecializationCatalog::builtin())
    }
}

impl SymptomClassifier {
    #[must_use]
    pub fn new(catalog: SpecializationCatalog) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &SpecializationCatalog {
        &self.catalog
    }

    /// Classifies `text` using the lexicon for `locale` (a BCP 47 tag;
    /// unsupported languages use English).
    #[must_use]
    pub fn classify(&self, text: &str, locale: &str) -> Classification {
        let locale = normalize_locale(locale);
        let normalized = normalize_text(text);

        let (urgency_level, urgency_matched) = detect_urgency(&normalized, locale);
        let ranked = self.rank_specializations(&normalized, locale.code());

        let recommendations = if !urgency_matched && ranked.is_empty() {
            vec![generic_recommendation(locale).to_owned()]
        } else {
            let top = ranked.first().and_then(|id| self.catalog.get(id));
            recommendations(urgency_level, top, locale)
        };

        tracing::debug!(
            %urgency_level,
            specializations = ranked.len(),
            %locale,
            "classified symptom text"
        );

        Classification {
            urgency_level,
            specializations: ranked,
            recommendations,
        }
    }

    /// Specializations with at least one keyword hit, most distinct hits first,
    /// ties broken by id.
    fn rank_specializations(&self, text: &str, locale: &str) -> Vec<SpecializationId> {
        let mut scored: Vec<(usize, &SpecializationId)> = self
            .catalog
            .iter()
            .filter_map(|spec| {
                let hits = spec
                    .keyword_sets
                    .get(locale)?
                    .iter()
                    .filter(|k| contains_phrase(text, k))
                    .count();
                (hits > 0).then_some((hits, &spec.id))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

        let mut ids: Vec<SpecializationId> = Vec::with_capacity(scored.len());
        for (_, id) in scored {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    /// Catalog entries for `ids`, in order, skipping unknown ids.
    #[must_use]
    pub fn resolve(&self, ids: &[SpecializationId]) -> Vec<Specialization> {
        ids.iter()
            .filter_map(|id| self.catalog.get(id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use carefind_core::UrgencyLevel;

    use super::*;

    fn ids(c: &Classification) -> Vec<&str> {
        c.specializations.iter().map(SpecializationId::as_str).collect()
    }

    #[test]
    fn chest_pain_and_breathlessness_is_cardiac_emergency() {
        let c = SymptomClassifier::default().classify("severe chest pain, can't breathe", "en");
        assert_eq!(c.urgency_level, UrgencyLevel::Emergency);
        assert!(ids(&c).contains(&"cardiology"));
        assert!(c.recommendations[0].contains("emergency services"));
    }

    #[test]
    fn curly_apostrophe_still_matches_emergency_phrase() {
        let c = SymptomClassifier::default().classify("I can\u{2019}t breathe", "en-US");
        assert_eq!(c.urgency_level, UrgencyLevel::Emergency);
    }

    #[test]
    fn routine_checkup_is_low() {
        let c = SymptomClassifier::default().classify("routine checkup", "en");
        assert_eq!(c.urgency_level, UrgencyLevel::Low);
    }

    #[test]
    fn no_keywords_is_medium_with_generic_advice() {
        let c = SymptomClassifier::default().classify("hello there", "en");
        assert_eq!(c.urgency_level, UrgencyLevel::Medium);
        assert!(c.specializations.is_empty());
        assert_eq!(c.recommendations, vec![generic_recommendation(carefind_core::Locale::En)]);
    }

    #[test]
    fn empty_text_never_fails() {
        let c = SymptomClassifier::default().classify("", "xx");
        assert_eq!(c.urgency_level, UrgencyLevel::Medium);
        assert_eq!(c.recommendations.len(), 1);
    }

    #[test]
    fn specializations_ranked_by_distinct_hits_then_id() {
        // dermatology: rash, itchy, skin (3); pediatrics: baby (1); ent: ear (1)
        let c = SymptomClassifier::default().classify(
            "my baby has an itchy rash on the skin near the ear",
            "en",
        );
        assert_eq!(ids(&c), vec!["dermatology", "ent", "pediatrics"]);
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let c = SymptomClassifier::default()
            .classify("cough cough cough and a rash and itching", "en");
        assert_eq!(ids(&c)[0], "dermatology");
    }

    #[test]
    fn spanish_text_uses_spanish_keywords() {
        let c = SymptomClassifier::default().classify("Tengo dolor de muelas", "es-MX");
        assert_eq!(ids(&c), vec!["dentistry"]);
        assert_eq!(c.urgency_level, UrgencyLevel::Medium);
        assert!(c.recommendations.last().unwrap().contains("Odontología"));
    }

    #[test]
    fn hindi_text_uses_hindi_keywords() {
        let c = SymptomClassifier::default().classify("बच्चे को तेज बुखार है", "hi");
        assert_eq!(c.urgency_level, UrgencyLevel::High);
        assert!(ids(&c).contains(&"pediatrics"));
        assert!(ids(&c).contains(&"general_medicine"));
    }

    #[test]
    fn resolve_skips_unknown_ids() {
        let classifier = SymptomClassifier::default();
        let resolved = classifier.resolve(&[
            SpecializationId::new("cardiology"),
            SpecializationId::new("astrology"),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].canonical_name, "Cardiology");
    }
}
