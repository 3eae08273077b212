//! Locale-specific urgency keyword tiers.
//!
//! Tiers are checked strictly in order: any emergency phrase wins outright,
//! then high, then low (explicitly routine phrasing). No hit means medium.

use carefind_core::{Locale, UrgencyLevel};

use crate::text::contains_phrase;

struct Tiers {
    emergency: &'static [&'static str],
    high: &'static [&'static str],
    low: &'static [&'static str],
}

const EN: Tiers = Tiers {
    emergency: &[
        "can't breathe",
        "cannot breathe",
        "can not breathe",
        "unable to breathe",
        "not breathing",
        "severe chest pain",
        "crushing chest pain",
        "heart attack",
        "stroke",
        "unconscious",
        "unresponsive",
        "seizure",
        "severe bleeding",
        "bleeding heavily",
        "suicide",
        "suicidal",
        "overdose",
        "poisoning",
        "choking",
        "anaphylaxis",
        "fainted",
        "collapsed",
    ],
    high: &[
        "high fever",
        "fracture",
        "broken bone",
        "severe pain",
        "severe headache",
        "vomiting blood",
        "blood in stool",
        "blood in urine",
        "shortness of breath",
        "difficulty breathing",
        "chest pain",
        "persistent vomiting",
        "dehydrated",
        "dehydration",
        "deep cut",
        "head injury",
        "burn",
    ],
    low: &[
        "routine",
        "checkup",
        "check-up",
        "check up",
        "follow-up",
        "follow up",
        "mild",
        "vaccination",
        "vaccine",
        "prescription refill",
        "annual physical",
    ],
};

const HI: Tiers = Tiers {
    emergency: &[
        "सांस नहीं",
        "साँस नहीं",
        "सीने में तेज दर्द",
        "छाती में तेज दर्द",
        "दिल का दौरा",
        "लकवा",
        "बेहोश",
        "बहुत खून",
        "दौरा पड़",
        "आत्महत्या",
        "ज़हर",
        "जहर",
    ],
    high: &[
        "तेज बुखार",
        "हड्डी टूट",
        "खून की उल्टी",
        "तेज दर्द",
        "सांस फूल",
        "साँस फूल",
        "सीने में दर्द",
        "गहरा घाव",
        "जल गया",
    ],
    low: &["नियमित", "चेकअप", "जांच", "जाँच", "टीका", "हल्का", "हल्की"],
};

const ES: Tiers = Tiers {
    emergency: &[
        "no puedo respirar",
        "dolor de pecho fuerte",
        "dolor fuerte en el pecho",
        "ataque al corazón",
        "infarto",
        "derrame cerebral",
        "inconsciente",
        "convulsión",
        "sangrado abundante",
        "suicidio",
        "sobredosis",
        "envenenamiento",
        "desmayo",
        "me desmayé",
    ],
    high: &[
        "fiebre alta",
        "fractura",
        "hueso roto",
        "dolor intenso",
        "vómito con sangre",
        "sangre en las heces",
        "falta de aire",
        "dificultad para respirar",
        "dolor de pecho",
        "deshidratación",
        "corte profundo",
        "quemadura",
    ],
    low: &["rutina", "chequeo", "revisión", "control", "vacuna", "leve"],
};

fn tiers(locale: Locale) -> &'static Tiers {
    match locale {
        Locale::En => &EN,
        Locale::Hi => &HI,
        Locale::Es => &ES,
    }
}

/// Urgency of already-normalized `text` under `locale`'s keyword tiers.
///
/// Returns the level plus whether any tier matched.
#[must_use]
pub fn detect_urgency(text: &str, locale: Locale) -> (UrgencyLevel, bool) {
    let tiers = tiers(locale);
    let hit = |words: &[&str]| words.iter().any(|w| contains_phrase(text, w));

    if hit(tiers.emergency) {
        (UrgencyLevel::Emergency, true)
    } else if hit(tiers.high) {
        (UrgencyLevel::High, true)
    } else if hit(tiers.low) {
        (UrgencyLevel::Low, true)
    } else {
        (UrgencyLevel::Medium, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_beats_lower_tiers() {
        let (level, _) = detect_urgency("routine checkup but now i can't breathe", Locale::En);
        assert_eq!(level, UrgencyLevel::Emergency);
    }

    #[test]
    fn high_beats_low() {
        let (level, _) = detect_urgency("mild cough and high fever", Locale::En);
        assert_eq!(level, UrgencyLevel::High);
    }

    #[test]
    fn no_hit_is_medium() {
        assert_eq!(
            detect_urgency("something feels off", Locale::En),
            (UrgencyLevel::Medium, false)
        );
    }

    #[test]
    fn hindi_and_spanish_tiers() {
        assert_eq!(
            detect_urgency("मुझे तेज बुखार है", Locale::Hi).0,
            UrgencyLevel::High
        );
        assert_eq!(
            detect_urgency("no puedo respirar", Locale::Es).0,
            UrgencyLevel::Emergency
        );
        assert_eq!(detect_urgency("chequeo anual", Locale::Es).0, UrgencyLevel::Low);
    }

    #[test]
    fn every_tier_keyword_is_normalized() {
        for tiers in [&EN, &HI, &ES] {
            for word in tiers.emergency.iter().chain(tiers.high).chain(tiers.low) {
                assert_eq!(crate::text::normalize_text(word), *word);
            }
        }
    }
}
