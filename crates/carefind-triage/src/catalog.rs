//! Specialization catalog: the built-in table plus optional YAML override.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use carefind_core::{Specialization, SpecializationId};
use serde::Deserialize;

use crate::error::CatalogError;
use crate::text::normalize_text;

/// Locales the built-in catalog carries, in table column order.
pub const CATALOG_LOCALES: [&str; 3] = ["en", "hi", "es"];

struct BuiltinEntry {
    id: &'static str,
    /// Display names in [`CATALOG_LOCALES`] order; the first is canonical.
    names: [&'static str; 3],
    keywords: [&'static [&'static str]; 3],
}

const BUILTIN: &[BuiltinEntry] = &[
    BuiltinEntry {
        id: "general_medicine",
        names: ["General Medicine", "सामान्य चिकित्सा", "Medicina general"],
        keywords: [
            &["fever", "cold", "flu", "fatigue", "tired", "weakness", "body ache", "checkup", "check-up"],
            &["बुखार", "सर्दी", "जुकाम", "थकान", "कमजोरी", "बदन दर्द", "चेकअप"],
            &["fiebre", "resfriado", "gripe", "cansancio", "debilidad", "dolor de cuerpo", "chequeo"],
        ],
    },
    BuiltinEntry {
        id: "emergency_medicine",
        names: ["Emergency Medicine", "आपातकालीन चिकित्सा", "Medicina de urgencias"],
        keywords: [
            &["unconscious", "accident", "severe bleeding", "poisoning", "overdose", "choking", "burn"],
            &["बेहोश", "दुर्घटना", "बहुत खून", "ज़हर", "जहर", "जल गया"],
            &["inconsciente", "accidente", "sangrado abundante", "envenenamiento", "sobredosis", "asfixia", "quemadura"],
        ],
    },
    BuiltinEntry {
        id: "cardiology",
        names: ["Cardiology", "हृदय रोग", "Cardiología"],
        keywords: [
            &["chest pain", "heart", "palpitations", "blood pressure", "hypertension", "irregular heartbeat"],
            &["सीने में दर्द", "छाती में दर्द", "दिल", "धड़कन", "ब्लड प्रेशर", "रक्तचाप"],
            &["dolor de pecho", "dolor en el pecho", "corazón", "palpitaciones", "presión arterial", "hipertensión", "infarto"],
        ],
    },
    BuiltinEntry {
        id: "pulmonology",
        names: ["Pulmonology", "फेफड़ा रोग", "Neumología"],
        keywords: [
            &["breathe", "breathing", "shortness of breath", "asthma", "wheezing", "cough", "lung"],
            &["सांस", "साँस", "दमा", "खांसी", "फेफड़"],
            &["respirar", "falta de aire", "asma", "sibilancias", "tos", "pulmón", "pulmones"],
        ],
    },
    BuiltinEntry {
        id: "neurology",
        names: ["Neurology", "तंत्रिका विज्ञान", "Neurología"],
        keywords: [
            &["headache", "migraine", "seizure", "numbness", "dizziness", "dizzy", "stroke", "tingling", "memory loss"],
            &["सिरदर्द", "सिर दर्द", "माइग्रेन", "दौरा", "सुन्न", "चक्कर", "लकवा"],
            &["dolor de cabeza", "migraña", "convulsión", "entumecimiento", "mareo", "derrame cerebral", "hormigueo"],
        ],
    },
    BuiltinEntry {
        id: "orthopedics",
        names: ["Orthopedics", "हड्डी रोग", "Ortopedia"],
        keywords: [
            &["fracture", "broken bone", "joint pain", "back pain", "knee", "sprain", "shoulder pain", "bone"],
            &["हड्डी", "जोड़ों में दर्द", "कमर दर्द", "घुटन", "मोच"],
            &["fractura", "hueso roto", "dolor de articulaciones", "dolor de espalda", "rodilla", "esguince"],
        ],
    },
    BuiltinEntry {
        id: "pediatrics",
        names: ["Pediatrics", "बाल रोग", "Pediatría"],
        keywords: [
            &["child", "baby", "infant", "toddler", "my son", "my daughter", "kid"],
            &["बच्चा", "बच्चे", "शिशु", "बेटा", "बेटी"],
            &["niño", "niña", "bebé", "mi hijo", "mi hija", "infantil"],
        ],
    },
    BuiltinEntry {
        id: "dermatology",
        names: ["Dermatology", "त्वचा रोग", "Dermatología"],
        keywords: [
            &["rash", "itching", "itchy", "acne", "skin", "eczema", "hives", "mole"],
            &["त्वचा", "खुजली", "दाने", "मुंहासे", "चकत्ते"],
            &["sarpullido", "erupción", "picazón", "acné", "piel", "eccema", "urticaria"],
        ],
    },
    BuiltinEntry {
        id: "gastroenterology",
        names: ["Gastroenterology", "पेट रोग", "Gastroenterología"],
        keywords: [
            &["stomach", "abdominal pain", "diarrhea", "diarrhoea", "vomiting", "nausea", "constipation", "acidity", "indigestion"],
            &["पेट", "दस्त", "उल्टी", "मतली", "कब्ज", "एसिडिटी"],
            &["estómago", "dolor abdominal", "diarrea", "vómito", "náusea", "estreñimiento", "acidez"],
        ],
    },
    BuiltinEntry {
        id: "ent",
        names: ["Ear, Nose & Throat", "नाक, कान, गला", "Otorrinolaringología"],
        keywords: [
            &["ear", "sore throat", "throat", "sinus", "hearing", "nosebleed", "tonsil"],
            &["कान", "गले में खराश", "गला", "नाक", "साइनस"],
            &["oído", "dolor de garganta", "garganta", "sinusitis", "audición", "nariz"],
        ],
    },
    BuiltinEntry {
        id: "ophthalmology",
        names: ["Ophthalmology", "नेत्र रोग", "Oftalmología"],
        keywords: [
            &["eye", "vision", "blurred vision", "red eye", "eyesight"],
            &["आंख", "आँख", "नज़र", "धुंधला"],
            &["ojo", "visión", "vista borrosa", "ojos rojos"],
        ],
    },
    BuiltinEntry {
        id: "dentistry",
        names: ["Dentistry", "दंत चिकित्सा", "Odontología"],
        keywords: [
            &["tooth", "toothache", "teeth", "gum", "dental", "cavity"],
            &["दांत", "दाँत", "मसूड़"],
            &["diente", "dolor de muelas", "muela", "encía", "dental", "caries"],
        ],
    },
    BuiltinEntry {
        id: "gynecology",
        names: ["Gynecology", "स्त्री रोग", "Ginecología"],
        keywords: [
            &["pregnant", "pregnancy", "menstrual", "period pain", "pelvic pain", "vaginal"],
            &["गर्भ", "मासिक धर्म", "पीरियड"],
            &["embarazada", "embarazo", "menstruación", "regla", "dolor pélvico"],
        ],
    },
    BuiltinEntry {
        id: "psychiatry",
        names: ["Psychiatry", "मनोचिकित्सा", "Psiquiatría"],
        keywords: [
            &["anxiety", "depression", "panic", "insomnia", "stress", "suicidal", "mental health"],
            &["चिंता", "घबराहट", "अवसाद", "डिप्रेशन", "नींद नहीं", "तनाव"],
            &["ansiedad", "depresión", "pánico", "insomnio", "estrés", "salud mental"],
        ],
    },
    BuiltinEntry {
        id: "urology",
        names: ["Urology", "मूत्र रोग", "Urología"],
        keywords: [
            &["urine", "urination", "kidney stone", "bladder", "prostate"],
            &["पेशाब", "गुर्दे की पथरी", "मूत्र"],
            &["orina", "orinar", "cálculo renal", "vejiga", "próstata"],
        ],
    },
];

#[derive(Debug, Deserialize)]
struct CatalogFile {
    specializations: Vec<Specialization>,
}

/// Ordered set of specializations, unique by id.
#[derive(Debug, Clone)]
pub struct SpecializationCatalog {
    specializations: Vec<Specialization>,
}

impl SpecializationCatalog {
    /// The built-in catalog with English, Hindi and Spanish entries.
    #[must_use]
    pub fn builtin() -> Self {
        let specializations = BUILTIN
            .iter()
            .map(|entry| {
                let localized_names: BTreeMap<String, String> = CATALOG_LOCALES
                    .iter()
                    .zip(entry.names)
                    .map(|(locale, name)| ((*locale).to_owned(), name.to_owned()))
                    .collect();
                let keyword_sets: BTreeMap<String, BTreeSet<String>> = CATALOG_LOCALES
                    .iter()
                    .zip(entry.keywords)
                    .map(|(locale, words)| {
                        let set: BTreeSet<String> = words.iter().map(|w| normalize_text(w)).collect();
                        ((*locale).to_owned(), set)
                    })
                    .collect();
                Specialization {
                    id: SpecializationId::new(entry.id),
                    canonical_name: entry.names[0].to_owned(),
                    localized_names,
                    keyword_sets,
                }
            })
            .collect();
        Self { specializations }
    }

    /// Parses and validates a YAML catalog of the form
    /// `specializations: [{id, canonical_name, localized_names, keyword_sets}]`.
    ///
    /// Keywords are normalized (lower-cased, whitespace collapsed) on load.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] on malformed YAML and
    /// [`CatalogError::Validation`] when ids are blank or duplicated, a name
    /// is blank, or an entry has no keywords.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        let specializations = file
            .specializations
            .into_iter()
            .map(|mut s| {
                s.keyword_sets = normalize_keyword_sets(s.keyword_sets);
                s
            })
            .collect();
        let catalog = Self { specializations };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.specializations.is_empty() {
            return Err(CatalogError::Validation(
                "catalog must contain at least one specialization".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for spec in &self.specializations {
            let id = spec.id.as_str();
            if id.trim().is_empty() {
                return Err(CatalogError::Validation(
                    "specialization id must be non-empty".to_string(),
                ));
            }
            if !seen.insert(id) {
                return Err(CatalogError::Validation(format!(
                    "duplicate specialization id: '{id}'"
                )));
            }
            if spec.canonical_name.trim().is_empty() {
                return Err(CatalogError::Validation(format!(
                    "specialization '{id}' has an empty canonical_name"
                )));
            }
            if spec.keyword_sets.values().all(BTreeSet::is_empty) {
                return Err(CatalogError::Validation(format!(
                    "specialization '{id}' has no keywords"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &SpecializationId) -> Option<&Specialization> {
        self.specializations.iter().find(|s| &s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specialization> {
        self.specializations.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specializations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specializations.is_empty()
    }
}

fn normalize_keyword_sets(
    sets: BTreeMap<String, BTreeSet<String>>,
) -> BTreeMap<String, BTreeSet<String>> {
    sets.into_iter()
        .map(|(locale, words)| {
            let words = words
                .iter()
                .map(|w| normalize_text(w))
                .filter(|w| !w.is_empty())
                .collect();
            (locale.trim().to_lowercase(), words)
        })
        .collect()
}

/// Loads a catalog from `path`, or the built-in catalog when `path` is `None`.
///
/// # Errors
///
/// Returns [`CatalogError::FileIo`] if the file cannot be read, otherwise as
/// [`SpecializationCatalog::from_yaml_str`].
pub fn load_catalog(path: Option<&Path>) -> Result<SpecializationCatalog, CatalogError> {
    let Some(path) = path else {
        return Ok(SpecializationCatalog::builtin());
    };
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let catalog = SpecializationCatalog::from_yaml_str(&content)?;
    tracing::info!(
        path = %path.display(),
        specializations = catalog.len(),
        "loaded specialization catalog"
    );
    Ok(catalog)
}
