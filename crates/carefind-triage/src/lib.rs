//! Symptom triage: urgency tiers, specialization matching and advice.

pub mod catalog;
pub mod classifier;
pub mod error;
pub mod lexicon;
pub mod recommend;
pub mod text;

pub use catalog::{load_catalog, SpecializationCatalog, CATALOG_LOCALES};
pub use classifier::SymptomClassifier;
pub use error::CatalogError;
pub use lexicon::detect_urgency;
pub use recommend::{generic_recommendation, recommendations};
pub use text::{contains_phrase, normalize_text};
