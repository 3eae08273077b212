//! Locale handling and user-facing failure messages.

use serde::{Deserialize, Serialize};

/// Locales with keyword lexicons and message translations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Hi,
    Es,
}

impl Locale {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Hi => "hi",
            Locale::Es => "es",
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Maps a BCP 47 tag such as `hi-IN` or `es_MX` to a supported [`Locale`].
///
/// Only the primary language subtag is considered. Unsupported languages fall
/// back to English.
#[must_use]
pub fn normalize_locale(tag: &str) -> Locale {
    let primary = tag
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match primary.as_str() {
        "hi" => Locale::Hi,
        "es" => Locale::Es,
        _ => Locale::En,
    }
}

/// Failure conditions that reach the end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMessage {
    LocationPermissionDenied,
    LocationTimeout,
    LocationUnavailable,
    SearchTimedOut,
    InvalidSearch,
}

impl UserMessage {
    #[must_use]
    pub fn text(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (UserMessage::LocationPermissionDenied, Locale::En) => {
                "Location access was denied. Please allow location access in your device settings to find nearby facilities."
            }
            (UserMessage::LocationPermissionDenied, Locale::Hi) => {
                "स्थान की अनुमति नहीं दी गई। आस-पास की सुविधाएँ खोजने के लिए कृपया डिवाइस सेटिंग्स में स्थान की अनुमति दें।"
            }
            (UserMessage::LocationPermissionDenied, Locale::Es) => {
                "Se denegó el acceso a la ubicación. Permite el acceso en la configuración del dispositivo para buscar centros cercanos."
            }
            (UserMessage::LocationTimeout, Locale::En) => {
                "We could not determine your location in time. Please move to an open area and try again."
            }
            (UserMessage::LocationTimeout, Locale::Hi) => {
                "समय पर आपका स्थान निर्धारित नहीं हो सका। कृपया खुले स्थान पर जाकर फिर से प्रयास करें।"
            }
            (UserMessage::LocationTimeout, Locale::Es) => {
                "No pudimos determinar tu ubicación a tiempo. Ve a un lugar abierto e inténtalo de nuevo."
            }
            (UserMessage::LocationUnavailable, Locale::En) => {
                "Location services are not available on this device."
            }
            (UserMessage::LocationUnavailable, Locale::Hi) => {
                "इस डिवाइस पर स्थान सेवाएँ उपलब्ध नहीं हैं।"
            }
            (UserMessage::LocationUnavailable, Locale::Es) => {
                "Los servicios de ubicación no están disponibles en este dispositivo."
            }
            (UserMessage::SearchTimedOut, Locale::En) => {
                "The search took too long. Please try again in a moment."
            }
            (UserMessage::SearchTimedOut, Locale::Hi) => {
                "खोज में बहुत अधिक समय लगा। कृपया थोड़ी देर बाद फिर से प्रयास करें।"
            }
            (UserMessage::SearchTimedOut, Locale::Es) => {
                "La búsqueda tardó demasiado. Inténtalo de nuevo en un momento."
            }
            (UserMessage::InvalidSearch, Locale::En) => {
                "Those search settings are not valid. Please adjust the distance, rating or result limit."
            }
            (UserMessage::InvalidSearch, Locale::Hi) => {
                "ये खोज सेटिंग्स मान्य नहीं हैं। कृपया दूरी, रेटिंग या परिणाम सीमा बदलें।"
            }
            (UserMessage::InvalidSearch, Locale::Es) => {
                "Esos criterios de búsqueda no son válidos. Ajusta la distancia, la valoración o el límite de resultados."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_locale_uses_primary_subtag() {
        assert_eq!(normalize_locale("hi-IN"), Locale::Hi);
        assert_eq!(normalize_locale("es_MX"), Locale::Es);
        assert_eq!(normalize_locale("EN"), Locale::En);
    }

    #[test]
    fn normalize_locale_falls_back_to_english() {
        assert_eq!(normalize_locale("fr-FR"), Locale::En);
        assert_eq!(normalize_locale(""), Locale::En);
    }

    #[test]
    fn every_message_has_text_in_every_locale() {
        let messages = [
            UserMessage::LocationPermissionDenied,
            UserMessage::LocationTimeout,
            UserMessage::LocationUnavailable,
            UserMessage::SearchTimedOut,
            UserMessage::InvalidSearch,
        ];
        for message in messages {
            for locale in [Locale::En, Locale::Hi, Locale::Es] {
                assert!(!message.text(locale).is_empty());
            }
        }
    }
}
