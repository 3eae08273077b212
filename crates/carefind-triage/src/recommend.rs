//! Recommendation templates by urgency tier and locale.

use carefind_core::{Locale, Specialization, UrgencyLevel};

fn tier_advice(urgency: UrgencyLevel, locale: Locale) -> &'static [&'static str] {
    match (urgency, locale) {
        (UrgencyLevel::Emergency, Locale::En) => &[
            "Contact emergency services (112 / 911) immediately.",
            "Go to the nearest emergency department; do not drive yourself if you feel faint.",
        ],
        (UrgencyLevel::Emergency, Locale::Hi) => &[
            "तुरंत आपातकालीन सेवाओं (112) को कॉल करें।",
            "सबसे नज़दीकी आपातकालीन विभाग में जाएं; चक्कर आ रहे हों तो खुद गाड़ी न चलाएं।",
        ],
        (UrgencyLevel::Emergency, Locale::Es) => &[
            "Llame a los servicios de emergencia (112 / 911) de inmediato.",
            "Acuda a la sala de urgencias más cercana; no conduzca si se siente débil.",
        ],
        (UrgencyLevel::High, Locale::En) => &[
            "Seek medical care today at the nearest hospital or urgent care centre.",
            "Call ahead to confirm they can see you now.",
        ],
        (UrgencyLevel::High, Locale::Hi) => &[
            "आज ही नज़दीकी अस्पताल या अर्जेंट केयर में डॉक्टर को दिखाएं।",
            "पहले फ़ोन करके पुष्टि करें कि वे अभी देख सकते हैं।",
        ],
        (UrgencyLevel::High, Locale::Es) => &[
            "Busque atención médica hoy en el hospital o centro de urgencias más cercano.",
            "Llame antes para confirmar que pueden atenderle ahora.",
        ],
        (UrgencyLevel::Medium, Locale::En) => &[
            "Book an appointment with a doctor within the next day or two.",
            "Call ahead to confirm availability.",
        ],
        (UrgencyLevel::Medium, Locale::Hi) => &[
            "एक-दो दिन में डॉक्टर से अपॉइंटमेंट लें।",
            "उपलब्धता की पुष्टि के लिए पहले फ़ोन करें।",
        ],
        (UrgencyLevel::Medium, Locale::Es) => &[
            "Pida cita con un médico en uno o dos días.",
            "Llame antes para confirmar disponibilidad.",
        ],
        (UrgencyLevel::Low, Locale::En) => &[
            "Schedule a routine appointment at your convenience.",
            "Call ahead to confirm availability.",
        ],
        (UrgencyLevel::Low, Locale::Hi) => &[
            "अपनी सुविधा से नियमित अपॉइंटमेंट लें।",
            "उपलब्धता की पुष्टि के लिए पहले फ़ोन करें।",
        ],
        (UrgencyLevel::Low, Locale::Es) => &[
            "Programe una cita de rutina cuando le convenga.",
            "Llame antes para confirmar disponibilidad.",
        ],
    }
}

/// Advice given when the text matched nothing at all.
#[must_use]
pub fn generic_recommendation(locale: Locale) -> &'static str {
    match locale {
        Locale::En => {
            "Describe your symptoms to a general physician, and call ahead to confirm availability."
        }
        Locale::Hi => {
            "अपने लक्षण किसी सामान्य चिकित्सक को बताएं और उपलब्धता की पुष्टि के लिए पहले फ़ोन करें।"
        }
        Locale::Es => {
            "Describa sus síntomas a un médico general y llame antes para confirmar disponibilidad."
        }
    }
}

fn specialist_advice(specialization: &Specialization, locale: Locale) -> String {
    let name = specialization.display_name(locale.code());
    match locale {
        Locale::En => format!("Consider seeing a {name} specialist."),
        Locale::Hi => format!("{name} विशेषज्ञ से परामर्श लें।"),
        Locale::Es => format!("Considere consultar a un especialista en {name}."),
    }
}

/// Tier advice, followed by a pointer to the top-ranked specialist if any.
#[must_use]
pub fn recommendations(
    urgency: UrgencyLevel,
    top_specialization: Option<&Specialization>,
    locale: Locale,
) -> Vec<String> {
    let mut out: Vec<String> = tier_advice(urgency, locale)
        .iter()
        .map(|s| (*s).to_owned())
        .collect();
    if let Some(spec) = top_specialization {
        out.push(specialist_advice(spec, locale));
    }
    out
}
