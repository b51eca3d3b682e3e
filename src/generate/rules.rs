//! Canned answers and rule-based fallback
//!
//! Two explicit ordered tables drive the offline paths of the answer
//! generator: canned answers matched by case-folded substring triggers
//! (checked before any model call), and keyword-categorized fallback
//! answers used when every provider fails. Order is priority order and
//! is part of the contract, so keep the tables auditable.

/// Returned for empty or whitespace-only questions.
pub const GUIDANCE: &str =
    "Please ask a question about hospital services, appointments, or medical assistance.";

/// A substring trigger with its predefined answer.
pub struct CannedRule {
    pub trigger: &'static str,
    pub answer: &'static str,
}

/// Checked in order against the case-folded query; first match wins.
pub const CANNED_RULES: &[CannedRule] = &[
    CannedRule {
        trigger: "book appointment",
        answer: "You can book an appointment through the patient dashboard. Select your preferred doctor and time slot.",
    },
    CannedRule {
        trigger: "how to book",
        answer: "Go to the Book Appointment section in your patient dashboard, choose a doctor, and select an available time slot.",
    },
    CannedRule {
        trigger: "doctor appointment",
        answer: "Book appointments through the patient dashboard. Doctors will confirm and you'll receive notifications.",
    },
    CannedRule {
        trigger: "diagnostic test",
        answer: "Contact diagnostic centers through the diagnostic section. They will schedule your tests and share reports.",
    },
    CannedRule {
        trigger: "emergency",
        answer: "For emergencies, call our emergency helpline or use the ambulance service from the patient dashboard.",
    },
    CannedRule {
        trigger: "hello",
        answer: "Hello! I'm MediBot. How can I help you with hospital services today?",
    },
    CannedRule {
        trigger: "hi",
        answer: "Hello! I'm MediBot. How can I help you with hospital services today?",
    },
    CannedRule {
        trigger: "hey",
        answer: "Hello! I'm MediBot. How can I help you with hospital services today?",
    },
];

/// Find the first canned answer whose trigger occurs in the query.
pub fn canned_answer(query: &str) -> Option<&'static str> {
    let lowered = query.to_lowercase();
    CANNED_RULES
        .iter()
        .find(|rule| lowered.contains(rule.trigger))
        .map(|rule| rule.answer)
}

/// A keyword category with its fallback answer.
pub struct FallbackRule {
    pub keywords: &'static [&'static str],
    pub answer: &'static str,
}

/// Checked in order against the case-folded query when every provider
/// has failed; any keyword hit selects the category.
pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        keywords: &["appointment", "book", "schedule", "doctor"],
        answer: "Book appointments through the patient dashboard. Select your doctor and preferred time slot.",
    },
    FallbackRule {
        keywords: &["diagnostic", "test", "lab", "report"],
        answer: "Contact diagnostic centers through the diagnostic section to schedule tests and view reports.",
    },
    FallbackRule {
        keywords: &["emergency", "ambulance", "urgent"],
        answer: "For emergencies, use the ambulance service from the patient dashboard or call the emergency helpline.",
    },
    FallbackRule {
        keywords: &["prescription", "medicine", "medication"],
        answer: "Doctors provide prescriptions after consultations. Check your patient records for prescription details.",
    },
    FallbackRule {
        keywords: &["result", "diagnosis"],
        answer: "View your diagnostic reports and medical records in the patient dashboard.",
    },
];

/// Used when no fallback category matches.
pub const GENERIC_FALLBACK: &str = "For hospital services, use the patient dashboard to book \
                                    appointments, contact doctors, or access diagnostic services.";

/// Select a category-appropriate fallback answer. Never fails.
pub fn fallback_answer(query: &str) -> &'static str {
    let lowered = query.to_lowercase();
    FALLBACK_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
        .map(|rule| rule.answer)
        .unwrap_or(GENERIC_FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_book_appointment() {
        let answer = canned_answer("How can I book appointment for tomorrow?").unwrap();
        assert!(answer.contains("patient dashboard"));
    }

    #[test]
    fn test_canned_is_case_folded() {
        assert!(canned_answer("BOOK APPOINTMENT").is_some());
        assert!(canned_answer("Book Appointment please").is_some());
    }

    #[test]
    fn test_canned_priority_order() {
        // "book appointment" outranks the greeting triggers even when both match
        let answer = canned_answer("hi, how do I book appointment?").unwrap();
        assert!(answer.contains("book an appointment"));
    }

    #[test]
    fn test_canned_no_match() {
        assert!(canned_answer("what are the visiting hours?").is_none());
    }

    #[test]
    fn test_fallback_emergency_category() {
        let answer = fallback_answer("I need an ambulance right now");
        assert!(answer.contains("emergencies"));
    }

    #[test]
    fn test_fallback_appointment_category() {
        let answer = fallback_answer("schedule with a cardiologist");
        assert!(answer.contains("Book appointments"));
    }

    #[test]
    fn test_fallback_prescription_category() {
        let answer = fallback_answer("where is my medication list?");
        assert!(answer.contains("prescriptions"));
    }

    #[test]
    fn test_fallback_generic() {
        let answer = fallback_answer("what is the meaning of life?");
        assert_eq!(answer, GENERIC_FALLBACK);
    }

    #[test]
    fn test_fallback_never_empty() {
        for query in ["", "xyz", "ambulance", "lab results"] {
            assert!(!fallback_answer(query).is_empty());
        }
    }
}
