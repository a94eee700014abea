//! Static follow-up suggestions for the chat front ends.
//!
//! Keyword matching over the user's question selects one of a few fixed
//! suggestion sets; `quick_actions` is the static chip list shown next
//! to the input box. No model calls are involved.

use serde::Serialize;

/// Contextual follow-up suggestions for a user question.
pub fn health_suggestions(user_input: &str) -> Vec<&'static str> {
    let input = user_input.to_lowercase();

    let matches = |words: &[&str]| words.iter().any(|w| input.contains(w));

    if matches(&["headache", "head", "pain"]) {
        vec![
            "What are common headache triggers?",
            "How to relieve tension headaches?",
            "When should I see a doctor for headaches?",
        ]
    } else if matches(&["fever", "temperature", "hot"]) {
        vec![
            "How to reduce fever naturally?",
            "What temperature is considered high fever?",
            "Home remedies for fever relief",
        ]
    } else if matches(&["cough", "cold", "flu"]) {
        vec![
            "Best remedies for persistent cough",
            "How to boost immune system?",
            "Difference between cold and flu",
        ]
    } else {
        vec![
            "What are healthy lifestyle tips?",
            "How often should I exercise?",
            "What foods boost immunity?",
        ]
    }
}

/// A quick-action chip shown in the chat page.
#[derive(Debug, Clone, Serialize)]
pub struct QuickAction {
    pub text: &'static str,
    pub icon: &'static str,
}

/// Static list of quick-action chips.
pub fn quick_actions() -> Vec<QuickAction> {
    vec![
        QuickAction { text: "Check symptoms", icon: "🔍" },
        QuickAction { text: "Medication info", icon: "💊" },
        QuickAction { text: "Health tips", icon: "💡" },
        QuickAction { text: "Exercise advice", icon: "🏃" },
        QuickAction { text: "Nutrition guide", icon: "🥗" },
        QuickAction { text: "Mental health", icon: "🧠" },
    ]
}
