//! Detection of "let me talk to a person" requests in an AI exchange.

/// Phrases that ask for a human. Matched case-insensitively as substrings.
pub const TRANSFER_KEYWORDS: &[&str] = &[
    "human",
    "real person",
    "live agent",
    "speak to an agent",
    "talk to an agent",
    "speak to someone",
    "talk to someone",
    "representative",
    "customer service",
    "support team",
    "operator",
];

/// Returns the first transfer keyword found in the visitor's message or the AI reply.
///
/// Both texts are scanned together, so an AI reply that mentions a human agent
/// triggers a transfer attempt as well.
pub fn find_transfer_trigger(user_message: &str, ai_reply: &str) -> Option<&'static str> {
    let haystack = format!("{user_message} {ai_reply}").to_lowercase();
    TRANSFER_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| haystack.contains(keyword))
}
