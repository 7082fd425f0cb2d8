//! Deterministic stand-in for the remote chat model

/// Build a canned reply from keyword rules over the lower-cased message.
///
/// Rules are checked in order and the first match wins. A non-blank initial
/// prompt is acknowledged after whichever rule fired.
pub fn mock_response(message: &str, initial_prompt: Option<&str>, context: Option<&str>) -> String {
    let lowered = message.to_lowercase();
    let context = context.filter(|c| !c.is_empty());

    let mut response = if lowered.contains("hello") || lowered.contains("hi") {
        "Hello! How can I help you today?".to_string()
    } else if lowered.contains("help") {
        "I'm here to help! What do you need assistance with?".to_string()
    } else if lowered.contains("bye") || lowered.contains("goodbye") {
        "Goodbye! Have a great day!".to_string()
    } else if let Some(context) = context.filter(|_| lowered.contains("context")) {
        format!(
            "I see you're asking about the context. Here's what I know: \"{}\"",
            truncate_chars(context, 100)
        )
    } else {
        format!(
            "I received your message: \"{}\". This is a mock response. To get real AI responses, please add your OpenAI API key to the .env.local file.",
            message
        )
    };

    if let Some(prompt) = initial_prompt.filter(|p| !p.trim().is_empty()) {
        response.push_str(&format!(
            " (Using your initial prompt: \"{}\")",
            truncate_chars(prompt, 30)
        ));
    }

    response
}

/// First `max` characters of `text`, with `...` appended when anything was cut
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_wins_over_help() {
        assert_eq!(
            mock_response("hi there, I need help", None, None),
            "Hello! How can I help you today?"
        );
    }

    #[test]
    fn test_greeting_is_a_substring_match() {
        // "this" contains "hi"
        assert_eq!(
            mock_response("What is THIS?", None, None),
            "Hello! How can I help you today?"
        );
    }

    #[test]
    fn test_help_and_farewell() {
        assert_eq!(
            mock_response("Can you HELP me", None, None),
            "I'm here to help! What do you need assistance with?"
        );
        assert_eq!(
            mock_response("goodbye", None, None),
            "Goodbye! Have a great day!"
        );
    }

    #[test]
    fn test_initial_prompt_acknowledged() {
        assert_eq!(
            mock_response("Goodbye", Some("You are a helpful assistant."), None),
            "Goodbye! Have a great day! (Using your initial prompt: \"You are a helpful assistant.\")"
        );
    }

    #[test]
    fn test_long_initial_prompt_truncated() {
        let prompt = "Act as a pirate captain who only speaks in rhymes";
        let response = mock_response("bye", Some(prompt), None);
        assert!(response.ends_with("(Using your initial prompt: \"Act as a pirate captain who on...\")"));
    }

    #[test]
    fn test_blank_prompt_ignored() {
        assert_eq!(
            mock_response("bye", Some("   "), None),
            "Goodbye! Have a great day!"
        );
    }

    #[test]
    fn test_context_rule() {
        let context = "a".repeat(150);
        let response = mock_response("Tell me about the context", None, Some(&context));
        assert_eq!(
            response,
            format!(
                "I see you're asking about the context. Here's what I know: \"{}...\"",
                "a".repeat(100)
            )
        );

        let short = mock_response("what context?", None, Some("Our pricing page"));
        assert!(short.ends_with("\"Our pricing page\""));
    }

    #[test]
    fn test_context_rule_needs_context() {
        let response = mock_response("Tell me about the context", None, Some(""));
        assert!(response.starts_with("I received your message: \"Tell me about the context\"."));
    }

    #[test]
    fn test_echo_rule() {
        assert_eq!(
            mock_response("Pricing?", None, None),
            "I received your message: \"Pricing?\". This is a mock response. To get real AI responses, please add your OpenAI API key to the .env.local file."
        );
    }

    #[test]
    fn test_truncation_counts_characters() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_chars("日本語", 3), "日本語");
        assert_eq!(truncate_chars("", 3), "");
    }
}
