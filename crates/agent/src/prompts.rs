//! Prompt text and fixed replies used across the turn pipeline.

use crate::oracle::ToolSpec;

/// Refusal returned for out-of-scope or unsafe queries.
pub const INVALID_QUERY_REPLY: &str = "I'm the Swapdesk assistant. I can only help with Swapdesk \
     orders, products, and account questions. How can I help?";

/// Apology returned once the whole-turn retry budget is exhausted.
pub const MAX_RETRIES_REPLY: &str =
    "I don't have the answer you requested. Can I help with anything else about Swapdesk?";

/// Safe text appended in place of a reply when the oracle call inside the
/// generate step fails.
pub const ORACLE_FAILURE_REPLY: &str =
    "I can only provide Swapdesk-related information right now. How can I help?";

/// Last-resort reply when a terminated turn carries no usable content.
pub const EMPTY_ANSWER_REPLY: &str = "I couldn't generate a response. Please try again.";

/// Prefix applied to a raw tool result promoted to the final reply.
pub const TOOL_RESULT_FRAMING: &str = "Here's what I found:";

pub const VALIDATION_PROMPT: &str = "You validate customer queries for Swapdesk, a marketplace \
for buying and selling refurbished electronics.

ACCEPT: orders and delivery, user profile and credits, purchase history, products and pricing, \
company information, greetings, general product searches.
REJECT: self-harm, violence, illegal activity, emergencies, unrelated general knowledge, \
questions about other companies.

Respond ONLY: \"VALID\" or \"INVALID\"";

pub const AUDIT_PROMPT: &str = "Check if the answer addresses the question properly.

Respond ONLY: \"SATISFIED\" or \"UNSATISFIED\"";

pub const SEARCH_QUERY_PROMPT: &str = "You are a search query generator.

TASK: Convert user questions into effective search queries for web search.

RULES:
- Keep search queries short and focused (2-4 keywords)
- Use relevant keywords only
- Remove question words (what, how, when, where, why)
- Make it search-engine friendly

Respond with ONLY the search query, nothing else.";

/// System instruction for the generate step: domain scope, tool catalog with
/// one-line purposes, and any rolling context from prior turns.
pub fn system_instruction(tools: &[ToolSpec], context: Option<&str>) -> String {
    let mut instruction = String::from(
        "You are a Swapdesk customer service agent. Swapdesk is a marketplace for buying and \
         selling refurbished electronics.\n\nTOOLS AVAILABLE:\n",
    );

    for tool in tools {
        instruction.push_str("- ");
        instruction.push_str(&tool.name);
        instruction.push_str(": ");
        instruction.push_str(&tool.description);
        instruction.push('\n');
    }

    instruction.push_str(
        "\nINSTRUCTIONS:\n\
         - Use appropriate tools for user queries\n\
         - Provide helpful responses after tool use\n\
         - Focus only on Swapdesk services\n\
         - Be conversational and professional\n",
    );

    if let Some(context) = context.filter(|context| !context.trim().is_empty()) {
        instruction.push_str("\nCONTEXT FROM RECENT CONVERSATION:\n");
        instruction.push_str(context);
        instruction.push('\n');
    }

    instruction
}

#[cfg(test)]
mod tests {
    use crate::oracle::ToolSpec;

    use super::system_instruction;

    #[test]
    fn instruction_lists_every_tool_with_its_purpose() {
        let tools = vec![
            ToolSpec::new("get_order_tracking", "order status and delivery info"),
            ToolSpec::new("about_swapdesk", "company information"),
        ];

        let instruction = system_instruction(&tools, None);
        assert!(instruction.contains("- get_order_tracking: order status and delivery info"));
        assert!(instruction.contains("- about_swapdesk: company information"));
        assert!(!instruction.contains("CONTEXT FROM RECENT CONVERSATION"));
    }

    #[test]
    fn rolling_context_is_injected_when_present() {
        let instruction =
            system_instruction(&[], Some("User: hello\nAssistant: hi, how can I help?"));
        assert!(instruction.contains("CONTEXT FROM RECENT CONVERSATION"));
        assert!(instruction.contains("User: hello"));
    }

    #[test]
    fn blank_context_is_ignored() {
        let instruction = system_instruction(&[], Some("   "));
        assert!(!instruction.contains("CONTEXT FROM RECENT CONVERSATION"));
    }
}
