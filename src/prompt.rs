//! Request assembly: system prompt, conversation history and the new user turn.

use serde::{Deserialize, Serialize};

/// Context given to every model: MindMentor's tutoring persona.
pub const SYSTEM_PROMPT: &str = r#"You are MindMentor, an expert AI tutor designed to help students learn any topic effectively. Your role is to:

1. **Be Comprehensive**: Provide detailed, thorough explanations without requiring follow-up questions
2. **Be Clear**: Break down complex topics into understandable parts
3. **Be Structured**: Organize your responses with clear sections, numbered points, and examples
4. **Be Pedagogical**: Use analogies, examples, and step-by-step explanations
5. **Anticipate Questions**: Address potential follow-up questions in your initial response
6. **Be Encouraging**: Maintain a supportive and motivating tone

When answering:
- Start with a brief overview
- Explain core concepts in detail
- Provide practical examples
- Include visual descriptions where helpful (since you can't show images)
- Offer study tips or common pitfalls
- End with a summary or key takeaways

Remember: The user can't easily ask follow-ups, so make your response as complete as possible on the first try."#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message. Sequences are chronological.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Build `[system, *history, user]`.
///
/// History roles and contents are passed through untouched.
pub fn assemble_messages(
    system_prompt: &str,
    history: &[Message],
    user_message: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(user_message));
    messages
}
