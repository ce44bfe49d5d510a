//! Parser for the overlay input line.
//!
//! Every submission is turned into a [`Directive`] before the state machine
//! acts on it, so intent is derived once instead of on every keystroke.

use crate::agents::{AgentRegistry, DEFAULT_AGENT_ID};
use crate::types::CommandKind;

/// Reserved input that stores the current context in the memory slot.
pub const SAVE_COMMAND: &str = "//save";
pub const AGENT_PREFIX: char = '@';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Blank input. Submitting it does nothing.
    Empty,
    Save,
    Prompt(PromptDirective),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDirective {
    /// Agent named by a recognised `@id` token.
    pub agent: Option<String>,
    pub command: CommandKind,
    /// Input with the agent token and command keyword removed.
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveForm {
    AgentSwitch,
    Keyword,
    Plain,
}

impl PromptDirective {
    /// Syntax the input used. An agent switch wins over a keyword when both appear.
    pub fn form(&self) -> DirectiveForm {
        if self.agent.is_some() {
            DirectiveForm::AgentSwitch
        } else if self.command != CommandKind::General {
            DirectiveForm::Keyword
        } else {
            DirectiveForm::Plain
        }
    }
}

pub fn parse(raw: &str, registry: &AgentRegistry) -> Directive {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Directive::Empty;
    }
    if trimmed == SAVE_COMMAND {
        return Directive::Save;
    }

    let (agent, rest) = match agent_token(raw) {
        Some((start, word)) if registry.contains(&word[1..]) => {
            (Some(word[1..].to_string()), strip_token(raw, start, word.len()))
        }
        _ => (None, raw.to_string()),
    };

    let rest = rest.trim();
    let (command, prompt) = match leading_keyword(rest) {
        Some((command, remainder)) => (command, remainder.trim().to_string()),
        None => (CommandKind::General, rest.to_string()),
    };

    Directive::Prompt(PromptDirective {
        agent,
        command,
        prompt,
    })
}

/// Agent shown while the user is still typing.
///
/// Empty input resets to the default persona; an unknown or missing token
/// keeps whatever was selected before.
pub fn live_agent(raw: &str, registry: &AgentRegistry, previous: &str) -> String {
    if raw.is_empty() {
        return DEFAULT_AGENT_ID.to_string();
    }
    match agent_token(raw) {
        Some((_, word)) if registry.contains(&word[1..]) => word[1..].to_string(),
        _ => previous.to_string(),
    }
}

/// First whitespace-separated word starting with the agent prefix, with its byte offset.
fn agent_token(raw: &str) -> Option<(usize, &str)> {
    let mut start = None;
    for (idx, ch) in raw.char_indices().chain(std::iter::once((raw.len(), ' '))) {
        match (start, ch.is_whitespace()) {
            (None, false) => start = Some(idx),
            (Some(begin), true) => {
                let word = &raw[begin..idx];
                if word.starts_with(AGENT_PREFIX) {
                    return Some((begin, word));
                }
                start = None;
            }
            _ => {}
        }
    }
    None
}

/// Removes the token and at most one whitespace char after it.
fn strip_token(raw: &str, start: usize, len: usize) -> String {
    let after = &raw[start + len..];
    let after = match after.chars().next() {
        Some(ch) if ch.is_whitespace() => &after[ch.len_utf8()..],
        _ => after,
    };
    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..start]);
    out.push_str(after);
    out
}

fn leading_keyword(input: &str) -> Option<(CommandKind, &str)> {
    let word_end = input.find(char::is_whitespace).unwrap_or(input.len());
    let word = &input[..word_end];
    let bare = word
        .strip_prefix("//")
        .or_else(|| word.strip_prefix('/'))
        .unwrap_or(word);
    let command = CommandKind::from_keyword(bare)?;
    Some((command, &input[word_end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(raw: &str) -> PromptDirective {
        match parse(raw, &AgentRegistry::builtin()) {
            Directive::Prompt(directive) => directive,
            other => panic!("expected a prompt, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_input_is_empty() {
        let registry = AgentRegistry::builtin();
        assert_eq!(parse("", &registry), Directive::Empty);
        assert_eq!(parse(" \t\n", &registry), Directive::Empty);
    }

    #[test]
    fn test_save_must_match_verbatim_after_trim() {
        let registry = AgentRegistry::builtin();
        assert_eq!(parse("  //save ", &registry), Directive::Save);
        assert_eq!(prompt("//save now").prompt, "//save now");
        assert_eq!(prompt("//SAVE").command, CommandKind::General);
    }

    #[test]
    fn test_leading_keyword_selects_command_and_is_stripped() {
        let directive = prompt("fix this");
        assert_eq!(directive.command, CommandKind::Fix);
        assert_eq!(directive.prompt, "this");
        assert_eq!(directive.form(), DirectiveForm::Keyword);

        assert_eq!(prompt("/polite   hey you").prompt, "hey you");
        assert_eq!(prompt("//ASK why").command, CommandKind::Ask);
        assert_eq!(prompt("meme").prompt, "");
    }

    #[test]
    fn test_keyword_must_lead_the_prompt() {
        let directive = prompt("please fix this");
        assert_eq!(directive.command, CommandKind::General);
        assert_eq!(directive.prompt, "please fix this");
        assert_eq!(directive.form(), DirectiveForm::Plain);
        assert_eq!(prompt("fixing it").command, CommandKind::General);
    }

    #[test]
    fn test_known_agent_token_is_stripped_anywhere() {
        let directive = prompt("@coder write a fast python fibonacci function");
        assert_eq!(directive.agent.as_deref(), Some("coder"));
        assert_eq!(directive.prompt, "write a fast python fibonacci function");
        assert_eq!(directive.form(), DirectiveForm::AgentSwitch);

        let directive = prompt("a memo @writer  about this");
        assert_eq!(directive.agent.as_deref(), Some("writer"));
        assert_eq!(directive.prompt, "a memo  about this");
    }

    #[test]
    fn test_agent_and_keyword_combine() {
        let directive = prompt("@writer polite the memo");
        assert_eq!(directive.agent.as_deref(), Some("writer"));
        assert_eq!(directive.command, CommandKind::Polite);
        assert_eq!(directive.prompt, "the memo");
    }

    #[test]
    fn test_unknown_agent_token_stays_literal() {
        let directive = prompt("@nobody hello");
        assert_eq!(directive.agent, None);
        assert_eq!(directive.prompt, "@nobody hello");
    }

    #[test]
    fn test_only_the_first_agent_token_counts() {
        let directive = prompt("@nobody @coder hi");
        assert_eq!(directive.agent, None);
        assert_eq!(directive.prompt, "@nobody @coder hi");
    }

    #[test]
    fn test_live_agent_tracks_typing() {
        let registry = AgentRegistry::builtin();
        assert_eq!(live_agent("@cod", &registry, "default"), "default");
        assert_eq!(live_agent("@coder", &registry, "default"), "coder");
        assert_eq!(live_agent("@coder x", &registry, "default"), "coder");
        assert_eq!(live_agent("x", &registry, "coder"), "coder");
        assert_eq!(live_agent("", &registry, "coder"), "default");
    }
}
