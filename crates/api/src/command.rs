//! Chat-command parsing
//!
//! Dictionary maintenance runs over chat commands (`!add`, `!remove`, ...).
//! Dispatch is a table keyed by the command string; each variant owns its
//! own argument validation, so an unknown command and a malformed argument
//! produce distinct messages.

use scrawl_core::{Error, Result};

/// A parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `!add <word>`: propose a word (level-gated)
    AddWord {
        /// Raw word argument, normalized downstream
        word: String,
    },
    /// `!remove <word>`: drop a word (moderators)
    RemoveWord {
        /// Raw word argument
        word: String,
    },
    /// `!ban <word>`: ban a word everywhere (moderators)
    BanWord {
        /// Raw word argument
        word: String,
    },
    /// `!words`: list the active dictionary
    ListWords,
}

type Parser = fn(&str) -> Result<ChatCommand>;

fn parse_add(rest: &str) -> Result<ChatCommand> {
    require_word(rest, "!add").map(|word| ChatCommand::AddWord { word })
}

fn parse_remove(rest: &str) -> Result<ChatCommand> {
    require_word(rest, "!remove").map(|word| ChatCommand::RemoveWord { word })
}

fn parse_ban(rest: &str) -> Result<ChatCommand> {
    require_word(rest, "!ban").map(|word| ChatCommand::BanWord { word })
}

fn parse_words(rest: &str) -> Result<ChatCommand> {
    if !rest.trim().is_empty() {
        return Err(Error::InvalidInput("!words takes no argument".into()));
    }
    Ok(ChatCommand::ListWords)
}

fn require_word(rest: &str, usage: &str) -> Result<String> {
    let word = rest.trim();
    if word.is_empty() {
        return Err(Error::InvalidInput(format!("usage: {} <word>", usage)));
    }
    Ok(word.to_string())
}

/// Dispatch table: command string → argument parser
static COMMANDS: &[(&str, Parser)] = &[
    ("!add", parse_add),
    ("!remove", parse_remove),
    ("!ban", parse_ban),
    ("!words", parse_words),
];

impl ChatCommand {
    /// Parse a raw chat line into a command
    pub fn parse(input: &str) -> Result<ChatCommand> {
        let trimmed = input.trim();
        let (name, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (trimmed, ""),
        };
        for (command, parser) in COMMANDS {
            if name.eq_ignore_ascii_case(command) {
                return parser(rest);
            }
        }
        Err(Error::InvalidInput(format!("unknown command: {}", name)))
    }

    /// The command string this variant dispatches on
    pub fn name(&self) -> &'static str {
        match self {
            ChatCommand::AddWord { .. } => "!add",
            ChatCommand::RemoveWord { .. } => "!remove",
            ChatCommand::BanWord { .. } => "!ban",
            ChatCommand::ListWords => "!words",
        }
    }
}
