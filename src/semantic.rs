//! Semantic prompt tracking (OSC 133)
//!
//! Shells emit `OSC 133 ; A` when drawing a prompt, `B` when input starts,
//! `C` when the command's output starts and `D [; exit]` when it finishes.
//! The tracker follows that cycle and records a [`PromptMark`] for each
//! marker so hosts can jump between prompts.

use serde::{Deserialize, Serialize};

use crate::core::LineTag;

/// Where the shell is in its prompt cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SemanticPromptState {
    #[default]
    Unknown,
    Prompt,
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptMarkType {
    PromptStart,
    InputStart,
    OutputStart,
    OutputEnd,
}

impl PromptMarkType {
    /// Tag placed on the line where this mark was recorded
    pub fn line_tag(self) -> LineTag {
        match self {
            PromptMarkType::PromptStart => LineTag::PromptStart,
            PromptMarkType::InputStart => LineTag::Input,
            PromptMarkType::OutputStart => LineTag::Output,
            PromptMarkType::OutputEnd => LineTag::OutputEnd,
        }
    }
}

/// Prompt kind given by `kind=` on a prompt start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptKind {
    Primary,
    Secondary,
    Right,
}

impl PromptKind {
    /// Unrecognised values count as primary
    fn parse(value: &str) -> Self {
        match value {
            "secondary" => PromptKind::Secondary,
            "right" => PromptKind::Right,
            _ => PromptKind::Primary,
        }
    }
}

/// A recorded OSC 133 marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMark {
    pub mark_type: PromptMarkType,
    /// Absolute row of the cursor at the time, see `Buffer::absolute_row`
    pub row: usize,
    /// Set only on prompt starts carrying a `kind=` parameter
    pub kind: Option<PromptKind>,
    /// Set only on output ends carrying an exit code
    pub exit_code: Option<i32>,
}

/// A parsed OSC 133 sub-command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticCommand {
    PromptStart { kind: Option<PromptKind> },
    InputStart,
    OutputStart,
    OutputEnd { exit_code: Option<i32> },
}

impl SemanticCommand {
    /// Parse the payload following `133;`
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(payload).ok()?;
        let mut parts = text.split(';');
        let command = match parts.next()? {
            "A" => SemanticCommand::PromptStart {
                kind: parts
                    .filter_map(|part| part.strip_prefix("kind="))
                    .map(PromptKind::parse)
                    .next(),
            },
            "B" => SemanticCommand::InputStart,
            "C" => SemanticCommand::OutputStart,
            "D" => SemanticCommand::OutputEnd {
                exit_code: parts.next().and_then(|code| code.trim().parse().ok()),
            },
            _ => return None,
        };
        Some(command)
    }

    pub fn mark_type(&self) -> PromptMarkType {
        match self {
            SemanticCommand::PromptStart { .. } => PromptMarkType::PromptStart,
            SemanticCommand::InputStart => PromptMarkType::InputStart,
            SemanticCommand::OutputStart => PromptMarkType::OutputStart,
            SemanticCommand::OutputEnd { .. } => PromptMarkType::OutputEnd,
        }
    }

    /// State after this command; output end closes the cycle
    pub fn next_state(&self) -> SemanticPromptState {
        match self {
            SemanticCommand::PromptStart { .. } => SemanticPromptState::Prompt,
            SemanticCommand::InputStart => SemanticPromptState::Input,
            SemanticCommand::OutputStart => SemanticPromptState::Output,
            SemanticCommand::OutputEnd { .. } => SemanticPromptState::Unknown,
        }
    }
}

/// Prompt state machine and mark history
#[derive(Debug, Clone, Default)]
pub struct SemanticPrompts {
    state: SemanticPromptState,
    marks: Vec<PromptMark>,
}

impl SemanticPrompts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SemanticPromptState {
        self.state
    }

    pub fn marks(&self) -> &[PromptMark] {
        &self.marks
    }

    /// Transition and record a mark at absolute `row`
    pub fn apply(&mut self, command: SemanticCommand, row: usize) -> &PromptMark {
        self.state = command.next_state();
        let (kind, exit_code) = match command {
            SemanticCommand::PromptStart { kind } => (kind, None),
            SemanticCommand::OutputEnd { exit_code } => (None, exit_code),
            _ => (None, None),
        };
        self.marks.push(PromptMark {
            mark_type: command.mark_type(),
            row,
            kind,
            exit_code,
        });
        log::trace!("semantic prompt {:?} at row {}", self.state, row);
        &self.marks[self.marks.len() - 1]
    }

    /// Row of the nearest prompt start strictly above `row`
    pub fn previous_prompt_line(&self, row: usize) -> Option<usize> {
        self.prompt_rows().filter(|&r| r < row).max()
    }

    /// Row of the nearest prompt start strictly below `row`
    pub fn next_prompt_line(&self, row: usize) -> Option<usize> {
        self.prompt_rows().filter(|&r| r > row).min()
    }

    fn prompt_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.marks
            .iter()
            .filter(|mark| mark.mark_type == PromptMarkType::PromptStart)
            .map(|mark| mark.row)
    }

    /// Return to unknown, keeping the mark history
    pub fn reset_state(&mut self) {
        self.state = SemanticPromptState::Unknown;
    }

    /// Forget state and history
    pub fn clear(&mut self) {
        self.state = SemanticPromptState::Unknown;
        self.marks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sub_commands() {
        assert_eq!(
            SemanticCommand::parse(b"A"),
            Some(SemanticCommand::PromptStart { kind: None })
        );
        assert_eq!(SemanticCommand::parse(b"B"), Some(SemanticCommand::InputStart));
        assert_eq!(SemanticCommand::parse(b"C"), Some(SemanticCommand::OutputStart));
        assert_eq!(
            SemanticCommand::parse(b"D;127"),
            Some(SemanticCommand::OutputEnd { exit_code: Some(127) })
        );
        assert_eq!(
            SemanticCommand::parse(b"D"),
            Some(SemanticCommand::OutputEnd { exit_code: None })
        );
        assert_eq!(SemanticCommand::parse(b"Z"), None);
    }

    #[test]
    fn test_parse_prompt_kind() {
        let kind = |payload: &[u8]| match SemanticCommand::parse(payload) {
            Some(SemanticCommand::PromptStart { kind }) => kind,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(kind(b"A;kind=secondary"), Some(PromptKind::Secondary));
        assert_eq!(kind(b"A;kind=right"), Some(PromptKind::Right));
        assert_eq!(kind(b"A;kind=custom"), Some(PromptKind::Primary));
        assert_eq!(kind(b"A;aid=7;kind=primary"), Some(PromptKind::Primary));
        assert_eq!(kind(b"A;aid=7"), None);
    }

    #[test]
    fn test_cycle_states() {
        let mut prompts = SemanticPrompts::new();
        prompts.apply(SemanticCommand::PromptStart { kind: None }, 0);
        assert_eq!(prompts.state(), SemanticPromptState::Prompt);
        prompts.apply(SemanticCommand::InputStart, 0);
        assert_eq!(prompts.state(), SemanticPromptState::Input);
        prompts.apply(SemanticCommand::OutputStart, 1);
        assert_eq!(prompts.state(), SemanticPromptState::Output);
        let mark = prompts.apply(SemanticCommand::OutputEnd { exit_code: Some(3) }, 2);
        assert_eq!(mark.exit_code, Some(3));
        assert_eq!(prompts.state(), SemanticPromptState::Unknown);
        assert_eq!(prompts.marks().len(), 4);
    }

    #[test]
    fn test_navigation() {
        let mut prompts = SemanticPrompts::new();
        prompts.apply(SemanticCommand::PromptStart { kind: None }, 0);
        prompts.apply(SemanticCommand::OutputStart, 1);
        prompts.apply(SemanticCommand::PromptStart { kind: None }, 4);
        prompts.apply(SemanticCommand::PromptStart { kind: None }, 9);

        assert_eq!(prompts.previous_prompt_line(0), None);
        assert_eq!(prompts.previous_prompt_line(5), Some(4));
        assert_eq!(prompts.previous_prompt_line(4), Some(0));
        assert_eq!(prompts.next_prompt_line(0), Some(4));
        assert_eq!(prompts.next_prompt_line(4), Some(9));
        assert_eq!(prompts.next_prompt_line(9), None);
    }

    #[test]
    fn test_reset_state_keeps_marks() {
        let mut prompts = SemanticPrompts::new();
        prompts.apply(SemanticCommand::PromptStart { kind: None }, 0);
        prompts.reset_state();
        assert_eq!(prompts.state(), SemanticPromptState::Unknown);
        assert_eq!(prompts.marks().len(), 1);
        prompts.clear();
        assert!(prompts.marks().is_empty());
    }

    #[test]
    fn test_mark_line_tags() {
        assert_eq!(PromptMarkType::PromptStart.line_tag(), LineTag::PromptStart);
        assert_eq!(PromptMarkType::OutputEnd.line_tag(), LineTag::OutputEnd);
    }
}
