//! Prompt presets for the different phases of a Dota 2 match.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PROMPT: &str = "Analyze this Dota 2 screenshot and provide concise gameplay suggestions. \
    Focus on: 1) Hero positioning, 2) Itemization status, 3) Farm priorities, \
    4) Team coordination opportunities. Keep response under 3 sentences if possible.";

pub const LANING_PHASE_PROMPT: &str = "This is a Dota 2 laning phase screenshot. Provide quick tips for: \
    1) Last hitting and denying, 2) Harassment windows, 3) Ward placement, \
    4) When to rotate. Keep response to 2-3 short sentences.";

pub const TEAM_FIGHT_PROMPT: &str = "This is a Dota 2 screenshot during or before a team fight. Analyze: \
    1) Enemy carry positioning, 2) Disengage opportunities, 3) Focus targets, \
    4) Spell usage priorities. Keep response to 2-3 sentences.";

pub const ITEMIZATION_PROMPT: &str = "Analyze the Dota 2 screenshot for itemization advice. Consider: \
    1) Current gold and shop availability, 2) Power spike timing, \
    3) Enemy counter-items needed, 4) Core vs luxury items. Keep response to 2-3 sentences.";

pub const LATE_GAME_PROMPT: &str = "This is a late game Dota 2 screenshot. Analyze: \
    1) High ground push timing, 2) Buyback considerations, \
    3) Split push opportunities, 4) Roshan/Aegis priority. Keep response to 2-3 sentences.";

/// Which prompt preset drives the analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromptType {
    #[default]
    Default,
    LaningPhase,
    TeamFight,
    Itemization,
    LateGame,
    /// Uses the free-text custom prompt.
    Custom,
}

impl PromptType {
    /// Returns all prompt types in selector order.
    pub fn all() -> &'static [PromptType] {
        &[
            Self::Default,
            Self::LaningPhase,
            Self::TeamFight,
            Self::Itemization,
            Self::LateGame,
            Self::Custom,
        ]
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Default => "General",
            Self::LaningPhase => "Laning Phase",
            Self::TeamFight => "Team Fight",
            Self::Itemization => "Itemization",
            Self::LateGame => "Late Game",
            Self::Custom => "Custom",
        }
    }

    /// The next type in selector order, wrapping around.
    pub fn next(&self) -> PromptType {
        let all = Self::all();
        let idx = all.iter().position(|p| p == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    /// Built-in prompt text. `None` for [`PromptType::Custom`].
    pub fn preset_text(&self) -> Option<&'static str> {
        match self {
            Self::Default => Some(DEFAULT_PROMPT),
            Self::LaningPhase => Some(LANING_PHASE_PROMPT),
            Self::TeamFight => Some(TEAM_FIGHT_PROMPT),
            Self::Itemization => Some(ITEMIZATION_PROMPT),
            Self::LateGame => Some(LATE_GAME_PROMPT),
            Self::Custom => None,
        }
    }
}

impl std::fmt::Display for PromptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A prompt type plus the custom text used when the type is `Custom`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptSelection {
    pub kind: PromptType,
    pub custom: String,
}

impl PromptSelection {
    pub fn new(kind: PromptType, custom: impl Into<String>) -> Self {
        Self {
            kind,
            custom: custom.into(),
        }
    }

    /// Resolve the text sent to the model.
    ///
    /// A blank custom prompt falls back to the default preset.
    pub fn resolve(&self) -> &str {
        match self.kind.preset_text() {
            Some(text) => text,
            None if self.custom.trim().is_empty() => DEFAULT_PROMPT,
            None => self.custom.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_resolution() {
        let sel = PromptSelection::new(PromptType::TeamFight, "ignored");
        assert_eq!(sel.resolve(), TEAM_FIGHT_PROMPT);
    }

    #[test]
    fn test_custom_prompt_used_only_for_custom() {
        let sel = PromptSelection::new(PromptType::Custom, "Where should I ward?");
        assert_eq!(sel.resolve(), "Where should I ward?");

        let sel = PromptSelection::new(PromptType::Default, "Where should I ward?");
        assert_eq!(sel.resolve(), DEFAULT_PROMPT);
    }

    #[test]
    fn test_blank_custom_falls_back() {
        let sel = PromptSelection::new(PromptType::Custom, "   ");
        assert_eq!(sel.resolve(), DEFAULT_PROMPT);
    }

    #[test]
    fn test_next_wraps() {
        assert_eq!(PromptType::Default.next(), PromptType::LaningPhase);
        assert_eq!(PromptType::Custom.next(), PromptType::Default);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&PromptType::LateGame).unwrap();
        assert_eq!(json, "\"LateGame\"");
    }
}
