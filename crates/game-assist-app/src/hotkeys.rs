//! Global hotkeys. All chords are Ctrl+Alt+<letter>.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    ToggleRun,
    CaptureNow,
    ShowOverlay,
    CyclePrompt,
    ReloadConfig,
    Quit,
}

impl Hotkey {
    pub fn all() -> &'static [Hotkey] {
        &[
            Hotkey::ToggleRun,
            Hotkey::CaptureNow,
            Hotkey::ShowOverlay,
            Hotkey::CyclePrompt,
            Hotkey::ReloadConfig,
            Hotkey::Quit,
        ]
    }

    /// Registration id passed to the OS.
    pub fn id(&self) -> i32 {
        match self {
            Hotkey::ToggleRun => 1,
            Hotkey::CaptureNow => 2,
            Hotkey::ShowOverlay => 3,
            Hotkey::CyclePrompt => 4,
            Hotkey::ReloadConfig => 5,
            Hotkey::Quit => 6,
        }
    }

    pub fn from_id(id: i32) -> Option<Hotkey> {
        Self::all().iter().copied().find(|h| h.id() == id)
    }

    /// Letter key; doubles as the virtual-key code.
    pub fn key(&self) -> char {
        match self {
            Hotkey::ToggleRun => 'S',
            Hotkey::CaptureNow => 'C',
            Hotkey::ShowOverlay => 'O',
            Hotkey::CyclePrompt => 'P',
            Hotkey::ReloadConfig => 'R',
            Hotkey::Quit => 'Q',
        }
    }

    pub fn chord(&self) -> String {
        format!("Ctrl+Alt+{}", self.key())
    }

    pub fn description(&self) -> &'static str {
        match self {
            Hotkey::ToggleRun => "Start or stop automatic capture",
            Hotkey::CaptureNow => "Capture and analyze now",
            Hotkey::ShowOverlay => "Show the last suggestion",
            Hotkey::CyclePrompt => "Switch to the next prompt",
            Hotkey::ReloadConfig => "Reload settings from disk",
            Hotkey::Quit => "Quit",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_and_are_unique() {
        for hotkey in Hotkey::all() {
            assert_eq!(Hotkey::from_id(hotkey.id()), Some(*hotkey));
        }
        assert_eq!(Hotkey::from_id(0), None);
        assert_eq!(Hotkey::from_id(99), None);
    }

    #[test]
    fn test_keys_are_distinct_letters() {
        let mut keys: Vec<char> = Hotkey::all().iter().map(|h| h.key()).collect();
        assert!(keys.iter().all(|k| k.is_ascii_uppercase()));
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), Hotkey::all().len());
        assert_eq!(Hotkey::CaptureNow.chord(), "Ctrl+Alt+C");
    }
}
