use std::fmt;

/// Quick-select categories offered next to the text input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickIntent {
    UpperBody,
    Core,
    LowerBody,
}

impl QuickIntent {
    /// Every intent, in the order the buttons are shown
    pub const ALL: [QuickIntent; 3] = [Self::UpperBody, Self::Core, Self::LowerBody];

    /// Label shown on the button and submitted as the prompt
    pub fn label(&self) -> &'static str {
        match self {
            Self::UpperBody => "Upper body",
            Self::Core => "Core",
            Self::LowerBody => "Lower body",
        }
    }

    /// Match a label, ignoring case and surrounding whitespace
    pub fn from_label(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|intent| intent.label().eq_ignore_ascii_case(wanted))
    }

    /// Match a terminal shortcut: the 1-based position or the first word of the label
    pub fn from_shortcut(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "upper" => Some(Self::UpperBody),
            "2" | "core" => Some(Self::Core),
            "3" | "lower" => Some(Self::LowerBody),
            other => Self::from_label(other),
        }
    }
}

impl fmt::Display for QuickIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
