use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ThemeMode::Light => "Light",
            ThemeMode::Dark => "Dark",
        }
    }

    /// Parse a stored preference. Only the exact strings `light` and `dark`
    /// are accepted.
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == ThemeMode::Dark
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guess the terminal's colour scheme from `COLORFGBG` (`"fg;bg"` or
/// `"fg;default;bg"`, as set by rxvt, Konsole and friends).
pub fn preference_from_colorfgbg(value: Option<&str>) -> Option<ThemeMode> {
    let background: u8 = value?.rsplit(';').next()?.trim().parse().ok()?;
    match background {
        7 | 9..=15 => Some(ThemeMode::Light),
        0..=6 | 8 => Some(ThemeMode::Dark),
        _ => None,
    }
}

pub fn system_preference() -> Option<ThemeMode> {
    preference_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

/// Stored preference first, then the terminal's scheme, then light.
pub fn resolve_initial_theme(stored: Option<&str>, system: Option<ThemeMode>) -> ThemeMode {
    stored
        .and_then(ThemeMode::from_stored)
        .or(system)
        .unwrap_or_default()
}
