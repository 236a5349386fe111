//! Terminal styling for the text output format.
//!
//! The palette follows the active [`Theme`]: bright accents on dark
//! terminals, deeper ones on light terminals. Everything collapses to plain
//! text when the terminal cannot show colour.

use globepeek_lib::Theme;

/// ANSI escape codes used by the palettes.
pub mod colors {
    /// Reset all styling.
    pub const RESET: &str = "\x1b[0m";
    /// Bold, default foreground.
    pub const BOLD: &str = "\x1b[1m";
    /// Bright bold white for headings on dark terminals.
    pub const WHITE_BOLD: &str = "\x1b[1;97m";
    /// Gray for secondary details.
    pub const GRAY: &str = "\x1b[90m";
    /// Dim gray that stays readable on a light background.
    pub const DARK_GRAY: &str = "\x1b[2;37m";
    pub const CYAN: &str = "\x1b[36m";
    pub const BLUE: &str = "\x1b[34m";
    pub const GREEN: &str = "\x1b[32m";
    pub const BRIGHT_GREEN: &str = "\x1b[92m";
    /// Orange (256-color) for warnings.
    pub const ORANGE: &str = "\x1b[38;5;208m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RED: &str = "\x1b[31m";
}

/// Resolved colour codes, or empty strings when colour is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPalette {
    pub reset: &'static str,
    /// Country names and section titles.
    pub heading: &'static str,
    /// Codes, counts and links.
    pub accent: &'static str,
    pub muted: &'static str,
    pub ok: &'static str,
    pub warn: &'static str,
    pub error: &'static str,
}

impl ColorPalette {
    /// Palette tuned for a theme.
    #[must_use]
    pub const fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                reset: colors::RESET,
                heading: colors::WHITE_BOLD,
                accent: colors::CYAN,
                muted: colors::GRAY,
                ok: colors::BRIGHT_GREEN,
                warn: colors::ORANGE,
                error: colors::RED,
            },
            Theme::Light => Self {
                reset: colors::RESET,
                heading: colors::BOLD,
                accent: colors::BLUE,
                muted: colors::DARK_GRAY,
                ok: colors::GREEN,
                warn: colors::YELLOW,
                error: colors::RED,
            },
        }
    }

    /// Palette with no colours (empty strings).
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            reset: "",
            heading: "",
            accent: "",
            muted: "",
            ok: "",
            warn: "",
            error: "",
        }
    }

    /// Themed palette if the terminal supports colour, plain otherwise.
    #[must_use]
    pub fn detect(theme: Theme) -> Self {
        if supports_color() {
            Self::for_theme(theme)
        } else {
            Self::plain()
        }
    }
}

/// Whether ANSI colour should be used.
///
/// Respects `NO_COLOR` (<https://no-color.org/>) and `TERM=dumb`.
#[must_use]
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if let Ok(term) = std::env::var("TERM") {
        if term.eq_ignore_ascii_case("dumb") {
            return false;
        }
    }
    true
}

/// Format a number with thousand separators (commas).
///
/// ```
/// # use globepeek_cli::terminal::format_with_separators;
/// assert_eq!(format_with_separators(999), "999");
/// assert_eq!(format_with_separators(67_391_582), "67,391,582");
/// ```
#[must_use]
pub fn format_with_separators(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
