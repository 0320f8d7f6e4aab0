use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Terminal palette for folio's CLI output
#[derive(Debug, Clone)]
pub struct Theme {
    /// Banner and section titles
    pub title: Style,
    pub saved: Style,
    pub failed: Style,
    pub caution: Style,
    pub note: Style,
    /// Field labels and secondary detail
    pub label: Style,
    /// Stand-in text for fields with no content
    pub empty: Style,
    pub remote: Style,
    pub local: Style,
}

impl Theme {
    /// Plain when stdout is not a terminal or `NO_COLOR` is set
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if no_color || !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            saved: Style::new().green().bold(),
            failed: Style::new().red().bold(),
            caution: Style::new().yellow().bold(),
            note: Style::new().magenta(),
            label: Style::new().white().dimmed(),
            empty: Style::new().bright_black().italic(),
            remote: Style::new().blue().bold(),
            local: Style::new().yellow(),
        }
    }

    pub fn plain() -> Self {
        Self {
            title: Style::new(),
            saved: Style::new(),
            failed: Style::new(),
            caution: Style::new(),
            note: Style::new(),
            label: Style::new(),
            empty: Style::new(),
            remote: Style::new(),
            local: Style::new(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    #[test]
    fn test_plain_theme_adds_no_escapes() {
        let plain = Theme::plain();
        assert_eq!("Projects".style(plain.title).to_string(), "Projects");
        assert_eq!("remote".style(plain.remote).to_string(), "remote");
    }

    #[test]
    fn test_colored_theme_styles_backend_modes_apart() {
        let colored = Theme::colored();
        let remote = "mode".style(colored.remote).to_string();
        let local = "mode".style(colored.local).to_string();
        assert!(remote.contains('\u{1b}'));
        assert_ne!(remote, local);
    }
}
