//! One-line status messages on stderr.

use owo_colors::{OwoColorize, Style};

pub(crate) fn paint(text: &str, style: Style) -> String {
    if super::colors_enabled() {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

pub fn success(message: &str) {
    eprintln!("{} {}", paint("✓", Style::new().green().bold()), message);
}

pub fn info(message: &str) {
    eprintln!("{} {}", paint("ℹ", Style::new().blue().bold()), message);
}

pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        paint("⚠", Style::new().yellow().bold()),
        paint(message, Style::new().yellow())
    );
}

pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        paint("✗", Style::new().red().bold()),
        paint(message, Style::new().red())
    );
}
