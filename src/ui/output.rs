use crate::config::BackendMode;
use crate::notify::{Toast, ToastKind};
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn banner(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().title.clone()));
}

pub fn status(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, label.style(theme().label.clone()), value);
}

/// Which store the content is coming from
pub fn backend(mode: &BackendMode) {
    let style = if mode.is_remote() { theme().remote.clone() } else { theme().local.clone() };
    status(Icons::DATABASE, "Backend", &mode.label().style(style).to_string());
    if !mode.is_remote() {
        println!("  {}", placeholder("edits stay on this machine until a hosted backend is configured"));
    }
}

pub fn success(message: &str) {
    println!("{} {}", Icons::CHECK, message.style(theme().saved.clone()));
}

pub fn error(message: &str) {
    eprintln!("{} {}", Icons::CROSS, message.style(theme().failed.clone()));
}

pub fn warn(message: &str) {
    eprintln!("{} {}", Icons::WARN, message.style(theme().caution.clone()));
}

pub fn note(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().note.clone()),
        label.style(theme().label.clone()),
        value
    );
}

/// Heading for one part of the about page
pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().title.clone()));
}

pub fn label(text: &str) -> String {
    text.style(theme().label.clone()).to_string()
}

pub fn placeholder(text: &str) -> String {
    text.style(theme().empty.clone()).to_string()
}

pub fn added(what: &str) {
    println!("{} {}", Icons::NEW.style(theme().saved.clone()), what);
}

pub fn changed(what: &str) {
    println!("{} {}", Icons::MOD.style(theme().caution.clone()), what);
}

/// Print an admin toast the way the terminal shows other feedback
pub fn toast(toast: &Toast) {
    match toast.kind {
        ToastKind::Success => success(&toast.message),
        ToastKind::Error => error(&toast.message),
        ToastKind::Warning => warn(&toast.message),
        ToastKind::Info => println!("{} {}", Icons::INFO.style(theme().note.clone()), toast.message),
    }
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().label.clone()), value);
}
