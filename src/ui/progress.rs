use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, ProgressBar};
use owo_colors::OwoColorize;
use std::time::Duration;

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::Term::stdout().is_term() {
            let pb = ProgressBar::new_spinner();
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());
        Self { pb }
    }

    /// Clear the spinner and print how long the work took
    pub fn finish_with_summary(&self, label: &str, duration: Duration) {
        self.pb.finish_and_clear();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().saved.clone()),
            format!("{} in {}", label, HumanDuration(duration)).style(theme().saved.clone())
        );
    }

    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}
