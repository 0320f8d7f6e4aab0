//! User feedback: toasts, the loading flag, and inline field errors

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastKind {
    pub fn default_duration_ms(self) -> u64 {
        match self {
            ToastKind::Success | ToastKind::Info => 5000,
            ToastKind::Error => 7000,
            ToastKind::Warning => 6000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    /// 0 keeps the toast until dismissed
    pub duration_ms: u64,
}

/// Feedback accumulated while handling one admin command
#[derive(Debug, Default, Serialize)]
pub struct Notifier {
    toasts: Vec<Toast>,
    loading: bool,
    field_errors: BTreeMap<String, String>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_toast(&mut self, kind: ToastKind, message: impl Into<String>, duration_ms: u64) {
        let message = message.into();
        tracing::debug!("Toast ({:?}): {}", kind, message);
        self.toasts.push(Toast {
            kind,
            message,
            duration_ms,
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show_toast(ToastKind::Success, message, ToastKind::Success.default_duration_ms());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show_toast(ToastKind::Error, message, ToastKind::Error.default_duration_ms());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.show_toast(ToastKind::Info, message, ToastKind::Info.default_duration_ms());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.show_toast(ToastKind::Warning, message, ToastKind::Warning.default_duration_ms());
    }

    pub fn show_loading(&mut self) {
        self.loading = true;
    }

    pub fn hide_loading(&mut self) {
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Attach an inline error to a form field
    pub fn show_error(&mut self, field: &str, message: impl Into<String>) {
        self.field_errors.insert(field.to_string(), message.into());
    }

    pub fn hide_error(&mut self, field: &str) {
        self.field_errors.remove(field);
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Drop every toast and field error
    pub fn clear_all(&mut self) {
        self.toasts.clear();
        self.field_errors.clear();
    }

    /// Take the pending toasts, leaving none behind
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_durations() {
        let mut notifier = Notifier::new();
        notifier.success("saved");
        notifier.error("failed");
        notifier.info("fyi");
        notifier.warning("careful");

        let durations: Vec<u64> = notifier.toasts().iter().map(|t| t.duration_ms).collect();
        assert_eq!(durations, vec![5000, 7000, 5000, 6000]);
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut notifier = Notifier::new();
        notifier.success("one");
        notifier.show_toast(ToastKind::Info, "sticky", 0);

        let drained = notifier.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].duration_ms, 0);
        assert!(notifier.toasts().is_empty());
    }

    #[test]
    fn test_field_errors_and_loading() {
        let mut notifier = Notifier::new();
        notifier.show_loading();
        assert!(notifier.is_loading());
        notifier.hide_loading();
        assert!(!notifier.is_loading());

        notifier.show_error("photoUrlError", "Please enter a URL");
        assert_eq!(notifier.field_error("photoUrlError"), Some("Please enter a URL"));
        notifier.hide_error("photoUrlError");
        assert_eq!(notifier.field_error("photoUrlError"), None);
    }

    #[test]
    fn test_clear_all_drops_field_errors() {
        let mut notifier = Notifier::new();
        notifier.error("Upload failed");
        notifier.show_error("photoStatus", "File too large");

        notifier.clear_all();
        assert!(notifier.toasts().is_empty());
        assert!(notifier.field_errors().is_empty());
    }
}
