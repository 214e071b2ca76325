//! Submit controls and the guard that keeps them consistent.

/// A submit button as the form controller sees it.
pub trait SubmitControl {
    fn label(&self) -> String;
    fn set_label(&mut self, label: &str);
    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
}

/// Disables a control and shows a busy label for as long as it lives.
/// Dropping it restores the original label and enabled state, whichever way
/// the surrounding operation exits.
pub struct SubmitGuard<'a> {
    control: &'a mut dyn SubmitControl,
    label: String,
    enabled: bool,
}

impl<'a> SubmitGuard<'a> {
    pub fn new(control: &'a mut dyn SubmitControl, busy_label: &str) -> Self {
        let label = control.label();
        let enabled = control.is_enabled();
        control.set_enabled(false);
        control.set_label(busy_label);
        Self {
            control,
            label,
            enabled,
        }
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.control.set_label(&self.label);
        self.control.set_enabled(self.enabled);
    }
}

/// In-memory button that remembers every state it was put in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    label: String,
    enabled: bool,
    history: Vec<(String, bool)>,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            enabled: true,
            history: Vec::new(),
        }
    }

    /// `(label, enabled)` after each change.
    pub fn history(&self) -> &[(String, bool)] {
        &self.history
    }

    /// Whether the button was ever disabled with this label.
    pub fn was_busy_with(&self, label: &str) -> bool {
        self.history.iter().any(|(l, enabled)| l == label && !enabled)
    }

    fn record(&mut self) {
        self.history.push((self.label.clone(), self.enabled));
    }
}

impl SubmitControl for Button {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
        self.record();
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.record();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_restores_on_early_exit() {
        fn submit(button: &mut Button) -> Result<(), &'static str> {
            let _guard = SubmitGuard::new(button, "Logging in...");
            Err("failed")
        }

        let mut button = Button::new("Login");
        assert!(submit(&mut button).is_err());

        assert!(button.was_busy_with("Logging in..."));
        assert_eq!(button.label(), "Login");
        assert!(button.is_enabled());
    }

    #[test]
    fn test_guard_keeps_disabled_control_disabled() {
        let mut button = Button::new("Save");
        button.set_enabled(false);
        drop(SubmitGuard::new(&mut button, "Saving"));
        assert!(!button.is_enabled());
    }
}
