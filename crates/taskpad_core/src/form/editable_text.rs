use crate::sanitize::strip_comments;
use std::fmt;

type ChangeListener = Box<dyn FnMut(&str)>;
type ValidityListener = Box<dyn FnMut(bool)>;

const DEFAULT_PLACEHOLDER: &str = "type something...";

/// Inline editable text field with form-control semantics.
///
/// Content is plain text. Programmatic writes ([`EditableText::set_value`])
/// are silent; user edits ([`EditableText::input`]) are sanitized and fire
/// both the value listeners and the validity listeners.
pub struct EditableText {
    value: String,
    placeholder: String,
    required: bool,
    disabled: bool,
    focused: bool,
    touched: bool,
    invalid: bool,
    on_change: Vec<ChangeListener>,
    on_validity_change: Vec<ValidityListener>,
}

impl fmt::Debug for EditableText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditableText")
            .field("value", &self.value)
            .field("required", &self.required)
            .field("disabled", &self.disabled)
            .field("focused", &self.focused)
            .field("touched", &self.touched)
            .field("invalid", &self.invalid)
            .finish_non_exhaustive()
    }
}

impl Default for EditableText {
    fn default() -> Self {
        Self::new()
    }
}

impl EditableText {
    pub fn new() -> Self {
        Self {
            value: String::new(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            required: false,
            disabled: false,
            focused: false,
            touched: false,
            invalid: false,
            on_change: Vec::new(),
            on_validity_change: Vec::new(),
        }
    }

    pub fn required() -> Self {
        let mut field = Self::new();
        field.set_required(true);
        field
    }

    pub fn with_placeholder<P: Into<String>>(mut self, placeholder: P) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Text to show: the value, or the placeholder while empty.
    pub fn display(&self) -> &str {
        if self.value.is_empty() {
            &self.placeholder
        } else {
            &self.value
        }
    }

    /// Writes a value from outside without notifying listeners.
    pub fn set_value<V: Into<String>>(&mut self, value: V) {
        self.value = value.into();
        self.refresh_invalid();
    }

    /// Applies a user edit. Ignored while disabled.
    ///
    /// Returns `false` when the edit was ignored.
    pub fn input(&mut self, raw: &str) -> bool {
        if self.disabled {
            return false;
        }

        self.value = strip_comments(raw);
        for listener in self.on_change.iter_mut() {
            listener(&self.value);
        }
        self.validate();
        true
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
        self.mark_as_touched();
    }

    pub fn mark_as_touched(&mut self) {
        self.touched = true;
        self.validate();
    }

    pub fn set_required(&mut self, required: bool) {
        self.required = required;
        self.refresh_invalid();
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        self.refresh_invalid();
    }

    /// Clears the value and interaction state; listeners stay registered.
    pub fn reset(&mut self) {
        self.value.clear();
        self.focused = false;
        self.touched = false;
        self.invalid = false;
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Whether the current value passes validation. Disabled fields always do.
    pub fn is_valid(&self) -> bool {
        self.disabled || !self.required || !self.value.trim().is_empty()
    }

    /// Invalid and touched: the state in which an error should be shown.
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&str) + 'static,
    {
        self.on_change.push(Box::new(listener));
    }

    pub fn on_validity_change<F>(&mut self, listener: F)
    where
        F: FnMut(bool) + 'static,
    {
        self.on_validity_change.push(Box::new(listener));
    }

    fn validate(&mut self) {
        self.refresh_invalid();
        let valid = self.is_valid();
        for listener in self.on_validity_change.iter_mut() {
            listener(valid);
        }
    }

    fn refresh_invalid(&mut self) {
        self.invalid = !self.is_valid() && self.touched;
    }
}
