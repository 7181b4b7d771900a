//! Form controls: the editable text field and the task creator built on it.

pub mod creator;
pub mod editable_text;

pub use creator::TaskCreator;
pub use editable_text::EditableText;
