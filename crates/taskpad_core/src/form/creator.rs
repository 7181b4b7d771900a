use crate::form::EditableText;
use crate::model::NewTask;

/// Title and description form that emits a [`NewTask`] on a valid submit.
#[derive(Debug)]
pub struct TaskCreator {
    pub title: EditableText,
    pub description: EditableText,
}

impl Default for TaskCreator {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskCreator {
    pub fn new() -> Self {
        Self {
            title: EditableText::required().with_placeholder("Task title"),
            description: EditableText::new().with_placeholder("Add a description"),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.title.is_valid() && self.description.is_valid()
    }

    /// Returns the trimmed input and resets the form when valid. Otherwise
    /// marks every field touched so errors surface, and returns `None`.
    pub fn submit(&mut self) -> Option<NewTask> {
        if !self.is_valid() {
            self.title.mark_as_touched();
            self.description.mark_as_touched();
            return None;
        }

        let task = NewTask::new(
            self.title.value().trim(),
            self.description.value().trim(),
        );
        self.reset();
        Some(task)
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.title.reset();
        self.description.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::TaskCreator;
    use crate::model::NewTask;

    #[test]
    fn valid_submit_emits_trimmed_values_and_resets() {
        let mut creator = TaskCreator::new();
        creator.title.input("  Buy milk ");
        creator.description.input(" 2 litres ");

        let emitted = creator.submit();

        assert_eq!(emitted, Some(NewTask::new("Buy milk", "2 litres")));
        assert_eq!(creator.title.value(), "");
        assert_eq!(creator.description.value(), "");
        assert!(!creator.title.is_touched());
    }

    #[test]
    fn description_is_optional() {
        let mut creator = TaskCreator::new();
        creator.title.input("Call mom");

        assert_eq!(creator.submit(), Some(NewTask::new("Call mom", "")));
    }

    #[test]
    fn invalid_submit_marks_fields_touched_and_emits_nothing() {
        let mut creator = TaskCreator::new();
        creator.description.input("orphan description");

        assert_eq!(creator.submit(), None);
        assert!(creator.title.is_touched());
        assert!(creator.title.is_invalid());
        assert!(creator.description.is_touched());
        assert_eq!(creator.description.value(), "orphan description");
    }

    #[test]
    fn cancel_clears_the_form() {
        let mut creator = TaskCreator::new();
        creator.title.input("half typed");

        creator.cancel();

        assert_eq!(creator.title.value(), "");
        assert!(!creator.is_valid());
    }
}
