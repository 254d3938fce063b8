//! Message request form state

use pulse_core::NewMessage;

use crate::mutation::Settlement;

pub const PHONE_NUMBER_REQUIRED: &str = "Phone Number Required";
pub const MESSAGE_REQUIRED: &str = "message required";

/// Per-field validation errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub phone_number: Option<&'static str>,
    pub message: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.phone_number.is_none() && self.message.is_none()
    }
}

/// Inputs of the request form plus what it currently shows as errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageForm {
    phone_number: String,
    message: String,
    field_errors: FieldErrors,
    error: Option<String>,
}

impl MessageForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(phone_number: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_phone_number(&mut self, value: impl Into<String>) {
        self.phone_number = value.into();
        self.field_errors.phone_number = None;
    }

    pub fn set_message(&mut self, value: impl Into<String>) {
        self.message = value.into();
        self.field_errors.message = None;
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// Form-level error from the last submission
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Check required fields; on success returns the trimmed submission
    pub fn validate(&mut self) -> Option<NewMessage> {
        let phone_number = self.phone_number.trim();
        let message = self.message.trim();

        self.field_errors = FieldErrors {
            phone_number: phone_number.is_empty().then_some(PHONE_NUMBER_REQUIRED),
            message: message.is_empty().then_some(MESSAGE_REQUIRED),
        };

        self.field_errors
            .is_empty()
            .then(|| NewMessage::new(phone_number, message))
    }

    /// Reflect a settled submission: clear on success, show the error otherwise
    pub fn settle<R>(&mut self, settlement: &Settlement<R>) {
        match settlement {
            Settlement::Success(_) => self.reset(),
            Settlement::Failure(e) => self.error = Some(e.user_message().to_string()),
        }
    }

    /// Empty every input and error
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::PulseError;

    #[test]
    fn test_required_fields() {
        let mut form = MessageForm::with_values("  ", "");
        assert_eq!(form.validate(), None);
        assert_eq!(form.field_errors().phone_number, Some(PHONE_NUMBER_REQUIRED));
        assert_eq!(form.field_errors().message, Some(MESSAGE_REQUIRED));

        form.set_phone_number("0812");
        assert_eq!(form.field_errors().phone_number, None);
        assert_eq!(form.validate(), None);
        assert_eq!(form.field_errors().message, Some(MESSAGE_REQUIRED));
    }

    #[test]
    fn test_valid_submission_is_trimmed() {
        let mut form = MessageForm::with_values(" 0812 ", " top up please ");
        assert_eq!(form.validate(), Some(NewMessage::new("0812", "top up please")));
        assert!(form.field_errors().is_empty());
    }

    #[test]
    fn test_settle() {
        let mut form = MessageForm::with_values("0812", "hi");
        form.settle::<()>(&Settlement::Failure(PulseError::api("An error has occurred")));
        assert_eq!(form.error(), Some("An error has occurred"));
        assert_eq!(form.phone_number(), "0812");

        form.settle(&Settlement::Success(()));
        assert_eq!(form, MessageForm::new());
    }
}
