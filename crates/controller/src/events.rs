//! Operator-facing notifications and error modeling for the template views.

use shared::error::{ApiError, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    LoadTemplates,
    LoadAssociations,
    Unlink,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let category = classify_message(&message);
        Self {
            category,
            context,
            message,
        }
    }

    /// The remote message is kept verbatim; the status code only sharpens the
    /// category when the text alone is ambiguous.
    pub fn from_api(context: UiErrorContext, error: &ApiError) -> Self {
        let category = match error.code {
            ErrorCode::Unauthorized | ErrorCode::Forbidden => UiErrorCategory::Auth,
            ErrorCode::Validation => UiErrorCategory::Validation,
            _ => classify_message(&error.message),
        };
        Self {
            category,
            context,
            message: error.message.clone(),
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn classify_message(message: &str) -> UiErrorCategory {
    let lower = message.to_ascii_lowercase();
    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
        || lower.contains("security_exception")
        || lower.contains("no permissions")
    {
        UiErrorCategory::Auth
    } else if lower.contains("invalid")
        || lower.contains("missing")
        || lower.contains("malformed")
    {
        UiErrorCategory::Validation
    } else if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("network")
        || lower.contains("unavailable")
        || lower.contains("dns")
    {
        UiErrorCategory::Transport
    } else {
        UiErrorCategory::Unknown
    }
}

/// Toast-style sink owned by the host application.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, error: &UiError);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_write_is_an_auth_failure_with_verbatim_text() {
        let error = UiError::from_api(
            UiErrorContext::Unlink,
            &ApiError::new(ErrorCode::Internal, "403 Forbidden"),
        );
        assert_eq!(error.category(), UiErrorCategory::Auth);
        assert!(error.requires_reauth());
        assert_eq!(error.message(), "403 Forbidden");
        assert_eq!(error.context(), UiErrorContext::Unlink);
    }

    #[test]
    fn status_code_wins_over_text() {
        let error = UiError::from_api(
            UiErrorContext::LoadTemplates,
            &ApiError::new(ErrorCode::Validation, "request failed"),
        );
        assert_eq!(error.category(), UiErrorCategory::Validation);
    }

    #[test]
    fn transport_failures_are_classified() {
        let error = UiError::from_message(
            UiErrorContext::LoadAssociations,
            "error sending request: connection refused",
        );
        assert_eq!(error.category(), UiErrorCategory::Transport);
        assert!(!error.requires_reauth());
    }
}
