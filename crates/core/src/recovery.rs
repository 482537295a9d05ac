use crate::AppError;

/// Recovery a caller chooses after a failed boundary call.
///
/// None of these are performed automatically; drafts are never touched by a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recovery {
    /// The referenced template or account is gone: clear the selection and refresh lists.
    ClearSelection,
    /// The caller lacks permission-editing rights: downgrade to a read-only experience.
    ReadOnly,
    /// The submitted draft was rejected: let the user correct it and retry.
    FixInput,
    /// Unexpected failure: the user may retry the same action.
    Retry,
}

impl Recovery {
    /// Classifies an application error.
    #[must_use]
    pub fn for_error(error: &AppError) -> Self {
        match error {
            AppError::NotFound(_) => Self::ClearSelection,
            AppError::Forbidden(_) | AppError::Unauthorized(_) => Self::ReadOnly,
            AppError::Validation(_) | AppError::Conflict(_) => Self::FixInput,
            AppError::Internal(_) => Self::Retry,
        }
    }

    /// Returns a stable identifier for logs and transport.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClearSelection => "clear_selection",
            Self::ReadOnly => "read_only",
            Self::FixInput => "fix_input",
            Self::Retry => "retry",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Recovery;
    use crate::AppError;

    #[test]
    fn forbidden_and_unauthorized_downgrade_to_read_only() {
        assert_eq!(
            Recovery::for_error(&AppError::Forbidden("tree".to_owned())),
            Recovery::ReadOnly
        );
        assert_eq!(
            Recovery::for_error(&AppError::Unauthorized("session".to_owned())),
            Recovery::ReadOnly
        );
    }

    #[test]
    fn validation_and_conflict_ask_for_input_fix() {
        assert_eq!(
            Recovery::for_error(&AppError::Validation("label".to_owned())),
            Recovery::FixInput
        );
        assert_eq!(
            Recovery::for_error(&AppError::Conflict("key".to_owned())),
            Recovery::FixInput
        );
    }
}
