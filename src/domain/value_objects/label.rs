use thiserror::Error;

pub(crate) const MAX_LABEL_LEN: usize = 63;
pub(crate) const MAX_NAME_LEN: usize = 253;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("empty label")]
    Empty,

    #[error("label '{0}' is longer than 63 characters")]
    TooLong(String),

    #[error("label '{0}' contains invalid characters")]
    InvalidCharacters(String),

    #[error("label '{0}' starts or ends with a hyphen")]
    HyphenEdge(String),
}

/// Check a single DNS label (LDH rule: letters, digits, hyphen).
pub(crate) fn check_label(label: &str) -> Result<(), LabelError> {
    if label.is_empty() {
        return Err(LabelError::Empty);
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(LabelError::TooLong(label.to_string()));
    }
    if !label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(LabelError::InvalidCharacters(label.to_string()));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(LabelError::HyphenEdge(label.to_string()));
    }
    Ok(())
}

/// Check every label of a dot-separated name.
pub(crate) fn check_labels(name: &str) -> Result<(), LabelError> {
    name.split('.').try_for_each(check_label)
}
