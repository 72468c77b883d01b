use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] bist_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Storage(#[from] bist_core::StorageError),

    #[error(transparent)]
    Export(#[from] bist_core::ExportError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Command(_) => 2,
            Self::Serialization(_) => 4,
            Self::Storage(_) => 10,
            Self::Export(_) => 10,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_categories_to_exit_codes() {
        assert_eq!(
            CliError::from(bist_core::ValidationError::EmptySymbol).exit_code(),
            2
        );
        assert_eq!(CliError::Command(String::from("unknown symbol")).exit_code(), 2);
        assert_eq!(
            CliError::from(std::io::Error::other("disk full")).exit_code(),
            10
        );
        assert_eq!(
            CliError::from(bist_core::StorageError::Poisoned).exit_code(),
            10
        );
    }
}
