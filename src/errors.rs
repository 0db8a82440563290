use std::fmt;
use std::path::PathBuf;

/// Reasons a pair of roots cannot be synchronized at all
#[derive(Debug)]
pub enum RootError {
    /// Neither root exists, so there is nothing to synchronize from
    BothMissing(PathBuf, PathBuf),
    /// A root exists but is not a directory
    NotADirectory(PathBuf),
}

impl RootError {
    /// Get a user-friendly error message with actionable guidance
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::BothMissing(a, b) => format!(
                "Neither {} nor {} exists\n\nSuggestions:\n\
                 - Check both paths for typos\n\
                 - Create at least one of the directories first",
                a.display(),
                b.display()
            ),
            Self::NotADirectory(path) => format!(
                "{} is not a directory\n\nSuggestions:\n\
                 - Pass the directory containing the file instead\n\
                 - Move the file out of the way if a directory should live there",
                path.display()
            ),
        }
    }

    /// Get a short description of the error type
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::BothMissing(..) => "Missing Roots",
            Self::NotADirectory(_) => "Not A Directory",
        }
    }
}

impl fmt::Display for RootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for RootError {}
