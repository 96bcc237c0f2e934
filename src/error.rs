use thiserror::Error;

/// Everything that can go wrong while turning a pattern into its expansion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The pattern text is not a well-formed regular expression.
    #[error("invalid regular expression at offset {position}: {message}")]
    Parse { position: usize, message: String },

    /// The pattern is well-formed but uses syntax that cannot be expanded.
    #[error("unsupported regular expression syntax: {construct}")]
    Unsupported { construct: &'static str },

    /// A node reached the expander in a shape the normalizer should have removed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(construct: &'static str) -> Self {
        Error::Unsupported { construct }
    }
}
