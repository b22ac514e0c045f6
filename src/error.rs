//! Error types for the `post_parser` crate.

/// Boxed error returned by registered filters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// All errors that can occur while parsing post content.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The payload or its content field does not have the expected shape.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A math span could not be rendered.
    ///
    /// Recovered per span by the expander; only surfaces from a
    /// [`MathRenderer`](crate::MathRenderer) directly.
    #[error("Render failed: {0}")]
    Render(String),

    /// A captured attribute value is not a valid URL reference.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A filter registered on a hook returned an error.
    #[error("Filter `{plugin}` failed on hook `{hook}`: {source}")]
    Filter {
        hook: &'static str,
        plugin: String,
        #[source]
        source: BoxError,
    },

    /// The builder or a rule configuration is invalid.
    #[error("Config error: {0}")]
    Config(String),
}

/// A type alias for `Result<T, PipelineError>`.
pub type Result<T> = std::result::Result<T, PipelineError>;
