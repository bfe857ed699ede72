pub type GlitchResult<T> = Result<T, GlitchError>;

#[derive(thiserror::Error, Debug)]
pub enum GlitchError {
    #[error("source error: {0}")]
    Source(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("output error: {0}")]
    Output(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlitchError {
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }
}
