use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Code generation error: {0}")]
    Generation(String),

    #[error("Format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}
