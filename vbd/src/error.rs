use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Vbea(#[from] vbea::VbeaError),

    #[error("PRIVATE_KEY environment variable is required")]
    MissingPrivateKey,
}

pub type Result<T> = std::result::Result<T, AppError>;
