use thiserror::Error;

#[derive(Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("store operation timed out")]
    Timeout,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
