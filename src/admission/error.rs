use thiserror::Error;

#[derive(Error)]
pub enum AdmissionError {
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
    #[error("failed to publish job: {0}")]
    PublishFailed(#[source] anyhow::Error),
}

impl From<crate::store::StoreError> for AdmissionError {
    fn from(e: crate::store::StoreError) -> Self { Self::Internal(e.into()) }
}
