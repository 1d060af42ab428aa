use rand::Rng;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("temporary send error")]
pub struct SendError;

/// Stand-in for an SMTP/API call. Succeeds ~85% of the time, matching
/// `simulateSend` in `worker.go`; `address`/`body` are unused beyond
/// signalling the call site's intent, same as the Go original.
pub fn simulate_send(_address: &str, _body: &str) -> Result<(), SendError> {
    if rand::thread_rng().gen::<f64>() < 0.85 {
        Ok(())
    } else {
        Err(SendError)
    }
}
