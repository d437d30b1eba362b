//! Patrón poll-until-visible.
//!
//! Tras la confirmación en cadena, algunos pasos esperan que el modelo de
//! lectura refleje el efecto. Sondear sin cota puede colgar si el
//! indexador cae; acá la cota es configurable y agotar los
//! intentos produce `VerificationStalled`, un estado distinguible de
//! "reintentar más tarde", nunca una falla dura.

use std::future::Future;

use crate::config::PollPolicy;
use crate::errors::FlowError;

/// Repite `probe` hasta que devuelva `Some`, dejando pasar `interval` entre
/// intentos. `Ok(None)` significa "todavía no visible" y no es falla.
pub async fn poll_until_visible<T, F, Fut>(policy: &PollPolicy, mut probe: F) -> Result<T, FlowError>
    where F: FnMut() -> Fut,
          Fut: Future<Output = Result<Option<T>, FlowError>>
{
    let mut attempts: u32 = 0;
    loop {
        if let Some(found) = probe().await? {
            return Ok(found);
        }
        attempts += 1;
        if let Some(max) = policy.max_attempts {
            if attempts >= max {
                return Err(FlowError::VerificationStalled);
            }
        }
        tokio::time::sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_on_first_visible_result() {
        let calls = AtomicU32::new(0);
        let policy = PollPolicy::fast(Some(10));
        let result = poll_until_visible(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(if n >= 3 { Some(n) } else { None }) }
        }).await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn exhausting_the_bound_stalls() {
        let policy = PollPolicy::fast(Some(3));
        let result: Result<(), _> = poll_until_visible(&policy, || async { Ok(None) }).await;
        assert_eq!(result.unwrap_err(), FlowError::VerificationStalled);
    }

    #[tokio::test]
    async fn probe_errors_propagate() {
        let policy = PollPolicy::fast(Some(3));
        let result: Result<(), _> = poll_until_visible(&policy, || async {
            Err(FlowError::ChainTransport("indexer down".into()))
        }).await;
        assert_eq!(result.unwrap_err(), FlowError::ChainTransport("indexer down".into()));
    }
}
