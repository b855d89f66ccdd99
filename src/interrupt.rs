//! Cooperative cancellation for blocking metadata operations.
//!
//! Every call that may suspend (snapshot fetch, directory lookup, config
//! generation, split-point calculation) takes an [`Interruptor`]. Once it is
//! cancelled the pending call resolves to [`ConfigError::Interrupted`] and no
//! join into the metadata store happens.

use crate::core::{ConfigError, Result};
use std::future::Future;

pub use tokio_util::sync::CancellationToken as Interruptor;

/// Fails fast when the interruptor has already fired.
pub fn check_interrupted(interruptor: &Interruptor) -> Result<()> {
    if interruptor.is_cancelled() {
        return Err(ConfigError::Interrupted);
    }
    Ok(())
}

/// Races `fut` against `interruptor`; cancellation wins ties.
pub async fn interruptible<F, T>(fut: F, interruptor: &Interruptor) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = interruptor.cancelled() => Err(ConfigError::Interrupted),
        value = fut => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_completed_future_passes_through() {
        let interruptor = Interruptor::new();
        let value = interruptible(async { 7 }, &interruptor).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_cancellation_wins_over_pending_future() {
        let interruptor = Interruptor::new();
        let child = interruptor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            child.cancel();
        });
        let result = interruptible(std::future::pending::<()>(), &interruptor).await;
        assert_eq!(result, Err(ConfigError::Interrupted));
        assert!(check_interrupted(&interruptor).is_err());
    }
}
