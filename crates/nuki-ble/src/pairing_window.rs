use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::info;

/// Time-boxed pairing mode.
///
/// Enabling starts a one-shot timer that switches the mode off again.
/// Enabling while already on neither restarts nor extends the timer. A timer
/// left over from an earlier period never cuts a later one short.
#[derive(Clone)]
pub struct PairingWindow {
    inner: Arc<Mutex<WindowState>>,
    duration: Duration,
}

/// `period` counts enables; a timer only ends the period it was started for.
#[derive(Default)]
struct WindowState {
    enabled: bool,
    period: u64,
}

impl PairingWindow {
    pub fn new(duration: Duration) -> Self {
        Self {
            inner: Arc::default(),
            duration,
        }
    }

    fn state(&self) -> MutexGuard<'_, WindowState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    /// Returns `false` if pairing mode was already on.
    pub fn enable(&self) -> bool {
        let period = {
            let mut state = self.state();
            if state.enabled {
                return false;
            }
            state.period += 1;
            state.enabled = true;
            state.period
        };
        info!(seconds = self.duration.as_secs_f32(), "Pairing mode enabled");

        let window = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(window.duration).await;
            window.expire(period);
        });
        true
    }

    pub fn disable(&self) {
        let mut state = self.state();
        if state.enabled {
            state.enabled = false;
            info!("Pairing mode disabled");
        }
    }

    fn expire(&self, period: u64) {
        let mut state = self.state();
        if state.period == period && state.enabled {
            state.enabled = false;
            info!("Pairing mode expired");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(60);

    #[tokio::test]
    async fn test_expires() {
        let window = PairingWindow::new(WINDOW);
        assert!(!window.is_enabled());
        assert!(window.enable());
        assert!(window.is_enabled());

        tokio::time::sleep(WINDOW * 2).await;
        assert!(!window.is_enabled());
    }

    #[tokio::test]
    async fn test_reenable_does_not_extend() {
        let window = PairingWindow::new(WINDOW);
        window.enable();
        tokio::time::sleep(WINDOW / 2).await;
        assert!(!window.enable());

        // still expires on the first timer
        tokio::time::sleep(WINDOW * 3 / 4).await;
        assert!(!window.is_enabled());
    }

    #[tokio::test]
    async fn test_stale_timer_ignored() {
        let window = PairingWindow::new(WINDOW);
        window.enable();
        window.disable();
        tokio::time::sleep(WINDOW / 2).await;
        assert!(window.enable());

        // first timer fires here and must not end the second period
        tokio::time::sleep(WINDOW * 3 / 4).await;
        assert!(window.is_enabled());

        tokio::time::sleep(WINDOW).await;
        assert!(!window.is_enabled());
    }

    #[tokio::test]
    async fn test_expiry_of_earlier_period_keeps_new_one() {
        let window = PairingWindow::new(Duration::from_secs(60));
        assert!(window.enable());
        window.disable();
        assert!(window.enable());

        window.expire(1);
        assert!(window.is_enabled());
        window.expire(2);
        assert!(!window.is_enabled());
    }
}
