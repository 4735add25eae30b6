// Single-slot rate limiter for single-case runs
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CooldownGate {
    window: Duration,
    last_run_at: Option<Instant>,
}

impl CooldownGate {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(7);

    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_run_at: None,
        }
    }

    /// Claim the slot. Returns false while the previous run's window is still open.
    pub fn try_acquire(&mut self) -> bool {
        if self.remaining().is_some() {
            return false;
        }
        self.last_run_at = Some(Instant::now());
        true
    }

    /// Time left before the next run is allowed
    pub fn remaining(&self) -> Option<Duration> {
        let last = self.last_run_at?;
        let elapsed = last.elapsed();
        (elapsed < self.window).then(|| self.window - elapsed)
    }

    pub fn is_idle(&self) -> bool {
        self.remaining().is_none()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_second_acquire_within_window_rejected() {
        let mut gate = CooldownGate::default();

        assert!(gate.is_idle());
        assert!(gate.try_acquire());
        assert!(!gate.is_idle());

        advance(Duration::from_secs(3)).await;
        assert!(!gate.try_acquire());
        assert_eq!(gate.remaining(), Some(Duration::from_secs(4)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_resets_after_window() {
        let mut gate = CooldownGate::default();
        assert!(gate.try_acquire());

        advance(Duration::from_secs(7)).await;
        assert!(gate.is_idle());
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_attempt_does_not_extend_window() {
        let mut gate = CooldownGate::new(Duration::from_secs(2));
        assert!(gate.try_acquire());

        advance(Duration::from_secs(1)).await;
        assert!(!gate.try_acquire());

        advance(Duration::from_secs(1)).await;
        assert!(gate.try_acquire());
    }
}
