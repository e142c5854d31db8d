use std::time::Duration;
use tokio::time::Instant;

/// A single one-shot deadline, armed/rearmed/cancelled idempotently (§4.A).
///
/// Unlike the teacher's transactions, which share a `JoinHandle` per timer
/// and race a `Drop` against the sleeping task, every `Timer` here is only
/// ever touched from inside the single task that owns its transaction (§5's
/// serialization domain realized as one actor per transaction), so a plain
/// `Option<Instant>` polled inside that task's own `select!` loop is race
/// free: there is no second task that could observe a half-cancelled timer.
#[derive(Debug, Default)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Timer { deadline: None }
    }

    /// Arm (or rearm) the timer to fire `interval` from now.
    pub fn arm(&mut self, interval: Duration) {
        self.deadline = Some(Instant::now() + interval);
    }

    /// Alias for [`Timer::arm`]; rearming a live timer simply replaces its
    /// deadline, matching §4.A's "rearm(interval)" operation.
    pub fn rearm(&mut self, interval: Duration) {
        self.arm(interval);
    }

    /// Cancel the timer. If it already fired but `fires()` hasn't been
    /// polled since, the pending wakeup is simply never produced again.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolve when the deadline passes; never resolves while unarmed. Safe
    /// to use as one branch of a `select!` alongside other timers and the
    /// transaction's mailbox receive, even when unarmed (pending forever is
    /// the correct behavior, not a bug: `select!` just never picks this arm).
    ///
    /// Must not consume the deadline just because it was polled: `select!`
    /// polls every branch each loop iteration, including the ones that lose
    /// the race, so this only clears `deadline` once the sleep actually
    /// resolves. Clearing it on poll would disarm every losing timer after
    /// the first iteration and it would never fire again without an explicit
    /// `arm`/`rearm`.
    pub async fn fires(&mut self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
        self.deadline = None;
    }
}
