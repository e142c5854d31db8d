use std::time::Duration;

/// RFC 3261 §17 timing constants, overridable per [`crate::manager::TransactionManager`]
/// instance.
///
/// The teacher keeps these as module-level `const`s in `transaction::consts`;
/// this crate generalizes them into a struct so a test (or an embedder with
/// unusual RTT characteristics) can shrink the schedule without touching any
/// state machine code.
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    /// Estimated round-trip time. RFC default 500ms.
    pub t1: Duration,
    /// Maximum retransmit interval for non-INVITE requests and INVITE
    /// responses. RFC default 4s.
    pub t2: Duration,
    /// Maximum duration a message can remain in the network. RFC default 5s.
    pub t4: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            t1: Duration::from_millis(500),
            t2: Duration::from_millis(4000),
            t4: Duration::from_millis(5000),
        }
    }
}

impl TimerConfig {
    /// Initial Timer A interval (client INVITE request retransmit), §4.E.3.
    pub fn timer_a0(&self) -> Duration {
        self.t1
    }

    /// Timer B deadline (client INVITE give-up), §3: 64·T1.
    pub fn timer_b(&self) -> Duration {
        self.t1 * 64
    }

    /// Timer D deadline (client INVITE Completed linger), §3: >= 32s
    /// unreliable, 0 reliable. We use `max(64·T1, 32s)` for the unreliable
    /// floor so a caller that raises T1 doesn't undercut the RFC floor.
    pub fn timer_d(&self, reliable: bool) -> Duration {
        if reliable {
            Duration::ZERO
        } else {
            (self.t1 * 64).max(Duration::from_millis(32_000))
        }
    }

    /// Initial Timer E interval (client non-INVITE request retransmit), §4.E.4.
    pub fn timer_e0(&self) -> Duration {
        self.t1
    }

    /// Timer F deadline (client non-INVITE give-up), §3: 64·T1.
    pub fn timer_f(&self) -> Duration {
        self.t1 * 64
    }

    /// Initial Timer G interval (server INVITE response retransmit), §4.E.1.
    pub fn timer_g0(&self) -> Duration {
        self.t1
    }

    /// Timer H deadline (server INVITE give-up waiting for ACK), §3: 64·T1.
    pub fn timer_h(&self) -> Duration {
        self.t1 * 64
    }

    /// Timer I deadline (server INVITE Confirmed linger), §3: T4 unreliable,
    /// 0 reliable.
    pub fn timer_i(&self, reliable: bool) -> Duration {
        if reliable {
            Duration::ZERO
        } else {
            self.t4
        }
    }

    /// Timer J deadline (server non-INVITE Completed linger), §3: 64·T1
    /// unreliable, 0 reliable.
    pub fn timer_j(&self, reliable: bool) -> Duration {
        if reliable {
            Duration::ZERO
        } else {
            self.t1 * 64
        }
    }

    /// Timer K deadline (client non-INVITE Completed linger), §3: T4
    /// unreliable, 0 reliable.
    pub fn timer_k(&self, reliable: bool) -> Duration {
        if reliable {
            Duration::ZERO
        } else {
            self.t4
        }
    }

    /// Next retransmit interval given the previous one, capped at T2 (used by
    /// Timer G and Timer E rearm, §4.E.1/§4.E.4).
    pub fn backoff(&self, previous: Duration) -> Duration {
        (previous * 2).min(self.t2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_rfc_3261() {
        let cfg = TimerConfig::default();
        assert_eq!(cfg.t1, Duration::from_millis(500));
        assert_eq!(cfg.t2, Duration::from_millis(4000));
        assert_eq!(cfg.t4, Duration::from_millis(5000));
        assert_eq!(cfg.timer_b(), Duration::from_millis(32_000));
        assert_eq!(cfg.timer_h(), Duration::from_millis(32_000));
        assert_eq!(cfg.timer_f(), Duration::from_millis(32_000));
    }

    #[test]
    fn reliable_transport_collapses_linger_timers_to_zero() {
        let cfg = TimerConfig::default();
        assert_eq!(cfg.timer_d(true), Duration::ZERO);
        assert_eq!(cfg.timer_i(true), Duration::ZERO);
        assert_eq!(cfg.timer_j(true), Duration::ZERO);
        assert_eq!(cfg.timer_k(true), Duration::ZERO);

        assert_eq!(cfg.timer_d(false), Duration::from_millis(32_000));
        assert_eq!(cfg.timer_i(false), cfg.t4);
    }

    #[test]
    fn backoff_doubles_then_caps_at_t2() {
        let cfg = TimerConfig::default();
        let mut interval = cfg.timer_g0();
        let mut seen = vec![interval];
        for _ in 0..6 {
            interval = cfg.backoff(interval);
            seen.push(interval);
        }
        assert_eq!(
            seen,
            vec![500, 1000, 2000, 4000, 4000, 4000, 4000]
                .into_iter()
                .map(Duration::from_millis)
                .collect::<Vec<_>>()
        );
    }
}
