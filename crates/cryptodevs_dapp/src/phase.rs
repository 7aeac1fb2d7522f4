use std::sync::atomic::{AtomicU64, Ordering};

use cryptodevs_chain::U256;
use serde::{Deserialize, Serialize};

/// Where the minting campaign stands. Derived from on-chain reads, never
/// stored on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignPhase {
    NotStarted,
    PresaleActive,
    PresaleEnded,
}

impl CampaignPhase {
    /// `presale_end` is the unix timestamp returned by `presaleEnded()`.
    /// The presale is over from that second on.
    pub fn derive(presale_started: bool, presale_end: U256, now: u64) -> Self {
        if !presale_started {
            Self::NotStarted
        } else if U256::from(now) < presale_end {
            Self::PresaleActive
        } else {
            Self::PresaleEnded
        }
    }

    pub fn has_started(&self) -> bool {
        !matches!(self, Self::NotStarted)
    }
}

/// Wall clock in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn phase_truth_table() {
        let cases = [
            (false, 0, CampaignPhase::NotStarted),
            (false, NOW + 3600, CampaignPhase::NotStarted),
            (false, NOW - 1, CampaignPhase::NotStarted),
            (true, NOW + 3600, CampaignPhase::PresaleActive),
            (true, NOW + 1, CampaignPhase::PresaleActive),
            (true, NOW, CampaignPhase::PresaleEnded),
            (true, NOW - 1, CampaignPhase::PresaleEnded),
            (true, 0, CampaignPhase::PresaleEnded),
        ];
        for (started, end, expected) in cases {
            assert_eq!(
                CampaignPhase::derive(started, U256::from(end), NOW),
                expected,
                "started={started} end={end}"
            );
        }
    }

    #[test]
    fn end_beyond_u64_is_still_active() {
        let far = U256::from(u64::MAX) + U256::from(1u64);
        assert_eq!(
            CampaignPhase::derive(true, far, NOW),
            CampaignPhase::PresaleActive
        );
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(NOW);
        assert_eq!(clock.now(), NOW);
        clock.advance(5);
        assert_eq!(clock.now(), NOW + 5);
        clock.set(1);
        assert_eq!(clock.now(), 1);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
