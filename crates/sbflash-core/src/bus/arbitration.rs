//! Bus ownership arbitration with a companion controller
//!
//! On some boards an embedded controller fetches its own firmware from the
//! same flash part. Before the host programs or erases, the companion must be
//! asked to stay off the bus, and told afterwards that the bus is free again.

use crate::error::{Error, Result};
use crate::programmer::BusIntent;

/// Handshake with a companion controller that shares the flash bus
pub trait Companion {
    /// Ask the companion to release the bus and wait for its acknowledgment
    fn sleep(&mut self) -> Result<()>;

    /// Tell the companion the bus is free and wait for its acknowledgment
    fn wakeup(&mut self) -> Result<()>;
}

/// Companion for platforms where the host is the only bus master
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCompanion;

impl Companion for NoCompanion {
    fn sleep(&mut self) -> Result<()> {
        Ok(())
    }

    fn wakeup(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Reentrant claim counter for write access
///
/// Nested write claims only signal the companion on the outermost
/// transition. Read intents never touch the counter.
#[derive(Debug)]
pub struct Arbitration<C> {
    companion: C,
    claimed: u32,
}

impl<C: Companion> Arbitration<C> {
    /// Create an arbitration object with nothing claimed
    pub fn new(companion: C) -> Self {
        Self {
            companion,
            claimed: 0,
        }
    }

    /// Current nesting depth of write claims
    pub fn depth(&self) -> u32 {
        self.claimed
    }

    /// Access the companion
    pub fn companion(&self) -> &C {
        &self.companion
    }

    /// Mutable access to the companion
    pub fn companion_mut(&mut self) -> &mut C {
        &mut self.companion
    }

    /// Claim the bus for `intent`
    pub fn claim(&mut self, intent: BusIntent) -> Result<()> {
        if intent == BusIntent::Read {
            return Ok(());
        }

        self.claimed += 1;
        if self.claimed == 1 {
            if let Err(e) = self.companion.sleep() {
                log::error!("Companion controller did not release the SPI bus: {}", e);
                self.claimed = 0;
                return Err(Error::BusClaimFailed);
            }
            log::trace!("SPI bus claimed from companion controller");
        }
        Ok(())
    }

    /// Release a claim taken with the same `intent`
    pub fn release(&mut self, intent: BusIntent) -> Result<()> {
        if intent == BusIntent::Read {
            return Ok(());
        }

        if self.claimed == 0 {
            log::warn!("SPI bus released without a matching claim");
        }

        self.claimed = self.claimed.saturating_sub(1);
        if self.claimed == 0 {
            if let Err(e) = self.companion.wakeup() {
                log::warn!("Companion controller did not acknowledge bus release: {}", e);
                return Err(Error::BusClaimFailed);
            }
            log::trace!("SPI bus handed back to companion controller");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        sleeps: u32,
        wakeups: u32,
        refuse_sleep: bool,
    }

    impl Companion for Recorder {
        fn sleep(&mut self) -> Result<()> {
            if self.refuse_sleep {
                return Err(Error::Timeout);
            }
            self.sleeps += 1;
            Ok(())
        }

        fn wakeup(&mut self) -> Result<()> {
            self.wakeups += 1;
            Ok(())
        }
    }

    #[test]
    fn test_read_intent_is_not_arbitrated() {
        let mut arb = Arbitration::new(Recorder::default());
        arb.claim(BusIntent::Read).unwrap();
        arb.release(BusIntent::Read).unwrap();
        assert_eq!(arb.depth(), 0);
        assert_eq!(arb.companion().sleeps, 0);
        assert_eq!(arb.companion().wakeups, 0);
    }

    #[test]
    fn test_nested_claims_signal_once() {
        let mut arb = Arbitration::new(Recorder::default());
        arb.claim(BusIntent::Write).unwrap();
        arb.claim(BusIntent::Write).unwrap();
        assert_eq!(arb.depth(), 2);
        assert_eq!(arb.companion().sleeps, 1);

        arb.release(BusIntent::Write).unwrap();
        assert_eq!(arb.companion().wakeups, 0);
        arb.release(BusIntent::Write).unwrap();
        assert_eq!(arb.depth(), 0);
        assert_eq!(arb.companion().wakeups, 1);
    }

    #[test]
    fn test_unbalanced_release_clamps_and_wakes() {
        let mut arb = Arbitration::new(Recorder::default());
        arb.release(BusIntent::Write).unwrap();
        assert_eq!(arb.depth(), 0);
        // Clamped at zero, and the companion is still told the bus is free
        assert_eq!(arb.companion().wakeups, 1);
        arb.claim(BusIntent::Write).unwrap();
        assert_eq!(arb.depth(), 1);
        assert_eq!(arb.companion().sleeps, 1);
    }

    #[test]
    fn test_refused_claim_leaves_counter_clear() {
        let mut arb = Arbitration::new(Recorder {
            refuse_sleep: true,
            ..Default::default()
        });
        assert_eq!(arb.claim(BusIntent::Write), Err(Error::BusClaimFailed));
        assert_eq!(arb.depth(), 0);
    }
}
