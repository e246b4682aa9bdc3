//! Scriptable companion controller

use sbflash_core::bus::Companion;
use sbflash_core::error::{Error, Result};

/// Companion that counts handshakes and can refuse to acknowledge them
#[derive(Debug, Default, Clone)]
pub struct SimulatedCompanion {
    /// Acknowledged sleep requests
    pub sleeps: u32,
    /// Acknowledged wakeup requests
    pub wakeups: u32,
    /// Refuse the next sleep requests
    pub fail_sleep: bool,
    /// Refuse the next wakeup requests
    pub fail_wakeup: bool,
    asleep: bool,
}

impl SimulatedCompanion {
    /// Create a companion that acknowledges everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the companion currently stays off the bus
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }
}

impl Companion for SimulatedCompanion {
    fn sleep(&mut self) -> Result<()> {
        if self.fail_sleep {
            return Err(Error::Timeout);
        }
        self.sleeps += 1;
        self.asleep = true;
        Ok(())
    }

    fn wakeup(&mut self) -> Result<()> {
        if self.fail_wakeup {
            return Err(Error::Timeout);
        }
        self.wakeups += 1;
        self.asleep = false;
        Ok(())
    }
}
