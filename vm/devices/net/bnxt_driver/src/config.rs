// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Driver configuration.

use crate::error::Error;
use bnxt_defs::MAX_MTU;
use bnxt_defs::MIN_MTU;
use bnxt_defs::hwrm::HWRM_DEFAULT_TIMEOUT_MS;
use std::time::Duration;

/// Largest descriptor count a ring may be configured with; ring indexes in
/// doorbells are 24 bits wide and completion rings are twice as large.
const MAX_DESCRIPTORS: u32 = 1 << 22;

/// Tunables for a [`BnxtDevice`](crate::BnxtDevice).
#[derive(Debug, Clone)]
pub struct BnxtConfig {
    /// How long to wait for a firmware response. Replaced by the firmware's
    /// advertised default when it reports one.
    pub hwrm_timeout: Duration,
    /// Descriptors per transmit ring. Must be a power of two.
    pub tx_descriptors: u32,
    /// Descriptors per receive and aggregation ring. Must be a power of two.
    pub rx_descriptors: u32,
    /// Initial MTU.
    pub mtu: u32,
    /// How often the device writes hardware statistics to host memory.
    pub stats_update_period_ms: u32,
}

impl Default for BnxtConfig {
    fn default() -> Self {
        Self {
            hwrm_timeout: Duration::from_millis(HWRM_DEFAULT_TIMEOUT_MS),
            tx_descriptors: 256,
            rx_descriptors: 256,
            mtu: 1500,
            stats_update_period_ms: 1000,
        }
    }
}

impl BnxtConfig {
    /// Checks that the configuration can be applied to a device.
    pub fn validate(&self) -> Result<(), Error> {
        for n in [self.tx_descriptors, self.rx_descriptors] {
            if !n.is_power_of_two() {
                return Err(Error::InvalidConfig(
                    "descriptor count must be a power of two",
                ));
            }
            if n > MAX_DESCRIPTORS {
                return Err(Error::InvalidConfig("descriptor count too large"));
            }
        }
        if !(MIN_MTU..=MAX_MTU).contains(&self.mtu) {
            return Err(Error::InvalidMtu(self.mtu));
        }
        if self.hwrm_timeout.is_zero() {
            return Err(Error::InvalidConfig("hwrm timeout must be nonzero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        BnxtConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        let bad_ring = BnxtConfig {
            rx_descriptors: 300,
            ..Default::default()
        };
        assert!(matches!(bad_ring.validate(), Err(Error::InvalidConfig(_))));

        let bad_mtu = BnxtConfig {
            mtu: 59,
            ..Default::default()
        };
        assert!(matches!(bad_mtu.validate(), Err(Error::InvalidMtu(59))));

        let zero_timeout = BnxtConfig {
            hwrm_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
    }
}
