//! Per-connection configuration for the unreliable-channel shim.

use crate::error::{RdtError, Result};

/// Default Go-Back-N window size when none is given.
pub const DEFAULT_WINDOW: usize = 1;

/// Loss/corruption rates and (RDT-4 only) window size for one `RdtSocket`.
///
/// Unlike the reference implementation's module-scope globals, this is a
/// value owned by the connection it configures, so two sockets in the same
/// process can carry independent error rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkConfig {
    pub loss_rate: f64,
    pub err_rate: f64,
    pub window: usize,
}

impl NetworkConfig {
    /// Builds a validated configuration. `window` is only meaningful for
    /// RDT-4; RDT-3 ignores it.
    pub fn new(loss_rate: f64, err_rate: f64, window: usize) -> Result<Self> {
        if !(0.0..=1.0).contains(&loss_rate) {
            return Err(RdtError::InvalidConfig("loss_rate must be within [0.0, 1.0]"));
        }
        if !(0.0..=1.0).contains(&err_rate) {
            return Err(RdtError::InvalidConfig("err_rate must be within [0.0, 1.0]"));
        }
        if window == 0 {
            return Err(RdtError::InvalidConfig("window must be at least 1"));
        }
        Ok(Self { loss_rate, err_rate, window })
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { loss_rate: 0.0, err_rate: 0.0, window: DEFAULT_WINDOW }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_rates() {
        assert!(NetworkConfig::new(-0.1, 0.0, 1).is_err());
        assert!(NetworkConfig::new(0.0, 1.1, 1).is_err());
    }

    #[test]
    fn rejects_zero_window() {
        assert!(NetworkConfig::new(0.0, 0.0, 0).is_err());
    }

    #[test]
    fn default_is_zero_loss_and_window_one() {
        let cfg = NetworkConfig::default();
        assert_eq!(cfg.loss_rate, 0.0);
        assert_eq!(cfg.err_rate, 0.0);
        assert_eq!(cfg.window, 1);
    }
}
