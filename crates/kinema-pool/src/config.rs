//! Pool configuration parameters.

use std::error::Error;
use std::fmt;

/// Configuration for a slot pool and its index allocator.
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Slots reserved (all free) when the pool is created.
    ///
    /// Default: 0. Payload columns are sized to this up front.
    pub initial_capacity: u32,

    /// Minimum number of slots added when the pool has to grow.
    ///
    /// Default: 1, so capacity grows by exactly the requested dimension.
    /// Larger values amortize payload column reallocation; the surplus
    /// becomes a free range at the tail.
    pub growth_step: u32,

    /// Ceiling on the logical slot count.
    ///
    /// Default: `u32::MAX - 1`. Must stay below `u32::MAX`, which is
    /// reserved for [`SlotIndex::INVALID`](kinema_core::SlotIndex::INVALID).
    ///
    /// Growth always places the new range at the old tail, so a free range
    /// touching the tail is not extended. Near the ceiling an allocation can
    /// fail with `CapacityExceeded` even though merging that tail range
    /// would have fit; defragmenting first reclaims it.
    pub max_capacity: u32,
}

impl PoolConfig {
    /// Default initial capacity.
    pub const DEFAULT_INITIAL_CAPACITY: u32 = 0;

    /// Default growth step.
    pub const DEFAULT_GROWTH_STEP: u32 = 1;

    /// Default slot ceiling.
    pub const DEFAULT_MAX_CAPACITY: u32 = u32::MAX - 1;

    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            growth_step: Self::DEFAULT_GROWTH_STEP,
            max_capacity: Self::DEFAULT_MAX_CAPACITY,
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.growth_step == 0 {
            return Err(ConfigError::ZeroGrowthStep);
        }
        if self.max_capacity == u32::MAX {
            return Err(ConfigError::MaxCapacityReserved);
        }
        if self.initial_capacity > self.max_capacity {
            return Err(ConfigError::InitialExceedsMax {
                initial: self.initial_capacity,
                max: self.max_capacity,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors detected by [`PoolConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `growth_step` is zero, so the pool could never grow.
    ZeroGrowthStep,
    /// `max_capacity` equals the reserved invalid-index value.
    MaxCapacityReserved,
    /// `initial_capacity` is above `max_capacity`.
    InitialExceedsMax {
        /// Configured initial capacity.
        initial: u32,
        /// Configured ceiling.
        max: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroGrowthStep => write!(f, "growth_step must be at least 1"),
            Self::MaxCapacityReserved => {
                write!(f, "max_capacity must be below u32::MAX (reserved sentinel)")
            }
            Self::InitialExceedsMax { initial, max } => {
                write!(f, "initial_capacity {initial} exceeds max_capacity {max}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(PoolConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_growth_step_rejected() {
        let config = PoolConfig {
            growth_step: 0,
            ..PoolConfig::new()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroGrowthStep));
    }

    #[test]
    fn sentinel_max_rejected() {
        let config = PoolConfig {
            max_capacity: u32::MAX,
            ..PoolConfig::new()
        };
        assert_eq!(config.validate(), Err(ConfigError::MaxCapacityReserved));
    }

    #[test]
    fn initial_above_max_rejected() {
        let config = PoolConfig {
            initial_capacity: 10,
            max_capacity: 4,
            ..PoolConfig::new()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InitialExceedsMax { initial: 10, max: 4 })
        ));
    }
}
