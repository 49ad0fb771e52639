//! Engine configuration.

use kinema_pool::{ConfigError, PoolConfig};

/// When processors compact their pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DefragmentPolicy {
    /// Defragment every processor at the start of each frame.
    #[default]
    EveryFrame,
    /// Only defragment on [`MotiveEngine::defragment_all`](crate::MotiveEngine::defragment_all).
    Manual,
}

/// Configuration for a [`MotiveEngine`](crate::MotiveEngine).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Pool configuration handed to every processor factory.
    pub pool: PoolConfig,
    /// When pools are compacted. Default: [`DefragmentPolicy::EveryFrame`].
    pub defragment_policy: DefragmentPolicy,
    /// Run the full consistency check on every pool after each frame.
    ///
    /// Default: `false`. Intended for debugging corrupted state; the check
    /// walks every slot.
    pub verify_each_frame: bool,
}

impl EngineConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()
    }
}
