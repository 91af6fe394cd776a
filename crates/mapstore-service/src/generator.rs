//! Sources of fresh identifiers and token values.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use rand::RngCore;
use std::fmt;

use mapstore_core::{CoreError, CoreResult, PlatformId};

/// Produces identifiers for records created without one.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Returns a valid (non-zero) identifier.
    fn id(&self) -> PlatformId;
}

/// Random 64-bit identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn id(&self) -> PlatformId {
        PlatformId::new()
    }
}

/// Produces secret token values.
pub trait TokenGenerator: Send + Sync + fmt::Debug {
    fn token(&self) -> CoreResult<String>;
}

/// URL-safe base64 encoding of `size` random bytes.
#[derive(Debug, Clone, Copy)]
pub struct RandomTokenGenerator {
    size: usize,
}

impl RandomTokenGenerator {
    /// Default number of random bytes per token.
    pub const DEFAULT_SIZE: usize = 64;

    #[must_use]
    pub const fn new(size: usize) -> Self {
        Self { size }
    }

    /// Length of every token this generator returns.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        self.size.div_ceil(3) * 4
    }
}

impl Default for RandomTokenGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}

impl TokenGenerator for RandomTokenGenerator {
    fn token(&self) -> CoreResult<String> {
        if self.size == 0 {
            return Err(CoreError::internal("token size must be positive"));
        }
        let mut bytes = vec![0u8; self.size];
        rand::thread_rng()
            .try_fill_bytes(&mut bytes)
            .map_err(|err| CoreError::internal_with("unable to generate token", err))?;
        Ok(URL_SAFE.encode(bytes))
    }
}
