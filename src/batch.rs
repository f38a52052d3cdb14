use crate::config::ConfigError;
use serde::Deserialize;
use std::{fmt, num::NonZeroUsize, slice::Chunks};

/// Maximum number of records one submission call may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "usize")]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(size)
            .map(Self)
            .ok_or(ConfigError::BatchSize(size))
    }

    /// For compile-time constants; a zero here fails const evaluation.
    pub const fn fixed(size: usize) -> Self {
        match NonZeroUsize::new(size) {
            Some(size) => Self(size),
            None => panic!("batch size must be positive"),
        }
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<usize> for BatchSize {
    type Error = ConfigError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Splits `items` into chunks of `size`; only the last chunk may be shorter.
///
/// The returned iterator is lazy and can be cloned to walk the batches again.
pub fn partition<T>(items: &[T], size: usize) -> Result<Chunks<'_, T>, ConfigError> {
    let size = BatchSize::new(size)?;
    Ok(items.chunks(size.get()))
}
