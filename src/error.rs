use rand::distributions::WeightedError;
use thiserror::Error;

/// Errors reported by [`crate::Seeder`].
///
/// Configuration errors are detected before any random number is drawn. A failed seeding never
/// returns a partial set of centers.
#[derive(Debug, Error)]
pub enum SeedingError {
    #[error("invalid configuration: the dataset contains no samples")]
    EmptyDataset,
    #[error("invalid configuration: {len} values can not be split into {sample_cnt} samples of {sample_dims} dimensions")]
    InvalidDimensions { len: usize, sample_cnt: usize, sample_dims: usize },
    #[error("invalid configuration: k must be in 1..={sample_cnt}, got {k}")]
    InvalidCenterCount { k: usize, sample_cnt: usize },
    #[error("invalid configuration: chain length must be at least 1, got {0}")]
    InvalidChainLength(usize),
    /// Every sample coincides with one of the centers chosen so far, so the squared distances sum up to `0`
    /// and there is no distribution left to sample center `slot` from. The dataset holds fewer than k distinct samples.
    #[error("degenerate input: no sample apart from the chosen centers was found for center {slot}")]
    Degenerate { slot: usize },
    /// A squared distance came out as NaN or infinite while choosing center `slot`. Either the samples contain
    /// non-finite values, or their distances overflow the primitive type.
    #[error("non-finite squared distance while choosing center {slot}")]
    NonFiniteDistance { slot: usize },
    #[error("invalid sampling weights: {0}")]
    Sampling(#[from] WeightedError),
}

impl SeedingError {
    /// Whether the error was caused by the passed parameters, rather than by the data itself.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SeedingError::EmptyDataset
                | SeedingError::InvalidDimensions { .. }
                | SeedingError::InvalidCenterCount { .. }
                | SeedingError::InvalidChainLength(_)
        )
    }
}

/// Convenient alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, SeedingError>;
