//! # kmc2 - API documentation
//!
//! kmc2 is a small rust library for the calculation of k-means seedings: sets of k samples that are
//! used as initial cluster centers by a subsequent k-means run (e.g. Lloyd's algorithm).
//!
//! ## Design target
//! k-means++ seeding provably leads to good clusterings, but needs k full passes over the data, which
//! gets expensive for large datasets and large k. This crate implements k-means++ next to its Markov chain
//! Monte Carlo approximations (KMC2 and assumption-free KMC2, as described by Bachem, Lucic, Hassani and
//! Krause in "Fast and Provably Good Seedings for k-Means", NIPS 2016), which only need a single pass
//! over the data plus `m * k²` distance calculations.
//! As with most numerics crates, samples are given using a raw row-major vector, instead of any high-level
//! matrix crate such as nalgebra or ndarray.
//!
//! ## Supported seeding methods
//! - k-means++ [`Seeder::init_kmeanplusplus`] - O(nkd)
//! - KMC2 [`Seeder::init_kmc2`] - O(mk²d), assumes a well-behaved data distribution
//! - Assumption-free KMC2 [`Seeder::init_afkmc2`] - O(nd + mk²d), **recommended**
//! - Assumption-free KMC2 with distance memoization [`Seeder::init_afkmc2_memoized`] - same centers as
//!   [`Seeder::init_afkmc2`], faster when n is not much larger than m·k, at the cost of O(nk) memory
//!
//! ## Supported primitive types
//! - [`f32`]
//! - [`f64`]
//!
//! ## Example
//! ```rust
//! use kmc2::*;
//! use rand::prelude::*;
//!
//! let (sample_cnt, sample_dims, k) = (20000, 16, 8);
//!
//! // Generate some random data
//! let mut samples = vec![0.0f64;sample_cnt * sample_dims];
//! samples.iter_mut().for_each(|v| *v = rand::random());
//!
//! let conf = SeedingConfig::build()
//!     .random_generator(StdRng::seed_from_u64(1337))
//!     .chain_length(200)
//!     .center_selected(&|slot, idx, dist| println!("Center {} <- sample {} (distance {:.3})", slot, idx, dist))
//!     .build();
//!
//! // Calculate seeds, using assumption-free KMC2
//! let seeder = Seeder::new(&samples, sample_cnt, sample_dims, EuclideanDistance).unwrap();
//! let centers = seeder.seed(k, Seeder::init_afkmc2, &conf).unwrap();
//!
//! println!("Centers: {:?}", centers.as_slice());
//! println!("Quantization error: {}", seeder.quantization_error(&centers));
//! ```
//!
//! ## Short API-Overview / Description
//! Entry-point of the library is the [`Seeder`] struct. This struct is generic over the underlying primitive
//! type, that should be used for the calculations, and over the [`DistanceFunction`]. To use it, an instance is
//! created from the sample data, of which it keeps its own copy.
//!
//! [`Seeder::seed`] does not mutate the seeder, so multiple seedings can be run in parallel, as long as each of
//! them gets its own [`SeedingConfig`] (and with that, its own random number generator). The seeding method is
//! passed to [`Seeder::seed`] by reference. Every seeding either returns exactly k [`Centers`], or a
//! [`SeedingError`].

#[macro_use] mod helpers;
mod memory;
mod error;
mod api;
mod inits;
mod distances;

pub use api::{Centers, CenterBuilder, DistanceFunction, Seeder, SeedingConfig, SeedingConfigBuilder, DEFAULT_CHAIN_LENGTH};
pub use distances::EuclideanDistance;
pub use error::{Result, SeedingError};
pub use inits::afkmc2::Proposal;
pub use memory::Primitive;
