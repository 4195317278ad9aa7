use crate::api::DistanceFunction;
use crate::inits::{kmeanplusplus, markovchain};
use crate::memory::*;
use crate::{CenterBuilder, Result, Seeder, SeedingConfig, SeedingError};
use rand::distributions::WeightedIndex;
use rand::prelude::*;

/// Assumption-free proposal distribution `q` over all samples.
///
/// A 50/50 mixture of the squared distance to the first center and the uniform distribution:
/// `q(x) = d(x, c0) / (2 * sum(d(., c0))) + 1 / (2n)`. It sums to `1` and, thanks to the uniform term,
/// no sample has a proposal probability of `0`. Built once per seeding and only read afterwards.
pub struct Proposal<T: Primitive> {
    probabilities: Vec<T>,
    index: WeightedIndex<T>,
}
impl<T: Primitive> Proposal<T> {
    /// Build the proposal from the squared distances of all samples to the first center.
    ///
    /// Fails with [`SeedingError::Degenerate`] when all distances are `0`, since there is then no second
    /// center to be found, and with [`SeedingError::NonFiniteDistance`] when they do not sum up to a finite value.
    pub fn from_distances(distances: &[T]) -> Result<Self> {
        if distances.is_empty() {
            return Err(SeedingError::EmptyDataset);
        }
        let distsum: T = distances.iter().cloned().sum();
        if !distsum.is_finite() {
            return Err(SeedingError::NonFiniteDistance { slot: 1 });
        }
        if distsum == T::zero() {
            return Err(SeedingError::Degenerate { slot: 1 });
        }
        let two = T::one() + T::one();
        let uniform = T::one() / (two * T::from(distances.len()).unwrap());
        let probabilities: Vec<T> = distances.iter()
            .map(|&d| d / (two * distsum) + uniform)
            .collect();
        let index = WeightedIndex::new(&probabilities)?;
        Ok(Self { probabilities, index })
    }

    pub fn probabilities(&self) -> &[T] { &self.probabilities }
    pub fn len(&self) -> usize { self.probabilities.len() }
    pub fn is_empty(&self) -> bool { self.probabilities.is_empty() }

    /// Draw a sample index from `q`, together with its probability.
    pub(crate) fn sample<R: Rng + ?Sized>(&self, rnd: &mut R) -> (usize, T) {
        let idx = self.index.sample(rnd);
        (idx, self.probabilities[idx])
    }
}


/// Where the Markov chains get sample-to-center distances from.
pub(crate) trait DistanceLookup<T: Primitive, D: DistanceFunction<T>> {
    /// Called once, with the squared distances of all samples to the first center.
    fn first_center(&mut self, _distances: &[T]) {}
    /// Squared distance of the sample to its closest chosen center.
    fn min_distance(&mut self, seeder: &Seeder<T, D>, sample_idx: usize, centers: &CenterBuilder<T>) -> T;
}

/// Computes every distance on request.
pub(crate) struct Recompute;
impl<T: Primitive, D: DistanceFunction<T>> DistanceLookup<T, D> for Recompute {
    #[inline(always)]
    fn min_distance(&mut self, seeder: &Seeder<T, D>, sample_idx: usize, centers: &CenterBuilder<T>) -> T {
        seeder.min_distance(sample_idx, centers)
    }
}

#[inline(always)]
pub fn calculate<T, D>(seeder: &Seeder<T, D>, centers: &mut CenterBuilder<T>, config: &SeedingConfig<'_, T>) -> Result<()>
where
    T: Primitive,
    D: DistanceFunction<T>,
{
    let chain_length = config.chain_length()?;
    log::debug!("afkmc2 seeding: {} samples, {} dims, k={}, m={}",
        seeder.sample_cnt, seeder.sample_dims, centers.k(), chain_length);
    calculate_with(seeder, centers, config, chain_length, &mut Recompute)
}

pub(crate) fn calculate_with<T, D, L>(
    seeder: &Seeder<T, D>, centers: &mut CenterBuilder<T>, config: &SeedingConfig<'_, T>, chain_length: usize, lookup: &mut L,
) -> Result<()>
where
    T: Primitive,
    D: DistanceFunction<T>,
    L: DistanceLookup<T, D>,
{
    let mut rnd = config.rnd.borrow_mut();

    let first_idx = rnd.gen_range(0..seeder.sample_cnt);
    centers.push(first_idx, seeder.sample(first_idx));
    config.report(0, first_idx, T::zero());
    if centers.k() == 1 {
        return Ok(());
    }

    let first_distances = seeder.distances_to(centers.center(0));
    let proposal = Proposal::from_distances(&first_distances)?;
    lookup.first_center(&first_distances);
    log::trace!("proposal distribution built from center 0 (sample {})", first_idx);

    for slot in 1..centers.k() {
        let chosen = &*centers;
        let state = markovchain::run(
            chain_length,
            &mut *rnd,
            |rnd| proposal.sample(rnd),
            |idx| lookup.min_distance(seeder, idx, chosen),
        );
        if !state.distance.is_finite() {
            return Err(SeedingError::NonFiniteDistance { slot });
        }
        let (sampled_idx, distance) = if state.distance > T::zero() {
            (state.index, state.distance)
        } else {
            // The chain never left the chosen centers
            log::debug!("chain for center {} ended on a chosen center, drawing it exactly", slot);
            kmeanplusplus::draw_exact(seeder, centers, &mut *rnd, slot)?
        };
        centers.push(sampled_idx, seeder.sample(sampled_idx));
        config.report(slot, sampled_idx, distance);
    }
    Ok(())
}
