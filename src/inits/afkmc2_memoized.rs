use crate::api::DistanceFunction;
use crate::inits::afkmc2::{self, DistanceLookup};
use crate::memory::*;
use crate::{CenterBuilder, Result, Seeder, SeedingConfig};

impl<T: Primitive, D: DistanceFunction<T>> DistanceLookup<T, D> for DistanceMemo<T> {
    fn first_center(&mut self, distances: &[T]) {
        distances.iter().enumerate().for_each(|(sample_idx, &d)| self.prefill(sample_idx, 0, d));
    }

    fn min_distance(&mut self, seeder: &Seeder<T, D>, sample_idx: usize, centers: &CenterBuilder<T>) -> T {
        (0..centers.len())
            .map(|center_idx| self.get_or_compute(sample_idx, center_idx,
                || seeder.distance_to(sample_idx, centers.center(center_idx))))
            .fold(T::infinity(), crate::api::nan_min)
    }
}

#[inline(always)]
pub fn calculate<T, D>(seeder: &Seeder<T, D>, centers: &mut CenterBuilder<T>, config: &SeedingConfig<'_, T>) -> Result<()>
where
    T: Primitive,
    D: DistanceFunction<T>,
{
    let chain_length = config.chain_length()?;
    log::debug!("afkmc2 (memoized) seeding: {} samples, {} dims, k={}, m={}",
        seeder.sample_cnt, seeder.sample_dims, centers.k(), chain_length);
    let mut memo = DistanceMemo::new(seeder.sample_cnt, centers.k());
    afkmc2::calculate_with(seeder, centers, config, chain_length, &mut memo)?;
    log::debug!("distance memo: {} hits, {} misses", memo.hits(), memo.misses());
    Ok(())
}
