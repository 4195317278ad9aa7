use crate::api::DistanceFunction;
use crate::inits::{kmeanplusplus, markovchain};
use crate::memory::*;
use crate::{CenterBuilder, Result, Seeder, SeedingConfig, SeedingError};
use rand::prelude::*;

#[inline(always)]
pub fn calculate<T, D>(seeder: &Seeder<T, D>, centers: &mut CenterBuilder<T>, config: &SeedingConfig<'_, T>) -> Result<()>
where
    T: Primitive,
    D: DistanceFunction<T>,
{
    let chain_length = config.chain_length()?;
    log::debug!("kmc2 seeding: {} samples, {} dims, k={}, m={}",
        seeder.sample_cnt, seeder.sample_dims, centers.k(), chain_length);
    let mut rnd = config.rnd.borrow_mut();

    let first_idx = rnd.gen_range(0..seeder.sample_cnt);
    centers.push(first_idx, seeder.sample(first_idx));
    config.report(0, first_idx, T::zero());

    for slot in 1..centers.k() {
        // Uniform proposals have the same density everywhere, so it cancels out of the acceptance ratio
        let chosen = &*centers;
        let state = markovchain::run(
            chain_length,
            &mut *rnd,
            |rnd| (rnd.gen_range(0..seeder.sample_cnt), T::one()),
            |idx| seeder.min_distance(idx, chosen),
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
