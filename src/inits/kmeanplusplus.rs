use crate::api::{self, DistanceFunction};
use crate::memory::*;
use crate::{CenterBuilder, Result, Seeder, SeedingConfig, SeedingError};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rayon::prelude::*;

/// Draw a sample index with a probability proportional to its squared distance **min_distances** to the
/// closest chosen center.
///
/// Fails with [`SeedingError::NonFiniteDistance`] when the distances do not sum up to a finite value, and with
/// [`SeedingError::Degenerate`] when they sum up to `0`.
pub(crate) fn draw_weighted<T, R>(min_distances: &[T], rnd: &mut R, slot: usize) -> Result<usize>
where
    T: Primitive,
    R: Rng + ?Sized,
{
    let distsum: T = min_distances.iter().cloned().sum();
    if !distsum.is_finite() {
        return Err(SeedingError::NonFiniteDistance { slot });
    }
    if distsum == T::zero() {
        return Err(SeedingError::Degenerate { slot });
    }

    // Use rand's WeightedIndex to randomly draw a center, with probability proportional to its distance.
    // WeightedIndex does an inverse-CDF lookup (binary search over the prefix sums), so on ties the
    // earliest sample wins and samples with a distance of 0 are never drawn.
    let center_index = WeightedIndex::new(min_distances)?;
    Ok(center_index.sample(rnd))
}

/// Draw the next center from the exact k-means++ distribution, recomputing the distance of every sample
/// to the chosen centers. Returns the sample index and its squared distance.
pub(crate) fn draw_exact<T, D, R>(seeder: &Seeder<T, D>, centers: &CenterBuilder<T>, rnd: &mut R, slot: usize) -> Result<(usize, T)>
where
    T: Primitive,
    D: DistanceFunction<T>,
    R: Rng + ?Sized,
{
    let min_distances: Vec<T> = (0..seeder.sample_cnt).into_par_iter()
        .map(|idx| seeder.min_distance(idx, centers))
        .collect();
    let sampled_idx = draw_weighted(&min_distances, rnd, slot)?;
    Ok((sampled_idx, min_distances[sampled_idx]))
}

#[inline(always)]
pub fn calculate<T, D>(seeder: &Seeder<T, D>, centers: &mut CenterBuilder<T>, config: &SeedingConfig<'_, T>) -> Result<()>
where
    T: Primitive,
    D: DistanceFunction<T>,
{
    log::debug!("k-means++ seeding: {} samples, {} dims, k={}", seeder.sample_cnt, seeder.sample_dims, centers.k());
    let mut rnd = config.rnd.borrow_mut();
    {
        // Randomly select first center
        let first_idx = rnd.gen_range(0..seeder.sample_cnt);
        centers.push(first_idx, seeder.sample(first_idx));
        config.report(0, first_idx, T::zero());
    }
    let mut min_distances = vec![T::infinity(); seeder.sample_cnt];
    for slot in 1..centers.k() {
        // For each following center...
        // Only the newest center can have moved closer to a sample
        let newest = centers.center(slot - 1);
        seeder.samples.par_chunks_exact(seeder.sample_dims)
            .zip(min_distances.par_iter_mut())
            .for_each(|(s, min_dist)| {
                *min_dist = api::nan_min(*min_dist, seeder.distance.distance(s, newest));
            });

        let sampled_idx = draw_weighted(&min_distances, &mut *rnd, slot)?;
        centers.push(sampled_idx, seeder.sample(sampled_idx));
        config.report(slot, sampled_idx, min_distances[sampled_idx]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::testing::*;
    use crate::EuclideanDistance;

    #[test]
    fn one_center_per_cluster() {
        let (seeder, cluster_ids) = separated_clusters(&[100, 5, 5, 30], 3, 1);
        let hits = (0..200)
            .filter(|&i| {
                let centers = seeder.seed(4, Seeder::init_kmeanplusplus, &seeded_config(i)).unwrap();
                hits_all_clusters(&centers, &cluster_ids, 4)
            })
            .count();
        assert!(hits >= 190, "only {} of 200 seedings hit every cluster", hits);
    }

    #[test]
    fn never_selects_a_chosen_sample_twice() {
        let (sample_cnt, sample_dims) = (6, 2);
        let samples = random_samples::<f32>(sample_cnt, sample_dims, 3);
        let seeder = Seeder::new(&samples, sample_cnt, sample_dims, EuclideanDistance).unwrap();
        for seed in 0..50 {
            let mut indices = seeder.seed(sample_cnt, Seeder::init_kmeanplusplus, &seeded_config(seed)).unwrap().indices;
            indices.sort_unstable();
            assert_eq!(indices, (0..sample_cnt).collect::<Vec<_>>());
        }
    }

    #[test]
    fn duplicate_samples_are_degenerate() {
        let seeder = Seeder::new(&[1.0f64, 1.0, 1.0, 1.0, 1.0, 1.0], 3, 2, EuclideanDistance).unwrap();
        let err = seeder.seed(2, Seeder::init_kmeanplusplus, &seeded_config(0)).err().unwrap();
        assert!(matches!(err, SeedingError::Degenerate { slot: 1 }));
        assert!(!err.is_configuration());

        // Two distinct samples can not make for three centers
        let seeder = Seeder::new(&[0.0f64, 0.0, 2.0], 3, 1, EuclideanDistance).unwrap();
        let err = seeder.seed(3, Seeder::init_kmeanplusplus, &seeded_config(0)).err().unwrap();
        assert!(matches!(err, SeedingError::Degenerate { slot: 2 }));
    }

    #[test]
    fn non_finite_samples_are_rejected() {
        let seeder = Seeder::new(&[0.0f64, f64::NAN, 1.0], 3, 1, EuclideanDistance).unwrap();
        let failed = (0..20)
            .map(|seed| seeder.seed(2, Seeder::init_kmeanplusplus, &seeded_config(seed)))
            .filter(|res| matches!(res, Err(SeedingError::NonFiniteDistance { slot: 1 })))
            .count();
        // Whatever the first center is, one of the distances is NaN
        assert_eq!(failed, 20);
    }

    #[test]
    fn overflowing_distances_are_rejected() {
        // Finite coordinates whose squared distances exceed f32::MAX
        let seeder = Seeder::new(&[0.0f32, 1.0e20, 2.0e20], 3, 1, EuclideanDistance).unwrap();
        for seed in 0..20 {
            let res = seeder.seed(2, Seeder::init_kmeanplusplus, &seeded_config(seed));
            assert!(matches!(res, Err(SeedingError::NonFiniteDistance { slot: 1 })), "{:?}", res);
        }
    }

    #[test]
    fn exact_draw_skips_chosen_samples() {
        let seeder = Seeder::new(&[0.0f64, 1.0, 3.0], 3, 1, EuclideanDistance).unwrap();
        let mut centers = CenterBuilder::new(3, 1);
        centers.push(0, seeder.sample(0));
        centers.push(2, seeder.sample(2));
        let mut rnd = StdRng::seed_from_u64(6);
        for _ in 0..20 {
            assert_eq!(draw_exact(&seeder, &centers, &mut rnd, 2).unwrap(), (1, 1.0));
        }

        centers.push(1, seeder.sample(1));
        assert!(matches!(draw_exact(&seeder, &centers, &mut rnd, 3), Err(SeedingError::Degenerate { slot: 3 })));
    }
}
