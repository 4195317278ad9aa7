use crate::{memory::*, EuclideanDistance, Result, SeedingError};
use std::cell::RefCell;
use rayon::prelude::*;
use rand::prelude::*;

/// Markov chain length used when none is configured.
pub const DEFAULT_CHAIN_LENGTH: usize = 200;

pub type CenterSelectedCallbackFn<'a, T> = &'a dyn Fn(usize, usize, T);

/// Distance measure the seedings are computed on. Implementations return the **squared** distance.
pub trait DistanceFunction<T: Primitive>: Sync {
    fn distance(&self, a: &[T], b: &[T]) -> T;
}

/// This is a structure holding the configuration options for a seeding, such as the random number
/// generator to use, the length of the Markov chains, or a callback to get status information from a
/// running seeding.
///
/// For a more detailed information about all possible options, have a look at [`SeedingConfigBuilder`].
pub struct SeedingConfig<'a, T: Primitive> {
    /// Callback that is called after each selected center
    /// ## Arguments
    /// - **slot**: Position of the new center within the resulting [`Centers`]
    /// - **sample_idx**: Index of the sample the center was copied from
    /// - **distance**: Squared distance of that sample to its closest previously chosen center (`0` for the first center)
    pub(crate) center_selected: CenterSelectedCallbackFn<'a, T>,
    /// Random number generator to use
    pub(crate) rnd: Box<RefCell<dyn RngCore>>,
    /// Amount of Markov chain steps per selected center (KMC2 variants only)
    pub(crate) chain_length: usize,
}
impl<'a, T: Primitive> Default for SeedingConfig<'a, T> {
    fn default() -> Self {
        Self {
            center_selected: &|_, _, _| {},
            rnd: Box::new(RefCell::new(rand::thread_rng())),
            chain_length: DEFAULT_CHAIN_LENGTH,
        }
    }
}
impl<'a, T: Primitive> SeedingConfig<'a, T> {
    /// Use the [`SeedingConfigBuilder`] to build a [`SeedingConfig`] instance.
    pub fn build() -> SeedingConfigBuilder<'a, T> {
        SeedingConfigBuilder { config: SeedingConfig::default() }
    }

    pub(crate) fn chain_length(&self) -> Result<usize> {
        match self.chain_length {
            0 => Err(SeedingError::InvalidChainLength(0)),
            m => Ok(m),
        }
    }

    pub(crate) fn report(&self, slot: usize, sample_idx: usize, distance: T) {
        log::trace!("center {:>4} <- sample {:>8} (distance {:e})", slot, sample_idx, distance);
        (self.center_selected)(slot, sample_idx, distance);
    }
}
impl<'a, T: Primitive> std::fmt::Debug for SeedingConfig<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedingConfig").field("chain_length", &self.chain_length).finish_non_exhaustive()
    }
}

pub struct SeedingConfigBuilder<'a, T: Primitive> {
    config: SeedingConfig<'a, T>
}
impl<'a, T: Primitive> SeedingConfigBuilder<'a, T> {
    /// Set the callback that should be called after each center that was appended to the result.
    pub fn center_selected(mut self, center_selected: CenterSelectedCallbackFn<'a, T>) -> Self {
        self.config.center_selected = center_selected; self
    }
    /// Set the random number generator that should be used in the seeding.
    /// Use a seeded generator for deterministically repeatable results.
    pub fn random_generator<R: RngCore + 'static>(mut self, rnd: R) -> Self {
        self.config.rnd = Box::new(RefCell::new(rnd)); self
    }
    /// Set the length of the Markov chain that is run for each center (KMC2 variants only).
    /// Longer chains approximate k-means++ more closely. Must be at least `1`.
    /// ## Default
    /// [`DEFAULT_CHAIN_LENGTH`] (200)
    pub fn chain_length(mut self, chain_length: usize) -> Self {
        self.config.chain_length = chain_length; self
    }
    /// Return the internally built configuration structure.
    pub fn build(self) -> SeedingConfig<'a, T> { self.config }
}


/// Append-only accumulator for the centers of a running seeding.
///
/// Seeding methods push one center per iteration, reading the already chosen ones to decide on the next.
/// Once the method returned, the builder is frozen into the immutable [`Centers`].
#[derive(Clone, Debug)]
pub struct CenterBuilder<T: Primitive> {
    k: usize,
    sample_dims: usize,
    centers: Vec<T>,
    indices: Vec<usize>,
}
impl<T: Primitive> CenterBuilder<T> {
    pub(crate) fn new(k: usize, sample_dims: usize) -> Self {
        Self {
            k,
            sample_dims,
            centers: Vec::with_capacity(k * sample_dims),
            indices: Vec::with_capacity(k),
        }
    }

    /// Amount of centers that were requested.
    pub fn k(&self) -> usize { self.k }
    /// Amount of centers chosen so far.
    pub fn len(&self) -> usize { self.indices.len() }
    pub fn is_empty(&self) -> bool { self.indices.is_empty() }

    /// Append a copy of the sample with index **sample_idx** as the next center.
    pub(crate) fn push(&mut self, sample_idx: usize, sample: &[T]) {
        debug_assert_eq!(sample.len(), self.sample_dims);
        debug_assert!(self.len() < self.k, "Pushed more centers than k");
        self.centers.extend_from_slice(sample);
        self.indices.push(sample_idx);
    }

    pub fn center(&self, idx: usize) -> &[T] {
        &self.centers[idx * self.sample_dims..(idx + 1) * self.sample_dims]
    }
    pub fn iter(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.centers.chunks_exact(self.sample_dims)
    }
    /// Dataset indices of the centers chosen so far, in selection order.
    pub fn indices(&self) -> &[usize] { &self.indices }

    pub(crate) fn freeze(self) -> Result<Centers<T>> {
        if self.len() != self.k {
            return Err(SeedingError::Degenerate { slot: self.len() });
        }
        Ok(Centers { k: self.k, sample_dims: self.sample_dims, centers: self.centers, indices: self.indices })
    }
}


/// Minimum of two distances, where a NaN on either side wins.
pub(crate) fn nan_min<T: Primitive>(current: T, distance: T) -> T {
    if current.is_nan() || distance >= current { current } else { distance }
}


/// Result of a seeding, as returned by [`Seeder::seed`].
///
/// Holds exactly k copies of samples, in selection order, together with the index of the sample each
/// center was copied from. Only seedings create instances, and they can not be modified afterwards:
///
/// ```rust,compile_fail
/// use kmc2::*;
///
/// let seeder = Seeder::new(&[0.0f64, 1.0, 2.0], 3, 1, EuclideanDistance).unwrap();
/// let mut centers = seeder.seed(2, Seeder::init_kmeanplusplus, &SeedingConfig::default()).unwrap();
/// centers.centers[0] = 42.0;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Centers<T: Primitive> {
    pub(crate) k: usize,
    pub(crate) sample_dims: usize,
    pub(crate) centers: Vec<T>,
    pub(crate) indices: Vec<usize>,
}
impl<T: Primitive> Centers<T> {
    pub fn len(&self) -> usize { self.k }
    pub fn is_empty(&self) -> bool { self.k == 0 }
    /// Dimensionality of each center.
    pub fn sample_dims(&self) -> usize { self.sample_dims }
    pub fn center(&self, idx: usize) -> &[T] {
        &self.centers[idx * self.sample_dims..(idx + 1) * self.sample_dims]
    }
    pub fn iter(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.centers.chunks_exact(self.sample_dims)
    }
    /// Chosen centers [row-major] = [<center0>,<center1>,<center2>,...].
    pub fn as_slice(&self) -> &[T] { &self.centers }
    /// Index of the sample each center was copied from.
    pub fn indices(&self) -> &[usize] { &self.indices }
    /// Row-major center buffer, ready to be handed to a k-means implementation as initialization.
    pub fn into_inner(self) -> Vec<T> { self.centers }
}


/// Entrypoint of this crate's API-Surface.
///
/// Create an instance of this struct, giving the samples you want to draw seeds from. The primitive type
/// of the passed samples array will be the type used internally for all calculations, as well as for the
/// returned [`Centers`].
///
/// ## Supported seeding methods
/// - k-means++ [`Seeder::init_kmeanplusplus`]
/// - KMC2 [`Seeder::init_kmc2`]
/// - Assumption-free KMC2 [`Seeder::init_afkmc2`]
/// - Assumption-free KMC2 with distance memoization [`Seeder::init_afkmc2_memoized`]
pub struct Seeder<T: Primitive, D: DistanceFunction<T> = EuclideanDistance> {
    pub(crate) sample_cnt: usize,
    pub(crate) sample_dims: usize,
    pub(crate) samples: Vec<T>,
    pub(crate) distance: D,
}
impl<T: Primitive, D: DistanceFunction<T>> Seeder<T, D> {
    /// Create a new instance of the [`Seeder`] structure.
    ///
    /// ## Arguments
    /// - **samples**: Slice of samples [row-major] = [<sample0>,<sample1>,<sample2>,...]
    /// - **sample_cnt**: Amount of samples, contained in the passed **samples** slice
    /// - **sample_dims**: Amount of dimensions each sample from the **samples** slice has
    /// - **distance**: Distance function to compute (squared) distances with
    pub fn new(samples: &[T], sample_cnt: usize, sample_dims: usize, distance: D) -> Result<Self> {
        if sample_cnt == 0 {
            return Err(SeedingError::EmptyDataset);
        }
        if sample_dims == 0 || samples.len() != sample_cnt * sample_dims {
            return Err(SeedingError::InvalidDimensions { len: samples.len(), sample_cnt, sample_dims });
        }
        Ok(Self { sample_cnt, sample_dims, samples: samples.to_vec(), distance })
    }

    pub fn sample_cnt(&self) -> usize { self.sample_cnt }
    pub fn sample_dims(&self) -> usize { self.sample_dims }

    pub fn sample(&self, idx: usize) -> &[T] {
        &self.samples[idx * self.sample_dims..(idx + 1) * self.sample_dims]
    }

    pub(crate) fn distance_to(&self, sample_idx: usize, center: &[T]) -> T {
        self.distance.distance(self.sample(sample_idx), center)
    }

    /// Squared distance of the given sample to its closest chosen center.
    pub(crate) fn min_distance(&self, sample_idx: usize, centers: &CenterBuilder<T>) -> T {
        centers.iter()
            .map(|c| self.distance_to(sample_idx, c))
            .fold(T::infinity(), nan_min)
    }

    /// Squared distance of every sample to **center**, in sample order.
    pub(crate) fn distances_to(&self, center: &[T]) -> Vec<T> {
        self.samples.par_chunks_exact(self.sample_dims)
            .map(|s| self.distance.distance(s, center))
            .collect()
    }

    /// Calculate **k** seeds using the given seeding method.
    ///
    /// ## Arguments
    /// - **k**: Amount of centers to select (`1 <= k <= sample_cnt`)
    /// - **init**: Seeding-Method to use for the selection of the **k** centers
    /// - **config**: [`SeedingConfig`] instance, containing several configuration options for the seeding.
    ///
    /// ## Returns
    /// Instance of [`Centers`], containing exactly **k** copies of samples.
    ///
    /// ## Example
    /// ```rust
    /// use kmc2::*;
    /// use rand::prelude::*;
    ///
    /// let (sample_cnt, sample_dims, k) = (2000, 8, 4);
    ///
    /// // Generate some random data
    /// let mut samples = vec![0.0f64;sample_cnt * sample_dims];
    /// samples.iter_mut().for_each(|v| *v = rand::random());
    ///
    /// let seeder = Seeder::new(&samples, sample_cnt, sample_dims, EuclideanDistance).unwrap();
    /// let conf = SeedingConfig::build().random_generator(StdRng::seed_from_u64(42)).build();
    /// let centers = seeder.seed(k, Seeder::init_afkmc2, &conf).unwrap();
    ///
    /// assert_eq!(centers.len(), k);
    /// println!("Centers: {:?}", centers.as_slice());
    /// ```
    pub fn seed<'a, F>(&self, k: usize, init: F, config: &SeedingConfig<'a, T>) -> Result<Centers<T>>
            where F: FnOnce(&Seeder<T, D>, &mut CenterBuilder<T>, &SeedingConfig<'a, T>) -> Result<()> {
        if k == 0 || k > self.sample_cnt {
            return Err(SeedingError::InvalidCenterCount { k, sample_cnt: self.sample_cnt });
        }
        let mut centers = CenterBuilder::new(k, self.sample_dims);
        init(self, &mut centers, config)?;
        centers.freeze()
    }

    /// Sum of squared distances from every sample to its closest center, i.e. the k-means cost
    /// of using **centers** as the final clustering.
    pub fn quantization_error(&self, centers: &Centers<T>) -> T {
        self.samples.par_chunks_exact(self.sample_dims)
            .map(|s| centers.iter()
                .map(|c| self.distance.distance(s, c))
                .fold(T::infinity(), nan_min))
            .sum()
    }

    /// k-means++ seeding, as described by Arthur and Vassilvitskii (2007). Runs in O(nkd).
    ///
    /// ## Description
    /// The first center is selected uniformly at random. Each following center is sampled from all samples,
    /// with a probability proportional to the sample's squared distance to its closest already chosen center.
    ///
    /// ## Note
    /// This method is not meant for direct invocation. Pass a reference to it, to [`Seeder::seed`].
    pub fn init_kmeanplusplus<'a>(seeder: &Seeder<T, D>, centers: &mut CenterBuilder<T>, config: &SeedingConfig<'a, T>) -> Result<()> {
        crate::inits::kmeanplusplus::calculate(seeder, centers, config)
    }

    /// KMC2 seeding, as described by Bachem, Lucic, Hassani and Krause (2016). Runs in O(mk²d).
    ///
    /// ## Description
    /// Approximates k-means++ with a Markov chain of [`SeedingConfigBuilder::chain_length`] steps per center,
    /// proposing samples uniformly at random. Works well when the data is not too skewed
    /// (bounded density); [`Seeder::init_afkmc2`] drops that assumption.
    ///
    /// ## Note
    /// This method is not meant for direct invocation. Pass a reference to it, to [`Seeder::seed`].
    pub fn init_kmc2<'a>(seeder: &Seeder<T, D>, centers: &mut CenterBuilder<T>, config: &SeedingConfig<'a, T>) -> Result<()> {
        crate::inits::kmc2::calculate(seeder, centers, config)
    }

    /// Assumption-free KMC2 seeding. Runs in O(nd + mk²d).
    ///
    /// ## Description
    /// Like [`Seeder::init_kmc2`], but candidates are proposed from a mixture of the squared distance to the
    /// first center and the uniform distribution (see [`Proposal`](crate::Proposal)). The acceptance
    /// probability is importance-weighted, so the chain targets the k-means++ distribution regardless of
    /// the data distribution. This is the recommended method.
    ///
    /// ## Note
    /// This method is not meant for direct invocation. Pass a reference to it, to [`Seeder::seed`].
    pub fn init_afkmc2<'a>(seeder: &Seeder<T, D>, centers: &mut CenterBuilder<T>, config: &SeedingConfig<'a, T>) -> Result<()> {
        crate::inits::afkmc2::calculate(seeder, centers, config)
    }

    /// Assumption-free KMC2 seeding, memoizing all sample-to-center distances in O(nk) additional memory.
    ///
    /// ## Description
    /// Draws the exact same centers as [`Seeder::init_afkmc2`] for the same random number stream. Pays off
    /// when the amount of samples is not much larger than `chain_length * k`, as distances are then
    /// frequently requested more than once.
    ///
    /// ## Note
    /// This method is not meant for direct invocation. Pass a reference to it, to [`Seeder::seed`].
    pub fn init_afkmc2_memoized<'a>(seeder: &Seeder<T, D>, centers: &mut CenterBuilder<T>, config: &SeedingConfig<'a, T>) -> Result<()> {
        crate::inits::afkmc2_memoized::calculate(seeder, centers, config)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::testing::*;

    #[test]
    fn rejects_malformed_datasets() {
        let err = Seeder::new(&[] as &[f64], 0, 2, EuclideanDistance).err().unwrap();
        assert!(matches!(err, SeedingError::EmptyDataset));
        assert!(err.is_configuration());

        let err = Seeder::new(&[1.0f64, 2.0, 3.0], 2, 2, EuclideanDistance).err().unwrap();
        assert!(matches!(err, SeedingError::InvalidDimensions { len: 3, sample_cnt: 2, sample_dims: 2 }));

        let err = Seeder::new(&[] as &[f32], 3, 0, EuclideanDistance).err().unwrap();
        assert!(matches!(err, SeedingError::InvalidDimensions { .. }));
    }

    #[test]
    fn rejects_invalid_center_counts() {
        let seeder = four_points();
        for k in [0, 5, 100] {
            for (name, method) in methods::<f64>() {
                let conf = seeded_config(1);
                let err = seeder.seed(k, method, &conf).err()
                    .unwrap_or_else(|| panic!("{} accepted k={}", name, k));
                assert!(matches!(err, SeedingError::InvalidCenterCount { .. }), "{}: {:?}", name, err);
                assert!(err.is_configuration());
            }
        }
    }

    #[test]
    fn rejects_empty_chains() {
        let seeder = four_points();
        let conf = SeedingConfig::build().random_generator(StdRng::seed_from_u64(3)).chain_length(0).build();
        for (name, method) in methods::<f64>().into_iter().filter(|(name, _)| *name != "kmeanplusplus") {
            let err = seeder.seed(2, method, &conf).err().unwrap();
            assert!(matches!(err, SeedingError::InvalidChainLength(0)), "{}: {:?}", name, err);
        }
        // k-means++ has no chain, so the length is irrelevant
        assert!(seeder.seed(2, Seeder::init_kmeanplusplus, &conf).is_ok());
    }

    #[test]
    fn centers_are_copies_of_samples() {
        let (sample_cnt, sample_dims) = (300, 5);
        let samples = random_samples::<f64>(sample_cnt, sample_dims, 7);
        let seeder = Seeder::new(&samples, sample_cnt, sample_dims, EuclideanDistance).unwrap();
        for k in [1, 2, 17, 64] {
            for (name, method) in methods::<f64>() {
                let centers = seeder.seed(k, method, &seeded_config(k as u64)).unwrap();
                assert_eq!(centers.len(), k, "{}", name);
                assert_eq!(centers.as_slice().len(), k * sample_dims);
                assert_centers_from_samples(&seeder, &centers);
            }
        }
    }

    #[test]
    fn centers_are_independent_of_the_input_buffer() {
        let mut samples = vec![0.0f32, 0.0, 5.0, 5.0];
        let seeder = Seeder::new(&samples, 2, 2, EuclideanDistance).unwrap();
        let centers = seeder.seed(2, Seeder::init_kmeanplusplus, &seeded_config(9)).unwrap();
        samples.iter_mut().for_each(|v| *v = -1.0);
        assert!(centers.as_slice().iter().all(|&v| v == 0.0 || v == 5.0));
    }

    #[test]
    fn center_selected_callback() {
        let seeder = four_points();
        let reported = RefCell::new(Vec::new());
        let centers = {
            let callback = |slot: usize, idx: usize, dist: f64| reported.borrow_mut().push((slot, idx, dist));
            let conf = SeedingConfig::build()
                .random_generator(StdRng::seed_from_u64(11))
                .center_selected(&callback)
                .build();
            seeder.seed(4, Seeder::init_afkmc2, &conf).unwrap()
        };

        let reported = reported.into_inner();
        assert_eq!(reported.len(), 4);
        assert_eq!(reported[0].2, 0.0);
        for (slot, (reported_slot, idx, dist)) in reported.into_iter().enumerate() {
            assert_eq!(slot, reported_slot);
            assert_eq!(centers.indices()[slot], idx);
            if slot > 0 {
                assert!(dist > 0.0);
            }
        }
    }

    #[test]
    fn quantization_error_of_full_seeding_is_zero() {
        let seeder = four_points();
        let centers = seeder.seed(4, Seeder::init_kmeanplusplus, &seeded_config(5)).unwrap();
        assert_eq!(seeder.quantization_error(&centers), 0.0);

        // One center per cluster leaves a cost of 1 per cluster
        let centers = Centers { k: 2, sample_dims: 2, centers: vec![0.0, 0.0, 10.0, 0.0], indices: vec![0, 2] };
        assert_approx_eq!(seeder.quantization_error(&centers), 2.0, 1e-12);
    }

    #[test]
    fn builder_freezes_only_when_complete() {
        let mut builder = CenterBuilder::<f64>::new(2, 1);
        builder.push(3, &[1.5]);
        assert_eq!(builder.center(0), &[1.5]);
        assert!(matches!(builder.clone().freeze(), Err(SeedingError::Degenerate { slot: 1 })));
        builder.push(0, &[-2.0]);
        let centers = builder.freeze().unwrap();
        assert_eq!(centers.indices(), &[3, 0]);
        assert_eq!(centers.sample_dims(), 1);
        assert_eq!(centers.center(1), &[-2.0]);
        assert_eq!(centers.as_slice(), &[1.5, -2.0]);
        assert_eq!(centers.into_inner(), vec![1.5, -2.0]);
    }
}
