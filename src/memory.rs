use num::{NumCast, Zero, Float};
use std::{
    fmt::{Debug, Display, LowerExp}, iter::Sum, ops::{Add, AddAssign, Sub, SubAssign}
};
use rand::distributions::uniform::SampleUniform;

/// Floating point type the seedings are calculated in.
/// The `AddAssign<&Self>` bound is what rand's `WeightedIndex` needs to accumulate weights.
pub trait Primitive: Add + AddAssign + Sum + Sub + SubAssign + Zero + Float + NumCast + SampleUniform
                + PartialOrd + Copy + Default + Display + Debug + Sync + Send + LowerExp + 'static
                + for<'a> AddAssign<&'a Self> + for<'a> Sub<&'a Self> {}
impl Primitive for f32 {}
impl Primitive for f64 {}


/// Dense `sample_cnt x k` table of squared distances between samples and chosen centers.
/// Cells are lazily populated; an unset cell is `None`, so a true distance of `0` is cached like any other.
#[derive(Clone, Debug)]
pub(crate) struct DistanceMemo<T: Primitive> {
    k: usize,
    cells: Vec<Option<T>>,
    hits: usize,
    misses: usize,
}
impl<T: Primitive> DistanceMemo<T> {
    pub fn new(sample_cnt: usize, k: usize) -> Self {
        Self { k, cells: vec![None; sample_cnt * k], hits: 0, misses: 0 }
    }

    /// Store an already computed distance without counting it as a lookup.
    pub fn prefill(&mut self, sample_idx: usize, center_idx: usize, distance: T) {
        self.cells[sample_idx * self.k + center_idx] = Some(distance);
    }

    pub fn get_or_compute(&mut self, sample_idx: usize, center_idx: usize, compute: impl FnOnce() -> T) -> T {
        let cell = &mut self.cells[sample_idx * self.k + center_idx];
        match *cell {
            Some(distance) => {
                self.hits += 1;
                distance
            }
            None => {
                self.misses += 1;
                let distance = compute();
                *cell = Some(distance);
                distance
            }
        }
    }

    pub fn hits(&self) -> usize { self.hits }
    pub fn misses(&self) -> usize { self.misses }
}
