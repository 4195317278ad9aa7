use crate::{DistanceFunction, Primitive};

/// Squared euclidean distance, the distance k-means++ and its Markov chain approximations are defined on.
#[derive(Clone, Copy, Debug, Default)]
pub struct EuclideanDistance;

impl<T: Primitive> DistanceFunction<T> for EuclideanDistance {
    #[inline(always)]
    fn distance(&self, a: &[T], b: &[T]) -> T {
        a.iter().zip(b.iter())
            .map(|(&sp, &cp)| sp - cp)   // <sample> - <center>
            .map(|v| v * v)              // <vec_components> ^2
            .sum()
    }
}
