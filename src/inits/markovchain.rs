use crate::memory::*;
use rand::prelude::*;

/// State of a Markov chain: the current candidate sample, its squared distance to the closest chosen
/// center, and the probability with which it was proposed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ChainState<T> {
    pub index: usize,
    pub distance: T,
    pub density: T,
}

/// Run a Metropolis-Hastings chain of **chain_length** steps, whose stationary distribution is proportional
/// to the squared distance to the closest chosen center.
///
/// ## Arguments
/// - **propose**: Draws a candidate, returning its sample index and its proposal probability
/// - **min_distance**: Squared distance of a sample to its closest chosen center
///
/// The first candidate is taken as is. Every following candidate `y` replaces the current state `x` with
/// probability `min(1, (d(y) * q(x)) / (d(x) * q(y)))`.
pub(crate) fn run<T, R>(
    chain_length: usize,
    rnd: &mut R,
    mut propose: impl FnMut(&mut R) -> (usize, T),
    mut min_distance: impl FnMut(usize) -> T,
) -> ChainState<T>
where
    T: Primitive,
    R: Rng + ?Sized,
{
    debug_assert!(chain_length >= 1);
    let (index, density) = propose(rnd);
    let mut state = ChainState { index, distance: min_distance(index), density };

    for _ in 1..chain_length {
        let (index, density) = propose(rnd);
        let distance = min_distance(index);
        let u = rnd.gen_range(T::zero()..T::one());
        // ratio > u, multiplied out: a state at distance 0 is left for any candidate at a positive distance,
        // and candidates at distance 0 are never moved to.
        if distance * state.density > u * state.distance * density {
            state = ChainState { index, distance, density };
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_step_keeps_first_candidate() {
        let mut rnd = StdRng::seed_from_u64(0);
        let mut proposed = 0;
        let state = run(1, &mut rnd, |_| { proposed += 1; (3, 0.25f64) }, |_| 7.0);
        assert_eq!(state, ChainState { index: 3, distance: 7.0, density: 0.25 });
        assert_eq!(proposed, 1);
    }

    #[test]
    fn leaves_zero_distance_states() {
        // Sample 0 sits on a chosen center, sample 1 does not
        let mut rnd = StdRng::seed_from_u64(1);
        let mut next = 0;
        let state = run(2, &mut rnd, |_| { next += 1; (next - 1, 0.5f64) }, |idx| idx as f64);
        assert_eq!(state.index, 1);
    }

    #[test]
    fn never_moves_to_zero_distance() {
        let mut rnd = StdRng::seed_from_u64(2);
        let mut step = 0usize;
        let state = run(500, &mut rnd, |_| {
            step += 1;
            if step == 1 { (1, 0.5f64) } else { (0, 0.5) }
        }, |idx| idx as f64);
        assert_eq!(state.index, 1);
    }

    #[test]
    fn stationary_distribution_is_proportional_to_distance() {
        // Uniform proposals over 3 samples with distances 1:2:5, long chain sampled at its end
        let distances = [1.0f64, 2.0, 5.0];
        let mut counts = [0usize; 3];
        let mut rnd = StdRng::seed_from_u64(3);
        for _ in 0..4000 {
            let state = run(50, &mut rnd, |r| (r.gen_range(0..3), 1.0), |idx| distances[idx]);
            counts[state.index] += 1;
        }
        let freq: Vec<f64> = counts.iter().map(|&c| c as f64 / 4000.0).collect();
        assert_approx_eq!(freq[0], 0.125, 0.03);
        assert_approx_eq!(freq[1], 0.25, 0.03);
        assert_approx_eq!(freq[2], 0.625, 0.03);
    }
}
