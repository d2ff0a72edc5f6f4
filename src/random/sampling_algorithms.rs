//! Algorithms for uniform random sampling without replacement. Exposure windows are contiguous
//! index ranges and cohorts are small vectors, so everything here is expressed over iterators and
//! plain slices and the selection logic is explicit rather than delegated to `rand::seq`.

use crate::error::OutbreakError;
use crate::rand::Rng;
use std::ops::Range;

/// Sample multiple random elements uniformly without replacement from a container of unknown
/// length. If more samples are requested than are in the set, the function returns as many items
/// as it can; callers that must not truncate check the pool size first.
///
/// This function implements "Algorithm L" from KIM-HUNG LI
/// Reservoir-Sampling Algorithms of Time Complexity O(n(1 + log(N/n)))
/// <https://dl.acm.org/doi/pdf/10.1145/198429.198435>
pub fn sample_multiple_l_reservoir<I, R, T>(rng: &mut R, iter: I, requested: usize) -> Vec<T>
where
    R: Rng,
    I: IntoIterator<Item = T>,
{
    if requested == 0 {
        return Vec::new();
    }
    let mut weight: f64 = rng.random_range(0.0..1.0); // controls skip distance distribution
    weight = weight.powf(1.0 / requested as f64);
    let mut position: usize = 0; // current index in data
    let mut next_pick_position: usize = 1; // index of the next item to pick
    let mut reservoir = Vec::with_capacity(requested); // the sample reservoir

    iter.into_iter().for_each(|item| {
        position += 1;
        if position == next_pick_position {
            if reservoir.len() == requested {
                let to_remove = rng.random_range(0..reservoir.len());
                reservoir.swap_remove(to_remove);
            }
            reservoir.push(item);

            if reservoir.len() == requested {
                next_pick_position += (f64::ln(rng.random_range(0.0..1.0)) / f64::ln(1.0 - weight))
                    .floor() as usize
                    + 1;
                let uniform_random: f64 = rng.random_range(0.0..1.0);
                weight *= uniform_random.powf(1.0 / requested as f64);
            } else {
                next_pick_position += 1;
            }
        }
    });

    reservoir
}

/// Draws `requested` distinct indices uniformly from the half-open `range`.
///
/// # Errors
///
/// Returns `OutbreakError::InsufficientPool` when `requested` exceeds the size of `range`.
/// The request is never silently truncated.
pub fn sample_range_without_replacement<R: Rng>(
    rng: &mut R,
    range: Range<usize>,
    requested: usize,
) -> Result<Vec<usize>, OutbreakError> {
    let available = range.len();
    if requested > available {
        return Err(OutbreakError::InsufficientPool {
            requested,
            available,
        });
    }
    Ok(sample_multiple_l_reservoir(rng, range, requested))
}

/// Splits `items` into a uniformly drawn sample of size `requested` and the remainder. The
/// remainder keeps the original relative order of `items`.
///
/// # Errors
///
/// Returns `OutbreakError::InsufficientPool` when `requested` exceeds `items.len()`.
pub fn split_sample<R: Rng, T>(
    rng: &mut R,
    items: Vec<T>,
    requested: usize,
) -> Result<(Vec<T>, Vec<T>), OutbreakError> {
    let positions = sample_range_without_replacement(rng, 0..items.len(), requested)?;
    let mut chosen = vec![false; items.len()];
    for &position in &positions {
        chosen[position] = true;
    }

    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    // Preserve the draw order for the sample.
    let sample = positions
        .iter()
        .filter_map(|&position| slots[position].take())
        .collect();
    let rest = slots
        .into_iter()
        .zip(chosen)
        .filter_map(|(slot, picked)| if picked { None } else { slot })
        .collect();
    Ok((sample, rest))
}
