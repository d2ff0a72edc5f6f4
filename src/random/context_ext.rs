use std::any::TypeId;
use std::cell::RefMut;
use std::ops::Range;

use log::trace;

use crate::context::Context;
use crate::error::OutbreakError;
use crate::hashing::hash_str;
use crate::rand::distr::uniform::{SampleRange, SampleUniform};
use crate::rand::{Rng, SeedableRng};
use crate::random::sampling_algorithms::{sample_range_without_replacement, split_sample};
use crate::random::{RngHolder, RngId, RngPlugin};

/// Gets a mutable reference to the random number generator associated with the given
/// [`RngId`]. If the Rng has not been used before, one will be created with the base seed
/// you defined in `init_random`. Note that this will panic if `init_random` was not called yet.
fn get_rng<R: RngId>(context: &Context) -> RefMut<R::RngType> {
    let data_container = context
        .get_data_container(RngPlugin)
        .expect("You must initialize the random number generator with a base seed");
    let base_seed = data_container
        .base_seed
        .expect("You must initialize the random number generator with a base seed");

    let rng_holders = data_container.rng_holders.borrow_mut();
    RefMut::map(rng_holders, |holders| {
        holders
            .entry(TypeId::of::<R>())
            // Create a new rng holder if it doesn't exist yet
            .or_insert_with(|| {
                trace!(
                    "creating new RNG (seed={}) for {}",
                    base_seed,
                    R::get_name()
                );
                let seed_offset = hash_str(R::get_name());
                RngHolder {
                    rng: Box::new(R::RngType::seed_from_u64(
                        base_seed.wrapping_add(seed_offset),
                    )),
                }
            })
            .rng
            .downcast_mut::<R::RngType>()
            .expect("rng holder has the wrong type")
    })
}

// This is a trait extension on Context for
// random number generation functionality.
pub trait ContextRandomExt {
    /// Initializes the `RngPlugin` data container to store rngs as well as a base
    /// seed. Note that rngs are created lazily when `sample` is called.
    fn init_random(&mut self, base_seed: u64);

    /// Returns the base seed, if `init_random` has been called.
    fn get_base_seed(&self) -> Option<u64>;

    /// Gets a random sample from the random number generator associated with the given
    /// [`RngId`] by applying the specified sampler function.
    fn sample<R: RngId, T>(&self, rng_id: R, sampler: impl FnOnce(&mut R::RngType) -> T) -> T;

    /// Gets a random sample within the range provided by `range`
    /// using the generator associated with the given [`RngId`].
    fn sample_range<R: RngId, S, T>(&self, rng_id: R, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform;

    /// Draws `requested` distinct indices from `range` using the generator associated with the
    /// given [`RngId`].
    ///
    /// # Errors
    ///
    /// `OutbreakError::InsufficientPool` when `requested` exceeds the size of `range`.
    fn sample_without_replacement<R: RngId>(
        &self,
        rng_id: R,
        range: Range<usize>,
        requested: usize,
    ) -> Result<Vec<usize>, OutbreakError>
    where
        R::RngType: Rng;

    /// Splits `items` into a uniformly drawn sample of `requested` items and the remainder.
    ///
    /// # Errors
    ///
    /// `OutbreakError::InsufficientPool` when `requested` exceeds `items.len()`.
    fn split_sample<R: RngId, T>(
        &self,
        rng_id: R,
        items: Vec<T>,
        requested: usize,
    ) -> Result<(Vec<T>, Vec<T>), OutbreakError>
    where
        R::RngType: Rng;
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random module");
        let data_container = self.get_data_container_mut(RngPlugin);
        data_container.base_seed = Some(base_seed);

        // Clear any existing Rngs to ensure they get re-seeded when `sample` is called
        data_container.rng_holders.borrow_mut().clear();
    }

    fn get_base_seed(&self) -> Option<u64> {
        self.get_data_container(RngPlugin)
            .and_then(|data_container| data_container.base_seed)
    }

    fn sample<R: RngId, T>(&self, _rng_id: R, sampler: impl FnOnce(&mut R::RngType) -> T) -> T {
        let mut rng = get_rng::<R>(self);
        sampler(&mut rng)
    }

    fn sample_range<R: RngId, S, T>(&self, rng_id: R, range: S) -> T
    where
        R::RngType: Rng,
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.sample(rng_id, |rng| rng.random_range(range))
    }

    fn sample_without_replacement<R: RngId>(
        &self,
        rng_id: R,
        range: Range<usize>,
        requested: usize,
    ) -> Result<Vec<usize>, OutbreakError>
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| {
            sample_range_without_replacement(rng, range, requested)
        })
    }

    fn split_sample<R: RngId, T>(
        &self,
        rng_id: R,
        items: Vec<T>,
        requested: usize,
    ) -> Result<(Vec<T>, Vec<T>), OutbreakError>
    where
        R::RngType: Rng,
    {
        self.sample(rng_id, |rng| split_sample(rng, items, requested))
    }
}
