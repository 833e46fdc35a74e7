use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::{ParamGen, RandErr, Result};

/// A parameter generator that follows a certain probabilistic distribution.
#[derive(Debug, Clone)]
pub struct RandParamGen<R: Rng, D: Distribution<f64>> {
    rng: R,
    distribution: D,
    remaining: usize,
}

impl<R: Rng, D: Distribution<f64>> RandParamGen<R, D> {
    /// Creates a new `RandParamGen` parameter generator.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `distribution` - The distribution to sample the random numbers from.
    /// * `limit` - The maximum amount of numbers to generate.
    pub fn new(rng: R, distribution: D, limit: usize) -> Self {
        Self {
            rng,
            distribution,
            remaining: limit,
        }
    }
}

impl<R: Rng> RandParamGen<R, Uniform<f64>> {
    /// Creates a new `RandParamGen` with a uniform distribution over `[low, high)`.
    ///
    /// # Returns
    /// An error if the range is invalid (low >= high).
    pub fn uniform(rng: R, limit: usize, low: f64, high: f64) -> Result<Self> {
        Ok(Self::new(rng, Uniform::new(low, high)?, limit))
    }

    /// Creates a new `RandParamGen` with a uniform distribution over `[low, high]`.
    ///
    /// # Returns
    /// An error if the range is invalid (low > high).
    pub fn uniform_inclusive(rng: R, limit: usize, low: f64, high: f64) -> Result<Self> {
        Ok(Self::new(rng, Uniform::new_inclusive(low, high)?, limit))
    }

    /// Creates a new `RandParamGen` using Xavier uniform initialization.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `limit` - The maximum amount of numbers to generate.
    /// * `fan_in` - The number of input units in the weight tensor.
    /// * `fan_out` - The number of output units in the weight tensor.
    ///
    /// # Returns
    /// An error if the calculated range is invalid.
    pub fn xavier_uniform(rng: R, limit: usize, fan_in: usize, fan_out: usize) -> Result<Self> {
        let range = (6. / (fan_in + fan_out) as f64).sqrt();
        Self::uniform(rng, limit, -range, range)
    }

    /// Creates a new `RandParamGen` using LeCun uniform initialization.
    ///
    /// # Returns
    /// An error if the calculated range is invalid.
    pub fn lecun_uniform(rng: R, limit: usize, fan_in: usize) -> Result<Self> {
        let range = (3. / fan_in as f64).sqrt();
        Self::uniform(rng, limit, -range, range)
    }
}

impl<R: Rng> RandParamGen<R, Normal<f64>> {
    /// Creates a new `RandParamGen` with a normal distribution.
    ///
    /// # Returns
    /// An error if `std_dev` is negative or not finite (Nan or infinite).
    pub fn normal(rng: R, limit: usize, mean: f64, std_dev: f64) -> Result<Self> {
        if std_dev < 0. {
            return Err(RandErr::NegativeStdDev(std_dev));
        }

        Ok(Self::new(rng, Normal::new(mean, std_dev)?, limit))
    }

    /// Creates a new `RandParamGen` using Kaiming normal initialization.
    ///
    /// # Returns
    /// An error if the calculated standard deviation is not finite.
    pub fn kaiming(rng: R, limit: usize, fan_in: usize) -> Result<Self> {
        let std_dev = (2. / fan_in as f64).sqrt();
        Self::normal(rng, limit, 0., std_dev)
    }

    /// Creates a new `RandParamGen` using Xavier normal initialization.
    pub fn xavier(rng: R, limit: usize, fan_in: usize, fan_out: usize) -> Result<Self> {
        Self::kaiming(rng, limit, fan_in + fan_out)
    }

    /// Creates a new `RandParamGen` using LeCun normal initialization.
    pub fn lecun(rng: R, limit: usize, fan_in: usize) -> Result<Self> {
        let std_dev = (1. / fan_in as f64).sqrt();
        Self::normal(rng, limit, 0., std_dev)
    }
}

impl<R: Rng, D: Distribution<f64>> ParamGen for RandParamGen<R, D> {
    fn sample(&mut self, n: usize) -> Option<Vec<f64>> {
        if self.remaining == 0 {
            return None;
        }

        let n = n.min(self.remaining);
        self.remaining -= n;

        let sample = (0..n)
            .map(|_| self.distribution.sample(&mut self.rng))
            .collect();

        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn empty() {
        let mut param_gen = RandParamGen::normal(seeded_rng(), 0, 0., 1.).unwrap();
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn partial() {
        let mut param_gen = RandParamGen::normal(seeded_rng(), 10, 0., 1.).unwrap();

        assert_eq!(param_gen.sample(7).unwrap().len(), 7);
        assert_eq!(param_gen.sample(7).unwrap().len(), 3);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn seeded_samples_repeat() {
        let a = RandParamGen::uniform(seeded_rng(), 8, -1., 1.)
            .unwrap()
            .sample(8)
            .unwrap();
        let b = RandParamGen::uniform(seeded_rng(), 8, -1., 1.)
            .unwrap()
            .sample(8)
            .unwrap();

        assert_eq!(a, b);
        assert!(a.iter().all(|x| (-1.0..1.0).contains(x)));
    }

    #[test]
    fn xavier_uniform_range() {
        let sample = RandParamGen::xavier_uniform(seeded_rng(), 100, 2, 1)
            .unwrap()
            .sample(100)
            .unwrap();

        let range = 2f64.sqrt();
        assert!(sample.iter().all(|x| x.abs() < range));
    }

    #[test]
    fn invalid_distributions() {
        assert!(RandParamGen::uniform(seeded_rng(), 1, 1., 0.).is_err());
        assert!(matches!(
            RandParamGen::normal(seeded_rng(), 1, 0., -1.),
            Err(RandErr::NegativeStdDev(_))
        ));
        assert!(matches!(
            RandParamGen::normal(seeded_rng(), 1, 0., f64::NAN),
            Err(RandErr::Normal(_))
        ));
        assert!(RandParamGen::kaiming(seeded_rng(), 1, 0).is_err());
    }
}
