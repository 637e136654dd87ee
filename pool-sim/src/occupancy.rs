//! Describing initial distributions of agents over pools

use crate::pool::PoolId;

/// Numeric type used to represent a fraction of the agent population.
pub type Share = f64;

/// Determines how agents are distributed over pools at the start of a
/// simulation.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum OccupancyDistribution {
    /// Weight each pool equally.
    #[default]
    Equal,
    /// Set the specified pool's share to some value between `0.0` and `1.0`
    /// inclusive, with the remainder split equally between all other pools.
    SetPool(PoolId, Share),
    /// Set all pool shares to those in the given vector.
    SetValues(Vec<Share>),
}

#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    #[error("distribution values sum to {0}, not 1.0")]
    BadDistributionSum(Share),
    #[error("share value {0} is not in the range 0.0..=1.0")]
    BadShareValue(Share),
    #[error("cannot set the share of invalid pool {0}")]
    SetPoolBadPoolId(PoolId),
    #[error("cannot set the share of the only pool in the layout")]
    SetPoolSinglePool,
    #[error("distribution size {0} does not match pool count {1}")]
    WrongNumPools(usize, usize),
    #[error("cannot create a distribution over zero pools")]
    ZeroPoolsGiven,
}

impl OccupancyDistribution {
    /// Allowable difference between a distribution sum and 1.0.
    const EPSILON_SHARE: Share = 1e-6;

    /// Returns true if the discrete distribution described by this
    /// [`OccupancyDistribution`] is valid over `num_pools`.
    #[inline]
    pub fn is_valid(&self, num_pools: usize) -> bool {
        self.validate(num_pools).is_ok()
    }

    /// Checks if the discrete distribution described by this
    /// [`OccupancyDistribution`] is valid over `num_pools`.
    ///
    /// Shares of exactly `0.0` and `1.0` are valid: a pool may start empty,
    /// or hold the entire population.
    pub fn validate(&self, num_pools: usize) -> Result<(), DistributionError> {
        use DistributionError::*;

        if num_pools == 0 {
            return Err(ZeroPoolsGiven);
        }

        match &self {
            Self::Equal => Ok(()),
            Self::SetValues(dist) => {
                if dist.len() != num_pools {
                    return Err(WrongNumPools(dist.len(), num_pools));
                }

                if let Some(&val) = dist
                    .iter()
                    .find(|&x| x.is_nan() || !(0.0..=1.0).contains(x))
                {
                    return Err(BadShareValue(val));
                }

                let sum = dist.iter().sum();
                if Share::abs(sum - 1.0) > Self::EPSILON_SHARE {
                    return Err(BadDistributionSum(sum));
                }

                Ok(())
            }
            Self::SetPool(pool, share) => {
                if num_pools == 1 {
                    return Err(SetPoolSinglePool);
                }

                let pool = *pool;
                if pool.0 >= num_pools {
                    return Err(SetPoolBadPoolId(pool));
                }

                let share = *share;
                if share.is_nan() || !(0.0..=1.0).contains(&share) {
                    return Err(BadShareValue(share));
                }

                Ok(())
            }
        }
    }

    /// Returns the initial share of `pool` according to this distribution.
    /// Returns a [`DistributionError`] if the underlying distribution is
    /// invalid over `num_pools`.
    pub fn share_of(
        &self,
        pool: PoolId,
        num_pools: usize,
    ) -> Result<Share, DistributionError> {
        self.validate(num_pools)?;

        Ok(unsafe { self.share_of_unchecked(pool, num_pools) })
    }

    /// Equivalent to calling [`.share_of()`](Self::share_of) without checking
    /// the validity of the underlying distribution.
    ///
    /// # Safety
    /// This function expects the underlying distribution to be a valid
    /// discrete probability distribution over the given number of pools.
    pub unsafe fn share_of_unchecked(
        &self,
        pool: PoolId,
        num_pools: usize,
    ) -> Share {
        match &self {
            Self::Equal => 1.0 / num_pools as Share,
            Self::SetValues(dist) => dist[pool.0],
            Self::SetPool(id, share) => {
                if pool == *id {
                    *share
                } else {
                    (1.0 - share) / (num_pools - 1) as Share
                }
            }
        }
    }

    /// Returns the per-pool shares described by this distribution as a
    /// vector. Returns a [`DistributionError`] if the underlying distribution
    /// is invalid over `num_pools`.
    pub fn values(
        &self,
        num_pools: usize,
    ) -> Result<Vec<Share>, DistributionError> {
        self.validate(num_pools)?;

        Ok(unsafe { self.values_unchecked(num_pools) })
    }

    /// Equivalent to calling [`.values()`](Self::values) without checking
    /// the validity of the underlying distribution.
    ///
    /// # Safety
    /// This function expects the underlying distribution to be a valid
    /// discrete probability distribution over the given number of pools.
    pub unsafe fn values_unchecked(&self, num_pools: usize) -> Vec<Share> {
        match &self {
            Self::Equal => vec![1.0 / num_pools as Share; num_pools],
            Self::SetValues(dist) => dist.clone(),
            Self::SetPool(pool, share) => {
                let other = (1.0 - share) / (num_pools - 1) as Share;

                let mut dist = vec![other; num_pools];
                dist[pool.0] = *share;

                dist
            }
        }
    }
}

/// Helper trait for turning inclusive integer ranges into shares.
/// # Example
/// ```
/// use pool_sim::occupancy::Percent;
///
/// for p in (0..=10).percent() {
///    println!("{}", p);
/// }
/// ```
pub trait Percent {
    /// Returns an iterator over percentage values. Can be used with
    /// [`SimulationBuilder`](crate::simulation::SimulationBuilder) to sweep
    /// over initial occupancy shares.
    fn percent(self) -> impl Iterator<Item = Share>;
}

impl Percent for std::ops::RangeInclusive<usize> {
    fn percent(self) -> impl Iterator<Item = Share> {
        assert!(
            (0..=100).contains(self.start()) && (0..=100).contains(self.end()),
            "invalid percent range {} to {}",
            self.start(),
            self.end()
        );

        self.map(|n| n as Share / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::PoolId;

    use super::{DistributionError, OccupancyDistribution};

    #[test]
    fn equal_shares() {
        assert_eq!(
            OccupancyDistribution::Equal.values(4).unwrap(),
            vec![0.25, 0.25, 0.25, 0.25]
        )
    }

    #[test]
    fn whole_population_in_one_pool_is_valid() {
        let dist = OccupancyDistribution::SetValues(vec![1.0, 0.0]);

        assert_eq!(dist.values(2).unwrap(), vec![1.0, 0.0]);
    }

    #[test]
    fn bad_sum_is_rejected() {
        let dist = OccupancyDistribution::SetValues(vec![0.5, 0.4]);

        assert!(matches!(
            dist.validate(2),
            Err(DistributionError::BadDistributionSum(_))
        ));
    }

    #[test]
    fn wrong_length_is_rejected() {
        let dist = OccupancyDistribution::SetValues(vec![0.5, 0.25, 0.25]);

        assert!(matches!(
            dist.validate(2),
            Err(DistributionError::WrongNumPools(3, 2))
        ));
    }

    #[test]
    fn set_pool_splits_remainder() {
        let dist = OccupancyDistribution::SetPool(PoolId(0), 0.4);

        assert_eq!(dist.values(3).unwrap(), vec![0.4, 0.3, 0.3]);
        assert_eq!(dist.share_of(PoolId(2), 3).unwrap(), 0.3);
    }

    #[test]
    fn set_pool_rejects_out_of_range_pool() {
        let dist = OccupancyDistribution::SetPool(PoolId(5), 0.4);

        assert!(matches!(
            dist.validate(2),
            Err(DistributionError::SetPoolBadPoolId(PoolId(5)))
        ));
    }
}
