//! Pool identifiers and the spatial arrangement of pools.

/// Unique identifier of a pool. Corresponds to an index into the row-major
/// ordering of a [`PoolLayout`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolId(pub(crate) usize);

impl PoolId {
    /// Returns the [`usize`] corresponding to this [`PoolId`].
    pub fn get(&self) -> usize {
        self.0
    }
}

impl From<usize> for PoolId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for PoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Arrangement of the pools agents can occupy: a line of `width` pools, or a
/// `width` by `height` lattice. The two shapes differ only in `height`, so a
/// single layout type covers both model variants.
///
/// Pool ids are assigned in row-major order. Edges do not wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLayout {
    width: usize,
    height: usize,
}

impl PoolLayout {
    /// Creates a `width` by `height` lattice of pools.
    ///
    /// ## Panics
    /// Panics if either dimension is 0.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(
            width > 0 && height > 0,
            "pool layout dimensions must be greater than 0"
        );
        PoolLayout { width, height }
    }

    /// Creates a 1-dimensional line of `width` pools.
    ///
    /// ## Panics
    /// Panics if `width` is 0.
    pub fn line(width: usize) -> Self {
        Self::new(width, 1)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of pools in the layout.
    #[inline]
    pub fn num_pools(&self) -> usize {
        self.width * self.height
    }

    /// Returns true iff `pool` is within this layout.
    #[inline]
    pub fn contains(&self, pool: PoolId) -> bool {
        pool.0 < self.num_pools()
    }

    /// Returns the `(x, y)` coordinates of `pool`.
    ///
    /// ## Panics
    /// Panics if `pool` is outside the layout.
    pub fn coords(&self, pool: PoolId) -> (usize, usize) {
        assert!(
            self.contains(pool),
            "pool {} is outside the {}x{} layout",
            pool,
            self.width,
            self.height
        );
        (pool.0 % self.width, pool.0 / self.width)
    }

    /// Returns the pool at `(x, y)`.
    ///
    /// ## Panics
    /// Panics if `(x, y)` is outside the layout.
    pub fn id_at(&self, x: usize, y: usize) -> PoolId {
        assert!(
            x < self.width && y < self.height,
            "({}, {}) is outside the {}x{} layout",
            x,
            y,
            self.width,
            self.height
        );
        PoolId(y * self.width + x)
    }

    /// Returns an iterator over every pool in the layout, in id order.
    pub fn pools(&self) -> impl Iterator<Item = PoolId> {
        (0..self.num_pools()).map(PoolId)
    }

    /// Returns the Moore neighborhood of `pool`: every directly or diagonally
    /// adjacent pool, excluding `pool` itself. Pools along an edge have
    /// clipped neighborhoods, and with `height == 1` the neighborhood reduces
    /// to the adjacent pools on the line.
    ///
    /// The only empty neighborhood is that of the single pool in a 1x1
    /// layout.
    ///
    /// ## Panics
    /// Panics if `pool` is outside the layout.
    pub fn neighbors(&self, pool: PoolId) -> Vec<PoolId> {
        let (x, y) = self.coords(pool);

        let mut neighborhood = Vec::with_capacity(8);
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0
                    || ny < 0
                    || nx >= self.width as i64
                    || ny >= self.height as i64
                {
                    continue;
                }

                neighborhood.push(self.id_at(nx as usize, ny as usize));
            }
        }

        neighborhood
    }
}

#[cfg(test)]
mod tests {
    use super::{PoolId, PoolLayout};

    #[test]
    fn line_neighbors_are_adjacent() {
        let layout = PoolLayout::line(4);

        assert_eq!(layout.neighbors(PoolId(0)), vec![PoolId(1)]);
        assert_eq!(layout.neighbors(PoolId(1)), vec![PoolId(0), PoolId(2)]);
        assert_eq!(layout.neighbors(PoolId(3)), vec![PoolId(2)]);
    }

    #[test]
    fn two_pool_line_has_single_candidate() {
        let layout = PoolLayout::line(2);

        assert_eq!(layout.neighbors(PoolId(0)), vec![PoolId(1)]);
        assert_eq!(layout.neighbors(PoolId(1)), vec![PoolId(0)]);
    }

    #[test]
    fn lattice_neighborhoods_clip_at_edges() {
        let layout = PoolLayout::new(10, 10);

        // Corner, edge, and interior pools of a non-toroidal lattice.
        assert_eq!(layout.neighbors(layout.id_at(0, 0)).len(), 3);
        assert_eq!(layout.neighbors(layout.id_at(5, 0)).len(), 5);
        assert_eq!(layout.neighbors(layout.id_at(5, 5)).len(), 8);
    }

    #[test]
    fn neighborhood_excludes_center() {
        let layout = PoolLayout::new(3, 3);
        let center = layout.id_at(1, 1);

        assert!(!layout.neighbors(center).contains(&center));
    }

    #[test]
    fn single_pool_has_no_neighbors() {
        let layout = PoolLayout::new(1, 1);

        assert!(layout.neighbors(PoolId(0)).is_empty());
    }

    #[test]
    fn coords_round_trip() {
        let layout = PoolLayout::new(4, 3);

        for pool in layout.pools() {
            let (x, y) = layout.coords(pool);
            assert_eq!(layout.id_at(x, y), pool);
        }
    }
}
