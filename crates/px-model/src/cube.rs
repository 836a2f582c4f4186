//! Mixed-radix addressing of the data cube.
//!
//! Cell order is the cross product of the variables in declaration order,
//! the last variable varying fastest. Nothing here depends on the order in
//! which a source table happened to deliver its rows.

/// Shape of a data cube: the number of value codes per variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeShape {
    sizes: Vec<usize>,
}

impl CubeShape {
    pub fn new(sizes: Vec<usize>) -> Self {
        Self { sizes }
    }

    /// Total number of cells, or `None` when it does not fit in `usize`.
    /// An empty shape has no cells.
    pub fn checked_cell_count(&self) -> Option<usize> {
        if self.sizes.is_empty() {
            return Some(0);
        }
        self.sizes
            .iter()
            .try_fold(1usize, |count, &size| count.checked_mul(size))
    }

    /// Total number of cells, saturating at `usize::MAX`.
    pub fn cell_count(&self) -> usize {
        self.checked_cell_count().unwrap_or(usize::MAX)
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.sizes.len()
    }

    /// Flat index of a coordinate, or `None` when out of range.
    pub fn index_of(&self, coordinate: &[usize]) -> Option<usize> {
        if coordinate.len() != self.sizes.len() {
            return None;
        }
        let mut index = 0usize;
        for (&position, &size) in coordinate.iter().zip(&self.sizes) {
            if position >= size {
                return None;
            }
            index = index * size + position;
        }
        Some(index)
    }

    /// Coordinate of a flat index.
    pub fn coordinate_of(&self, mut index: usize) -> Option<Vec<usize>> {
        if index >= self.cell_count() {
            return None;
        }
        let mut coordinate = vec![0; self.sizes.len()];
        for (slot, &size) in coordinate.iter_mut().zip(&self.sizes).rev() {
            *slot = index % size;
            index /= size;
        }
        Some(coordinate)
    }

    /// Cells per row when the trailing `heading_rank` dimensions form the
    /// columns of the printed table.
    pub fn row_width(&self, heading_rank: usize) -> usize {
        let start = self.sizes.len().saturating_sub(heading_rank);
        self.sizes[start..]
            .iter()
            .try_fold(1usize, |width, &size| width.checked_mul(size))
            .unwrap_or(usize::MAX)
            .max(1)
    }
}
