//! Grid topology (C3): abstract cell addressing, neighbor enumeration and the
//! edge-direction inverse map. Concrete topologies are the only grid-specific
//! knowledge anywhere in the engine.

use std::hash::Hash;

/// A capability describing the shape of the grid the engine collapses over.
///
/// `Coord` is whatever coordinate type is natural for the shape (a `(x, y)`
/// pair for square and triangular grids, axial coordinates for hex, a triple
/// for cube). Implementors only need to be internally consistent: `inverse`
/// must be the direction on a neighbor that faces back at `direction`, given
/// the orientation of the cell that `direction` was taken from.
pub trait Topology {
    type Coord: Copy + Eq + Hash + std::fmt::Debug;

    /// All cell coordinates, in a stable iteration order.
    fn coords(&self) -> Vec<Self::Coord>;

    /// Number of outgoing edges per cell (and hence the required `edges.len()`
    /// on every tile built for this topology).
    fn edge_count(&self) -> usize;

    /// Number of distinct orientations cells can have. 1 for topologies where
    /// every cell behaves identically (square, hex, cube); 2 for triangular
    /// grids, which alternate "up" and "down" triangles.
    fn orientation_count(&self) -> usize {
        1
    }

    /// The orientation tag of a given cell; always 0 when `orientation_count() == 1`.
    fn orientation(&self, coord: Self::Coord) -> usize {
        let _ = coord;
        0
    }

    /// The direction index on a neighbor, reached via `direction` from a cell
    /// of the given orientation, that points back at the original cell.
    fn inverse(&self, orientation: usize, direction: usize) -> usize;

    /// The coordinate reached by following `direction` from `coord`, or `None`
    /// if that step falls outside the grid. Out-of-bounds neighbors impose no
    /// constraint anywhere upstream.
    fn neighbor(&self, coord: Self::Coord, direction: usize) -> Option<Self::Coord>;
}

/// The four cardinal directions of [`SquareTopology`], in the fixed order used
/// throughout the engine: `Up=0, Right=1, Down=2, Left=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }
}

/// A finite rectangular grid of square cells.
#[derive(Debug, Clone)]
pub struct SquareTopology {
    pub width: usize,
    pub height: usize,
}

impl SquareTopology {
    pub fn new(width: usize, height: usize) -> Self {
        SquareTopology { width, height }
    }
}

impl Topology for SquareTopology {
    type Coord = (usize, usize);

    fn coords(&self) -> Vec<Self::Coord> {
        let mut out = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push((x, y));
            }
        }
        out
    }

    fn edge_count(&self) -> usize {
        4
    }

    fn inverse(&self, _orientation: usize, direction: usize) -> usize {
        (direction + 2) % 4
    }

    fn neighbor(&self, coord: Self::Coord, direction: usize) -> Option<Self::Coord> {
        let (x, y) = coord;
        match direction {
            0 => y.checked_sub(1).map(|y| (x, y)), // Up
            1 => (x + 1 < self.width).then(|| (x + 1, y)), // Right
            2 => (y + 1 < self.height).then(|| (x, y + 1)), // Down
            3 => x.checked_sub(1).map(|x| (x, y)), // Left
            _ => None,
        }
    }
}

/// A finite rectangular strip of triangles, alternating "up" (apex at the
/// top) and "down" (apex at the bottom) orientation by `(x + y) % 2`.
/// Directions: `0 = Left, 1 = Right` (within-row neighbors, orientation
/// independent), `2 = Base` (the cross-row neighbor an up-triangle shares its
/// base with below it, and a down-triangle shares its base with above it).
#[derive(Debug, Clone)]
pub struct TriangularTopology {
    pub width: usize,
    pub height: usize,
}

impl TriangularTopology {
    pub fn new(width: usize, height: usize) -> Self {
        TriangularTopology { width, height }
    }
}

impl Topology for TriangularTopology {
    type Coord = (usize, usize);

    fn coords(&self) -> Vec<Self::Coord> {
        let mut out = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push((x, y));
            }
        }
        out
    }

    fn edge_count(&self) -> usize {
        3
    }

    fn orientation_count(&self) -> usize {
        2
    }

    fn orientation(&self, coord: Self::Coord) -> usize {
        (coord.0 + coord.1) % 2
    }

    fn inverse(&self, _orientation: usize, direction: usize) -> usize {
        match direction {
            0 => 1, // Left <-> Right
            1 => 0,
            2 => 2, // Base <-> Base
            _ => direction,
        }
    }

    fn neighbor(&self, coord: Self::Coord, direction: usize) -> Option<Self::Coord> {
        let (x, y) = coord;
        let up = self.orientation(coord) == 0;
        match direction {
            0 => x.checked_sub(1).map(|x| (x, y)), // Left
            1 => (x + 1 < self.width).then(|| (x + 1, y)), // Right
            2 => {
                if up {
                    (y + 1 < self.height).then(|| (x, y + 1))
                } else {
                    y.checked_sub(1).map(|y| (x, y))
                }
            }
            _ => None,
        }
    }
}

/// An axial hexagonal grid bounded to a `width x height` rectangle of `(q, r)`
/// coordinates. Directions `0..6` follow the usual pointy-top axial order.
#[derive(Debug, Clone)]
pub struct HexTopology {
    pub width: i32,
    pub height: i32,
}

const HEX_DIRECTIONS: [(i32, i32); 6] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
];

impl HexTopology {
    pub fn new(width: i32, height: i32) -> Self {
        HexTopology { width, height }
    }
}

impl Topology for HexTopology {
    type Coord = (i32, i32);

    fn coords(&self) -> Vec<Self::Coord> {
        let mut out = Vec::with_capacity((self.width * self.height).max(0) as usize);
        for r in 0..self.height {
            for q in 0..self.width {
                out.push((q, r));
            }
        }
        out
    }

    fn edge_count(&self) -> usize {
        6
    }

    fn inverse(&self, _orientation: usize, direction: usize) -> usize {
        (direction + 3) % 6
    }

    fn neighbor(&self, coord: Self::Coord, direction: usize) -> Option<Self::Coord> {
        let (dq, dr) = HEX_DIRECTIONS[direction % 6];
        let (q, r) = (coord.0 + dq, coord.1 + dr);
        if q >= 0 && q < self.width && r >= 0 && r < self.height {
            Some((q, r))
        } else {
            None
        }
    }
}

/// A finite 3D grid of cube cells, `0..6` = `+X, -X, +Y, -Y, +Z, -Z`.
#[derive(Debug, Clone)]
pub struct CubeTopology {
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
}

const CUBE_DIRECTIONS: [(isize, isize, isize); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

impl CubeTopology {
    pub fn new(size_x: usize, size_y: usize, size_z: usize) -> Self {
        CubeTopology { size_x, size_y, size_z }
    }
}

impl Topology for CubeTopology {
    type Coord = (usize, usize, usize);

    fn coords(&self) -> Vec<Self::Coord> {
        let mut out = Vec::with_capacity(self.size_x * self.size_y * self.size_z);
        for z in 0..self.size_z {
            for y in 0..self.size_y {
                for x in 0..self.size_x {
                    out.push((x, y, z));
                }
            }
        }
        out
    }

    fn edge_count(&self) -> usize {
        6
    }

    fn inverse(&self, _orientation: usize, direction: usize) -> usize {
        direction ^ 1 // pairs (0,1) (2,3) (4,5)
    }

    fn neighbor(&self, coord: Self::Coord, direction: usize) -> Option<Self::Coord> {
        let (dx, dy, dz) = CUBE_DIRECTIONS[direction % 6];
        let x = coord.0 as isize + dx;
        let y = coord.1 as isize + dy;
        let z = coord.2 as isize + dz;
        if x >= 0
            && (x as usize) < self.size_x
            && y >= 0
            && (y as usize) < self.size_y
            && z >= 0
            && (z as usize) < self.size_z
        {
            Some((x as usize, y as usize, z as usize))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_inverse_is_involution() {
        let topo = SquareTopology::new(3, 3);
        for d in 0..4 {
            assert_eq!(topo.inverse(0, topo.inverse(0, d)), d);
        }
    }

    #[test]
    fn square_out_of_bounds_is_none() {
        let topo = SquareTopology::new(2, 2);
        assert_eq!(topo.neighbor((0, 0), 0), None); // Up from top row
        assert_eq!(topo.neighbor((0, 0), 3), None); // Left from left column
        assert_eq!(topo.neighbor((0, 0), 1), Some((1, 0)));
        assert_eq!(topo.neighbor((0, 0), 2), Some((0, 1)));
    }

    #[test]
    fn square_neighbor_inverse_points_back() {
        let topo = SquareTopology::new(4, 4);
        let coord = (1, 1);
        for d in 0..4 {
            if let Some(n) = topo.neighbor(coord, d) {
                let back = topo.inverse(topo.orientation(coord), d);
                assert_eq!(topo.neighbor(n, back), Some(coord));
            }
        }
    }

    #[test]
    fn triangular_orientation_alternates() {
        let topo = TriangularTopology::new(4, 4);
        assert_eq!(topo.orientation((0, 0)), 0);
        assert_eq!(topo.orientation((1, 0)), 1);
        assert_eq!(topo.orientation((0, 1)), 1);
    }

    #[test]
    fn triangular_base_neighbor_points_back() {
        let topo = TriangularTopology::new(4, 4);
        let up = (0, 0);
        let down = topo.neighbor(up, 2).unwrap();
        assert_eq!(topo.orientation(down), 1);
        let back_dir = topo.inverse(topo.orientation(up), 2);
        assert_eq!(topo.neighbor(down, back_dir), Some(up));
    }

    #[test]
    fn hex_inverse_pairs_opposite_directions() {
        let topo = HexTopology::new(5, 5);
        for d in 0..6 {
            assert_eq!(topo.inverse(0, d), (d + 3) % 6);
        }
    }

    #[test]
    fn hex_neighbor_round_trip() {
        let topo = HexTopology::new(5, 5);
        let coord = (2, 2);
        for d in 0..6 {
            if let Some(n) = topo.neighbor(coord, d) {
                assert_eq!(topo.neighbor(n, topo.inverse(0, d)), Some(coord));
            }
        }
    }

    #[test]
    fn cube_neighbor_round_trip() {
        let topo = CubeTopology::new(3, 3, 3);
        let coord = (1, 1, 1);
        for d in 0..6 {
            if let Some(n) = topo.neighbor(coord, d) {
                assert_eq!(topo.neighbor(n, topo.inverse(0, d)), Some(coord));
            }
        }
    }
}
