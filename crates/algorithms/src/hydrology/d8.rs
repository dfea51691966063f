//! D8 direction codec
//!
//! Flow-direction grids store, for each cell, the neighbour that receives its
//! flow as a power of two, clockwise from north-east:
//! ```text
//!   64  128   1
//!   32   x    2
//!   16   8    4
//! ```
//! Zero, negative and no-data cells have no downstream neighbour (pits,
//! outlets, cells outside the study area). Any other value is malformed and
//! is treated as terminal too, but reported separately.

/// One of the eight D8 neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum D8Direction {
    NorthEast = 1,
    East = 2,
    SouthEast = 4,
    South = 8,
    SouthWest = 16,
    West = 32,
    NorthWest = 64,
    North = 128,
}

/// (row, col) offsets indexed by `log2(code)`
const OFFSETS: [(isize, isize); 8] = [
    (-1, 1),  // 1: NE
    (0, 1),   // 2: E
    (1, 1),   // 4: SE
    (1, 0),   // 8: S
    (1, -1),  // 16: SW
    (0, -1),  // 32: W
    (-1, -1), // 64: NW
    (-1, 0),  // 128: N
];

impl D8Direction {
    /// All directions in code order
    pub const ALL: [D8Direction; 8] = [
        D8Direction::NorthEast,
        D8Direction::East,
        D8Direction::SouthEast,
        D8Direction::South,
        D8Direction::SouthWest,
        D8Direction::West,
        D8Direction::NorthWest,
        D8Direction::North,
    ];

    /// Position in [`D8Direction::ALL`], `log2(code)`
    pub fn index(self) -> usize {
        (self as u8).trailing_zeros() as usize
    }

    /// Encoded value as stored in a flow-direction grid
    pub fn code(self) -> f64 {
        f64::from(self as u8)
    }

    /// (Δrow, Δcol) to the receiving neighbour
    pub fn offset(self) -> (isize, isize) {
        OFFSETS[self.index()]
    }

    pub fn is_diagonal(self) -> bool {
        let (dr, dc) = self.offset();
        dr != 0 && dc != 0
    }

    /// The direction pointing back at this cell from its receiver
    pub fn opposite(self) -> D8Direction {
        D8Direction::ALL[(self.index() + 4) % 8]
    }

    /// Exact power-of-two code in `1..=128`, anything else is `None`.
    pub fn from_code(code: f64) -> Option<D8Direction> {
        if !(1.0..=128.0).contains(&code) || code.fract() != 0.0 {
            return None;
        }
        let code = code as u32;
        if !code.is_power_of_two() {
            return None;
        }
        Some(D8Direction::ALL[code.trailing_zeros() as usize])
    }
}

/// Outcome of decoding one flow-direction cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    /// No downstream neighbour: no-data, zero or negative.
    Terminal,
    /// Flow leaves towards this neighbour.
    Step(D8Direction),
    /// Not a D8 code. Walks stop here as if it were terminal.
    Malformed(f64),
}

/// Decode a stored flow-direction value.
pub fn decode(value: f64, nodata: f64) -> Decoded {
    if value.is_nan() || value == nodata || value <= 0.0 {
        return Decoded::Terminal;
    }
    match D8Direction::from_code(value) {
        Some(dir) => Decoded::Step(dir),
        None => Decoded::Malformed(value),
    }
}
