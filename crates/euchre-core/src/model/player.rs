use core::fmt;
use serde::{Deserialize, Serialize};

/// Table seat. Seats are numbered clockwise; `P1`/`P3` and `P2`/`P4` are partners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Seat {
    P1 = 0,
    P2 = 1,
    P3 = 2,
    P4 = 3,
}

impl Seat {
    pub const LOOP: [Seat; 4] = [Seat::P1, Seat::P2, Seat::P3, Seat::P4];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Seat::P1),
            1 => Some(Seat::P2),
            2 => Some(Seat::P3),
            3 => Some(Seat::P4),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn next(self) -> Seat {
        match self {
            Seat::P1 => Seat::P2,
            Seat::P2 => Seat::P3,
            Seat::P3 => Seat::P4,
            Seat::P4 => Seat::P1,
        }
    }

    pub const fn partner(self) -> Seat {
        match self {
            Seat::P1 => Seat::P3,
            Seat::P2 => Seat::P4,
            Seat::P3 => Seat::P1,
            Seat::P4 => Seat::P2,
        }
    }

    pub const fn team(self) -> Team {
        match self {
            Seat::P1 | Seat::P3 => Team::A,
            Seat::P2 | Seat::P4 => Team::B,
        }
    }

    /// Seats in clockwise order starting with `self`.
    pub fn clockwise(self) -> [Seat; 4] {
        let first = self;
        let second = first.next();
        let third = second.next();
        [first, second, third, third.next()]
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.index() + 1)
    }
}

/// Partnership. Displayed as `Team 0` / `Team 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Team {
    A = 0,
    B = 1,
}

impl Team {
    pub const BOTH: [Team; 2] = [Team::A, Team::B];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn other(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team {}", self.index())
    }
}
