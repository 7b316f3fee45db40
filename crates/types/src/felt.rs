//! Scalars of the prime field used by the bridge hash.
//!
//! The modulus is `p = 2^64 - 2^32 + 1`, chosen so that every canonical
//! value fits in a single machine word. All hashed leaves and map-key
//! material must be canonical (`< p`); wider integers go through the
//! based-list codec first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// The field modulus, `2^64 - 2^32 + 1`.
pub const P: u64 = 0xFFFF_FFFF_0000_0001;

/// A canonical field element.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Felt(u64);

impl Felt {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);

    /// Wraps a canonical representative. `None` when `raw >= P`.
    pub const fn new(raw: u64) -> Option<Self> {
        if raw < P {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Reduces an arbitrary integer into the field.
    pub const fn reduce(raw: u128) -> Self {
        Self((raw % P as u128) as u64)
    }

    /// The canonical representative.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// `self^7`, the non-linear layer exponent of the sponge.
    pub fn pow7(self) -> Self {
        let x2 = self * self;
        let x4 = x2 * x2;
        x4 * x2 * self
    }
}

impl Add for Felt {
    type Output = Felt;

    fn add(self, rhs: Felt) -> Felt {
        Felt::reduce(self.0 as u128 + rhs.0 as u128)
    }
}

impl Sub for Felt {
    type Output = Felt;

    fn sub(self, rhs: Felt) -> Felt {
        Felt::reduce(P as u128 + self.0 as u128 - rhs.0 as u128)
    }
}

impl Mul for Felt {
    type Output = Felt;

    fn mul(self, rhs: Felt) -> Felt {
        Felt::reduce(self.0 as u128 * rhs.0 as u128)
    }
}

impl From<Felt> for u64 {
    fn from(value: Felt) -> u64 {
        value.0
    }
}

impl fmt::Debug for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Felt({})", self.0)
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
