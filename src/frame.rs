use crate::lattice::{Energy, EnergyField, Lattice, Spin};

/// Number of distinct display levels.
pub(crate) const LEVELS: usize = 6;

/// Down spins are level 0; up spins climb 1..=5 with `|energy| / 4`.
#[inline]
pub(crate) fn level(spin: Spin, energy: Energy) -> u8 {
    if spin > 0 {
        energy.unsigned_abs() / 4 + 1
    } else {
        0
    }
}

/// Finished sweep handed to the renderer: one level per cell, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Frame {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) levels: Vec<u8>,
}

impl Frame {
    pub(crate) fn capture(lattice: &Lattice, field: &EnergyField) -> Self {
        debug_assert_eq!(
            (lattice.height(), lattice.width()),
            (field.height(), field.width())
        );
        let levels = lattice
            .spins()
            .iter()
            .zip(field.values())
            .map(|(&s, &e)| level(s, e))
            .collect();
        Self {
            width: lattice.width(),
            height: lattice.height(),
            levels,
        }
    }

    pub(crate) fn row(&self, i: usize) -> &[u8] {
        &self.levels[i * self.width..(i + 1) * self.width]
    }
}
