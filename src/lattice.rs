use crate::error::{Error, Result};
use rand::Rng;

pub(crate) type Spin = i8;
pub(crate) type Energy = i8;

pub(crate) const UP: Spin = 1;
pub(crate) const DOWN: Spin = -1;

/// Largest accepted height or width.
pub(crate) const MAX_DIMENSION: usize = 4096;

pub(crate) fn random_spin<R: Rng + ?Sized>(rng: &mut R) -> Spin {
    if rng.gen_bool(0.5) {
        UP
    } else {
        DOWN
    }
}

fn alloc<T: Copy>(height: usize, width: usize, fill: T) -> Result<Vec<T>> {
    if !(1..=MAX_DIMENSION).contains(&height) || !(1..=MAX_DIMENSION).contains(&width) {
        return Err(Error::InvalidDimensions {
            height,
            width,
            max: MAX_DIMENSION,
        });
    }
    let n = height
        .checked_mul(width)
        .ok_or(Error::Allocation { height, width })?;
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(n)
        .map_err(|_| Error::Allocation { height, width })?;
    cells.resize(n, fill);
    Ok(cells)
}

/// Row-major toroidal grid of spins. Every cell holds `UP` or `DOWN`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Lattice {
    w: usize,
    h: usize,
    spins: Vec<Spin>,
}

impl Lattice {
    pub(crate) fn random<R: Rng + ?Sized>(height: usize, width: usize, rng: &mut R) -> Result<Self> {
        Self::from_fn(height, width, |_, _| random_spin(rng))
    }

    /// Builds a lattice cell by cell; `f` gets `(row, col)` and must yield a spin.
    pub(crate) fn from_fn(
        height: usize,
        width: usize,
        mut f: impl FnMut(usize, usize) -> Spin,
    ) -> Result<Self> {
        let mut spins = alloc(height, width, UP)?;
        for i in 0..height {
            for j in 0..width {
                let s = f(i, j);
                debug_assert!(s == UP || s == DOWN, "spin out of domain: {s}");
                spins[i * width + j] = s;
            }
        }
        Ok(Self {
            w: width,
            h: height,
            spins,
        })
    }

    pub(crate) fn width(&self) -> usize {
        self.w
    }

    pub(crate) fn height(&self) -> usize {
        self.h
    }

    #[inline]
    pub(crate) fn get(&self, i: usize, j: usize) -> Spin {
        self.spins[i * self.w + j]
    }

    pub(crate) fn spins(&self) -> &[Spin] {
        &self.spins
    }

    #[inline]
    pub(crate) fn flip_index(&mut self, k: usize) {
        self.spins[k] = -self.spins[k];
    }

    /// Sum of the 8 wrapped neighbours of `(i, j)`, using plain modulo arithmetic.
    #[cfg(test)]
    pub(crate) fn neighbor_sum(&self, i: usize, j: usize) -> i8 {
        let (h, w) = (self.h as isize, self.w as isize);
        let mut sum = 0;
        for di in [-1isize, 0, 1] {
            for dj in [-1isize, 0, 1] {
                if di == 0 && dj == 0 {
                    continue;
                }
                let ii = (i as isize + di).rem_euclid(h) as usize;
                let jj = (j as isize + dj).rem_euclid(w) as usize;
                sum += self.get(ii, jj);
            }
        }
        sum
    }

    /// Local energy of a single cell, the slow way.
    #[cfg(test)]
    pub(crate) fn local_energy(&self, i: usize, j: usize) -> Energy {
        2 * self.get(i, j) * self.neighbor_sum(i, j)
    }
}

/// Per-cell `2 * spin * neighbour_sum`, rebuilt from scratch every sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnergyField {
    w: usize,
    h: usize,
    values: Vec<Energy>,
}

impl EnergyField {
    pub(crate) fn zeroed(height: usize, width: usize) -> Result<Self> {
        Ok(Self {
            w: width,
            h: height,
            values: alloc(height, width, 0)?,
        })
    }

    pub(crate) fn width(&self) -> usize {
        self.w
    }

    pub(crate) fn height(&self) -> usize {
        self.h
    }

    #[cfg(test)]
    pub(crate) fn get(&self, i: usize, j: usize) -> Energy {
        self.values[i * self.w + j]
    }

    pub(crate) fn values(&self) -> &[Energy] {
        &self.values
    }

    /// Recomputes every cell from `lattice`. Only the first and last columns
    /// wrap; interior columns index their neighbours directly.
    pub(crate) fn compute(&mut self, lattice: &Lattice) {
        assert_eq!(
            (self.h, self.w),
            (lattice.h, lattice.w),
            "energy field and lattice disagree on size"
        );
        let (h, w) = (lattice.h, lattice.w);
        let s = &lattice.spins;

        for i in 0..h {
            let up = ((i + h - 1) % h) * w;
            let mid = i * w;
            let down = ((i + 1) % h) * w;

            let cell = |j: usize, l: usize, r: usize| -> Energy {
                let sum = s[up + l] + s[up + j] + s[up + r]
                    + s[mid + l] + s[mid + r]
                    + s[down + l] + s[down + j] + s[down + r];
                2 * s[mid + j] * sum
            };

            self.values[mid] = cell(0, w - 1, 1 % w);
            for j in 1..w.saturating_sub(1) {
                self.values[mid + j] = cell(j, j - 1, j + 1);
            }
            if w > 1 {
                self.values[mid + w - 1] = cell(w - 1, w - 2, 0);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn filled(height: usize, width: usize, e: Energy) -> Self {
        Self {
            w: width,
            h: height,
            values: vec![e; width * height],
        }
    }
}
