use crate::error::Result;
use crate::lattice::{random_spin, Lattice};
use rand::Rng;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Set from the input listener when the display changes size; consumed by
/// the simulation loop at a sweep boundary.
#[derive(Clone, Debug, Default)]
pub(crate) struct ResizeFlag(Arc<AtomicBool>);

impl ResizeFlag {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Safe to call from any context: it only stores a bool.
    pub(crate) fn notify(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clears the flag and reports whether it was set.
    pub(crate) fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Source of the current display size, in grid cells as `(height, width)`.
pub(crate) trait DisplayProbe {
    fn dimensions(&self) -> io::Result<(usize, usize)>;
}

/// Queries `probe`, falling back to `default` when the query fails or
/// reports an empty area.
pub(crate) fn dimensions_or<P: DisplayProbe + ?Sized>(
    probe: &P,
    default: (usize, usize),
) -> (usize, usize) {
    match probe.dimensions() {
        Ok((h, w)) if h > 0 && w > 0 => (h, w),
        Ok((h, w)) => {
            tracing::warn!(height = h, width = w, "display reported an empty area, using default size");
            default
        }
        Err(err) => {
            tracing::warn!(%err, "display size query failed, using default size");
            default
        }
    }
}

/// Where the grid size comes from: explicit overrides win, the display
/// fills in whatever is left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SizePolicy {
    pub(crate) height: Option<usize>,
    pub(crate) width: Option<usize>,
    pub(crate) fallback: (usize, usize),
}

impl SizePolicy {
    pub(crate) fn resolve<P: DisplayProbe + ?Sized>(&self, probe: &P) -> (usize, usize) {
        if let (Some(h), Some(w)) = (self.height, self.width) {
            return (h, w);
        }
        let (h, w) = dimensions_or(probe, self.fallback);
        (self.height.unwrap_or(h), self.width.unwrap_or(w))
    }
}

/// Builds a `height` x `width` lattice that keeps the overlapping top-left
/// rectangle of `old` and draws fresh random spins everywhere else.
pub(crate) fn resized<R: Rng + ?Sized>(
    old: &Lattice,
    height: usize,
    width: usize,
    rng: &mut R,
) -> Result<Lattice> {
    let keep_h = old.height().min(height);
    let keep_w = old.width().min(width);
    Lattice::from_fn(height, width, |i, j| {
        if i < keep_h && j < keep_w {
            old.get(i, j)
        } else {
            random_spin(rng)
        }
    })
}
