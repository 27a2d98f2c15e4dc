use crate::lattice::{Energy, EnergyField, Lattice};
use rand::Rng;

/// Decides whether one cell flips, given its start-of-sweep energy.
#[inline]
fn should_flip<R: Rng + ?Sized>(e: Energy, probability: f64, temperature: f64, rng: &mut R) -> bool {
    if rng.gen::<f64>() >= probability {
        return false;
    }
    if e < 0 {
        return true;
    }
    rng.gen::<f64>() < (-f64::from(e) / temperature).exp()
}

/// One synchronous sweep: every decision reads `field`, which must have been
/// computed from `lattice` before any cell in this sweep changed.
///
/// `temperature` must be strictly positive; the parameter store and config
/// validation guarantee this.
pub(crate) fn apply_update<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    field: &EnergyField,
    probability: f64,
    temperature: f64,
    rng: &mut R,
) {
    debug_assert!(temperature > 0.0, "non-positive temperature {temperature}");
    debug_assert_eq!(lattice.spins().len(), field.values().len());

    for (k, &e) in field.values().iter().enumerate() {
        if should_flip(e, probability, temperature, rng) {
            lattice.flip_index(k);
        }
    }
}
