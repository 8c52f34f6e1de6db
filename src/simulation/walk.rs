//! Bounded random walk.
//!
//! `next = clamp(value + uniform(-step, +step), min, max)`. A value already
//! outside its interval (e.g. from an external feed) is pulled back inside
//! on its next step.

use rand::Rng;

use crate::model::FieldError;
use crate::simulation::bounds::FieldBounds;

/// Advances `value` by one bounded random step.
///
/// Fails without consuming randomness when the current value or the bounds
/// are malformed; callers keep the previous value in that case.
pub fn step<R: Rng + ?Sized>(value: f64, bounds: &FieldBounds, rng: &mut R) -> Result<f64, FieldError> {
    if !bounds.is_valid() {
        return Err(FieldError::InvalidBounds {
            field: bounds.name,
            min: bounds.min,
            max: bounds.max,
            step: bounds.step,
        });
    }
    if !value.is_finite() {
        return Err(FieldError::NonFinite {
            field: bounds.name,
            value,
        });
    }

    let delta = rng.gen_range(-bounds.step..=bounds.step);
    Ok((value + delta).clamp(bounds.min, bounds.max))
}

/// Integer variant: the walk runs on the real line and the result is rounded.
pub fn step_count<R: Rng + ?Sized>(value: u32, bounds: &FieldBounds, rng: &mut R) -> Result<u32, FieldError> {
    let next = step(f64::from(value), bounds, rng)?;
    Ok(next.round() as u32)
}

/// Applies `step` in place, keeping the previous value on failure.
pub fn advance<R: Rng + ?Sized>(
    field: &mut f64,
    bounds: &FieldBounds,
    rng: &mut R,
) -> Result<(), FieldError> {
    *field = step(*field, bounds, rng)?;
    Ok(())
}
