//! Pure points engine for the Throwdown challenge tracker.
//!
//! Three functions, no state, no side effects:
//!
//! - [`nominal_points`] -- base point value for an activity before capping
//! - [`clamp_to_weekly_cap`] -- enforce the per-player weekly cap
//! - [`weight_loss_points`] -- monotonic cumulative weight-loss grants
//!
//! All integer arithmetic saturates. Weight arithmetic uses [`Decimal`] —
//! no floating point anywhere in point calculations.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use throwdown_types::{ActivityKind, ActivityPoints};

/// Base (uncapped) point value for an activity.
///
/// Flat kinds ignore the magnitude; scaled kinds multiply their per-unit
/// value by it. The synthetic [`ActivityKind::WeighInTotal`] kind is worth
/// nothing here — its points come from [`weight_loss_points`].
pub fn nominal_points(kind: ActivityKind, magnitude: u32, points: &ActivityPoints) -> u32 {
    match kind {
        ActivityKind::Workout => points.workout,
        ActivityKind::Steps5k => points.steps5k.saturating_mul(magnitude),
        ActivityKind::Active10Min => points.active10_min.saturating_mul(magnitude),
        ActivityKind::PersonalRecord => points.pr,
        ActivityKind::WeighInTotal => 0,
    }
}

/// Clamp a nominal grant so a player's weekly total never exceeds the cap.
///
/// Returns the amount to actually credit. Excess activity is recorded with
/// zero credited points rather than rejected, so logging stays lossless even
/// at the cap.
pub fn clamp_to_weekly_cap(nominal: u32, already_used_this_week: u32, cap: u32) -> u32 {
    nominal.min(cap.saturating_sub(already_used_this_week))
}

/// Points to grant for cumulative weight loss, given what was already
/// awarded.
///
/// The entitlement is `floor(total_loss_lb * points_per_lb)`; the grant is
/// the entitlement minus `already_awarded`, floored at zero. Weight gain
/// shrinks the entitlement below the awarded total, which yields a zero
/// grant — never a negative one, and never a clawback. Total awarded points
/// are therefore monotonic across arbitrary weight fluctuation.
///
/// A non-positive `total_loss_lb` (no loss, or a gain past the start
/// weight) yields a zero entitlement.
pub fn weight_loss_points(total_loss_lb: Decimal, points_per_lb: u32, already_awarded: u32) -> u32 {
    let loss = total_loss_lb.max(Decimal::ZERO);
    let entitled = loss
        .saturating_mul(Decimal::from(points_per_lb))
        .floor()
        .to_u32()
        .unwrap_or(u32::MAX);
    entitled.saturating_sub(already_awarded)
}
