//! Visibility and threshold planning.
//!
//! Plans are batches of surface operations computed against the active
//! layer set, applied together by the surface at its next paint
//! opportunity. Planning only mutates existing members; it never creates
//! or destroys layers.

use foundation::{ThresholdMap, Year};

use crate::active::ActiveLayerSet;
use crate::surface::{MinValueFilter, SurfaceOp};

/// Plans the switch to `year`.
///
/// Every member whose year differs is hidden; every member whose year
/// matches is shown with the filter `DN >= thresholds[dataset]`.
///
/// Ordering contract: hide operations precede show operations in the
/// returned batch, so no two layers transiently claim the same z-order.
/// Members already in the requested state produce no operation.
pub fn plan_show_year(
    active: &mut ActiveLayerSet,
    year: Year,
    thresholds: &ThresholdMap,
) -> Vec<SurfaceOp> {
    let mut hides = Vec::new();
    let mut shows = Vec::new();

    for (key, state) in active.iter_mut() {
        if key.year != year {
            if state.visible {
                state.visible = false;
                hides.push(SurfaceOp::SetVisibility {
                    key: key.clone(),
                    visible: false,
                });
            }
            continue;
        }

        let threshold = thresholds.get(&key.dataset);
        if state.threshold != threshold {
            state.threshold = threshold;
            shows.push(SurfaceOp::SetFilter {
                key: key.clone(),
                filter: MinValueFilter(threshold),
            });
        }
        if !state.visible {
            state.visible = true;
            shows.push(SurfaceOp::SetVisibility {
                key: key.clone(),
                visible: true,
            });
        }
    }

    hides.extend(shows);
    hides
}

/// Plans a threshold re-application for the currently displayed year only.
///
/// Other years are left alone; their filters are refreshed by the next
/// `plan_show_year` that makes them visible.
pub fn plan_apply_thresholds(
    active: &mut ActiveLayerSet,
    current_year: Year,
    thresholds: &ThresholdMap,
) -> Vec<SurfaceOp> {
    let mut batch = Vec::new();
    for (key, state) in active.iter_mut() {
        if key.year != current_year {
            continue;
        }
        let threshold = thresholds.get(&key.dataset);
        if state.threshold != threshold {
            state.threshold = threshold;
            batch.push(SurfaceOp::SetFilter {
                key: key.clone(),
                filter: MinValueFilter(threshold),
            });
        }
    }
    batch
}
