//! Trace conditioning and level conversion for the spectrum view.

/// Lowest level a spectrum bin reports, in dBV.
pub const DB_FLOOR: f64 = -140.0;

// Squared amplitudes at or below this read as the floor.
const POWER_EPSILON: f64 = 1.0e-20;

// 10 / ln(10): turns ln(V^2) into dBV.
const LN_TO_DB: f64 = 4.342_944_819_032_518;

/// Level in dBV of a squared peak amplitude, never below `floor`.
#[inline(always)]
pub fn power_to_db(power: f64, floor: f64) -> f64 {
    if power > POWER_EPSILON {
        (power.ln() * LN_TO_DB).max(floor)
    } else {
        floor
    }
}

/// Multiplies a trace by window coefficients of the same length.
#[inline]
pub fn apply_window(buffer: &mut [f64], window: &[f64]) {
    debug_assert_eq!(buffer.len(), window.len());
    for (sample, coeff) in buffer.iter_mut().zip(window.iter()) {
        *sample *= *coeff;
    }
}

/// Subtracts the trace mean so a DC offset does not leak into the low bins.
pub fn remove_dc(buffer: &mut [f64]) {
    if buffer.is_empty() {
        return;
    }

    let mean = buffer.iter().sum::<f64>() / buffer.len() as f64;
    if mean.abs() <= f64::EPSILON {
        return;
    }

    for sample in buffer.iter_mut() {
        *sample -= mean;
    }
}
