//! Target acceleration to drive level conversion
//!
//! Factory calibration characterizes each actuator as a polynomial mapping
//! drive level (volts peak) to measured acceleration (g). Producing a given
//! acceleration means inverting that polynomial in closed form and checking
//! the root against the range the driver can physically produce.

/// Tolerance for every zero comparison in this module
pub const FLOAT_EPS: f64 = 1e-6;

/// Highest drive level the amplifier can produce, volts peak
pub const LEVEL_MAX: f64 = 3.2;

/// Fixed gain of the over-drive clamp register, volts per code
const OD_CLAMP_VOLTS_PER_CODE: f64 = 21.32 / 1000.0;

/// Attenuation resolution of digital scale registers, dB
const ATTENUATION_STEP_DB: f64 = 0.125;

/// Calibrated transfer function of one actuator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferCurve {
    /// `g = slope·level + intercept`
    Linear { slope: f64, intercept: f64 },
    /// `g = a·level³ + b·level² + c·level + d`
    Cubic([f64; 4]),
}

impl TransferCurve {
    /// Interpret persisted coefficients. Records whose trailing two
    /// coefficients are zero hold a straight line in the first two.
    pub fn from_coeffs(coeffs: [f32; 4]) -> Self {
        let [a, b, c, d] = coeffs.map(f64::from);
        if is_zero(c) && is_zero(d) {
            TransferCurve::Linear {
                slope: a,
                intercept: b,
            }
        } else {
            TransferCurve::Cubic([a, b, c, d])
        }
    }

    /// Drive level producing `target_g`, or 0 if none is reachable
    pub fn level_for(&self, target_g: f64) -> f64 {
        match *self {
            TransferCurve::Linear { slope, intercept } => solve_linear(slope, intercept, target_g),
            TransferCurve::Cubic(coeffs) => solve_cubic(coeffs, target_g),
        }
    }
}

fn is_zero(value: f64) -> bool {
    value.abs() <= FLOAT_EPS
}

fn valid_level(level: f64) -> Option<f64> {
    (level.is_finite() && level > FLOAT_EPS && level <= LEVEL_MAX).then_some(level)
}

fn first_valid(candidates: impl IntoIterator<Item = f64>) -> f64 {
    candidates
        .into_iter()
        .find_map(valid_level)
        .unwrap_or(0.0)
}

/// Solve `slope·level + intercept = target_g`
pub fn solve_linear(slope: f64, intercept: f64, target_g: f64) -> f64 {
    if is_zero(slope) {
        return 0.0;
    }
    first_valid([(target_g - intercept) / slope])
}

/// Solve `b·level² + c·level + d = target_g`, smallest valid root first
fn solve_quadratic(b: f64, c: f64, d: f64, target_g: f64) -> f64 {
    let e = d - target_g;
    let discriminant = c * c - 4.0 * b * e;
    if discriminant < -FLOAT_EPS {
        return 0.0;
    }
    let root = discriminant.max(0.0).sqrt();
    let mut candidates = [(-c - root) / (2.0 * b), (-c + root) / (2.0 * b)];
    candidates.sort_by(f64::total_cmp);
    first_valid(candidates)
}

/// Solve `a·level³ + b·level² + c·level + d = target_g` with Shengjin's
/// discriminants.
///
/// With `e = d - target_g` the auxiliary quantities are
///
/// ```text
/// A = b² - 3ac      B = bc - 9ae      C = c² - 3be      Δ = B² - 4AC
/// ```
///
/// * `A = B = 0`: triple root `-b / 3a`.
/// * `Δ > 0`: one real root `(-b - (∛Y₁ + ∛Y₂)) / 3a` with
///   `Y₁,₂ = Ab + 3a(-B ± √Δ) / 2`. `Y₁` and `Y₂` are real but either may be
///   negative. The real cube root of a negative number is the negated cube
///   root of its magnitude, so each sign pattern flips the sign of the
///   matching term rather than feeding a negative base to `powf`.
/// * `Δ < 0`: three real roots from `θ = acos((2Ab - 3aB) / 2A√A)`.
/// * `Δ = 0`: with `K = B/A`, roots `-b/a + K` and the double root `-K/2`.
///
/// Degenerate leading coefficients drop to the quadratic or linear form.
pub fn solve_cubic(coeffs: [f64; 4], target_g: f64) -> f64 {
    let [a, b, c, d] = coeffs;
    if is_zero(a) {
        if is_zero(b) {
            return solve_linear(c, d, target_g);
        }
        return solve_quadratic(b, c, d, target_g);
    }

    let e = d - target_g;
    let aa = b * b - 3.0 * a * c;
    let bb = b * c - 9.0 * a * e;
    let cc = c * c - 3.0 * b * e;
    let delta = bb * bb - 4.0 * aa * cc;

    if is_zero(aa) && is_zero(bb) {
        return first_valid([-b / (3.0 * a)]);
    }

    if delta > FLOAT_EPS {
        let sqrt_delta = delta.sqrt();
        let y1 = aa * b + 3.0 * a * (-bb + sqrt_delta) / 2.0;
        let y2 = aa * b + 3.0 * a * (-bb - sqrt_delta) / 2.0;
        let one_third = 1.0 / 3.0;

        let numerator = if y1 < -FLOAT_EPS && y2 > FLOAT_EPS {
            -b + (-y1).powf(one_third) - y2.powf(one_third)
        } else if y1 > FLOAT_EPS && y2 < -FLOAT_EPS {
            -b - y1.powf(one_third) + (-y2).powf(one_third)
        } else if y1 < -FLOAT_EPS && y2 < -FLOAT_EPS {
            -b + (-y1).powf(one_third) + (-y2).powf(one_third)
        } else {
            // Both non-negative, or one of them within tolerance of zero
            -b - y1.cbrt() - y2.cbrt()
        };
        return first_valid([numerator / (3.0 * a)]);
    }

    if delta < -FLOAT_EPS {
        if aa <= FLOAT_EPS {
            return 0.0;
        }
        let sqrt_a = aa.sqrt();
        let t = ((2.0 * aa * b - 3.0 * a * bb) / (2.0 * aa * sqrt_a)).clamp(-1.0, 1.0);
        let theta = t.acos();
        let cos_third = (theta / 3.0).cos();
        let sin_third_sqrt3 = 3f64.sqrt() * (theta / 3.0).sin();

        return first_valid([
            (-b - 2.0 * sqrt_a * cos_third) / (3.0 * a),
            (-b + sqrt_a * (cos_third + sin_third_sqrt3)) / (3.0 * a),
            (-b + sqrt_a * (cos_third - sin_third_sqrt3)) / (3.0 * a),
        ]);
    }

    if is_zero(aa) {
        return 0.0;
    }
    let k = bb / aa;
    first_valid([-b / a + k, -k / 2.0])
}

/// Convert between LRA period (device ticks) and frequency (Hz). The
/// relation is its own inverse.
pub fn freq_period(value: u32) -> u32 {
    let divisor = 24_615u64 * u64::from(value);
    if divisor == 0 {
        return 0;
    }
    (1_000_000_000u64 / divisor) as u32
}

/// Period after lowering the resonant frequency by `shift` Hz. Falls back to
/// `period` when the shift would not leave a positive frequency.
pub fn shifted_period(period: u32, shift: u32) -> u32 {
    freq_period(period)
        .checked_sub(shift)
        .filter(|frequency| *frequency > 0)
        .map(freq_period)
        .filter(|shifted| *shifted > 0)
        .unwrap_or(period)
}

/// Over-drive clamp code for a drive level at the given LRA period
pub fn level_to_od_clamp(level: f64, lra_period: u32) -> u32 {
    let frequency = f64::from(freq_period(lra_period));
    let radicand = 1.0 - frequency * 8.0 / 10_000.0;
    if radicand <= FLOAT_EPS || level <= 0.0 {
        return 0;
    }
    let od_clamp = level / (OD_CLAMP_VOLTS_PER_CODE * radicand.sqrt());
    od_clamp.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Attenuation in 1/8 dB steps for a fraction of full scale in (0, 1]
pub fn attenuation_steps(fraction: f64) -> u32 {
    if fraction <= 0.0 || !fraction.is_finite() {
        return 0;
    }
    let steps = (-20.0 * fraction.min(1.0).log10()) / ATTENUATION_STEP_DB;
    steps.round().max(0.0) as u32
}
