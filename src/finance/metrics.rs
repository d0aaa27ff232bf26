/// Lowest discount rate probed when bracketing an IRR.
const IRR_MIN_RATE: f64 = -0.99;
/// Highest discount rate probed when bracketing an IRR.
const IRR_MAX_RATE: f64 = 10.0;
const IRR_TOLERANCE: f64 = 1e-10;
const IRR_MAX_ITERATIONS: usize = 200;

/// Compound escalation factor `(1 + rate)^years`.
pub fn inflation_factor(rate: f64, years: u32) -> f64 {
    (1.0 + rate).powi(years as i32)
}

/// Net present value of `flows`, where `flows[t]` occurs at the end of year `t`.
///
/// # Examples
///
/// ```
/// use eaf_bess_finance::finance::npv;
///
/// let v = npv(0.10, &[-100.0, 110.0]);
/// assert!(v.abs() < 1e-9);
/// ```
pub fn npv(rate: f64, flows: &[f64]) -> f64 {
    flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Internal rate of return of `flows`.
///
/// Returns NaN when the year-0 flow is not an outflow or the NPV never changes
/// sign over the probed rate range.
pub fn irr(flows: &[f64]) -> f64 {
    match flows.first() {
        Some(&first) if first < 0.0 => {}
        _ => return f64::NAN,
    }
    if !flows.iter().skip(1).any(|&cf| cf > 0.0) {
        return f64::NAN;
    }

    let Some((mut lo, mut hi)) = bracket_root(flows) else {
        return f64::NAN;
    };
    let mut f_lo = npv(lo, flows);

    for _ in 0..IRR_MAX_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        let f_mid = npv(mid, flows);
        if f_mid == 0.0 || (hi - lo) < IRR_TOLERANCE {
            return mid;
        }
        if f_lo.signum() == f_mid.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Scans increasing rates for the first interval where the NPV changes sign.
fn bracket_root(flows: &[f64]) -> Option<(f64, f64)> {
    let mut prev_rate = IRR_MIN_RATE;
    let mut prev_npv = npv(prev_rate, flows);
    let mut rate = prev_rate;
    while rate < IRR_MAX_RATE {
        rate += if rate < 1.0 { 0.01 } else { 0.1 };
        let value = npv(rate, flows);
        if !value.is_finite() || !prev_npv.is_finite() {
            prev_rate = rate;
            prev_npv = value;
            continue;
        }
        if value == 0.0 {
            return Some((rate, rate));
        }
        if prev_npv.signum() != value.signum() {
            return Some((prev_rate, rate));
        }
        prev_rate = rate;
        prev_npv = value;
    }
    None
}

/// Years until cumulative `flows` turn non-negative, interpolated within the
/// crossing year.
///
/// Returns 0 when the year-0 flow is not an outflow and `f64::INFINITY` when
/// the cumulative sum never recovers.
pub fn payback_years(flows: &[f64]) -> f64 {
    let Some(&first) = flows.first() else {
        return f64::INFINITY;
    };
    if first >= 0.0 {
        return 0.0;
    }

    let mut cumulative = first;
    for (t, &cf) in flows.iter().enumerate().skip(1) {
        let before = cumulative;
        cumulative += cf;
        if cumulative >= 0.0 {
            return (t - 1) as f64 + (-before) / cf;
        }
    }
    f64::INFINITY
}
