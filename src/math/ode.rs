use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_config, Error, Result};

// Dormand-Prince 5(4) tableau.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const A71: f64 = 35.0 / 384.0;
const A73: f64 = 500.0 / 1113.0;
const A74: f64 = 125.0 / 192.0;
const A75: f64 = -2187.0 / 6784.0;
const A76: f64 = 11.0 / 84.0;

// Difference between the 5th and 4th order weights.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

// Shampine-Reichelt Rosenbrock 2(3) pair, L-stable.
const ROS_D: f64 = 0.292_893_218_813_452_5; // 1 / (2 + sqrt(2))
const ROS_E32: f64 = 7.414_213_562_373_095; // 6 + sqrt(2)

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

fn default_tol() -> f64 {
    1.49012e-8
}

fn default_max_steps() -> usize {
    500
}

/// How a state vector is advanced across one integration segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Integrator {
    /// Embedded Dormand-Prince 5(4) with per-step error control. A segment the
    /// explicit pair cannot finish within `max_steps` attempts (or whose step size
    /// underflows) is redone from its start with the stiff Rosenbrock pair.
    Adaptive {
        #[serde(default = "default_tol")]
        rtol: f64,
        #[serde(default = "default_tol")]
        atol: f64,
        #[serde(default = "default_max_steps")]
        max_steps: usize,
    },
    /// Linearly implicit Rosenbrock 2(3) only, for problems known to be stiff.
    Stiff {
        #[serde(default = "default_tol")]
        rtol: f64,
        #[serde(default = "default_tol")]
        atol: f64,
        #[serde(default = "default_max_steps")]
        max_steps: usize,
    },
    /// Classic RK4 with `substeps` equal steps per segment.
    FixedRk4 { substeps: usize },
}

impl Default for Integrator {
    fn default() -> Self {
        Integrator::Adaptive {
            rtol: default_tol(),
            atol: default_tol(),
            max_steps: default_max_steps(),
        }
    }
}

impl Integrator {
    pub fn check(&self) -> Result<()> {
        match *self {
            Integrator::Adaptive { rtol, atol, max_steps } | Integrator::Stiff { rtol, atol, max_steps } => {
                ensure_config!(rtol > 0.0 && rtol.is_finite(), "rtol must be > 0 (got {rtol})");
                ensure_config!(atol > 0.0 && atol.is_finite(), "atol must be > 0 (got {atol})");
                ensure_config!(max_steps >= 1, "max_steps must be >= 1");
            }
            Integrator::FixedRk4 { substeps } => {
                ensure_config!(substeps >= 1, "substeps must be >= 1");
            }
        }
        Ok(())
    }

    /// Integrate `y` in place from `t0` to `t1`. Only the end state is kept.
    pub fn advance<F>(&self, y: &mut [f64], t0: f64, t1: f64, mut f: F) -> Result<()>
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        match *self {
            Integrator::Adaptive { rtol, atol, max_steps } => {
                let start = y.to_vec();
                let mut ws = Dopri5Workspace::new(y.len());
                match dopri5_integrate(y, t0, t1, rtol, atol, max_steps, &mut ws, &mut f) {
                    Ok(_) => Ok(()),
                    Err(Error::IntegrationFailure { t, steps }) => {
                        debug!("explicit step stalled at t={t} after {steps} attempts, retrying [{t0}, {t1}] as stiff");
                        y.copy_from_slice(&start);
                        let mut ws = RosenbrockWorkspace::new(y.len());
                        rosenbrock23_integrate(y, t0, t1, rtol, atol, max_steps, &mut ws, f).map(|_| ())
                    }
                    Err(e) => Err(e),
                }
            }
            Integrator::Stiff { rtol, atol, max_steps } => {
                let mut ws = RosenbrockWorkspace::new(y.len());
                rosenbrock23_integrate(y, t0, t1, rtol, atol, max_steps, &mut ws, f).map(|_| ())
            }
            Integrator::FixedRk4 { substeps } => {
                let mut ws = Rk4Workspace::new(y.len());
                let dt = (t1 - t0) / substeps as f64;
                for step in 0..substeps {
                    rk4_step_ws(y, t0 + step as f64 * dt, dt, &mut ws, &mut f);
                }
                Ok(())
            }
        }
    }
}

/// Workspace for allocation-free RK4 steps
pub struct Rk4Workspace {
    pub k1: Vec<f64>,
    pub k2: Vec<f64>,
    pub k3: Vec<f64>,
    pub k4: Vec<f64>,
    pub ytmp: Vec<f64>,
}

impl Rk4Workspace {
    pub fn new(n: usize) -> Self {
        Self {
            k1: vec![0.0; n],
            k2: vec![0.0; n],
            k3: vec![0.0; n],
            k4: vec![0.0; n],
            ytmp: vec![0.0; n],
        }
    }

    pub fn resize(&mut self, n: usize) {
        if self.k1.len() != n {
            self.k1.resize(n, 0.0);
            self.k2.resize(n, 0.0);
            self.k3.resize(n, 0.0);
            self.k4.resize(n, 0.0);
            self.ytmp.resize(n, 0.0);
        }
    }
}

/// Fixed-step RK4 using preallocated workspace to avoid allocations per step.
pub fn rk4_step_ws<F>(y: &mut [f64], t: f64, dt: f64, ws: &mut Rk4Workspace, mut f: F)
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let n = y.len();
    ws.resize(n);

    let (k1, k2, k3, k4, ytmp) = (&mut ws.k1, &mut ws.k2, &mut ws.k3, &mut ws.k4, &mut ws.ytmp);

    f(t, y, k1);

    for i in 0..n {
        ytmp[i] = y[i] + 0.5 * dt * k1[i];
    }
    f(t + 0.5 * dt, ytmp, k2);

    for i in 0..n {
        ytmp[i] = y[i] + 0.5 * dt * k2[i];
    }
    f(t + 0.5 * dt, ytmp, k3);

    for i in 0..n {
        ytmp[i] = y[i] + dt * k3[i];
    }
    f(t + dt, ytmp, k4);

    for i in 0..n {
        y[i] += (dt / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
}

/// Stage buffers for [`dopri5_integrate`].
pub struct Dopri5Workspace {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    k5: Vec<f64>,
    k6: Vec<f64>,
    k7: Vec<f64>,
    ytmp: Vec<f64>,
    ynew: Vec<f64>,
}

impl Dopri5Workspace {
    pub fn new(n: usize) -> Self {
        Self {
            k1: vec![0.0; n],
            k2: vec![0.0; n],
            k3: vec![0.0; n],
            k4: vec![0.0; n],
            k5: vec![0.0; n],
            k6: vec![0.0; n],
            k7: vec![0.0; n],
            ytmp: vec![0.0; n],
            ynew: vec![0.0; n],
        }
    }

    pub fn resize(&mut self, n: usize) {
        if self.k1.len() != n {
            for buf in [
                &mut self.k1,
                &mut self.k2,
                &mut self.k3,
                &mut self.k4,
                &mut self.k5,
                &mut self.k6,
                &mut self.k7,
                &mut self.ytmp,
                &mut self.ynew,
            ] {
                buf.resize(n, 0.0);
            }
        }
    }
}

/// Adaptive Dormand-Prince 5(4) from `t0` to `t1`, updating `y` in place.
///
/// The first trial step spans the whole interval, so identical inputs always take
/// identical internal steps. Returns the number of step attempts used.
#[allow(clippy::too_many_arguments)]
pub fn dopri5_integrate<F>(
    y: &mut [f64],
    t0: f64,
    t1: f64,
    rtol: f64,
    atol: f64,
    max_steps: usize,
    ws: &mut Dopri5Workspace,
    mut f: F,
) -> Result<usize>
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let n = y.len();
    ws.resize(n);
    let span = t1 - t0;
    if span <= 0.0 || n == 0 {
        return Ok(0);
    }

    let h_min = span * 1e-12;
    let mut t = t0;
    let mut h = span;
    let mut attempts = 0;

    f(t, y, &mut ws.k1);

    while t < t1 {
        if attempts >= max_steps {
            return Err(Error::IntegrationFailure { t, steps: attempts });
        }
        attempts += 1;

        let last = t + h >= t1;
        if last {
            h = t1 - t;
        }

        let Dopri5Workspace { k1, k2, k3, k4, k5, k6, k7, ytmp, ynew } = &mut *ws;

        for i in 0..n {
            ytmp[i] = y[i] + h * A21 * k1[i];
        }
        f(t + C2 * h, ytmp, k2);
        for i in 0..n {
            ytmp[i] = y[i] + h * (A31 * k1[i] + A32 * k2[i]);
        }
        f(t + C3 * h, ytmp, k3);
        for i in 0..n {
            ytmp[i] = y[i] + h * (A41 * k1[i] + A42 * k2[i] + A43 * k3[i]);
        }
        f(t + C4 * h, ytmp, k4);
        for i in 0..n {
            ytmp[i] = y[i] + h * (A51 * k1[i] + A52 * k2[i] + A53 * k3[i] + A54 * k4[i]);
        }
        f(t + C5 * h, ytmp, k5);
        for i in 0..n {
            ytmp[i] = y[i] + h * (A61 * k1[i] + A62 * k2[i] + A63 * k3[i] + A64 * k4[i] + A65 * k5[i]);
        }
        f(t + h, ytmp, k6);
        for i in 0..n {
            ynew[i] = y[i] + h * (A71 * k1[i] + A73 * k3[i] + A74 * k4[i] + A75 * k5[i] + A76 * k6[i]);
        }
        f(t + h, ynew, k7);

        let mut sum_sq = 0.0;
        for i in 0..n {
            let e = h * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i] + E7 * k7[i]);
            let scale = atol + rtol * y[i].abs().max(ynew[i].abs());
            sum_sq += (e / scale) * (e / scale);
        }
        let err = (sum_sq / n as f64).sqrt();

        if err.is_finite() && err <= 1.0 {
            t = if last { t1 } else { t + h };
            y.copy_from_slice(ynew);
            // FSAL: the last stage is the first stage of the next step.
            std::mem::swap(k1, k7);
            let factor = if err == 0.0 { MAX_FACTOR } else { (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR) };
            h *= factor;
        } else {
            let factor = if err.is_finite() { (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, 1.0) } else { MIN_FACTOR };
            h *= factor;
            if h < h_min {
                return Err(Error::IntegrationFailure { t, steps: attempts });
            }
        }
    }

    Ok(attempts)
}

/// Buffers for [`rosenbrock23_integrate`]. Matrices are row-major `n x n`.
pub struct RosenbrockWorkspace {
    f0: Vec<f64>,
    f1: Vec<f64>,
    f2: Vec<f64>,
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    dfdt: Vec<f64>,
    fpert: Vec<f64>,
    ytmp: Vec<f64>,
    ynew: Vec<f64>,
    jac: Vec<f64>,
    lu: Vec<f64>,
    piv: Vec<usize>,
}

impl RosenbrockWorkspace {
    pub fn new(n: usize) -> Self {
        Self {
            f0: vec![0.0; n],
            f1: vec![0.0; n],
            f2: vec![0.0; n],
            k1: vec![0.0; n],
            k2: vec![0.0; n],
            k3: vec![0.0; n],
            dfdt: vec![0.0; n],
            fpert: vec![0.0; n],
            ytmp: vec![0.0; n],
            ynew: vec![0.0; n],
            jac: vec![0.0; n * n],
            lu: vec![0.0; n * n],
            piv: vec![0; n],
        }
    }

    pub fn resize(&mut self, n: usize) {
        if self.f0.len() != n {
            *self = Self::new(n);
        }
    }
}

/// Forward-difference Jacobian `df/dy` into `jac` and `df/dt` into `dfdt`.
/// `f0` must already hold `f(t, y)`.
#[allow(clippy::too_many_arguments)]
fn numeric_jacobian<F>(t: f64, y: &[f64], f0: &[f64], jac: &mut [f64], dfdt: &mut [f64], ytmp: &mut [f64], fpert: &mut [f64], f: &mut F)
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let n = y.len();
    let sqrt_eps = f64::EPSILON.sqrt();
    ytmp.copy_from_slice(y);
    for j in 0..n {
        let delta = sqrt_eps * y[j].abs().max(1.0);
        ytmp[j] = y[j] + delta;
        f(t, ytmp, fpert);
        for i in 0..n {
            jac[i * n + j] = (fpert[i] - f0[i]) / delta;
        }
        ytmp[j] = y[j];
    }
    let dt = sqrt_eps * t.abs().max(1.0);
    f(t + dt, y, fpert);
    for i in 0..n {
        dfdt[i] = (fpert[i] - f0[i]) / dt;
    }
}

/// In-place LU factorisation with partial pivoting. `false` if `a` is singular.
fn lu_factor(a: &mut [f64], piv: &mut [usize], n: usize) -> bool {
    for k in 0..n {
        let mut p = k;
        for i in k + 1..n {
            if a[i * n + k].abs() > a[p * n + k].abs() {
                p = i;
            }
        }
        piv[k] = p;
        let pivot = a[p * n + k];
        if pivot == 0.0 || !pivot.is_finite() {
            return false;
        }
        if p != k {
            for j in 0..n {
                a.swap(k * n + j, p * n + j);
            }
        }
        for i in k + 1..n {
            let m = a[i * n + k] / pivot;
            a[i * n + k] = m;
            for j in k + 1..n {
                a[i * n + j] -= m * a[k * n + j];
            }
        }
    }
    true
}

/// Solve `LU x = b` in place, with `lu`/`piv` from [`lu_factor`].
fn lu_solve(lu: &[f64], piv: &[usize], b: &mut [f64]) {
    let n = b.len();
    for (k, &p) in piv.iter().enumerate() {
        b.swap(k, p);
    }
    for k in 0..n {
        for i in k + 1..n {
            b[i] -= lu[i * n + k] * b[k];
        }
    }
    for k in (0..n).rev() {
        for j in k + 1..n {
            b[k] -= lu[k * n + j] * b[j];
        }
        b[k] /= lu[k * n + k];
    }
}

/// Adaptive Rosenbrock 2(3) from `t0` to `t1`, updating `y` in place.
///
/// Each stage solves with `W = I - h d J`, so step size is bounded by accuracy
/// rather than by the fastest decay rate. `J` is a forward-difference Jacobian taken
/// once per accepted step. Like [`dopri5_integrate`], the first trial step spans the
/// whole interval and the return value counts step attempts.
#[allow(clippy::too_many_arguments)]
pub fn rosenbrock23_integrate<F>(
    y: &mut [f64],
    t0: f64,
    t1: f64,
    rtol: f64,
    atol: f64,
    max_steps: usize,
    ws: &mut RosenbrockWorkspace,
    mut f: F,
) -> Result<usize>
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let n = y.len();
    ws.resize(n);
    let span = t1 - t0;
    if span <= 0.0 || n == 0 {
        return Ok(0);
    }

    let h_min = span * 1e-12;
    let mut t = t0;
    let mut h = span;
    let mut attempts = 0;

    let RosenbrockWorkspace { f0, f1, f2, k1, k2, k3, dfdt, fpert, ytmp, ynew, jac, lu, piv } = &mut *ws;

    f(t, y, f0);
    numeric_jacobian(t, y, f0, jac, dfdt, ytmp, fpert, &mut f);

    while t < t1 {
        if attempts >= max_steps {
            return Err(Error::IntegrationFailure { t, steps: attempts });
        }
        attempts += 1;

        let last = t + h >= t1;
        if last {
            h = t1 - t;
        }
        let hd = h * ROS_D;

        for i in 0..n {
            for j in 0..n {
                let identity = if i == j { 1.0 } else { 0.0 };
                lu[i * n + j] = identity - hd * jac[i * n + j];
            }
        }
        let err = if lu_factor(lu, piv, n) {
            for i in 0..n {
                k1[i] = f0[i] + hd * dfdt[i];
            }
            lu_solve(lu, piv, k1);

            for i in 0..n {
                ytmp[i] = y[i] + 0.5 * h * k1[i];
            }
            f(t + 0.5 * h, ytmp, f1);
            for i in 0..n {
                k2[i] = f1[i] - k1[i];
            }
            lu_solve(lu, piv, k2);
            for i in 0..n {
                k2[i] += k1[i];
            }

            for i in 0..n {
                ynew[i] = y[i] + h * k2[i];
            }
            f(t + h, ynew, f2);
            for i in 0..n {
                k3[i] = f2[i] - ROS_E32 * (k2[i] - f1[i]) - 2.0 * (k1[i] - f0[i]) + hd * dfdt[i];
            }
            lu_solve(lu, piv, k3);

            let mut sum_sq = 0.0;
            for i in 0..n {
                let e = h / 6.0 * (k1[i] - 2.0 * k2[i] + k3[i]);
                let scale = atol + rtol * y[i].abs().max(ynew[i].abs());
                sum_sq += (e / scale) * (e / scale);
            }
            (sum_sq / n as f64).sqrt()
        } else {
            f64::INFINITY
        };

        if err.is_finite() && err <= 1.0 {
            t = if last { t1 } else { t + h };
            y.copy_from_slice(ynew);
            std::mem::swap(f0, f2);
            if t < t1 {
                numeric_jacobian(t, y, f0, jac, dfdt, ytmp, fpert, &mut f);
            }
            let factor = if err == 0.0 { MAX_FACTOR } else { (SAFETY * err.powf(-1.0 / 3.0)).clamp(MIN_FACTOR, MAX_FACTOR) };
            h *= factor;
        } else {
            let factor = if err.is_finite() { (SAFETY * err.powf(-1.0 / 3.0)).clamp(MIN_FACTOR, 1.0) } else { MIN_FACTOR };
            h *= factor;
            if h < h_min {
                return Err(Error::IntegrationFailure { t, steps: attempts });
            }
        }
    }

    Ok(attempts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn decay(_t: f64, y: &[f64], dy: &mut [f64]) {
        dy[0] = -y[0];
    }

    #[rstest]
    #[case(Integrator::default(), 1e-7)]
    #[case(Integrator::FixedRk4 { substeps: 10 }, 1e-6)]
    fn integrates_exponential_decay(#[case] integrator: Integrator, #[case] eps: f64) {
        let mut y = [1.0];
        integrator.advance(&mut y, 0.0, 1.0, decay).unwrap();
        assert_approx_eq!(f64, y[0], (-1.0f64).exp(), epsilon = eps);
    }

    #[test]
    fn preserves_linear_invariant() {
        // Closed two-compartment exchange: y0 + y1 is constant.
        let mut y = [900.0, 100.0];
        let mut ws = Dopri5Workspace::new(2);
        dopri5_integrate(&mut y, 0.0, 5.0, 1e-8, 1e-8, 500, &mut ws, |_, y, dy| {
            let flow = 0.3 * y[0] - 0.1 * y[1];
            dy[0] = -flow;
            dy[1] = flow;
        })
        .unwrap();
        assert_approx_eq!(f64, y[0] + y[1], 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let run = || {
            let mut y = [0.7, 0.2];
            Integrator::default()
                .advance(&mut y, 3.0, 4.0, |_, y, dy| {
                    dy[0] = -2.0 * y[0] * y[1];
                    dy[1] = 2.0 * y[0] * y[1] - 0.5 * y[1];
                })
                .unwrap();
            y
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn explicit_pair_gives_up_on_stiff_decay() {
        let mut y = [1.0];
        let mut ws = Dopri5Workspace::new(1);
        let err = dopri5_integrate(&mut y, 0.0, 1.0, 1e-10, 1e-10, 1, &mut ws, |_, y, dy| dy[0] = -1000.0 * y[0])
            .unwrap_err();
        assert!(matches!(err, Error::IntegrationFailure { steps: 1, .. }));
    }

    #[rstest]
    #[case(Integrator::Adaptive { rtol: 1e-12, atol: 1e-12, max_steps: 1 })]
    #[case(Integrator::Stiff { rtol: 1e-12, atol: 1e-12, max_steps: 1 })]
    fn exhausted_step_budget_fails(#[case] integrator: Integrator) {
        let mut y = [1.0];
        let err = integrator.advance(&mut y, 0.0, 1.0, |_, y, dy| dy[0] = y[0]).unwrap_err();
        assert!(matches!(err, Error::IntegrationFailure { steps: 1, .. }));
    }

    // Fast transfer out of y0 (rate 1e5) into a slowly decaying y1.
    fn fast_slow(_t: f64, y: &[f64], dy: &mut [f64]) {
        dy[0] = -1e5 * y[0];
        dy[1] = 1e5 * y[0] - 0.1 * y[1];
    }

    fn fast_slow_exact() -> f64 {
        1e5 / (1e5 - 0.1) * (-0.1f64).exp()
    }

    #[test]
    fn adaptive_switches_to_stiff_solver() {
        let mut y = [1.0, 0.0];
        Integrator::default().advance(&mut y, 0.0, 1.0, fast_slow).unwrap();
        assert!(y[0].abs() < 1e-6);
        assert_approx_eq!(f64, y[1], fast_slow_exact(), epsilon = 1e-6);

        // The explicit pair alone cannot do this within the default budget.
        let mut y = [1.0, 0.0];
        let mut ws = Dopri5Workspace::new(2);
        assert!(dopri5_integrate(&mut y, 0.0, 1.0, 1.49012e-8, 1.49012e-8, 500, &mut ws, fast_slow).is_err());
    }

    #[test]
    fn stiff_solver_tracks_smooth_solution() {
        let integrator = Integrator::Stiff { rtol: 1e-8, atol: 1e-8, max_steps: 500 };
        let mut y = [1.0];
        integrator.advance(&mut y, 0.0, 1.0, decay).unwrap();
        assert_approx_eq!(f64, y[0], (-1.0f64).exp(), epsilon = 1e-6);

        let mut y = [1.0, 0.0];
        integrator.advance(&mut y, 0.0, 1.0, fast_slow).unwrap();
        assert_approx_eq!(f64, y[1], fast_slow_exact(), epsilon = 1e-6);
    }

    #[test]
    fn stiff_solver_preserves_linear_invariant() {
        let mut y = [900.0, 100.0];
        let mut ws = RosenbrockWorkspace::new(2);
        rosenbrock23_integrate(&mut y, 0.0, 5.0, 1e-8, 1e-8, 500, &mut ws, |_, y, dy| {
            let flow = 3000.0 * y[0] - 0.1 * y[1];
            dy[0] = -flow;
            dy[1] = flow;
        })
        .unwrap();
        assert_approx_eq!(f64, y[0] + y[1], 1000.0, epsilon = 1e-9);
        // Equilibrium of the exchange: 3000 * y0 = 0.1 * y1.
        assert_approx_eq!(f64, y[1], 1000.0 * 3000.0 / 3000.1, epsilon = 1e-4);
    }

    #[test]
    fn singular_matrix_is_detected() {
        let mut a = [1.0, 2.0, 2.0, 4.0];
        let mut piv = [0; 2];
        assert!(!lu_factor(&mut a, &mut piv, 2));
    }

    #[test]
    fn lu_solves_small_system() {
        // [[0, 2], [3, 1]] x = [4, 5] => x = [1, 2]; needs a row swap.
        let mut a = [0.0, 2.0, 3.0, 1.0];
        let mut piv = [0; 2];
        assert!(lu_factor(&mut a, &mut piv, 2));
        let mut b = [4.0, 5.0];
        lu_solve(&a, &piv, &mut b);
        assert_approx_eq!(f64, b[0], 1.0, epsilon = 1e-12);
        assert_approx_eq!(f64, b[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_interval_is_a_no_op() {
        let mut y = [2.0];
        Integrator::default().advance(&mut y, 1.0, 1.0, decay).unwrap();
        assert_eq!(y[0], 2.0);
    }

    #[rstest]
    #[case(Integrator::FixedRk4 { substeps: 0 })]
    #[case(Integrator::Adaptive { rtol: 0.0, atol: 1e-8, max_steps: 10 })]
    #[case(Integrator::Adaptive { rtol: 1e-8, atol: 1e-8, max_steps: 0 })]
    #[case(Integrator::Stiff { rtol: 1e-8, atol: f64::NAN, max_steps: 10 })]
    fn check_rejects_bad_settings(#[case] integrator: Integrator) {
        assert!(matches!(integrator.check(), Err(Error::Configuration(_))));
    }
}
