//! Grid geometry shared by the resolvers.

/// One step toward `to`, moving each axis by the sign of its difference.
#[must_use]
pub fn step_toward(from: (u16, u16), to: (u16, u16)) -> (u16, u16) {
    let step = |a: u16, b: u16| match b.cmp(&a) {
        std::cmp::Ordering::Greater => a + 1,
        std::cmp::Ordering::Less => a - 1,
        std::cmp::Ordering::Equal => a,
    };
    (step(from.0, to.0), step(from.1, to.1))
}

#[must_use]
pub fn chebyshev(a: (u16, u16), b: (u16, u16)) -> u16 {
    a.0.abs_diff(b.0).max(a.1.abs_diff(b.1))
}

#[must_use]
pub fn distance(a: (u16, u16), b: (u16, u16)) -> f64 {
    let dx = f64::from(a.0) - f64::from(b.0);
    let dy = f64::from(a.1) - f64::from(b.1);
    (dx * dx + dy * dy).sqrt()
}
