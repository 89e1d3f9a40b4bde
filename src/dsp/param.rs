//! Automatable parameter with linear ramps.
//!
//! Mirrors the subset of Web Audio `AudioParam` automation the engine needs:
//! an immediate value, a linear ramp that always starts from wherever the
//! parameter currently is, and cancel-and-hold. Values are evaluated against
//! the context clock in seconds.

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ramp {
    from: f64,
    to: f64,
    start: f64,
    end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioParam {
    value: f64,
    ramp: Option<Ramp>,
}

impl AudioParam {
    pub fn new(value: f64) -> Self {
        AudioParam { value, ramp: None }
    }

    /// Value of the parameter at time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        match self.ramp {
            None => self.value,
            Some(r) if t <= r.start => r.from,
            Some(r) if t >= r.end => r.to,
            Some(r) => {
                let progress = (t - r.start) / (r.end - r.start);
                r.from + (r.to - r.from) * progress
            }
        }
    }

    /// Jump to `value` immediately, discarding any ramp.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.ramp = None;
    }

    /// Ramp linearly from the value held at `now` to `target` over `duration`
    /// seconds. A zero duration degenerates to `set_value`.
    pub fn linear_ramp_to(&mut self, target: f64, now: f64, duration: f64) {
        let from = self.value_at(now);
        if duration <= 0.0 {
            self.set_value(target);
            return;
        }
        self.value = target;
        self.ramp = Some(Ramp {
            from,
            to: target,
            start: now,
            end: now + duration,
        });
    }

    /// Freeze the parameter at whatever value it has at `now`.
    pub fn cancel_and_hold(&mut self, now: f64) {
        let held = self.value_at(now);
        self.set_value(held);
    }

    /// Final value once any ramp in flight completes.
    pub fn target(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_is_linear() {
        let mut p = AudioParam::new(0.0);
        p.linear_ramp_to(0.1, 0.0, 2.0);
        assert!(p.value_at(0.0).abs() < 1e-12);
        assert!((p.value_at(1.0) - 0.05).abs() < 1e-12);
        assert!((p.value_at(2.0) - 0.1).abs() < 1e-12);
        assert!((p.value_at(50.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn new_ramp_starts_from_current_value() {
        let mut p = AudioParam::new(0.0);
        p.linear_ramp_to(1.0, 0.0, 2.0);
        // Half way up, head back down.
        p.linear_ramp_to(0.0, 1.0, 1.0);
        assert!((p.value_at(1.0) - 0.5).abs() < 1e-12);
        assert!((p.value_at(1.5) - 0.25).abs() < 1e-12);
        assert!(p.value_at(2.0).abs() < 1e-12);
        assert_eq!(p.target(), 0.0);
    }

    #[test]
    fn ramp_never_jumps() {
        let mut p = AudioParam::new(0.2);
        p.linear_ramp_to(0.8, 3.0, 0.5);
        let mut last = p.value_at(3.0);
        let mut t = 3.0;
        while t < 3.6 {
            t += 0.001;
            let v = p.value_at(t);
            assert!((v - last).abs() <= 0.6 * 0.001 / 0.5 + 1e-9, "step at {t}");
            last = v;
        }
    }

    #[test]
    fn cancel_and_hold_freezes() {
        let mut p = AudioParam::new(0.0);
        p.linear_ramp_to(1.0, 0.0, 1.0);
        p.cancel_and_hold(0.25);
        assert!((p.value_at(10.0) - 0.25).abs() < 1e-12);
        assert_eq!(p.target(), 0.25);
        // A fade after the hold starts from the held value.
        p.linear_ramp_to(0.0, 0.25, 1.0);
        assert!((p.value_at(0.25) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn zero_duration_sets_immediately() {
        let mut p = AudioParam::new(0.4);
        p.linear_ramp_to(0.9, 1.0, 0.0);
        assert_eq!(p.value_at(0.0), 0.9);
    }
}
