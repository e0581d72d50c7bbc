use super::PidParams;

/// Terms of the most recent step, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidRuntime {
    pub p_term: f32,
    pub i_term: f32,
    pub d_term: f32,
    pub output: u8,
}

#[derive(Debug)]
pub struct PidController {
    params: PidParams,
    sample_time: f32,
    previous_error: f32,
    integral: f32,
    last: PidRuntime,
}

impl PidController {
    /// `sample_time` is the fixed tick period in seconds.
    pub fn new(params: PidParams, sample_time: f32) -> Self {
        Self {
            params,
            sample_time,
            previous_error: 0.0,
            integral: 0.0,
            last: PidRuntime::default(),
        }
    }

    /// Clears the loop state. The snapshot reports a zero command, which is
    /// what an idle channel drives.
    pub fn reset(&mut self) {
        self.previous_error = 0.0;
        self.integral = 0.0;
        self.last = PidRuntime::default();
    }

    /// Advances the loop by one tick and returns the actuator command.
    pub fn step(&mut self, measured: f32, setpoint: f32) -> u8 {
        const DT_EPSILON: f32 = 1e-6;
        if self.sample_time < DT_EPSILON {
            return self.last.output;
        }
        let dt = self.sample_time;

        let min_output = self.params.min_output as f32;
        let max_output = self.params.max_output as f32;

        let error = setpoint - measured;
        if !error.is_finite() {
            self.last = PidRuntime {
                output: self.params.min_output,
                ..PidRuntime::default()
            };
            return self.last.output;
        }

        // Proportional term
        let p_term = self.params.kp * error;

        // Integral term, bounded so it alone stays inside the output range
        self.integral += error * dt;
        self.integral = match self.integral_bounds(min_output, max_output) {
            Some((low, high)) => self.integral.clamp(low, high),
            None => 0.0,
        };
        let i_term = self.params.ki * self.integral;

        // Derivative term
        let d_term = self.params.kd * (error - self.previous_error) / dt;

        let raw = p_term + i_term + d_term;
        let output = if raw.is_nan() {
            min_output
        } else {
            raw.clamp(min_output, max_output)
        };

        self.previous_error = error;
        self.last = PidRuntime {
            p_term,
            i_term,
            d_term,
            output: output as u8,
        };

        self.last.output
    }

    fn integral_bounds(&self, min_output: f32, max_output: f32) -> Option<(f32, f32)> {
        const KI_EPSILON: f32 = 1e-6;
        if libm::fabsf(self.params.ki) < KI_EPSILON {
            return None;
        }

        let a = min_output / self.params.ki;
        let b = max_output / self.params.ki;
        Some((a.min(b), a.max(b)))
    }

    /// Read-only snapshot of the last step.
    pub fn export_runtime(&self) -> PidRuntime {
        self.last
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn set_params(&mut self, params: PidParams) {
        self.params = params;
        self.reset();
    }

    pub fn params(&self) -> &PidParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PidParams {
        PidParams {
            kp: 10.0,
            ki: 0.5,
            kd: 1.0,
            min_output: 0,
            max_output: 255,
        }
    }

    #[test]
    fn test_pid_controller_basic() {
        let mut controller = PidController::new(params(), 1.0);

        // Below setpoint drives the heater
        let output = controller.step(5.0, 7.0);
        assert!(output > 0);

        // Above setpoint shuts it off
        controller.reset();
        let output = controller.step(20.0, 7.0);
        assert_eq!(output, 0);

        controller.reset();
        assert_eq!(controller.previous_error, 0.0);
        assert_eq!(controller.integral, 0.0);
        assert_eq!(controller.export_runtime().output, 0);
    }

    #[test]
    fn test_output_always_clamped() {
        let mut controller = PidController::new(params(), 1.0);

        for &(measured, setpoint) in &[
            (-1000.0, 1000.0),
            (1000.0, -1000.0),
            (0.0, 3.4e38),
            (f32::NAN, 0.0),
            (12.0, 12.5),
        ] {
            let output = controller.step(measured, setpoint);
            assert!((0..=255).contains(&output));
        }

        let mut narrow = PidController::new(
            PidParams {
                min_output: 20,
                max_output: 80,
                ..params()
            },
            1.0,
        );
        assert_eq!(narrow.step(0.0, 100.0), 80);
        assert_eq!(narrow.step(100.0, 0.0), 20);
    }

    #[test]
    fn test_anti_windup() {
        let mut controller = PidController::new(params(), 1.0);

        // Saturate for a long time far below setpoint
        for _ in 0..10_000 {
            controller.step(0.0, 50.0);
        }

        let bound = 255.0 / 0.5;
        assert!(controller.integral() <= bound);
        assert!(controller.export_runtime().i_term <= 255.0 + 1e-3);

        // Recovers within a few ticks once above setpoint
        let mut ticks = 0;
        while controller.step(60.0, 50.0) > 0 {
            ticks += 1;
            assert!(ticks < 60, "integral wound up");
        }
    }

    #[test]
    fn test_zero_error_holds_integral() {
        let mut controller = PidController::new(params(), 1.0);
        controller.step(10.0, 12.0);
        controller.step(11.0, 12.0);
        let integral = controller.integral();

        for _ in 0..100 {
            controller.step(12.0, 12.0);
            assert_eq!(controller.integral(), integral);
        }
        let runtime = controller.export_runtime();
        assert_eq!(runtime.p_term, 0.0);
        assert_eq!(runtime.d_term, 0.0);
    }

    #[test]
    fn test_export_runtime_is_read_only() {
        let mut controller = PidController::new(params(), 1.0);
        controller.step(8.0, 10.0);

        let first = controller.export_runtime();
        let second = controller.export_runtime();
        assert_eq!(first, second);
        assert_eq!(first.p_term, 20.0);
        assert_eq!(first.i_term, 1.0);
        assert_eq!(first.d_term, 2.0);
        assert_eq!(first.output, 23);
    }

    #[test]
    fn test_zero_ki_disables_integral() {
        let mut controller = PidController::new(
            PidParams {
                ki: 0.0,
                ..params()
            },
            1.0,
        );
        for _ in 0..50 {
            controller.step(0.0, 10.0);
        }
        assert_eq!(controller.integral(), 0.0);
    }

    #[test]
    fn test_set_params() {
        let mut controller = PidController::new(params(), 1.0);
        controller.step(0.0, 10.0);

        controller.set_params(PidParams {
            kp: 2.0,
            ..params()
        });
        assert_eq!(controller.params().kp, 2.0);
        assert_eq!(controller.integral(), 0.0);
    }
}
