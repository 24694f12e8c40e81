//! Simulation clock advanced by the scene manager once per frame.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTime {
    pub elapsed: f32,
    /// Scaled delta of the current frame.
    pub delta: f32,
    pub time_scale: f32,
    pub frame: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame: 0,
        }
    }
}

impl WorldTime {
    /// Apply `time_scale` to the unscaled frame delta `dt` and advance.
    /// Returns the scaled delta.
    pub fn advance(&mut self, dt: f32) -> f32 {
        let scaled = dt * self.time_scale;
        self.elapsed += scaled;
        self.delta = scaled;
        self.frame += 1;
        scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_applies_time_scale() {
        let mut wt = WorldTime {
            time_scale: 0.5,
            ..Default::default()
        };
        assert_eq!(wt.advance(0.5), 0.25);
        assert_eq!(wt.advance(1.0), 0.5);
        assert_eq!(wt.elapsed, 0.75);
        assert_eq!(wt.delta, 0.5);
        assert_eq!(wt.frame, 2);
    }
}
