//! Circular orbits and the floating bob layered on top of them.

use std::f32::consts::TAU;

use cgmath::Vector3;

/// Circular motion in the xz plane around `centre`, lifted by `height`.
///
/// The angle advances by `speed` radians once per step and stays within `[0, 2π)`; a speed of
/// zero parks the body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitState {
    pub angle: f32,
    pub speed: f32,
    pub radius: f32,
    pub centre: Vector3<f32>,
    pub height: f32,
}

impl OrbitState {
    pub fn new(centre: Vector3<f32>, radius: f32, speed: f32, height: f32) -> Self {
        Self {
            angle: 0.0,
            speed,
            radius,
            centre,
            height,
        }
    }

    pub fn advance(&mut self) {
        self.angle = wrap_angle(self.angle + self.speed);
    }

    pub fn position(&self) -> Vector3<f32> {
        let (sin, cos) = self.angle.sin_cos();
        self.centre + Vector3::new(cos * self.radius, self.height, sin * self.radius)
    }

    /// Yaw that points a body's +z along the direction of travel.
    pub fn heading(&self) -> f32 {
        let (sin, cos) = self.angle.sin_cos();
        (-sin).atan2(cos)
    }

    /// Gentle roll into the turn.
    pub fn bank(&self) -> f32 {
        self.angle.sin() * 0.1
    }
}

/// Folds an angle back into `[0, 2π)` so long sessions keep full f32 precision.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Slow independent sine bob on every axis, `time` being the body's own clock.
pub fn float_offset(time: f32) -> Vector3<f32> {
    Vector3::new(
        (time * 0.5).sin(),
        (time * 0.3).sin() * 2.0,
        (time * 0.4).sin(),
    )
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use cgmath::InnerSpace;

    use super::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn quarter_turn_moves_from_plus_x_to_plus_z() {
        let mut orbit = OrbitState::new(Vector3::new(0.0, -50.0, -20.0), 80.0, FRAC_PI_2, 0.0);
        assert!(close(orbit.position(), Vector3::new(80.0, -50.0, -20.0)));
        orbit.advance();
        assert!(close(orbit.position(), Vector3::new(0.0, -50.0, 60.0)));
    }

    #[test]
    fn stays_on_the_circle() {
        let mut orbit = OrbitState::new(Vector3::new(0.0, -50.0, -20.0), 60.0, 0.01, 20.0);
        for _ in 0..1000 {
            orbit.advance();
            let p = orbit.position();
            assert!((p.y - -30.0).abs() < 1e-4);
            let flat = Vector3::new(p.x, 0.0, p.z + 20.0);
            assert!((flat.magnitude() - 60.0).abs() < 1e-3);
        }
    }

    #[test]
    fn zero_speed_is_idle() {
        let mut orbit = OrbitState::new(Vector3::new(1.0, 2.0, 3.0), 10.0, 0.0, 0.0);
        let start = orbit.position();
        for _ in 0..100 {
            orbit.advance();
        }
        assert_eq!(orbit.position(), start);
    }

    #[test]
    fn angle_wraps_after_a_full_turn() {
        let mut orbit = OrbitState::new(Vector3::new(0.0, -50.0, -20.0), 60.0, 0.01, 20.0);
        let mut unwrapped = 0.0f64;
        for _ in 0..1000 {
            orbit.advance();
            unwrapped += 0.01;
            assert!((0.0..TAU).contains(&orbit.angle));
        }
        // 1000 steps of 0.01 is ten radians, more than one full turn
        let expected = OrbitState {
            angle: (unwrapped % std::f64::consts::TAU) as f32,
            ..orbit
        };
        assert!((orbit.position() - expected.position()).magnitude() < 0.05);
    }

    #[test]
    fn keeps_moving_after_a_long_session() {
        let mut orbit = OrbitState::new(Vector3::new(0.0, 0.0, 0.0), 80.0, 0.01, 0.0);
        orbit.angle = wrap_angle(300_000.0);
        let before = orbit.position();
        orbit.advance();
        assert!(!close(orbit.position(), before));
        assert!((0.0..TAU).contains(&wrap_angle(-1e-9)));
    }

    #[test]
    fn heading_follows_the_tangent() {
        let orbit = OrbitState::new(Vector3::new(0.0, 0.0, 0.0), 1.0, 0.0, 0.0);
        assert_eq!(orbit.heading(), 0.0);
        assert_eq!(orbit.bank(), 0.0);
        assert_eq!(float_offset(0.0), Vector3::new(0.0, 0.0, 0.0));
    }
}
