use glam::Quat;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Top of the integer angle scale.
pub const ANGLE_MAX: u16 = 359;
/// Units in a full turn; corrected angles wrap at this value.
pub const FULL_TURN: u16 = 360;

/// Roll, pitch and yaw rescaled to integers in `0..=ANGLE_MAX`.
///
/// Zero rotation maps to the middle of the scale (179) on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Angles {
    pub roll: u16,
    pub pitch: u16,
    pub yaw: u16,
}

impl Angles {
    pub fn new(roll: u16, pitch: u16, yaw: u16) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Convert a unit quaternion to Euler angles on the integer scale.
    ///
    /// The asin argument is clamped to [-1, 1] so that slightly
    /// denormalized quaternions stay on the principal branch.
    pub fn from_quaternion(q: Quat) -> Self {
        let (w, x, y, z) = (q.w, q.x, q.y, q.z);

        let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
        let pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin();
        let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));

        Self {
            roll: rescale((roll + PI) / TAU),
            pitch: rescale((pitch + FRAC_PI_2) / PI),
            yaw: rescale((yaw + PI) / TAU),
        }
    }
}

/// Map a fraction of the range onto `0..=ANGLE_MAX`, truncating.
fn rescale(fraction: f32) -> u16 {
    let scaled = fraction * ANGLE_MAX as f32;
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, ANGLE_MAX as f32) as u16
}

/// Angle of `value` measured from `origin`, wrapped into `0..FULL_TURN`.
/// Inputs past a full turn are reduced first.
pub fn correction(value: u16, origin: u16) -> u16 {
    let value = value % FULL_TURN;
    let origin = origin % FULL_TURN;
    (value + FULL_TURN - origin) % FULL_TURN
}

/// Signed distance of `value` from `origin`, without wrapping.
pub fn deviation(value: u16, origin: u16) -> i32 {
    i32::from(value) - i32::from(origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_straight_ahead() {
        assert_eq!(Angles::from_quaternion(Quat::IDENTITY), Angles::new(179, 179, 179));
    }

    #[test]
    fn quarter_turn_yaw() {
        let angles = Angles::from_quaternion(Quat::from_rotation_z(FRAC_PI_2));
        assert_eq!(angles.yaw, 269);
        assert_eq!(angles.pitch, 179);

        let angles = Angles::from_quaternion(Quat::from_rotation_z(-FRAC_PI_2));
        assert_eq!(angles.yaw, 89);
    }

    #[test]
    fn pitch_reaches_the_ends_of_the_scale() {
        let up = Angles::from_quaternion(Quat::from_rotation_y(FRAC_PI_2));
        assert!(up.pitch >= ANGLE_MAX - 1, "pitch {}", up.pitch);

        let down = Angles::from_quaternion(Quat::from_rotation_y(-FRAC_PI_2));
        assert!(down.pitch <= 1, "pitch {}", down.pitch);

        let raised = Angles::from_quaternion(Quat::from_rotation_y(FRAC_PI_2 / 3.0));
        assert_eq!(raised.pitch, 239);
    }

    #[test]
    fn denormalized_quaternion_is_clamped() {
        // 2(wy - zx) = 2 here, outside asin's domain.
        let angles = Angles::from_quaternion(Quat::from_xyzw(0.0, 1.0, 0.0, 1.0));
        assert_eq!(angles.pitch, ANGLE_MAX);
        assert!(angles.roll <= ANGLE_MAX);
        assert!(angles.yaw <= ANGLE_MAX);
    }

    #[test]
    fn correction_matches_wrapping_formula_everywhere() {
        for origin in 0..=ANGLE_MAX {
            for value in 0..=ANGLE_MAX {
                let corrected = correction(value, origin);
                assert!(corrected <= ANGLE_MAX, "value {value} origin {origin}");

                let expected = if value >= origin {
                    value - origin
                } else {
                    value + (360 - origin)
                };
                assert_eq!(corrected, expected);
                assert_eq!(
                    u32::from(corrected),
                    (u32::from(value) + 360 - u32::from(origin)) % 360
                );
            }
        }
    }

    #[test]
    fn correction_reduces_out_of_range_inputs() {
        assert_eq!(correction(360, 0), 0);
        assert_eq!(correction(10, 361), 9);
        assert_eq!(correction(400, 30), 10);
        assert_eq!(correction(u16::MAX, u16::MAX), 0);
        assert_eq!(correction(0, u16::MAX), 360 - u16::MAX % 360);
        for value in [360, 719, 1000, u16::MAX] {
            for origin in [0, 359, 360, 5000, u16::MAX] {
                assert!(correction(value, origin) <= ANGLE_MAX, "value {value} origin {origin}");
            }
        }
    }

    #[test]
    fn deviation_is_signed() {
        assert_eq!(deviation(240, 179), 61);
        assert_eq!(deviation(100, 179), -79);
        assert_eq!(deviation(179, 179), 0);
    }
}
