//! Exact quarter-turn rotations and face transform composition.
//!
//! `DMat4::from_rotation_x(FRAC_PI_2)` leaves ~6e-17 residue in the zero
//! entries. The cube face transforms only ever rotate by multiples of 90°, so
//! they are built from exact sin/cos values instead.

use glam::{DMat4, DVec3, DVec4};

/// `(cos, sin)` of `turns × 90°`, exact.
fn quarter_cos_sin(turns: i32) -> (f64, f64) {
    match turns.rem_euclid(4) {
        0 => (1.0, 0.0),
        1 => (0.0, 1.0),
        2 => (-1.0, 0.0),
        _ => (0.0, -1.0),
    }
}

/// Right-handed rotation about +X by `turns × 90°`.
pub fn quarter_turns_about_x(turns: i32) -> DMat4 {
    let (c, s) = quarter_cos_sin(turns);
    DMat4::from_cols(
        DVec4::X,
        DVec4::new(0.0, c, s, 0.0),
        DVec4::new(0.0, -s, c, 0.0),
        DVec4::W,
    )
}

/// Right-handed rotation about +Y by `turns × 90°`.
pub fn quarter_turns_about_y(turns: i32) -> DMat4 {
    let (c, s) = quarter_cos_sin(turns);
    DMat4::from_cols(
        DVec4::new(c, 0.0, -s, 0.0),
        DVec4::Y,
        DVec4::new(s, 0.0, c, 0.0),
        DVec4::W,
    )
}

/// `translation ∘ rotation`: rotate first, then move.
pub fn face_transform(rotation: DMat4, translation: DVec3) -> DMat4 {
    DMat4::from_translation(translation) * rotation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_turns_match_glam_rotation() {
        for turns in -4..=4 {
            let angle = turns as f64 * std::f64::consts::FRAC_PI_2;
            let exact_x = quarter_turns_about_x(turns);
            let exact_y = quarter_turns_about_y(turns);
            assert!(exact_x.abs_diff_eq(DMat4::from_rotation_x(angle), 1e-12));
            assert!(exact_y.abs_diff_eq(DMat4::from_rotation_y(angle), 1e-12));
        }
    }

    #[test]
    fn test_quarter_turns_are_exact() {
        let m = quarter_turns_about_x(-1);
        assert_eq!(m.transform_vector3(DVec3::Z), DVec3::Y);
        let m = quarter_turns_about_y(2);
        assert_eq!(m.transform_vector3(DVec3::Z), DVec3::NEG_Z);
    }

    #[test]
    fn test_face_transform_rotates_then_translates() {
        let m = face_transform(quarter_turns_about_y(1), DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(m.transform_point3(DVec3::ZERO), DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(
            m.transform_point3(DVec3::new(0.0, 0.0, 1.0)),
            DVec3::new(11.0, 0.0, 0.0)
        );
    }
}
