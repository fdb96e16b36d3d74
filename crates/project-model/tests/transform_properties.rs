use lapse_project_model::transform::{clamp_rotation, clamp_scale, to_normalized, to_pixels, Transform};
use proptest::prelude::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn normalized_position_round_trips_through_pixels(
        x in -3.0f64..3.0,
        y in -3.0f64..3.0,
        w in 1.0f64..4096.0,
        h in 1.0f64..4096.0,
    ) {
        let transform = Transform::new(x, y, 1.0, 0.0);
        let px = to_pixels(&transform, w, h);
        let (nx, ny) = to_normalized(px.x, px.y, w, h);
        prop_assert!(close(nx, x));
        prop_assert!(close(ny, y));
    }

    #[test]
    fn zero_dimension_never_produces_nan(x in -3.0f64..3.0, y in -3.0f64..3.0, w in 0.0f64..100.0) {
        let transform = Transform::new(x, y, 1.0, 0.0);
        let px = to_pixels(&transform, w, 0.0);
        prop_assert_eq!((px.x, px.y), (0.0, 0.0));
        let (nx, ny) = to_normalized(x, y, 0.0, w);
        prop_assert_eq!((nx, ny), (0.0, 0.0));
    }

    #[test]
    fn clamps_stay_in_range(scale in -100.0f64..100.0, rotation in -1000.0f64..1000.0) {
        let s = clamp_scale(scale);
        let r = clamp_rotation(rotation);
        prop_assert!((0.5..=3.0).contains(&s));
        prop_assert!((-180.0..=180.0).contains(&r));
    }
}

#[test]
fn documented_clamp_values() {
    assert_eq!(clamp_scale(10.0), 3.0);
    assert_eq!(clamp_scale(0.01), 0.5);
    assert_eq!(clamp_rotation(200.0), 180.0);
    assert_eq!(clamp_rotation(-200.0), -180.0);
}
