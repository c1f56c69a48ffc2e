use super::*;
use crate::paint::UpdateMode;

#[test]
fn defaults_are_valid() {
    let o = FogOfWarOpts::default();
    o.validate().unwrap();
    assert_eq!((o.width(), o.height()), (256, 256));
    assert_eq!(o.max_transitions, 64_000);
    assert!(o.blur_kernel().is_none());
}

#[test]
fn dimensions_round_down_to_multiples_of_four() {
    let o = FogOfWarOpts {
        texture_width: 130,
        texture_height: 67,
        ..Default::default()
    };
    assert_eq!((o.width(), o.height()), (128, 64));
    let tiny = FogOfWarOpts {
        texture_width: 1,
        ..Default::default()
    };
    assert_eq!((tiny.width(), tiny.height()), (4, 4));
}

#[test]
fn partial_json_fills_defaults() {
    let o = FogOfWarOpts::from_json_str(
        r#"{
            "texture_width": 64,
            "placement": { "center": { "x": 5.0, "z": -5.0 }, "size": { "x": 32.0, "z": 32.0 } },
            "paint": { "smoothness": 0.0, "mode": "immediate" },
            "blur": true
        }"#,
    )
    .unwrap();
    o.validate().unwrap();
    assert_eq!(o.height(), 64);
    assert_eq!(o.placement.center.x, 5.0);
    assert!(!o.placement.is_local);
    assert_eq!(o.paint.mode, UpdateMode::Immediate);
    assert_eq!(o.paint.restore_duration, 2.0);
    assert_eq!(o.blur_kernel(), Some((4, 2.0)));
}

#[test]
fn bad_json_is_a_serde_error() {
    assert!(matches!(
        FogOfWarOpts::from_json_str("{ \"texture_width\": \"wide\" }"),
        Err(FogError::Serde(_))
    ));
}

#[test]
fn validate_rejects_out_of_range_values() {
    let zero_size = FogOfWarOpts {
        placement: Placement {
            size: crate::foundation::core::Vec3::new(0.0, 0.0, 10.0),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(zero_size.validate().is_err());

    let huge = FogOfWarOpts {
        texture_width: MAX_DIMENSION + 4,
        ..Default::default()
    };
    assert!(huge.validate().is_err());

    let no_pool = FogOfWarOpts {
        max_transitions: 0,
        ..Default::default()
    };
    assert!(no_pool.validate().is_err());

    let bad_blur = FogOfWarOpts {
        blur: true,
        blur_sigma: 0.0,
        ..Default::default()
    };
    assert!(bad_blur.validate().is_err());
}

#[test]
fn json_round_trip_preserves_options() {
    let o = FogOfWarOpts {
        texture_width: 512,
        blur: true,
        ..Default::default()
    };
    let back = FogOfWarOpts::from_json_str(&o.to_json_string().unwrap()).unwrap();
    assert_eq!(back, o);
}
