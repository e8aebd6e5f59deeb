use cardsmith::config::{Background, Config, HandleLayout, RegionShape};

#[test]
fn default_config_validates_and_names_both_templates() {
    let cfg = Config::default();
    cfg.validate().unwrap();

    let participation = cfg.template("participation").unwrap();
    assert_eq!((participation.width, participation.height), (1200, 900));
    assert_eq!(participation.text.len(), 5);
    assert!(participation.stars.is_some());
    assert!(participation.confetti.is_some());

    let frame = cfg.template("photo-frame").unwrap();
    assert_eq!((frame.width, frame.height), (1920, 1920));
    assert!(frame.text.is_empty());
    assert!(frame.stars.is_none());
}

#[test]
fn yaml_overrides_parse_kebab_case() {
    let yaml = r##"
editor:
  layout: eight-handle
  handle-size: 30
templates:
  badge:
    width: 600
    height: 600
    background:
      type: linear-gradient
      start: "#112233"
      end: "#445566"
    photo:
      x: 100
      y: 100
      width: 400
      height: 400
      shape:
        type: rounded-rect
        radius: 24
    text:
      - template: "Hi {name}"
        size: 40
        color: "#FFFFFF"
        baseline: 560
"##;
    let cfg: Config = serde_yaml::from_str(yaml).unwrap();
    cfg.validate().unwrap();

    assert_eq!(cfg.editor.layout, HandleLayout::EightHandle);
    assert_eq!(cfg.editor.handle_size, 30.0);
    // Unset editor fields keep their defaults.
    assert_eq!(cfg.editor.min_crop_size, 50.0);

    let badge = cfg.template("badge").unwrap();
    match &badge.background {
        Background::LinearGradient { start, end } => {
            assert_eq!(start.0, [0x11, 0x22, 0x33]);
            assert_eq!(end.0, [0x44, 0x55, 0x66]);
        }
        other => panic!("unexpected background {other:?}"),
    }
    let photo = badge.photo.as_ref().unwrap();
    assert_eq!(photo.shape, RegionShape::RoundedRect { radius: 24.0 });
    assert_eq!(badge.text[0].template, "Hi {name}");
}

#[test]
fn bad_color_is_rejected() {
    let yaml = r##"
templates:
  broken:
    width: 100
    height: 100
    background:
      type: linear-gradient
      start: "123456"
      end: "#445566"
"##;
    assert!(serde_yaml::from_str::<Config>(yaml).is_err());
}

#[test]
fn out_of_range_baseline_fails_validation() {
    let yaml = r##"
templates:
  broken:
    width: 100
    height: 100
    background:
      type: linear-gradient
      start: "#112233"
      end: "#445566"
    text:
      - template: "hello"
        size: 12
        color: "#000000"
        baseline: 500
"##;
    let cfg: Config = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validate().is_err());
}
