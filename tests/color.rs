mod tests {
    use fastrand::Rng;
    use myrtio_light_show::color::{
        CYAN_SENTINEL, ChannelOrder, ColorLiteral, ColorMath, ColorParam, Rgb, SoftwareColorMath,
        rgb_from_u32, rgb_to_u32, scale_color,
    };
    use rstest::rstest;

    fn resolve(literal: ColorLiteral) -> u32 {
        let mut rng = Rng::with_seed(1);
        rgb_to_u32(literal.resolve(&mut rng, &SoftwareColorMath))
    }

    #[rstest]
    #[case::packed(ColorLiteral::Packed(0x12_3456), 0x12_3456)]
    #[case::name(ColorLiteral::from("gold"), 0xd4_af37)]
    #[case::name_any_case(ColorLiteral::from(" Red "), 0xff_0000)]
    #[case::hex(ColorLiteral::from("0x00ff80"), 0x00_ff80)]
    #[case::hex_bad_channel(ColorLiteral::from("0x00zz80"), 0x00_0080)]
    #[case::decimal(ColorLiteral::from("255"), 0x00_00ff)]
    #[case::unknown_word(ColorLiteral::from("mauve"), CYAN_SENTINEL)]
    #[case::empty(ColorLiteral::from(""), CYAN_SENTINEL)]
    #[case::other_json(ColorLiteral::Other(serde_json::json!({"r": 1})), CYAN_SENTINEL)]
    fn test_color_literals(#[case] literal: ColorLiteral, #[case] expected: u32) {
        assert_eq!(resolve(literal), expected);
    }

    #[test]
    fn test_random_color_is_saturated() {
        let mut rng = Rng::with_seed(42);
        let color = ColorLiteral::from("random").resolve(&mut rng, &SoftwareColorMath);
        let channels = [color.r, color.g, color.b];
        // Full saturation leaves at least one channel dark and one at value 0.8
        assert!(channels.contains(&204) || channels.contains(&203));
        assert_eq!(*channels.iter().min().unwrap(), 0);
    }

    #[test]
    fn test_color_param_from_json() {
        let one: ColorParam = serde_json::from_str(r#""yellow""#).unwrap();
        assert!(!one.is_list());

        let list: ColorParam = serde_json::from_str(r#"["red", 65280, "0x0000ff"]"#).unwrap();
        assert!(list.is_list());

        let mut rng = Rng::with_seed(1);
        let math = SoftwareColorMath;
        assert_eq!(list.resolve_at(1, &mut rng, &math), Rgb::new(0, 255, 0));
        // Palette positions wrap around
        assert_eq!(list.resolve_at(5, &mut rng, &math), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_empty_palette_resolves_to_sentinel() {
        let mut rng = Rng::with_seed(1);
        let empty = ColorParam::List(Vec::new());
        assert!(empty.at(0).is_none());
        assert_eq!(
            empty.resolve_at(0, &mut rng, &SoftwareColorMath),
            rgb_from_u32(CYAN_SENTINEL)
        );
    }

    #[rstest]
    #[case(0.0, Rgb::new(204, 0, 0))]
    #[case(1.0 / 3.0, Rgb::new(0, 204, 0))]
    #[case(2.0 / 3.0, Rgb::new(0, 0, 204))]
    #[case(1.0, Rgb::new(204, 0, 0))]
    #[case(-1.0 / 3.0, Rgb::new(0, 0, 204))]
    fn test_hsv_primaries(#[case] hue: f32, #[case] expected: Rgb) {
        let color = SoftwareColorMath.hsv_to_rgb(hue, 1.0, 0.8);
        let close = |a: u8, b: u8| a.abs_diff(b) <= 1;
        assert!(
            close(color.r, expected.r) && close(color.g, expected.g) && close(color.b, expected.b),
            "{color:?} != {expected:?}"
        );
    }

    #[test]
    fn test_hue_dist() {
        let math = SoftwareColorMath;
        assert_eq!(math.hue_dist(3.0, 4.0, 10.0), 0.5);
        assert_eq!(math.hue_dist(3.0, 4.0, 0.0), 0.0);
    }

    #[test]
    fn test_decay_fades_out() {
        let math = SoftwareColorMath;
        let colors = [Rgb::new(200, 100, 0)];
        let mut out = [Rgb::default()];
        let rates = [1.0 / 1024.0];
        let mut remaining = [1024];

        math.decay(512, &colors, &mut out, &rates, &mut remaining);
        assert_eq!(remaining, [512]);
        assert_eq!(out, [Rgb::new(100, 50, 0)]);

        math.decay(600, &colors, &mut out, &rates, &mut remaining);
        assert_eq!(remaining, [0]);
        assert_eq!(out, [Rgb::new(0, 0, 0)]);

        // Exhausted pixels hold their last output
        out[0] = Rgb::new(1, 2, 3);
        math.decay(50, &colors, &mut out, &rates, &mut remaining);
        assert_eq!(out, [Rgb::new(1, 2, 3)]);
    }

    #[test]
    fn test_decay_without_rate_passes_through() {
        let math = SoftwareColorMath;
        let colors = [Rgb::new(9, 8, 7)];
        let mut out = [Rgb::default()];
        let mut remaining = [0];

        math.decay(50, &colors, &mut out, &[0.0], &mut remaining);
        assert_eq!(out, colors);
    }

    #[test]
    fn test_negative_rate_fades_in() {
        let math = SoftwareColorMath;
        let colors = [Rgb::new(200, 200, 200)];
        let mut out = [Rgb::default()];
        let rates = [-1.0 / 1024.0];
        let mut remaining = [1024];

        math.decay(256, &colors, &mut out, &rates, &mut remaining);
        assert_eq!(out, [Rgb::new(50, 50, 50)]);

        math.decay(2000, &colors, &mut out, &rates, &mut remaining);
        assert_eq!(out, colors);
    }

    #[rstest]
    #[case(ChannelOrder::Rgb, 0x7f_4020)]
    #[case(ChannelOrder::Grb, 0x40_7f20)]
    #[case(ChannelOrder::Rgbw, 0x7f40_2000)]
    fn test_brightness_convert(#[case] order: ChannelOrder, #[case] expected: u32) {
        let color = Rgb::new(0xff, 0x80, 0x40);
        assert_eq!(
            SoftwareColorMath.brightness_convert(color, 128, order),
            expected
        );
    }

    #[test]
    fn test_scale_and_pack() {
        assert_eq!(scale_color(Rgb::new(100, 50, 10), 0.5), Rgb::new(50, 25, 5));
        assert_eq!(scale_color(Rgb::new(100, 50, 10), 2.0), Rgb::new(100, 50, 10));
        assert_eq!(rgb_to_u32(rgb_from_u32(0xab_cdef)), 0xab_cdef);
    }
}
