mod tests {
    use myrtio_light_show::color::ChannelOrder;
    use myrtio_light_show::layout::{
        LayoutBuilder, LayoutError, LayoutSpec, LineSet, MAX_DEVICE_PIXELS, NO_PIXEL,
        PrototypeTable, merge_layout_spec,
    };
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn strip(len: usize) -> LayoutSpec {
        LayoutSpec::default().with_len(len)
    }

    #[test]
    fn test_identity_line_and_center_split() {
        let prototypes = PrototypeTable::new();
        let layout = LayoutBuilder::new(&prototypes).build(&strip(6)).unwrap();

        assert_eq!(layout.line(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(layout.lines(), &[vec![2, 1, 0], vec![3, 4, 5]]);
        assert_eq!(layout.linesh(), layout.lines());
        assert_eq!(layout.angles(), &[0.0, 60.0, 120.0, 180.0, 240.0, 300.0]);
        assert_eq!(layout.cangles(), layout.angles());
        assert_eq!(layout.order(), ChannelOrder::Rgb);
        assert!(layout.grid().is_none());
    }

    #[test]
    fn test_odd_length_leaves_last_pixel_out_of_lines() {
        let prototypes = PrototypeTable::new();
        let layout = LayoutBuilder::new(&prototypes).build(&strip(5)).unwrap();

        assert_eq!(layout.lines(), &[vec![1, 0], vec![2, 3]]);
    }

    #[test]
    fn test_offsets_are_assigned_sequentially() {
        let prototypes = PrototypeTable::builtin();
        let mut builder = LayoutBuilder::new(&prototypes);

        let star = builder.build(&LayoutSpec::device("star", "ZTR1")).unwrap();
        let lights = builder.build(&LayoutSpec::device("lights", "LINE")).unwrap();
        let pinned = builder.build(&strip(4).with_offset(200)).unwrap();
        let tail = builder.build(&strip(2)).unwrap();

        assert_eq!(star.offset(), 0);
        assert_eq!(star.len(), 30);
        assert_eq!(lights.offset(), 30);
        assert_eq!(lights.len(), 50);
        assert_eq!(pinned.offset(), 200);
        // An explicit offset still advances the running counter
        assert_eq!(tail.offset(), 84);
        assert_eq!(builder.total_length(), 86);
    }

    #[test]
    fn test_window_past_pixel_range() {
        let prototypes = PrototypeTable::builtin();
        let mut builder = LayoutBuilder::new(&prototypes);

        let huge_offset = LayoutSpec::device("x", "LINE").with_offset(usize::MAX - 10);
        assert_eq!(builder.build(&huge_offset), Err(LayoutError::OffsetOverflow));
        assert_eq!(builder.build(&strip(usize::MAX)), Err(LayoutError::OffsetOverflow));
        assert_eq!(
            builder.build(&strip(10).with_offset(MAX_DEVICE_PIXELS - 5)),
            Err(LayoutError::OffsetOverflow)
        );
        // Rejected entries claim no pixels
        assert_eq!(builder.total_length(), 0);

        let last = builder
            .build(&strip(5).with_offset(MAX_DEVICE_PIXELS - 5))
            .unwrap();
        assert_eq!(last.offset(), MAX_DEVICE_PIXELS - 5);
        assert_eq!(builder.total_length(), 5);
    }

    #[test]
    fn test_new_builder_starts_at_zero() {
        let prototypes = PrototypeTable::new();
        let mut first = LayoutBuilder::new(&prototypes);
        first.build(&strip(10)).unwrap();

        let mut second = LayoutBuilder::new(&prototypes);
        assert_eq!(second.build(&strip(10)).unwrap().offset(), 0);
    }

    #[test]
    fn test_star_prototype_keeps_its_arms() {
        let prototypes = PrototypeTable::builtin();
        let star = LayoutBuilder::new(&prototypes)
            .build(&LayoutSpec::device("star", "ZTR1"))
            .unwrap();

        assert_eq!(star.name(), "star");
        assert_eq!(star.lines().len(), 5);
        assert_eq!(star.lines()[1], vec![6, 7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_merge_lets_overrides_win() {
        let prototype = LayoutSpec {
            tok: Some("TEST".into()),
            len: Some(12),
            brightness: Some(10),
            order: Some(ChannelOrder::Rgb),
            ..LayoutSpec::default()
        };
        let overrides = LayoutSpec::device("mine", "TEST").with_brightness(90);

        let merged = merge_layout_spec(&prototype, &overrides);
        assert_eq!(merged.len, Some(12));
        assert_eq!(merged.brightness, Some(90));
        assert_eq!(merged.order, Some(ChannelOrder::Rgb));
        assert_eq!(merged.name.as_deref(), Some("mine"));
    }

    #[test]
    fn test_unknown_prototype() {
        let prototypes = PrototypeTable::builtin();
        let mut builder = LayoutBuilder::new(&prototypes);

        assert_eq!(
            builder.build(&LayoutSpec::device("x", "NOPE")),
            Err(LayoutError::UnknownPrototype)
        );
        // A self-describing entry still builds
        let layout = builder
            .build(&LayoutSpec::device("x", "NOPE").with_len(3))
            .unwrap();
        assert_eq!(layout.len(), 3);
    }

    #[test]
    fn test_missing_length() {
        let prototypes = PrototypeTable::new();
        let mut builder = LayoutBuilder::new(&prototypes);

        assert_eq!(
            builder.build(&LayoutSpec::default()),
            Err(LayoutError::MissingLength)
        );
        let layout = builder
            .build(&LayoutSpec::default().with_line(vec![3, 2, 1, 0]))
            .unwrap();
        assert_eq!(layout.len(), 4);
    }

    #[test]
    fn test_seven_segment_clock() {
        let prototypes = PrototypeTable::builtin();
        let clock = LayoutBuilder::new(&prototypes)
            .build(&LayoutSpec::device("clock", "CLK4"))
            .unwrap();
        let grid = clock.grid().unwrap();

        assert!(clock.is_clock());
        assert_eq!(clock.len(), 58);
        assert_eq!((grid.width(), grid.height()), (17, 7));

        // Colon sits in the middle column
        assert_eq!(grid.position_of(56), Some((8, 2)));
        assert_eq!(grid.position_of(57), Some((8, 4)));
        // Top segment of the first digit, right to left
        assert_eq!(grid.position_of(0), Some((2, 0)));
        assert_eq!(grid.position_of(1), Some((1, 0)));
        // Digits after the colon are shifted by one column
        assert_eq!(grid.pixel_at(9, 1), 30);
        assert_eq!(grid.pixel_at(0, 0), NO_PIXEL);

        assert_eq!(clock.linesh().len(), 7);
        assert!(clock.linesh().iter().all(|row| row.len() == 17));
        assert_eq!(clock.linesv().len(), 17);
        assert_eq!(clock.digits().len(), 4);
        assert_eq!(clock.digits()[3].len(), 14);
        assert_eq!(clock.lines_for(LineSet::Digits), clock.digits());
    }

    #[test]
    fn test_pixels_switched_off() {
        let prototypes = PrototypeTable::builtin();
        let mut clock = LayoutBuilder::new(&prototypes)
            .build(&LayoutSpec::device("clock", "CLK4"))
            .unwrap();

        assert!(clock.is_pixel_on(5));
        clock.set_pixel_on(5, false);
        assert!(!clock.is_pixel_on(5));
        clock.set_pixel_on(5, true);
        assert!(clock.is_pixel_on(5));

        let mut strip = LayoutBuilder::new(&prototypes).build(&strip(4)).unwrap();
        strip.set_pixel_on(1, false);
        assert!(strip.is_pixel_on(1));
    }

    #[test]
    fn test_line_set_variants() {
        let mut rng = fastrand::Rng::with_seed(7);
        assert_eq!(LineSet::from_variant(None, &mut rng), LineSet::Lines);
        assert_eq!(LineSet::from_variant(Some(1), &mut rng), LineSet::Horizontal);
        assert_eq!(LineSet::from_variant(Some(2), &mut rng), LineSet::Vertical);
        assert_eq!(LineSet::from_variant(Some(3), &mut rng), LineSet::Digits);
        assert_eq!(LineSet::from_variant(Some(9), &mut rng), LineSet::Lines);
    }

    proptest! {
        #[test]
        fn test_halves_mirror_around_center(half in 1usize..200) {
            let len = half * 2;
            let prototypes = PrototypeTable::new();
            let layout = LayoutBuilder::new(&prototypes).build(&strip(len)).unwrap();
            let line = layout.line();
            let lines = layout.lines();

            prop_assert_eq!(lines[0].len(), half);
            prop_assert_eq!(lines[1].len(), half);
            for i in 0..half {
                prop_assert_eq!(lines[0][i], line[len / 2 - i - 1]);
                prop_assert_eq!(lines[1][i], line[len / 2 + i]);
            }
        }
    }
}
