mod tests {
    use myrtio_light_show::color::ChannelOrder;
    use myrtio_light_show::effect::EffectParams;
    use myrtio_light_show::layout::{LayoutError, LayoutSpec, PrototypeTable};
    use myrtio_light_show::storage::{
        DEFAULT_NAME, DeviceFile, MemoryStore, ShowStore, StoreError, builtin_sequence,
    };
    use myrtio_light_show::timeline::{SegmentTarget, SequenceFile, TimelineEntry};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_seeded_with_builtins() {
        let store = MemoryStore::new();

        assert_eq!(store.sequence_names(), [DEFAULT_NAME]);
        assert_eq!(store.device_names(), [DEFAULT_NAME]);
        assert_eq!(store.read_sequence(DEFAULT_NAME).unwrap(), builtin_sequence());
        assert_eq!(store.read_device(DEFAULT_NAME).unwrap(), DeviceFile::builtin());
    }

    #[test]
    fn test_builtin_device_layout() {
        let segments = DeviceFile::builtin()
            .build_segments(&PrototypeTable::builtin())
            .unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].layout().name(), "star");
        assert_eq!(segments[1].layout().offset(), 30);
        assert_eq!(segments[1].len(), 50);
        assert!(segments.iter().all(|s| s.layout().brightness() == Some(60)));
    }

    #[test]
    fn test_write_replaces_and_lists_in_order() {
        let mut store = MemoryStore::empty();
        assert!(store.sequence_names().is_empty());

        let first = SequenceFile::new("first").with_entry(TimelineEntry::restart(500));
        store.write_sequence("first", &first).unwrap();
        store
            .write_sequence("second", &SequenceFile::new("second"))
            .unwrap();

        let updated = first.clone().with_entry(TimelineEntry::trigger(
            0,
            SegmentTarget::All,
            "RNBW",
            EffectParams::default().with_kind(1),
        ));
        store.write_sequence("first", &updated).unwrap();

        assert_eq!(store.sequence_names(), ["first", "second"]);
        assert_eq!(store.read_sequence("first").unwrap(), updated);
        // Devices live under their own prefix
        assert!(store.device_names().is_empty());
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let mut store = MemoryStore::empty();
        store.insert_raw_sequence("broken", "{\"name\": \"broken\", \"seq\": [");
        store.insert_raw_device("broken", "[]");

        assert_eq!(
            store.read_sequence("absent"),
            Err(StoreError::NotFound("absent".into()))
        );
        assert_eq!(
            store.read_sequence("broken"),
            Err(StoreError::Parse("broken".into()))
        );
        assert_eq!(
            store.read_device("broken"),
            Err(StoreError::Parse("broken".into()))
        );
        assert_eq!(store.sequence_names(), ["broken"]);
    }

    #[test]
    fn test_device_from_json() {
        let mut store = MemoryStore::empty();
        store.insert_raw_device(
            "desk",
            r#"{"name": "desk", "dev": [
                {"name": "clock", "layout_id": "CLK4", "order": "RGB"},
                {"len": 12, "brightness": 20}
            ]}"#,
        );

        let device = store.read_device("desk").unwrap();
        let segments = device.build_segments(&PrototypeTable::builtin()).unwrap();
        assert_eq!(segments[0].len(), 58);
        assert!(segments[0].layout().is_clock());
        assert_eq!(segments[1].layout().offset(), 58);
    }

    #[test]
    fn test_device_round_trip_rebuilds_same_layouts() {
        let prototypes = PrototypeTable::builtin();
        let mut clock = LayoutSpec::device("clock", "CLK4");
        clock.order = Some(ChannelOrder::Grb);
        let device = DeviceFile::new(
            "desk",
            vec![
                clock,
                LayoutSpec::device("shelf", "LINE")
                    .with_line(vec![3, 2, 1, 0, 4, 5])
                    .with_offset(100)
                    .with_brightness(20),
                LayoutSpec::default().with_len(8),
            ],
        );
        let built = device.build_segments(&prototypes).unwrap();

        let mut store = MemoryStore::empty();
        store.write_device("desk", &device).unwrap();
        let reloaded = store.read_device("desk").unwrap();

        assert_eq!(reloaded, device);
        assert_eq!(reloaded.build_segments(&prototypes).unwrap(), built);
        assert_eq!(built[0].layout().order(), ChannelOrder::Grb);
        assert_eq!(built[1].layout().line(), &[3, 2, 1, 0, 4, 5]);
        assert_eq!(built[1].layout().offset(), 100);
        assert_eq!(built[1].layout().brightness(), Some(20));
        assert_eq!(built[2].layout().offset(), 58 + 50);
    }

    #[test]
    fn test_unbuildable_device() {
        let device = DeviceFile::new("odd", vec![LayoutSpec::device("x", "NONE")]);
        let err = device
            .build_segments(&PrototypeTable::builtin())
            .map_err(StoreError::from)
            .unwrap_err();

        assert_eq!(err, StoreError::Layout(LayoutError::UnknownPrototype));
        assert_eq!(
            err.to_string(),
            "invalid layout: layout references an unknown prototype"
        );
    }
}
