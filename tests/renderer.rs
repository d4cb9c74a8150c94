mod tests {
    use myrtio_light_show::color::SoftwareColorMath;
    use myrtio_light_show::effect::{EffectParams, EffectTag};
    use myrtio_light_show::frame_scheduler::FrameScheduler;
    use myrtio_light_show::intent::{IntentChannel, IntentError, ShowIntent};
    use myrtio_light_show::layout::LayoutSpec;
    use myrtio_light_show::renderer::{Renderer, ShowConfig};
    use myrtio_light_show::storage::{DeviceFile, MemoryStore, ShowStore};
    use myrtio_light_show::timeline::{NextMode, SegmentTarget, SequenceFile, TimelineEntry};
    use myrtio_light_show::{Duration, Instant, OutputDriver};

    type TestRenderer<'a> = Renderer<'a, MemoryStore, SoftwareColorMath, 4>;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn renderer<'a>(channel: &'a IntentChannel<4>, store: MemoryStore) -> TestRenderer<'a> {
        Renderer::new(
            channel.receiver(),
            store,
            SoftwareColorMath,
            ShowConfig::default(),
        )
    }

    fn file_switch(name: &str, target: &str) -> SequenceFile {
        SequenceFile::new(name).with_entry(TimelineEntry::file(0, target))
    }

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Vec<u32>>,
    }

    impl OutputDriver for Recorder {
        fn write(&mut self, frame: &[u32]) {
            self.frames.push(frame.to_vec());
        }
    }

    #[test]
    fn test_default_show() {
        let channel = IntentChannel::<4>::new();
        let mut renderer = renderer(&channel, MemoryStore::new());

        assert_eq!(renderer.device_name(), "default");
        assert_eq!(renderer.sequence_name(), "default");
        assert_eq!(renderer.segments().len(), 2);
        assert_eq!(renderer.frame().len(), 80);

        // Decay runs from the second frame on
        assert!(renderer.render(at(0)).iter().all(|&word| word == 0));
        assert!(renderer.sequencer().is_running());
        assert_eq!(renderer.segments()[0].action(), Some(EffectTag::PulseAll));

        let frame = renderer.render(at(50));
        assert_ne!(frame[0], 0);
        assert_ne!(frame[30], 0);
    }

    #[test]
    fn test_intents_change_speed_and_brightness() {
        let channel = IntentChannel::<4>::new();
        let mut renderer = renderer(&channel, MemoryStore::new());
        let sender = channel.sender();

        sender.send(ShowIntent::SetSpeed(250)).unwrap();
        sender.send(ShowIntent::SetBrightness(10)).unwrap();
        renderer.render(at(0));

        assert_eq!(renderer.speed(), 250);
        assert_eq!(renderer.brightness(), 10);
    }

    #[test]
    fn test_full_channel_hands_intent_back() {
        let channel = IntentChannel::<1>::new();
        let sender = channel.sender();

        sender.send(ShowIntent::Restart).unwrap();
        assert_eq!(
            sender.send(ShowIntent::SetSpeed(50)),
            Err(IntentError(ShowIntent::SetSpeed(50)))
        );
        assert_eq!(channel.receiver().drain().count(), 1);
        assert!(channel.receiver().try_receive().is_none());
    }

    #[test]
    fn test_missing_sequence_falls_back_to_default() {
        let channel = IntentChannel::<4>::new();
        let mut renderer = renderer(&channel, MemoryStore::new());

        channel
            .sender()
            .send(ShowIntent::LoadSequence("missing".into()))
            .unwrap();
        renderer.render(at(0));
        assert_eq!(renderer.sequence_name(), "default");
    }

    #[test]
    fn test_next_walks_stored_sequences() {
        let channel = IntentChannel::<4>::new();
        let mut store = MemoryStore::new();
        let second = SequenceFile::new("second").with_entry(TimelineEntry::trigger(
            0,
            SegmentTarget::All,
            "MARQ",
            EffectParams::default(),
        ));
        store.write_sequence("second", &second).unwrap();
        let mut renderer = renderer(&channel, store);
        renderer.render(at(0));

        channel
            .sender()
            .send(ShowIntent::Next { random: false })
            .unwrap();
        renderer.render(at(50));
        assert_eq!(renderer.sequence_name(), "second");
        assert!(
            renderer
                .segments()
                .iter()
                .all(|s| s.action() == Some(EffectTag::Marquee))
        );

        // Wraps around to the first stored name
        channel
            .sender()
            .send(ShowIntent::Next { random: false })
            .unwrap();
        renderer.render(at(100));
        assert_eq!(renderer.sequence_name(), "default");

        channel
            .sender()
            .send(ShowIntent::Next { random: true })
            .unwrap();
        renderer.render(at(150));
        assert!(["default", "second"].contains(&renderer.sequence_name()));
    }

    #[test]
    fn test_next_follows_store_keys_not_titles() {
        let channel = IntentChannel::<4>::new();
        let mut store = MemoryStore::empty();
        store
            .write_sequence("alpha", &SequenceFile::new("Alpha Show"))
            .unwrap();
        store
            .write_sequence("beta", &SequenceFile::new("Beta Show"))
            .unwrap();
        let mut renderer = Renderer::new(
            channel.receiver(),
            store,
            SoftwareColorMath,
            ShowConfig::default().with_sequence("alpha"),
        );
        renderer.render(at(0));
        assert_eq!(renderer.sequence_name(), "alpha");

        renderer.next_sequence(at(50), NextMode::Sequential);
        assert_eq!(renderer.sequence_name(), "beta");
        assert_eq!(renderer.sequencer().name(), "Beta Show");

        channel
            .sender()
            .send(ShowIntent::Next { random: false })
            .unwrap();
        renderer.render(at(100));
        assert_eq!(renderer.sequence_name(), "alpha");
        assert_eq!(renderer.sequencer().name(), "Alpha Show");
    }

    #[test]
    fn test_file_directive_switches_sequence() {
        let channel = IntentChannel::<4>::new();
        let mut store = MemoryStore::new();
        store
            .write_sequence("intro", &file_switch("intro", "default"))
            .unwrap();
        let mut renderer = Renderer::new(
            channel.receiver(),
            store,
            SoftwareColorMath,
            ShowConfig::default().with_sequence("intro"),
        );

        assert_eq!(renderer.sequence_name(), "intro");
        renderer.render(at(0));
        assert_eq!(renderer.sequence_name(), "default");
        assert_eq!(renderer.segments()[1].action(), Some(EffectTag::PulseAll));
    }

    #[test]
    fn test_switch_loops_are_cut_short() {
        let channel = IntentChannel::<4>::new();
        let mut store = MemoryStore::new();
        store.write_sequence("ping", &file_switch("ping", "pong")).unwrap();
        store.write_sequence("pong", &file_switch("pong", "ping")).unwrap();
        let mut renderer = Renderer::new(
            channel.receiver(),
            store,
            SoftwareColorMath,
            ShowConfig::default().with_sequence("ping"),
        );

        renderer.render(at(0));
        assert_eq!(renderer.sequence_name(), "ping");
    }

    #[test]
    fn test_load_device_rebuilds_segments() {
        let channel = IntentChannel::<4>::new();
        let mut store = MemoryStore::new();
        let strip = DeviceFile::new("strip", vec![LayoutSpec::default().with_len(12)]);
        store.write_device("strip", &strip).unwrap();
        let mut renderer = renderer(&channel, store);
        renderer.render(at(0));

        channel
            .sender()
            .send(ShowIntent::LoadDevice("strip".into()))
            .unwrap();
        renderer.render(at(50));
        assert_eq!(renderer.device_name(), "strip");
        assert_eq!(renderer.frame().len(), 12);
        assert_eq!(renderer.segments()[0].action(), Some(EffectTag::PulseAll));

        channel
            .sender()
            .send(ShowIntent::LoadDevice("missing".into()))
            .unwrap();
        renderer.render(at(100));
        assert_eq!(renderer.device_name(), "default");
        assert_eq!(renderer.frame().len(), 80);
    }

    #[test]
    fn test_out_of_range_device_falls_back() {
        let channel = IntentChannel::<4>::new();
        let mut store = MemoryStore::new();
        let big = DeviceFile::new(
            "big",
            vec![LayoutSpec::device("x", "LINE").with_offset(usize::MAX - 10)],
        );
        store.write_device("big", &big).unwrap();
        let mut renderer = Renderer::new(
            channel.receiver(),
            store,
            SoftwareColorMath,
            ShowConfig::default().with_device("big"),
        );

        assert_eq!(renderer.device_name(), "default");
        assert_eq!(renderer.render(at(0)).len(), 80);
        assert_eq!(renderer.render(at(50)).len(), 80);
    }

    #[test]
    fn test_layout_brightness_overrides_display() {
        let channel = IntentChannel::<4>::new();
        let mut store = MemoryStore::new();
        let device = DeviceFile::new(
            "two",
            vec![
                LayoutSpec::default().with_len(2).with_brightness(0),
                LayoutSpec::default().with_len(2),
            ],
        );
        store.write_device("two", &device).unwrap();
        let mut renderer = Renderer::new(
            channel.receiver(),
            store,
            SoftwareColorMath,
            ShowConfig::default().with_device("two"),
        );

        renderer.render(at(0));
        let frame = renderer.render(at(50));
        assert_eq!(&frame[..2], &[0, 0]);
        assert!(frame[2..].iter().all(|&word| word != 0));
    }

    #[test]
    fn test_scheduler_paces_frames() {
        let channel = IntentChannel::<4>::new();
        let renderer = renderer(&channel, MemoryStore::new());
        let mut scheduler = FrameScheduler::new(renderer, Recorder::default());

        let first = scheduler.tick(at(0));
        assert_eq!(first.sleep_duration, Duration::from_millis(50));
        assert_eq!(first.next_deadline, at(50));

        let late = scheduler.tick(at(70));
        assert_eq!(late.sleep_duration, Duration::from_millis(30));

        // Far behind: the backlog is dropped
        let resumed = scheduler.tick(at(400));
        assert_eq!(resumed.next_deadline, at(450));
        assert_eq!(resumed.sleep_duration, Duration::from_millis(50));

        let frames = &scheduler.output().frames;
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|frame| frame.len() == 80));
        assert_eq!(scheduler.renderer().sequence_name(), "default");
    }
}
