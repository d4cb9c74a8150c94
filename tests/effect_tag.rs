mod tests {
    use myrtio_light_show::effect::{EffectRegistry, EffectTag};

    #[test]
    fn test_tag_names() {
        let names: Vec<&str> = EffectTag::ALL.iter().map(|tag| tag.as_str()).collect();
        assert_eq!(names, ["PULS", "PLSA", "PLSL", "RNBW", "MARQ"]);
    }

    #[test]
    fn test_tag_round_trip() {
        for tag in EffectTag::ALL {
            assert_eq!(EffectTag::parse_from_str(tag.as_str()), Some(tag));
            assert_eq!(EffectTag::from_raw(tag as u8), Some(tag));
        }
    }

    #[test]
    fn test_unknown_tags() {
        assert_eq!(EffectTag::parse_from_str("puls"), None);
        assert_eq!(EffectTag::parse_from_str("XXXX"), None);
        assert_eq!(EffectTag::from_raw(5), None);
        assert_eq!(EffectRegistry::lookup(""), None);
    }

    #[test]
    fn test_registry_slots_match_tags() {
        let registry = EffectRegistry::new();
        for tag in EffectTag::ALL {
            assert_eq!(registry.slot(tag).tag(), tag);
            assert_eq!(registry.slot(tag).live_instances(), 0);
        }
        assert_eq!(registry.live_instances(), 0);
    }
}
