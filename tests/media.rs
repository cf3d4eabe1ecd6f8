mod common;

mod usage_log {
    use crate::common::{self, Card};
    use fc_eeprom::media::{POSITION_LOG_FILE, USAGE_LOG_FILE};
    use fc_eeprom::platform::Signal;
    use fc_eeprom::{ConfigStore, FeatureSet, MediaMirror, Record, UsageLog, defaults};
    use pretty_assertions::assert_eq;

    fn store() -> ConfigStore<common::Eeprom, common::Signals> {
        ConfigStore::new(
            common::Eeprom::new(1024),
            common::Signals::default(),
            FeatureSet::default(),
        )
        .unwrap()
    }

    fn flight_log() -> UsageLog {
        UsageLog {
            arm: 3,
            disarm: 2,
            lifetime: 120000,
            running: 1,
            ..UsageLog::default()
        }
    }

    #[test]
    fn round_trip() {
        let mut store = store();
        let mut mirror = MediaMirror::new(Card::new());
        assert!(mirror.is_available());

        store.set_usage_log(flight_log());
        store.mirror_usage_log_to_media(&mut mirror).unwrap();
        assert_eq!(
            mirror.media().text(USAGE_LOG_FILE).unwrap(),
            "arm=3\ndisarm=2\nstart=0\narmed_time=0\nlifetime=120000\n\
             failsafe=0\ni2c=0\nrunning=1\nchecksum=240\n"
        );

        store.set_usage_log(UsageLog::default());
        assert_eq!(store.load_usage_log_from_media(&mut mirror), Ok(true));
        assert_eq!(store.usage_log(), &flight_log());
        assert_eq!(store.usage_log().checksum(), flight_log().checksum());

        assert_eq!(mirror.media().open_files, 0);
        assert!(store.alarm().0.is_empty());
    }

    #[test]
    fn tolerates_unknown_keys_and_windows_line_endings() {
        let mut store = store();
        let card = Card::new().with_file(
            USAGE_LOG_FILE,
            "arm = 3\r\nvoltage=12\r\ndisarm=2\r\nlifetime=120000\r\nrunning=1\r\n\
             firmware_version_string=2.4\r\nchecksum=240\r\n",
        );
        let mut mirror = MediaMirror::new(card);

        assert_eq!(store.load_usage_log_from_media(&mut mirror), Ok(true));
        assert_eq!(store.usage_log(), &flight_log());
    }

    #[test]
    fn checksum_mismatch_rewrites_defaults() {
        let mut store = store();
        let card = Card::new().with_file(USAGE_LOG_FILE, "arm=3\nchecksum=1\n");
        let mut mirror = MediaMirror::new(card);

        assert_eq!(store.load_usage_log_from_media(&mut mirror), Ok(false));
        assert_eq!(store.usage_log(), &defaults::usage_log());
        assert_eq!(store.alarm().0, vec![Signal::UsageLogCorrupted]);
        assert_eq!(
            mirror.media().text(USAGE_LOG_FILE).unwrap(),
            "arm=0\ndisarm=0\nstart=0\narmed_time=0\nlifetime=0\n\
             failsafe=0\ni2c=0\nrunning=1\nchecksum=86\n"
        );

        // the EEPROM is left alone
        assert_eq!(store.storage().writes(), 0);
    }

    #[test]
    fn missing_file_keeps_log() {
        let mut store = store();
        store.set_usage_log(flight_log());
        let mut mirror = MediaMirror::new(Card::new());

        assert_eq!(store.load_usage_log_from_media(&mut mirror), Ok(true));
        assert_eq!(store.usage_log(), &flight_log());
        assert!(store.alarm().0.is_empty());
        assert_eq!(mirror.media().text(USAGE_LOG_FILE), None);
    }

    #[test]
    fn file_without_checksum_line() {
        let mut store = store();
        store.set_usage_log(flight_log());
        let card = Card::new().with_file(
            USAGE_LOG_FILE,
            "arm=3\ndisarm=2\nlifetime=120000\nrunning=1\n",
        );
        let mut mirror = MediaMirror::new(card);

        // same values as in memory, the in-memory checksum still matches
        assert_eq!(store.load_usage_log_from_media(&mut mirror), Ok(true));
        assert_eq!(store.usage_log(), &flight_log());

        mirror
            .media_mut()
            .files
            .insert(USAGE_LOG_FILE.to_string(), b"arm=9\n".to_vec());
        assert_eq!(store.load_usage_log_from_media(&mut mirror), Ok(false));
        assert_eq!(store.usage_log(), &defaults::usage_log());
        assert_eq!(store.alarm().0, vec![Signal::UsageLogCorrupted]);
    }

    #[test]
    fn unavailable_media_is_a_no_op() {
        let mut store = store();
        store.set_usage_log(flight_log());
        let mut mirror = MediaMirror::new(Card::missing());
        assert!(!mirror.is_available());

        assert_eq!(store.mirror_usage_log_to_media(&mut mirror), Ok(()));
        assert_eq!(store.load_usage_log_from_media(&mut mirror), Ok(true));
        assert_eq!(mirror.append_position(1, 2, 3), Ok(()));

        assert_eq!(store.usage_log(), &flight_log());
        assert!(mirror.media().files.is_empty());
        assert!(store.alarm().0.is_empty());
    }

    #[test]
    fn position_log_appends() {
        let mut mirror = MediaMirror::new(
            Card::new().with_file(POSITION_LOG_FILE, "473977420,85455970,1200\n"),
        );

        mirror.append_position(473977421, 85455971, 1250).unwrap();
        mirror.append_position(-1, -2, 0).unwrap();

        assert_eq!(
            mirror.media().text(POSITION_LOG_FILE).unwrap(),
            "473977420,85455970,1200\n473977421,85455971,1250\n-1,-2,0\n"
        );
        assert_eq!(mirror.media().open_files, 0);
    }
}
