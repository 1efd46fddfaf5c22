#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use crate::tests::test_utils::{config, epoch, frozen_uid, init_tracing, FailingStore};
    use crate::{LocalSettings, Uid, ROLLOVER_SEQUENCE};

    #[test]
    fn test_first_id_of_fresh_generator() {
        let dir = tempfile::tempdir().unwrap();
        let generator = frozen_uid(dir.path(), 8, 5, epoch() + Duration::minutes(1));

        assert_eq!(generator.base(), 1);
        assert_eq!(generator.node_id(), 5);
        assert_eq!(generator.current_id(), generator.layout().encode(1, 5, 0));

        let id = generator.next_id();
        assert_eq!(generator.decompose(id), (1, 5, 1));
        assert_eq!(generator.current_id(), id);
    }

    #[test]
    fn test_rollover_advances_base() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let generator = frozen_uid(dir.path(), 32, 9, epoch() + Duration::minutes(30));
        let max_seq = generator.layout().max_sequence();
        assert_eq!(max_seq, 63);

        let ids: Vec<u64> = (0..max_seq + 2).map(|_| generator.next_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let (first_base, _, first_seq) = generator.decompose(ids[0]);
        assert_eq!((first_base, first_seq), (30, 1));

        // the bucket issues sequences 1..=max_seq, then moves to the next base
        let last_in_bucket = ids[max_seq as usize - 1];
        assert_eq!(generator.decompose(last_in_bucket), (30, 9, max_seq));

        let rolled = ids[max_seq as usize];
        assert_eq!(generator.decompose(rolled), (31, 9, ROLLOVER_SEQUENCE));
        assert_eq!(generator.decompose(ids[max_seq as usize + 1]), (31, 9, 2));

        assert_eq!(generator.base(), 31);
        assert_eq!(generator.settings().load_base().unwrap(), 31);
    }

    #[test]
    fn test_base_races_ahead_of_clock() {
        let dir = tempfile::tempdir().unwrap();
        let generator = frozen_uid(dir.path(), 32, 0, epoch());
        for _ in 0..63 * 5 + 1 {
            generator.next_id();
        }
        // clock never moved, yet five buckets were exhausted
        assert_eq!(generator.base(), 5);
        assert_eq!(generator.decompose(generator.current_id()).2, ROLLOVER_SEQUENCE);
    }

    #[test]
    fn test_save_failure_does_not_stop_generation() {
        init_tracing();
        let store = FailingStore {
            fail_load: false,
            fail_save: true,
        };
        let now = epoch() + Duration::minutes(3);
        let settings = Arc::new(LocalSettings::with_store(2, store).with_clock(move || now));
        let generator = Uid::with_settings(config(32), settings).unwrap();

        let ids: Vec<u64> = (0..200).map(|_| generator.next_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(generator.base(), 3 + 3);
    }
}
