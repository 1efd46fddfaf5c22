//! Configuration tests

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::config::{UidConfig, UidConfigError};
    use crate::{BitLayout, TOTAL_NODE_AND_SEQUENCE_BITS};

    #[test]
    fn test_valid_node_bits() {
        for bits in 6..=32 {
            let config = UidConfig::builder().node_bits(bits).unwrap().build();
            assert_eq!(config.node_bits(), bits);
            assert_eq!(config.sequence_bits(), TOTAL_NODE_AND_SEQUENCE_BITS - bits);
            assert_eq!(config.layout().base_bits(), 25);
        }
    }

    #[test]
    fn test_node_bits_err() {
        let err = UidConfig::builder().node_bits(5).unwrap_err();
        assert_eq!(err, UidConfigError::InvalidNodeBits { bits: 5 });
        let err = UidConfig::builder().node_bits(33).unwrap_err();
        assert_eq!(err, UidConfigError::InvalidNodeBits { bits: 33 });
    }

    #[test]
    fn test_custom_config() {
        let epoch = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let config = UidConfig::builder()
            .node_bits(8)
            .unwrap()
            .epoch(epoch)
            .build();

        assert_eq!(config.node_bits(), 8);
        assert_eq!(config.sequence_bits(), 30);
        assert_eq!(config.epoch(), epoch);
        assert_eq!(config.max_node_id(), 255);
        assert_eq!(config.max_sequence(), (1 << 30) - 1);
    }

    #[test]
    fn test_custom_layout() {
        let layout = BitLayout::with_widths(31, 16, 16).unwrap();
        let config = UidConfig::builder().layout(layout).build();
        assert_eq!(config.layout().max_base(), u32::MAX >> 1);
        assert_eq!(config.max_sequence(), 0xFFFF);
    }

    #[test]
    fn test_default_config() {
        let config = UidConfig::default();
        assert_eq!(config.node_bits(), 16);
        assert_eq!(config.sequence_bits(), 22);
        assert_eq!(
            config.epoch(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_bit_config() {
        let config = UidConfig::default();
        assert_eq!(config.max_sequence(), 0x3F_FFFF);
        assert_eq!(config.max_node_id(), 0xFFFF);
    }
}
