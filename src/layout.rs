//! Bit layout of a packed identifier
//!
//! ```text
//! 1 bit | base_bits (minutes) | node_bits (node id) | sequence_bits (per-minute counter)
//! 0     | 25                  | 16                  | 22                  (default)
//! ```

use crate::config::UidConfigError;

/// Total width of a packed identifier
pub const ID_BITS: u8 = 64;
/// Bits available for base + node + sequence (the top bit is always 0)
pub const PAYLOAD_BITS: u8 = ID_BITS - 1;
/// Width of the minute bucket in the reference layout
pub const BASE_BITS: u8 = 25;
/// Bits shared by node id and sequence in the reference layout
pub const TOTAL_NODE_AND_SEQUENCE_BITS: u8 = PAYLOAD_BITS - BASE_BITS;
/// Supported node bit range
pub const MIN_NODE_BITS: u8 = 6;
pub const MAX_NODE_BITS: u8 = 32;
pub const DEFAULT_NODE_BITS: u8 = 16;

/// Field widths, shifts and masks for packing `(base, node_id, sequence)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitLayout {
    base_bits: u8,
    node_bits: u8,
    sequence_bits: u8,
    base_mask: u32,
    node_mask: u32,
    sequence_mask: u64,
}

impl BitLayout {
    /// Reference layout: 25 base bits, `node_bits` node bits, the rest sequence
    pub fn new(node_bits: u8) -> Result<Self, UidConfigError> {
        if !(MIN_NODE_BITS..=MAX_NODE_BITS).contains(&node_bits) {
            return Err(UidConfigError::InvalidNodeBits { bits: node_bits });
        }
        Self::with_widths(BASE_BITS, node_bits, TOTAL_NODE_AND_SEQUENCE_BITS - node_bits)
    }

    /// Arbitrary split of the 63 payload bits
    pub fn with_widths(
        base_bits: u8,
        node_bits: u8,
        sequence_bits: u8,
    ) -> Result<Self, UidConfigError> {
        if !(MIN_NODE_BITS..=MAX_NODE_BITS).contains(&node_bits) {
            return Err(UidConfigError::InvalidNodeBits { bits: node_bits });
        }
        let sum = base_bits as u16 + node_bits as u16 + sequence_bits as u16;
        // base is persisted as a u32, sequence needs at least one bit to roll over
        if sum != PAYLOAD_BITS as u16 || !(1..=32).contains(&base_bits) || sequence_bits == 0 {
            return Err(UidConfigError::InvalidLayout {
                base_bits,
                node_bits,
                sequence_bits,
            });
        }
        Ok(Self {
            base_bits,
            node_bits,
            sequence_bits,
            base_mask: mask_u32(base_bits),
            node_mask: mask_u32(node_bits),
            sequence_mask: (1u64 << sequence_bits) - 1,
        })
    }

    #[inline(always)]
    pub const fn base_bits(&self) -> u8 {
        self.base_bits
    }

    #[inline(always)]
    pub const fn node_bits(&self) -> u8 {
        self.node_bits
    }

    #[inline(always)]
    pub const fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    #[inline(always)]
    pub const fn max_base(&self) -> u32 {
        self.base_mask
    }

    #[inline(always)]
    pub const fn max_node_id(&self) -> u32 {
        self.node_mask
    }

    #[inline(always)]
    pub const fn max_sequence(&self) -> u64 {
        self.sequence_mask
    }

    #[inline(always)]
    pub(crate) const fn node_shift(&self) -> u8 {
        self.sequence_bits
    }

    #[inline(always)]
    pub(crate) const fn base_shift(&self) -> u8 {
        self.node_bits + self.sequence_bits
    }

    /// Pack the three fields; each is masked to its width first
    #[inline(always)]
    pub const fn encode(&self, base: u32, node_id: u32, sequence: u64) -> u64 {
        (((base & self.base_mask) as u64) << self.base_shift())
            | (((node_id & self.node_mask) as u64) << self.node_shift())
            | (sequence & self.sequence_mask)
    }

    /// Split a packed id into `(base, node_id, sequence)`
    #[inline]
    pub const fn decode(&self, id: u64) -> (u32, u32, u64) {
        let base = ((id >> self.base_shift()) as u32) & self.base_mask;
        let node = ((id >> self.node_shift()) as u32) & self.node_mask;
        let sequence = id & self.sequence_mask;
        (base, node, sequence)
    }

    #[inline(always)]
    pub const fn base(&self, id: u64) -> u32 {
        ((id >> self.base_shift()) as u32) & self.base_mask
    }

    #[inline(always)]
    pub const fn node(&self, id: u64) -> u32 {
        ((id >> self.node_shift()) as u32) & self.node_mask
    }

    #[inline(always)]
    pub const fn sequence(&self, id: u64) -> u64 {
        id & self.sequence_mask
    }
}

impl Default for BitLayout {
    fn default() -> Self {
        Self {
            base_bits: BASE_BITS,
            node_bits: DEFAULT_NODE_BITS,
            sequence_bits: TOTAL_NODE_AND_SEQUENCE_BITS - DEFAULT_NODE_BITS,
            base_mask: mask_u32(BASE_BITS),
            node_mask: mask_u32(DEFAULT_NODE_BITS),
            sequence_mask: (1u64 << (TOTAL_NODE_AND_SEQUENCE_BITS - DEFAULT_NODE_BITS)) - 1,
        }
    }
}

#[inline(always)]
const fn mask_u32(bits: u8) -> u32 {
    ((1u64 << bits) - 1) as u32
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_reference_layout() {
        let layout = BitLayout::new(8).unwrap();
        assert_eq!(layout.base_bits(), 25);
        assert_eq!(layout.sequence_bits(), 30);
        assert_eq!(layout.max_node_id(), 255);
        assert_eq!(layout.max_sequence(), (1 << 30) - 1);
        assert_eq!(layout.encode(1, 5, 1), (1u64 << 38) | (5u64 << 30) | 1);
    }

    #[test]
    fn test_decode_recovers_fields() {
        let layout = BitLayout::new(16).unwrap();
        let cases = [
            (0, 0, 0),
            (1, 5, 1),
            (layout.max_base(), layout.max_node_id(), layout.max_sequence()),
            (0x123_4567, 0xBEEF, 0x2A_AAAA),
        ];
        for (base, node, seq) in cases {
            let id = layout.encode(base, node, seq);
            assert_eq!(layout.decode(id), (base, node, seq));
            assert_eq!(layout.base(id), base);
            assert_eq!(layout.node(id), node);
            assert_eq!(layout.sequence(id), seq);
        }
    }

    #[test]
    fn test_decode_recovers_random_fields_for_every_split() {
        let mut rng = rand::rng();
        for bits in MIN_NODE_BITS..=MAX_NODE_BITS {
            let layout = BitLayout::new(bits).unwrap();
            for _ in 0..1_000 {
                let base = rng.random_range(0..=layout.max_base());
                let node = rng.random_range(0..=layout.max_node_id());
                let seq = rng.random_range(0..=layout.max_sequence());

                let id = layout.encode(base, node, seq);
                assert_eq!(layout.decode(id), (base, node, seq), "node_bits={bits}");
                assert_eq!(id >> 63, 0);
            }
        }
    }

    #[test]
    fn test_sign_bit_stays_clear() {
        for bits in [MIN_NODE_BITS, 16, MAX_NODE_BITS] {
            let layout = BitLayout::new(bits).unwrap();
            let id = layout.encode(u32::MAX, u32::MAX, u64::MAX);
            assert_eq!(id >> 63, 0);
            assert_eq!(id, i64::MAX as u64);
        }
    }

    #[test]
    fn test_node_bits_out_of_range() {
        assert_eq!(
            BitLayout::new(5),
            Err(UidConfigError::InvalidNodeBits { bits: 5 })
        );
        assert_eq!(
            BitLayout::new(33),
            Err(UidConfigError::InvalidNodeBits { bits: 33 })
        );
    }

    #[test]
    fn test_widths_must_fill_payload() {
        assert!(BitLayout::with_widths(25, 8, 30).is_ok());
        assert!(BitLayout::with_widths(31, 16, 16).is_ok());
        assert_eq!(
            BitLayout::with_widths(25, 8, 29),
            Err(UidConfigError::InvalidLayout {
                base_bits: 25,
                node_bits: 8,
                sequence_bits: 29
            })
        );
        assert!(BitLayout::with_widths(33, 24, 6).is_err());
    }

    #[test]
    fn test_default_matches_new() {
        assert_eq!(BitLayout::default(), BitLayout::new(16).unwrap());
    }
}
