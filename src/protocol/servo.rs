//! Multi-servo presence bitset and ordered payload list
//!
//! The SERVO_CONST and SERVO_SERIES layouts start with a 5-byte bitset
//! marking which of the 36 servo slots the command addresses, followed by
//! one payload per marked servo. The firmware requires the payload list in
//! ascending servo-id order, matching bitset order; encoding out of order is
//! a silent protocol violation, so ordering is maintained on every insert.

use super::ICS_COUNT;

/// Per-servo payload: target speed and position
///
/// The speed byte is stored pre-inverted (the board's 1-fastest convention);
/// SERVO_CONST ignores it and uses the message-wide speed instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServoEntry {
    /// Inverted speed byte as the board expects it
    pub speed: u8,
    /// Target position, 0-0xFFFF
    pub position: u16,
}

/// Sorted, bitset-indexed set of servo payloads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServoSet {
    bitset: [u8; 5],
    entries: Vec<ServoEntry>,
}

impl ServoSet {
    /// Empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of servos present
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no servo has been added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The 5-byte presence bitset; bit `i` of byte `i / 8` marks servo id `i + 1`
    #[must_use]
    pub fn bitset(&self) -> &[u8; 5] {
        &self.bitset
    }

    /// Payloads in ascending servo-id order
    #[must_use]
    pub fn entries(&self) -> &[ServoEntry] {
        &self.entries
    }

    /// Insert or overwrite the payload for servo `id` (1-based, 1-36)
    ///
    /// The caller validates the id range. A new id opens a gap at its sorted
    /// position; a repeated id overwrites in place.
    pub fn insert(&mut self, id: u8, entry: ServoEntry) {
        debug_assert!(id >= 1 && id <= ICS_COUNT);
        let bit = usize::from(id - 1);
        let (block, mask) = (bit / 8, 1u8 << (bit % 8));

        // Set bits below `id` give the insertion index.
        let index = self.rank(bit);
        let overwrite = self.bitset[block] & mask != 0;

        if overwrite {
            self.entries[index] = entry;
        } else {
            self.bitset[block] |= mask;
            self.entries.insert(index, entry);
        }
    }

    /// Count set bits strictly below bit position `bit`
    fn rank(&self, bit: usize) -> usize {
        let mut count = 0usize;
        for (block, byte) in self.bitset.iter().enumerate() {
            let base = block * 8;
            if base >= bit {
                break;
            }
            let take = (bit - base).min(8);
            let mask = if take == 8 { 0xFF } else { (1u8 << take) - 1 };
            count += (byte & mask).count_ones() as usize;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(position: u16) -> ServoEntry {
        ServoEntry { speed: 0, position }
    }

    #[test]
    fn inserts_keep_ascending_order() {
        let mut set = ServoSet::new();
        set.insert(10, entry(0x0A0A));
        set.insert(2, entry(0x0202));
        set.insert(1, entry(0x0101));

        assert_eq!(set.len(), 3);
        assert_eq!(
            set.entries()
                .iter()
                .map(|e| e.position)
                .collect::<Vec<_>>(),
            [0x0101, 0x0202, 0x0A0A]
        );
        // Bits 0, 1, and 9 and nothing else.
        assert_eq!(set.bitset(), &[0b0000_0011, 0b0000_0010, 0, 0, 0]);
    }

    #[test]
    fn reinsert_overwrites_in_place() {
        let mut set = ServoSet::new();
        set.insert(2, entry(0x1111));
        set.insert(5, entry(0x5555));
        set.insert(2, entry(0x2222));

        assert_eq!(set.len(), 2);
        assert_eq!(set.entries()[0].position, 0x2222);
        assert_eq!(set.entries()[1].position, 0x5555);
    }

    #[test]
    fn highest_slot() {
        let mut set = ServoSet::new();
        set.insert(36, entry(1));
        set.insert(1, entry(2));
        assert_eq!(set.bitset()[4], 0b1000_0000);
        assert_eq!(set.entries()[1].position, 1);
    }
}
