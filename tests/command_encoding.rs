//! Frame-level golden vectors and encoding properties

use rcb4::protocol::{MAX_LITERAL_LEN, MAX_RAM_ADDRESS};
use rcb4::{CommandMessage, Error, Opcode};

fn wire_sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

#[test]
fn mov_ics_source_to_ram() {
    let mut cmd = CommandMessage::new(Opcode::Mov);
    cmd.set_source_ics(0, 1, 2).unwrap();
    cmd.set_destination_ram(0x0000).unwrap();
    assert_eq!(
        cmd.encode().unwrap(),
        [0x0A, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x0D]
    );
}

#[test]
fn mov_rom_source_is_eleven_bytes() {
    let mut cmd = CommandMessage::new(Opcode::Mov);
    cmd.set_source_rom(0x01_2345, 1).unwrap();
    cmd.set_destination_ram(0x0010).unwrap();
    assert_eq!(
        cmd.encode().unwrap(),
        [0x0B, 0x00, 0x03, 0x10, 0x00, 0x00, 0x45, 0x23, 0x01, 0x01, 0x88]
    );
}

#[test]
fn add_literal_to_ram() {
    let mut cmd = CommandMessage::new(Opcode::Add);
    cmd.set_destination_ram(0x0060).unwrap();
    cmd.set_source_literal(&[0x01, 0x00]).unwrap();
    assert_eq!(
        cmd.encode().unwrap(),
        [0x09, 0x06, 0x02, 0x60, 0x00, 0x00, 0x01, 0x00, 0x72]
    );
}

#[test]
fn suppressed_subtract_acts_as_compare() {
    let mut cmd = CommandMessage::new(Opcode::Sub);
    cmd.set_destination_ram(0x0010).unwrap();
    cmd.set_source_literal(&[0x05]).unwrap();
    cmd.set_do_not_save().unwrap();
    assert_eq!(
        cmd.encode().unwrap(),
        [0x08, 0x07, 0x82, 0x10, 0x00, 0x00, 0x05, 0xA6]
    );
}

#[test]
fn reply_size_follows_destination() {
    let mut cmd = CommandMessage::new(Opcode::Mov);
    cmd.set_source_literal(&[1, 2, 3]).unwrap();
    cmd.set_destination_com().unwrap();
    assert_eq!(cmd.expected_reply_size(), 3);

    cmd.set_destination_ram(0).unwrap();
    assert_eq!(cmd.expected_reply_size(), 0);

    let mut cmd = CommandMessage::new(Opcode::Add);
    cmd.set_source_ram(0x0040, 2).unwrap();
    cmd.set_destination_com().unwrap();
    assert_eq!(cmd.expected_reply_size(), 2);
}

#[test]
fn out_of_range_parameters_are_reported() {
    let mut cmd = CommandMessage::new(Opcode::Mov);
    assert_eq!(
        cmd.set_source_ram(MAX_RAM_ADDRESS + 1, 1),
        Err(Error::InvalidParameter {
            name: "RAM address",
            value: u32::from(MAX_RAM_ADDRESS) + 1,
            min: 0,
            max: MAX_RAM_ADDRESS.into(),
        })
    );
    assert!(cmd.set_source_literal(&[0u8; 122]).is_err());
    assert!(cmd.set_source_rom(0x04_0000, 1).is_err());
    assert!(cmd.set_source_ics(0, 37, 1).is_err());
    // Nothing above may have left a partial source behind.
    assert_eq!(cmd.total_size(), 0);
}

#[test]
fn error_messages_name_the_problem() {
    let mut cmd = CommandMessage::new(Opcode::ServoSingle);
    let err = cmd.set_data_size(2).unwrap_err();
    assert_eq!(
        err.to_string(),
        "set_data_size is not valid for SERVO_SINGLE commands"
    );

    let err = CommandMessage::new(Opcode::ServoSpeed).encode().unwrap_err();
    assert_eq!(err.to_string(), "SERVO_SPEED commands have no encoder");
}

mod proptests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    proptest! {
        /// Any in-range RAM-to-RAM MOV is 10 bytes and checksums cleanly.
        #[test]
        fn prop_mov_frame_shape(
            src_addr in 0u16..=MAX_RAM_ADDRESS,
            dst_addr in 0u16..=MAX_RAM_ADDRESS,
            size in 1u8..=118,
        ) {
            let mut cmd = CommandMessage::new(Opcode::Mov);
            cmd.set_source_ram(src_addr, size).unwrap();
            cmd.set_destination_ram(dst_addr).unwrap();

            let frame = cmd.encode().unwrap();
            prop_assert_eq!(frame.len(), 10);
            prop_assert_eq!(frame.len(), usize::from(cmd.total_size()));
            prop_assert_eq!(frame[9], wire_sum(&frame[..9]));
        }

        /// Literal sources grow the frame by exactly their length.
        #[test]
        fn prop_literal_frame_length(
            literal in prop::collection::vec(any::<u8>(), 1..=MAX_LITERAL_LEN),
        ) {
            let mut cmd = CommandMessage::new(Opcode::Mov);
            cmd.set_source_literal(&literal).unwrap();
            cmd.set_destination_com().unwrap();

            let frame = cmd.encode().unwrap();
            prop_assert_eq!(frame.len(), literal.len() + 7);
            prop_assert_eq!(usize::from(cmd.expected_reply_size()), literal.len());
            prop_assert_eq!(frame[frame.len() - 1], wire_sum(&frame[..frame.len() - 1]));
        }

        /// SERIES payloads come out in ascending servo-id order no matter
        /// the insertion order, with repeats overwriting.
        #[test]
        fn prop_series_stays_sorted(
            inserts in prop::collection::vec((1u8..=36, any::<u16>()), 1..24),
        ) {
            let mut cmd = CommandMessage::new(Opcode::ServoSeries);
            let mut expected = BTreeMap::new();
            for &(id, position) in &inserts {
                cmd.set_servo(id, 1, position).unwrap();
                expected.insert(id, position);
            }

            let servos = cmd.servos().unwrap();
            prop_assert_eq!(servos.len(), expected.len());
            let positions: Vec<u16> =
                servos.entries().iter().map(|e| e.position).collect();
            let sorted: Vec<u16> = expected.values().copied().collect();
            prop_assert_eq!(positions, sorted);

            let frame = cmd.encode().unwrap();
            prop_assert_eq!(frame.len(), 8 + 3 * expected.len());
            prop_assert_eq!(frame.len(), usize::from(cmd.total_size()));
            prop_assert_eq!(frame[frame.len() - 1], wire_sum(&frame[..frame.len() - 1]));
        }
    }
}
