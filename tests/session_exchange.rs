//! Session behavior against a scripted serial link

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use rcb4::transport::{SerialLink, TransportError, FALLBACK_BAUD, PRIMARY_BAUD};
use rcb4::{CommandMessage, Conditions, Opcode, PingReply, Session};

const PING_REQUEST: [u8; 3] = [0x03, 0xFE, 0x01];
const PING_ACK: [u8; 4] = [0x04, 0xFE, 0x06, 0x08];
const PING_NACK: [u8; 4] = [0x04, 0xFE, 0x15, 0x17];

#[derive(Debug)]
enum Reply {
    Frame(Vec<u8>),
    Silence,
}

#[derive(Debug, Default)]
struct Inner {
    script: VecDeque<Reply>,
    pending: VecDeque<u8>,
    written: Vec<Vec<u8>>,
    bauds: Vec<u32>,
    restored: bool,
}

/// Scripted link: each written frame consumes the next scripted reply.
#[derive(Clone, Debug, Default)]
struct FakeLink {
    inner: Rc<RefCell<Inner>>,
}

impl FakeLink {
    fn new() -> Self {
        Self::default()
    }

    fn script_frame(&self, frame: &[u8]) {
        self.inner
            .borrow_mut()
            .script
            .push_back(Reply::Frame(frame.to_vec()));
    }

    fn script_silence(&self) {
        self.inner.borrow_mut().script.push_back(Reply::Silence);
    }

    fn written(&self) -> Vec<Vec<u8>> {
        self.inner.borrow().written.clone()
    }

    fn bauds(&self) -> Vec<u32> {
        self.inner.borrow().bauds.clone()
    }

    fn restored(&self) -> bool {
        self.inner.borrow().restored
    }
}

impl SerialLink for FakeLink {
    fn configure(&mut self, baud: u32) -> io::Result<()> {
        self.inner.borrow_mut().bauds.push(baud);
        Ok(())
    }

    fn flush_input(&mut self) -> io::Result<()> {
        self.inner.borrow_mut().pending.clear();
        Ok(())
    }

    fn write_all(&mut self, frame: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.written.push(frame.to_vec());
        match inner.script.pop_front() {
            Some(Reply::Frame(bytes)) => inner.pending.extend(bytes),
            Some(Reply::Silence) | None => {}
        }
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.pending.len() < buf.len() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no reply"));
        }
        for slot in buf {
            *slot = inner.pending.pop_front().unwrap();
        }
        Ok(())
    }

    fn restore(&mut self) {
        self.inner.borrow_mut().restored = true;
    }
}

fn open_session(link: &FakeLink) -> Session<FakeLink> {
    link.script_frame(&PING_ACK);
    Session::open(link.clone()).unwrap()
}

#[test]
fn open_answers_at_primary_baud() {
    let link = FakeLink::new();
    let session = open_session(&link);
    assert_eq!(session.baud(), PRIMARY_BAUD);
    assert_eq!(link.bauds(), [PRIMARY_BAUD]);
    assert_eq!(link.written(), [PING_REQUEST.to_vec()]);
}

#[test]
fn open_falls_back_to_custom_baud() {
    let link = FakeLink::new();
    link.script_silence();
    link.script_silence();
    link.script_silence();
    link.script_frame(&PING_ACK);

    let session = Session::open(link.clone()).unwrap();
    assert_eq!(session.baud(), FALLBACK_BAUD);
    assert_eq!(link.bauds(), [PRIMARY_BAUD, FALLBACK_BAUD]);
    assert_eq!(link.written().len(), 4);
}

#[test]
fn open_gives_up_after_both_rates() {
    let link = FakeLink::new();
    let err = Session::open(link.clone()).unwrap_err();
    assert!(matches!(
        err,
        TransportError::LinkUnavailable {
            primary: PRIMARY_BAUD,
            fallback: FALLBACK_BAUD,
        }
    ));
    // Two probes per rate, then the link is put back.
    assert_eq!(link.written().len(), 4);
    assert!(link.restored());
}

#[test]
fn ping_reports_nack() {
    let link = FakeLink::new();
    let mut session = open_session(&link);
    link.script_frame(&PING_NACK);
    assert_eq!(session.ping().unwrap(), PingReply::Nack);
}

#[test]
fn send_validates_ack_status() {
    let link = FakeLink::new();
    let mut session = open_session(&link);

    let mut cmd = CommandMessage::new(Opcode::ServoSingle);
    cmd.set_servo(1, 127, 7500).unwrap();

    link.script_frame(&[0x04, 0x0F, 0x06, 0x19]);
    assert_eq!(session.send(&cmd, None).unwrap(), 0);
    assert_eq!(link.written()[1], cmd.encode().unwrap());
}

#[test]
fn send_surfaces_nack_as_rejection() {
    let link = FakeLink::new();
    let mut session = open_session(&link);

    let mut cmd = CommandMessage::new(Opcode::ServoSingle);
    cmd.set_servo(1, 127, 7500).unwrap();

    link.script_frame(&[0x04, 0x0F, 0x15, 0x28]);
    assert!(matches!(
        session.send(&cmd, None),
        Err(TransportError::Rejected { opcode: 0x0F })
    ));
}

#[test]
fn send_copies_data_reply_payload() {
    let link = FakeLink::new();
    let mut session = open_session(&link);

    let mut cmd = CommandMessage::new(Opcode::Mov);
    cmd.set_source_ram(0x0000, 2).unwrap();
    cmd.set_destination_com().unwrap();

    link.script_frame(&[0x05, 0x00, 0x34, 0x12, 0x4B]);
    let mut reply = [0u8; 2];
    assert_eq!(session.send(&cmd, Some(&mut reply)).unwrap(), 2);
    assert_eq!(reply, [0x34, 0x12]);
}

#[test]
fn send_rejects_corrupted_checksum() {
    let link = FakeLink::new();
    let mut session = open_session(&link);

    let mut cmd = CommandMessage::new(Opcode::Mov);
    cmd.set_source_ram(0x0000, 2).unwrap();
    cmd.set_destination_com().unwrap();

    link.script_frame(&[0x05, 0x00, 0x34, 0x12, 0x4C]);
    assert!(matches!(
        session.send(&cmd, Some(&mut [0u8; 2])),
        Err(TransportError::UnexpectedReply { opcode: 0x00, .. })
    ));
}

#[test]
fn send_checks_reply_buffer_capacity() {
    let link = FakeLink::new();
    let mut session = open_session(&link);

    let mut cmd = CommandMessage::new(Opcode::Mov);
    cmd.set_source_ram(0x0000, 2).unwrap();
    cmd.set_destination_com().unwrap();

    link.script_frame(&[0x05, 0x00, 0x34, 0x12, 0x4B]);
    assert!(matches!(
        session.send(&cmd, Some(&mut [0u8; 1])),
        Err(TransportError::BufferTooSmall {
            required: 2,
            available: 1,
        })
    ));
}

#[test]
fn send_times_out_without_reply() {
    let link = FakeLink::new();
    let mut session = open_session(&link);

    let mut cmd = CommandMessage::new(Opcode::ServoSingle);
    cmd.set_servo(1, 127, 7500).unwrap();

    link.script_silence();
    assert!(matches!(
        session.send(&cmd, None),
        Err(TransportError::Timeout(_))
    ));
}

#[test]
fn jump_frame_layout() {
    let link = FakeLink::new();
    let mut session = open_session(&link);

    link.script_frame(&[0x04, 0x0B, 0x06, 0x15]);
    session
        .jump(0x00_1234, Conditions::ALWAYS.zero_set())
        .unwrap();
    assert_eq!(
        link.written()[1],
        [0x07, 0x0B, 0x34, 0x12, 0x00, 0x05, 0x5D]
    );
}

#[test]
fn call_and_ret_frames() {
    let link = FakeLink::new();
    let mut session = open_session(&link);

    link.script_frame(&[0x04, 0x0C, 0x06, 0x16]);
    session.call(0x000000, Conditions::ALWAYS).unwrap();
    assert_eq!(
        link.written()[1],
        [0x07, 0x0C, 0x00, 0x00, 0x00, 0x00, 0x13]
    );

    link.script_frame(&[0x04, 0x0D, 0x06, 0x17]);
    session.ret().unwrap();
    assert_eq!(link.written()[2], [0x03, 0x0D, 0x10]);
}

#[test]
fn jump_rejects_out_of_range_address() {
    let link = FakeLink::new();
    let mut session = open_session(&link);
    let writes_before = link.written().len();

    assert!(matches!(
        session.jump(0x04_0000, Conditions::ALWAYS),
        Err(TransportError::Command(_))
    ));
    assert_eq!(link.written().len(), writes_before);
}

#[test]
fn read_ad_decodes_little_endian_sample() {
    let link = FakeLink::new();
    let mut session = open_session(&link);

    link.script_frame(&[0x05, 0x00, 0xF4, 0x01, 0xFA]);
    assert_eq!(session.read_ad(0).unwrap(), 500);
    // MOV from the converter block, 2 bytes, to COM.
    assert_eq!(
        link.written()[1],
        [0x0A, 0x00, 0x20, 0x00, 0x00, 0x00, 0x22, 0x00, 0x02, 0x4E]
    );

    assert!(matches!(
        session.read_ad(11),
        Err(TransportError::Command(_))
    ));
}
