//! Codec Tests
//!
//! Tests for request encoding, reply decoding and body reads.

use std::io::{Cursor, ErrorKind};

use kisslight::protocol::{
    decode_reply, encode_command, read_block, read_line, read_reply, write_command, BlockEnd,
    Command, DeviceType, ProtocolVersion, Status, UpdateField,
};
use kisslight::KlError;

const V03: ProtocolVersion = ProtocolVersion::new(0, 3);
const V02: ProtocolVersion = ProtocolVersion::new(0, 2);

// =============================================================================
// Request Encoding Tests
// =============================================================================

#[test]
fn test_encode_toggle() {
    let cmd = Command::Toggle {
        name: "lamp".to_string(),
    };
    assert_eq!(encode_command(&cmd, V03), "TOGGLE lamp KL/0.3\n");
}

#[test]
fn test_encode_set_uppercases_command_and_arg() {
    let cmd = Command::Set {
        name: "desk".to_string(),
        command: "power".to_string(),
        arg: Some("on".to_string()),
    };
    assert_eq!(encode_command(&cmd, V03), "SET desk POWER ON KL/0.3\n");
}

#[test]
fn test_encode_set_without_arg() {
    let cmd = Command::Set {
        name: "desk".to_string(),
        command: "Toggle".to_string(),
        arg: None,
    };
    assert_eq!(encode_command(&cmd, V03), "SET desk TOGGLE KL/0.3\n");
}

#[test]
fn test_encode_set_keeps_name_case() {
    let cmd = Command::Set {
        name: "LivingRoom".to_string(),
        command: "dimmer".to_string(),
        arg: Some("40".to_string()),
    };
    assert_eq!(encode_command(&cmd, V03), "SET LivingRoom DIMMER 40 KL/0.3\n");
}

#[test]
fn test_encode_transmit_topic() {
    let cmd = Command::Transmit {
        topic: "cmnd/tasmota_1/POWER".to_string(),
        message: "ON".to_string(),
    };
    assert_eq!(
        encode_command(&cmd, V03),
        "TRANSMIT cmnd/tasmota_1/POWER ON KL/0.3\n"
    );
}

#[test]
fn test_encode_transmit_code() {
    let cmd = Command::TransmitCode {
        code: 5592371,
        pulse: 189,
    };
    assert_eq!(encode_command(&cmd, V02), "TRANSMIT 5592371 189 KL/0.2\n");
}

#[test]
fn test_encode_add_device_sends_type_id() {
    let cmd = Command::AddDevice {
        name: "bulb".to_string(),
        topic: "tasmota_bulb".to_string(),
        device_type: DeviceType::Rgbw,
        commands: None,
    };
    assert_eq!(encode_command(&cmd, V03), "ADD bulb tasmota_bulb 5 KL/0.3\n");
}

#[test]
fn test_encode_add_strip_with_commands() {
    let cmd = Command::AddDevice {
        name: "strip".to_string(),
        topic: "tasmota_strip".to_string(),
        device_type: DeviceType::PowerStrip,
        commands: Some("4".to_string()),
    };
    assert_eq!(encode_command(&cmd, V03), "ADD strip tasmota_strip 1 4 KL/0.3\n");
}

#[test]
fn test_encode_add_codes() {
    let cmd = Command::AddCodes {
        name: "fan".to_string(),
        on_code: 5592371,
        off_code: 5592380,
        pulse: 189,
    };
    assert_eq!(encode_command(&cmd, V02), "ADD fan 5592371 5592380 189 KL/0.2\n");
}

#[test]
fn test_encode_no_argument_verbs() {
    assert_eq!(encode_command(&Command::Sniff, V02), "SNIFF KL/0.2\n");
    assert_eq!(encode_command(&Command::List, V03), "LIST KL/0.3\n");
}

#[test]
fn test_encode_delete_and_status() {
    let delete = Command::Delete {
        name: "lamp".to_string(),
    };
    let status = Command::Status {
        name: "lamp".to_string(),
    };
    assert_eq!(encode_command(&delete, V03), "DELETE lamp KL/0.3\n");
    assert_eq!(encode_command(&status, V03), "STATUS lamp KL/0.3\n");
}

#[test]
fn test_encode_update() {
    let rename = Command::Update {
        field: UpdateField::Name,
        name: "lamp".to_string(),
        value: Some("desklamp".to_string()),
    };
    let refresh = Command::Update {
        field: UpdateField::State,
        name: "lamp".to_string(),
        value: None,
    };
    assert_eq!(encode_command(&rename, V03), "UPDATE NAME lamp desklamp KL/0.3\n");
    assert_eq!(encode_command(&refresh, V03), "UPDATE STATE lamp KL/0.3\n");
}

#[test]
fn test_encode_quit_has_no_version() {
    assert_eq!(encode_command(&Command::Quit, V03), "Q\n");
}

// =============================================================================
// Reply Decoding Tests
// =============================================================================

#[test]
fn test_decode_ok_reason_only() {
    let reply = decode_reply("RESP 200 OK\n").unwrap();
    assert_eq!(reply.tag, "RESP");
    assert_eq!(reply.status, Status::Ok);
    assert_eq!(reply.tokens, vec!["OK".to_string()]);
    assert_eq!(reply.reason(), "OK");
}

#[test]
fn test_decode_status_only() {
    let reply = decode_reply("KL/0.3 203").unwrap();
    assert_eq!(reply.status, Status::DeviceDeleted);
    assert!(reply.tokens.is_empty());
    assert!(reply.is_success());
}

#[test]
fn test_decode_sniff_capture() {
    let reply = decode_reply("KL/0.2 200 Code: 5592371 Pulse: 189").unwrap();
    assert_eq!(reply.tag, "KL/0.2");
    assert_eq!(reply.tokens, vec!["Code:", "5592371", "Pulse:", "189"]);
}

#[test]
fn test_decode_tolerates_extra_whitespace() {
    let reply = decode_reply("KL/0.3   404   no  such\r\n").unwrap();
    assert_eq!(reply.status, Status::NoSuchDevice);
    assert_eq!(reply.tokens, vec!["no", "such"]);
}

#[test]
fn test_decode_unknown_status_is_kept() {
    let reply = decode_reply("KL/0.3 299 whatever").unwrap();
    assert_eq!(reply.status, Status::Unrecognized(299));
    assert!(!reply.status.is_recognized());
    assert!(reply.is_success());
}

#[test]
fn test_decode_rejects_short_line() {
    assert!(matches!(decode_reply("KL/0.3"), Err(KlError::MalformedReply(_))));
    assert!(matches!(decode_reply(""), Err(KlError::MalformedReply(_))));
}

#[test]
fn test_decode_rejects_non_numeric_status() {
    assert!(matches!(
        decode_reply("KL/0.3 OK 200"),
        Err(KlError::MalformedReply(_))
    ));
    assert!(matches!(
        decode_reply("KL/0.3 -200"),
        Err(KlError::MalformedReply(_))
    ));
}

#[test]
fn test_decode_rejects_out_of_range_status() {
    assert!(matches!(
        decode_reply("KL/0.3 99999"),
        Err(KlError::MalformedReply(_))
    ));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_read_line_strips_terminators() {
    let mut cursor = Cursor::new(b"first\r\nsecond\n".to_vec());
    assert_eq!(read_line(&mut cursor).unwrap(), "first");
    assert_eq!(read_line(&mut cursor).unwrap(), "second");
}

#[test]
fn test_read_line_eof_is_transport_error() {
    let mut cursor = Cursor::new(Vec::new());
    match read_line(&mut cursor) {
        Err(KlError::Transport(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
        other => panic!("Expected transport error, got {:?}", other),
    }
}

#[test]
fn test_read_reply_from_stream() {
    let mut cursor = Cursor::new(b"KL/0.3 202 added\nKL/0.3 207\n".to_vec());
    assert_eq!(read_reply(&mut cursor).unwrap().status, Status::DeviceAdded);
    assert_eq!(read_reply(&mut cursor).unwrap().status, Status::Goodbye);
}

#[test]
fn test_read_block_count() {
    let mut cursor = Cursor::new(b"lamp\nfan\nstrip\nnext\n".to_vec());
    let lines = read_block(&mut cursor, BlockEnd::Count(3)).unwrap();
    assert_eq!(lines, vec!["lamp", "fan", "strip"]);

    // Line after the body is left unread
    assert_eq!(read_line(&mut cursor).unwrap(), "next");
}

#[test]
fn test_read_block_count_zero_reads_nothing() {
    let mut cursor = Cursor::new(b".\n".to_vec());
    assert!(read_block(&mut cursor, BlockEnd::Count(0)).unwrap().is_empty());
    assert_eq!(read_line(&mut cursor).unwrap(), ".");
}

#[test]
fn test_read_block_count_short_body_is_error() {
    let mut cursor = Cursor::new(b"lamp\nfan\n".to_vec());
    let result = read_block(&mut cursor, BlockEnd::Count(3));
    assert!(matches!(result, Err(KlError::Transport(_))));
}

#[test]
fn test_read_block_huge_count_is_error() {
    let mut cursor = Cursor::new(b"lamp\nfan\n".to_vec());
    let result = read_block(&mut cursor, BlockEnd::Count(usize::MAX));
    assert!(matches!(result, Err(KlError::Transport(_))));

    let mut cursor = Cursor::new(b"lamp\n.\n".to_vec());
    let result = read_block(&mut cursor, BlockEnd::Count(usize::MAX / 2));
    assert!(matches!(result, Err(KlError::MalformedReply(_))));
}

#[test]
fn test_read_block_count_early_sentinel_is_error() {
    let mut cursor = Cursor::new(b"lamp\n.\n".to_vec());
    let result = read_block(&mut cursor, BlockEnd::Count(3));
    assert!(matches!(result, Err(KlError::MalformedReply(_))));
}

#[test]
fn test_read_block_sentinel() {
    let mut cursor = Cursor::new(b"POWER ON\nDIMMER 40\n.\n".to_vec());
    let lines = read_block(&mut cursor, BlockEnd::Sentinel).unwrap();
    assert_eq!(lines, vec!["POWER ON", "DIMMER 40"]);
}

#[test]
fn test_read_block_sentinel_missing_is_error() {
    let mut cursor = Cursor::new(b"POWER ON\n".to_vec());
    let result = read_block(&mut cursor, BlockEnd::Sentinel);
    assert!(matches!(result, Err(KlError::Transport(_))));
}

#[test]
fn test_write_command() {
    let mut out = Vec::new();
    let cmd = Command::Toggle {
        name: "lamp".to_string(),
    };
    write_command(&mut out, &cmd, V03).unwrap();
    assert_eq!(out, b"TOGGLE lamp KL/0.3\n");
}

#[test]
fn test_write_command_validates_first() {
    let mut out = Vec::new();
    let cmd = Command::Toggle {
        name: "two words".to_string(),
    };
    assert!(matches!(
        write_command(&mut out, &cmd, V03),
        Err(KlError::Usage(_))
    ));
    assert!(out.is_empty());
}
