//! Unit tests for the line codec used by the protocol engine.
//!
//! Covers:
//! - a single terminated line decodes without its delimiter
//! - several lines in one buffer decode one at a time
//! - a partial line waits for its delimiter
//! - an oversized line is rejected and decoding resumes afterwards
//! - invalid UTF-8 is rejected as a codec error
//! - blank lines are swallowed and surrounding whitespace trimmed
//! - rejected frames are counted
//! - outbound strings gain exactly one delimiter
//! - outbound strings containing a line break are refused

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use mcp_relay_agent::mcp::codec::{FrameCodec, MAX_FRAME_BYTES};
use mcp_relay_agent::AppError;

#[test]
fn single_line_decodes_without_delimiter() {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::from("{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n");

    let line = codec.decode(&mut buf).expect("decode");
    assert_eq!(
        line.as_deref(),
        Some("{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}")
    );
    assert!(buf.is_empty());
}

#[test]
fn batched_lines_decode_in_order() {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::from("one\ntwo\nthree\n");

    let mut lines = Vec::new();
    while let Some(line) = codec.decode(&mut buf).expect("decode") {
        lines.push(line);
    }
    assert_eq!(lines, ["one", "two", "three"]);
}

#[test]
fn partial_line_waits_for_delimiter() {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::from("{\"jsonrpc\":");

    assert!(codec.decode(&mut buf).expect("decode").is_none());

    buf.extend_from_slice(b"\"2.0\"}\n");
    assert_eq!(
        codec.decode(&mut buf).expect("decode").as_deref(),
        Some("{\"jsonrpc\":\"2.0\"}")
    );
}

#[test]
fn oversized_line_is_rejected_then_decoding_resumes() {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::with_capacity(MAX_FRAME_BYTES + 16);
    buf.extend_from_slice(&vec![b'a'; MAX_FRAME_BYTES + 1]);
    buf.extend_from_slice(b"\nnext\n");

    let err = codec.decode(&mut buf).expect_err("oversized line must fail");
    assert!(matches!(err, AppError::Codec(ref msg) if msg.contains("line too long")));
    assert_eq!(codec.rejected(), 1);

    let mut recovered = None;
    for _ in 0..4 {
        match codec.decode(&mut buf) {
            Ok(Some(line)) => {
                recovered = Some(line);
                break;
            }
            Ok(None) => break,
            Err(_) => {}
        }
    }
    assert_eq!(recovered.as_deref(), Some("next"));
}

#[test]
fn invalid_utf8_is_a_codec_error() {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::from(&[0xff, 0xfe, b'\n'][..]);

    let err = codec.decode(&mut buf).expect_err("invalid utf-8 must fail");
    assert!(matches!(err, AppError::Codec(_)));
}

#[test]
fn encode_appends_one_delimiter() {
    let mut codec = FrameCodec::new();
    let mut out = BytesMut::new();
    codec
        .encode("{\"id\":1}".to_owned(), &mut out)
        .expect("encode");
    assert_eq!(&out[..], b"{\"id\":1}\n");
}

#[test]
fn blank_lines_never_surface() {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::from("\n   \n\t\nframe\n\n");

    assert_eq!(codec.decode(&mut buf).expect("decode").as_deref(), Some("frame"));
    assert!(codec.decode(&mut buf).expect("decode").is_none());
    assert!(buf.is_empty());
    assert_eq!(codec.rejected(), 0);
}

#[test]
fn surrounding_whitespace_is_trimmed() {
    let mut codec = FrameCodec::new();
    let mut buf = BytesMut::from("  {\"id\":1}\t\r\n");
    assert_eq!(
        codec.decode(&mut buf).expect("decode").as_deref(),
        Some("{\"id\":1}")
    );
}

#[test]
fn custom_limit_counts_each_rejection() {
    let mut codec = FrameCodec::with_max_length(4);
    assert_eq!(codec.max_length(), 4);
    let mut buf = BytesMut::from("toolong\nok\n");

    let err = codec.decode(&mut buf).expect_err("over the limit");
    assert!(matches!(err, AppError::Codec(ref msg) if msg.contains("exceeded 4 bytes")));

    let mut frames = Vec::new();
    for _ in 0..4 {
        match codec.decode(&mut buf) {
            Ok(Some(line)) => frames.push(line),
            Ok(None) => break,
            Err(_) => {}
        }
    }
    assert_eq!(frames, ["ok"]);
    assert_eq!(codec.rejected(), 1);

    let mut bad = BytesMut::from(&[0xff, b'\n'][..]);
    assert!(codec.decode(&mut bad).is_err());
    assert_eq!(codec.rejected(), 2);
}

#[test]
fn encode_refuses_embedded_line_break() {
    let mut codec = FrameCodec::new();
    let mut out = BytesMut::new();
    for item in ["{\"a\":1}\n{\"b\":2}", "x\ry"] {
        let err = codec
            .encode(item.to_owned(), &mut out)
            .expect_err("line break must be refused");
        assert!(matches!(err, AppError::Codec(_)));
    }
    assert!(out.is_empty());
}
