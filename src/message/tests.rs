//! Tests for envelope serialisation.

use rstest::rstest;

use super::*;

#[rstest]
#[case::unit(Message::FirstDataSentComplete, MsgType::FirstDataSentComplete)]
#[case::connect(Message::Connect(RequestConnect { auth_code: Some(4242) }), MsgType::Connect)]
#[case::chunk(
    Message::SongFileChunk(ResponseSongFileChunk {
        chunk_number: 1,
        chunk_count: 1,
        file_number: 2,
        size: 3,
        song_metadata: None,
        data: vec![1, 2, 3],
        file_hash: Some("abc".into()),
    }),
    MsgType::SongFileChunk
)]
fn envelope_preserves_message_and_kind(#[case] message: Message, #[case] kind: MsgType) {
    let bytes = Envelope::new(message.clone()).to_bytes().expect("encode");
    let decoded = Envelope::from_bytes(&bytes).expect("decode");

    assert_eq!(decoded.version, PROTOCOL_VERSION);
    assert_eq!(decoded.message.msg_type(), kind);
    assert_eq!(decoded.message, message);
}

#[test]
fn trailing_bytes_are_ignored() {
    let mut bytes = Envelope::new(Message::KeepAlive).to_bytes().expect("encode");
    bytes.extend_from_slice(&[0xFF, 0xEE]);

    let decoded = Envelope::from_bytes(&bytes).expect("decode with trailing bytes");
    assert_eq!(decoded.message, Message::KeepAlive);
}

#[rstest]
#[case::empty(&[])]
#[case::unknown_tag(&[42, 250, 0xFF, 0xFF, 0xFF])]
fn garbage_is_a_decode_error(#[case] bytes: &[u8]) {
    let err = Envelope::from_bytes(bytes).expect_err("garbage must not decode");
    assert!(matches!(err, MessageError::Decode(_)));
}

#[test]
fn msg_type_names_match_protocol() {
    assert_eq!(MsgType::DownloadTotalSize.to_string(), "DOWNLOAD_TOTAL_SIZE");
    assert_eq!(Message::GetLibrary.msg_type().as_str(), "GET_LIBRARY");
}

#[test]
fn disconnect_reasons_are_human_readable() {
    assert_eq!(ReasonDisconnect::WrongAuthCode.text(), "Wrong auth code");
}
