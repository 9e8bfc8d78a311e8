// SPDX-License-Identifier: MIT

use super::*;
use crate::protocol::Request;
use std::io::Cursor;

#[tokio::test]
async fn round_trips_a_request_through_the_wire_format() {
    let request = Request::Get { id: "wi-1".to_string() };
    let bytes = encode(&request).unwrap();
    let mut framed = Vec::new();
    write_message(&mut framed, &bytes).await.unwrap();

    let mut reader = Cursor::new(framed);
    let read_back = read_message(&mut reader).await.unwrap();
    let decoded: Request = decode(&read_back).unwrap();
    assert_eq!(decoded, request);
}

#[tokio::test]
async fn rejects_a_length_prefix_over_the_message_cap() {
    let mut framed = Vec::new();
    framed.extend_from_slice(&((MAX_MESSAGE_SIZE + 1) as u32).to_be_bytes());
    let mut reader = Cursor::new(framed);
    let err = read_message(&mut reader).await.unwrap_err();
    assert!(matches!(err, WireError::MessageTooLarge { .. }));
}

#[tokio::test]
async fn empty_reader_reports_connection_closed() {
    let mut reader = Cursor::new(Vec::<u8>::new());
    let err = read_message(&mut reader).await.unwrap_err();
    assert!(matches!(err, WireError::ConnectionClosed));
}
