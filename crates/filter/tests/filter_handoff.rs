//! Facade behavior: dispatch, chunked activation, and hand-off permanence.

use clickhouse_filter::{ClickHouseFilter, ConnectionContext, FilterStatus, NetworkFilter};
use clickhouse_wire::{encode_varuint_to_vec, ClientPhase, ServerPhase, SSH_KEY_AUTHENTICATION_MARKER};

fn put_str(out: &mut Vec<u8>, value: &str) {
    encode_varuint_to_vec(value.len() as u64, out);
    out.extend_from_slice(value.as_bytes());
}

fn client_hello(revision: u64, user: &str, password: &str) -> Vec<u8> {
    let mut out = Vec::new();
    encode_varuint_to_vec(0, &mut out);
    put_str(&mut out, "clickhouse-client");
    encode_varuint_to_vec(24, &mut out);
    encode_varuint_to_vec(8, &mut out);
    encode_varuint_to_vec(revision, &mut out);
    put_str(&mut out, "default");
    put_str(&mut out, user);
    put_str(&mut out, password);
    out
}

fn client_addendum(quota_key: &str, send: &str, recv: &str) -> Vec<u8> {
    let mut out = Vec::new();
    put_str(&mut out, quota_key);
    put_str(&mut out, send);
    put_str(&mut out, recv);
    out
}

fn server_hello(revision: u64) -> Vec<u8> {
    let mut out = Vec::new();
    encode_varuint_to_vec(0, &mut out);
    put_str(&mut out, "ClickHouse");
    encode_varuint_to_vec(24, &mut out);
    encode_varuint_to_vec(8, &mut out);
    encode_varuint_to_vec(54470, &mut out);
    if revision >= 54058 {
        put_str(&mut out, "UTC");
    }
    if revision >= 54372 {
        put_str(&mut out, "ch-node-1");
    }
    if revision >= 54401 {
        encode_varuint_to_vec(7, &mut out);
    }
    if revision >= 54470 {
        put_str(&mut out, "notchunked");
        put_str(&mut out, "notchunked");
    }
    if revision >= 54461 {
        encode_varuint_to_vec(0, &mut out);
    }
    if revision >= 54462 {
        out.extend_from_slice(&7u64.to_le_bytes());
    }
    out
}

fn chunk(payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

fn terminator() -> Vec<u8> {
    0u32.to_le_bytes().to_vec()
}

fn send_client(filter: &mut ClickHouseFilter, bytes: &[u8]) -> FilterStatus {
    let slices = [bytes];
    filter.on_client_bytes(&slices, false)
}

fn send_server(filter: &mut ClickHouseFilter, bytes: &[u8]) -> FilterStatus {
    let slices = [bytes];
    filter.on_server_bytes(&slices, false)
}

#[test]
fn plain_handshake_hands_both_directions_off() {
    let mut filter = ClickHouseFilter::new();
    filter.initialize_read_context(ConnectionContext { id: 7 });
    filter.initialize_write_context(ConnectionContext { id: 7 });
    assert_eq!(filter.on_new_connection(), FilterStatus::Continue);

    assert_eq!(
        send_client(&mut filter, &client_hello(54000, "admin", "")),
        FilterStatus::Continue
    );
    assert!(filter.client_hands_off());
    assert!(!filter.server_hands_off());
    assert_eq!(filter.protocol_state().tcp_protocol_version().value(), 54000);

    assert_eq!(
        send_server(&mut filter, &server_hello(54000)),
        FilterStatus::Continue
    );
    assert!(filter.server_hands_off());
}

#[test]
fn chunked_client_direction_stays_inspected() {
    let mut filter = ClickHouseFilter::new();

    let mut bytes = client_hello(54470, "u", "p");
    bytes.extend_from_slice(&client_addendum("", "chunked", "notchunked"));
    // The first chunked packet rides in the same delivery as the handshake.
    bytes.extend_from_slice(&chunk(&[0x02, 0xAB]));
    bytes.extend_from_slice(&terminator());

    assert_eq!(send_client(&mut filter, &bytes), FilterStatus::Continue);
    assert!(!filter.client_hands_off());
    assert!(filter.protocol_state().chunked_client());
    assert!(!filter.protocol_state().chunked_server());

    // Later chunked deliveries keep flowing through the framer.
    let mut next = chunk(&[0x04]);
    next.extend_from_slice(&terminator());
    assert_eq!(send_client(&mut filter, &next), FilterStatus::Continue);
    assert!(!filter.client_hands_off());

    // The server direction did not negotiate chunking and hands off.
    assert_eq!(
        send_server(&mut filter, &server_hello(54470)),
        FilterStatus::Continue
    );
    assert!(filter.server_hands_off());
}

#[test]
fn ssh_handshake_runs_through_the_facade() {
    let mut filter = ClickHouseFilter::new();

    assert_eq!(
        send_client(
            &mut filter,
            &client_hello(54470, SSH_KEY_AUTHENTICATION_MARKER, ""),
        ),
        FilterStatus::Continue
    );
    assert_eq!(
        filter.client_handshake().phase(),
        ClientPhase::SshChallengeRequest
    );
    assert!(filter.protocol_state().is_ssh_based_auth());

    let mut request = Vec::new();
    encode_varuint_to_vec(11, &mut request);
    send_client(&mut filter, &request);

    let mut response = Vec::new();
    encode_varuint_to_vec(12, &mut response);
    put_str(&mut response, "sig");
    send_client(&mut filter, &response);

    send_client(
        &mut filter,
        &client_addendum("", "notchunked", "notchunked"),
    );
    assert!(filter.client_handshake().is_complete());
    assert!(filter.client_hands_off());

    let mut server_bytes = Vec::new();
    encode_varuint_to_vec(18, &mut server_bytes); // SSHChallenge
    server_bytes.extend_from_slice(&server_hello(54470));
    send_server(&mut filter, &server_bytes);
    assert!(filter.server_handshake().is_complete());
    assert!(filter.server_hands_off());
}

#[test]
fn malformed_first_byte_hands_the_client_off() {
    let mut filter = ClickHouseFilter::new();

    assert_eq!(send_client(&mut filter, &[0x05]), FilterStatus::Continue);
    assert!(filter.client_hands_off());
    // The server machine keeps waiting exactly where it was.
    assert_eq!(filter.server_handshake().phase(), ServerPhase::SshChallenge);
    assert!(filter.protocol_state().tcp_protocol_version().is_unset());
    assert!(!filter.server_hands_off());
}

#[test]
fn hand_off_is_permanent() {
    let mut filter = ClickHouseFilter::new();
    assert_eq!(
        send_client(&mut filter, &client_hello(54000, "admin", "")),
        FilterStatus::Continue
    );
    assert!(filter.client_hands_off());
    let revision = filter.protocol_state().tcp_protocol_version();
    let phase = filter.client_handshake().phase();

    // Garbage after hand-off must not disturb decoders or shared state.
    for _ in 0..3 {
        assert_eq!(
            send_client(&mut filter, &[0xFF, 0x00, 0x80, 0x13, 0x37]),
            FilterStatus::Continue
        );
    }
    assert_eq!(filter.protocol_state().tcp_protocol_version(), revision);
    assert_eq!(filter.client_handshake().phase(), phase);
    assert!(filter.client_hands_off());
}

#[test]
fn early_server_delivery_is_tolerated() {
    let mut filter = ClickHouseFilter::new();

    // Server bytes before the client Hello: the machine must not advance.
    assert_eq!(
        send_server(&mut filter, &server_hello(54000)),
        FilterStatus::Continue
    );
    assert!(!filter.server_handshake().is_complete());
    assert!(!filter.server_hands_off());

    assert_eq!(
        send_client(&mut filter, &client_hello(54000, "admin", "")),
        FilterStatus::Continue
    );
    assert_eq!(
        send_server(&mut filter, &server_hello(54000)),
        FilterStatus::Continue
    );
    assert!(filter.server_handshake().is_complete());
    assert!(filter.server_hands_off());
}

#[test]
fn end_of_stream_flag_does_not_change_dispatch() {
    let mut filter = ClickHouseFilter::new();
    let bytes = client_hello(54000, "admin", "");
    let (head, tail) = bytes.split_at(5);

    let head_slices = [head];
    assert_eq!(
        filter.on_client_bytes(&head_slices, false),
        FilterStatus::Continue
    );
    let tail_slices = [tail];
    assert_eq!(
        filter.on_client_bytes(&tail_slices, true),
        FilterStatus::Continue
    );
    assert!(filter.client_handshake().is_complete());
}

#[test]
fn fragmented_deliveries_reassemble_across_slices() {
    let mut filter = ClickHouseFilter::new();
    let bytes = client_hello(54000, "admin", "");

    // One delivery made of many tiny slices.
    let slices: Vec<&[u8]> = bytes.chunks(3).collect();
    assert_eq!(filter.on_client_bytes(&slices, false), FilterStatus::Continue);
    assert!(filter.client_handshake().is_complete());
    assert_eq!(filter.client_handshake().hello().user(), "admin");
}
