//! End-to-end handshake scenarios over canonical byte sequences.

mod common;

use clickhouse_wire::{
    ClientHandshake, ClientPhase, Cursor, Direction, ProtocolState, ServerHandshake,
    WireError, SSH_KEY_AUTHENTICATION_MARKER,
};
use common::{client_addendum, client_hello, put_str, server_hello};
use clickhouse_wire::encode_varuint_to_vec;

fn feed_client(machine: &mut ClientHandshake, state: &ProtocolState, bytes: &[u8]) -> bool {
    let slices = [bytes];
    let mut data = Cursor::new(&slices);
    machine.feed(&mut data, state).expect("stream is well formed")
}

fn feed_server(machine: &mut ServerHandshake, state: &ProtocolState, bytes: &[u8]) -> bool {
    let slices = [bytes];
    let mut data = Cursor::new(&slices);
    machine.feed(&mut data, state).expect("stream is well formed")
}

#[test]
fn minimal_old_revision_handshake() {
    let state = ProtocolState::new();
    let mut client = ClientHandshake::new();
    let mut server = ServerHandshake::new();

    assert!(feed_client(&mut client, &state, &client_hello(54000, "admin", "")));
    assert_eq!(client.phase(), ClientPhase::Done);
    assert_eq!(client.hello().client_name(), "clickhouse-client");
    assert_eq!(client.hello().client_version_major(), 24);
    assert_eq!(client.hello().client_version_minor(), 8);
    assert_eq!(client.hello().revision().value(), 54000);
    assert_eq!(client.hello().default_db(), "default");
    assert_eq!(client.hello().user(), "admin");
    assert!(!client.hello().has_password());

    // No addendum below 54458; the chunked flags stay off.
    assert!(!state.chunked_client());
    assert!(!state.chunked_server());

    assert!(feed_server(&mut server, &state, &server_hello(54000)));
    assert_eq!(server.hello().version_name(), "ClickHouse");
    assert_eq!(server.hello().time_zone(), "");
}

#[test]
fn modern_handshake_negotiates_chunking() {
    let state = ProtocolState::new();
    let mut client = ClientHandshake::new();

    let mut bytes = client_hello(54470, "u", "p");
    bytes.extend_from_slice(&client_addendum("", "chunked", "notchunked"));
    assert!(feed_client(&mut client, &state, &bytes));

    assert!(state.chunked_client());
    assert!(!state.chunked_server());
    assert_eq!(client.addendum().quota_key(), "");
    assert!(client.addendum().send_chunked());
    assert!(!client.addendum().recv_chunked());
}

#[test]
fn ssh_auth_path_walks_every_phase() {
    let state = ProtocolState::new();
    let mut client = ClientHandshake::new();
    let mut server = ServerHandshake::new();

    let hello = client_hello(54470, SSH_KEY_AUTHENTICATION_MARKER, "");
    assert!(!feed_client(&mut client, &state, &hello));
    assert_eq!(client.phase(), ClientPhase::SshChallengeRequest);
    assert!(state.is_ssh_based_auth());

    let mut request = Vec::new();
    encode_varuint_to_vec(11, &mut request); // SSHChallengeRequest
    assert!(!feed_client(&mut client, &state, &request));
    assert_eq!(client.phase(), ClientPhase::SshChallengeResponse);

    let mut response = Vec::new();
    encode_varuint_to_vec(12, &mut response); // SSHChallengeResponse
    put_str(&mut response, "ssh-ed25519 signature");
    assert!(!feed_client(&mut client, &state, &response));
    assert_eq!(client.phase(), ClientPhase::Addendum);

    assert!(feed_client(
        &mut client,
        &state,
        &client_addendum("", "notchunked", "notchunked"),
    ));
    assert_eq!(client.phase(), ClientPhase::Done);

    // The server side now owes one SSHChallenge before its Hello.
    let mut server_bytes = Vec::new();
    encode_varuint_to_vec(18, &mut server_bytes); // SSHChallenge
    server_bytes.extend_from_slice(&server_hello(54470));
    assert!(feed_server(&mut server, &state, &server_bytes));
}

#[test]
fn byte_at_a_time_delivery_matches_one_shot() {
    let one_shot_state = ProtocolState::new();
    let mut one_shot = ClientHandshake::new();
    let bytes = client_hello(54000, "admin", "");
    assert!(feed_client(&mut one_shot, &one_shot_state, &bytes));

    let state = ProtocolState::new();
    let mut machine = ClientHandshake::new();
    for (index, byte) in bytes.iter().enumerate() {
        let complete = feed_client(&mut machine, &state, std::slice::from_ref(byte));
        assert_eq!(complete, index + 1 == bytes.len(), "byte {index}");
    }

    assert_eq!(machine.hello().client_name(), one_shot.hello().client_name());
    assert_eq!(machine.hello().user(), one_shot.hello().user());
    assert_eq!(machine.hello().revision(), one_shot.hello().revision());
    assert_eq!(
        state.tcp_protocol_version(),
        one_shot_state.tcp_protocol_version()
    );
}

#[test]
fn malformed_first_byte_rejects_the_client_direction() {
    let state = ProtocolState::new();
    let mut client = ClientHandshake::new();
    let mut server = ServerHandshake::new();

    let bytes = [0x05u8];
    let slices: [&[u8]; 1] = [&bytes];
    let mut data = Cursor::new(&slices);
    assert_eq!(
        client.feed(&mut data, &state),
        Err(WireError::UnexpectedPacket {
            direction: Direction::Client,
            expected: 0,
            actual: 5,
        })
    );

    // The server machine saw nothing and still waits for the revision.
    assert!(!feed_server(&mut server, &state, &server_hello(54470)));
    assert!(state.tcp_protocol_version().is_unset());
}
