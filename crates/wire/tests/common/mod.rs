//! Wire-format builders shared by the integration tests.

#![allow(dead_code)]

use clickhouse_wire::encode_varuint_to_vec;

/// Appends a VarUInt-length-prefixed string.
pub fn put_str(out: &mut Vec<u8>, value: &str) {
    encode_varuint_to_vec(value.len() as u64, out);
    out.extend_from_slice(value.as_bytes());
}

/// Canonical client Hello body with the given revision and credentials.
pub fn client_hello(revision: u64, user: &str, password: &str) -> Vec<u8> {
    let mut out = Vec::new();
    encode_varuint_to_vec(0, &mut out); // Hello
    put_str(&mut out, "clickhouse-client");
    encode_varuint_to_vec(24, &mut out);
    encode_varuint_to_vec(8, &mut out);
    encode_varuint_to_vec(revision, &mut out);
    put_str(&mut out, "default");
    put_str(&mut out, user);
    put_str(&mut out, password);
    out
}

/// Client addendum with the given quota key and chunked-framing choices.
pub fn client_addendum(quota_key: &str, send: &str, recv: &str) -> Vec<u8> {
    let mut out = Vec::new();
    put_str(&mut out, quota_key);
    put_str(&mut out, send);
    put_str(&mut out, recv);
    out
}

/// Canonical server Hello containing exactly the fields `revision` admits.
/// Gate values are written as literals so the builder cannot share a bug
/// with the reader's gate table.
pub fn server_hello(revision: u64) -> Vec<u8> {
    let mut out = Vec::new();
    encode_varuint_to_vec(0, &mut out); // Hello
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
        out.extend_from_slice(&0x1122_3344_5566_7788u64.to_le_bytes());
    }
    out
}

/// One chunk: u32 little-endian length followed by the payload.
pub fn chunk(payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

/// The zero-length chunk that terminates a packet.
pub fn terminator() -> Vec<u8> {
    0u32.to_le_bytes().to_vec()
}
