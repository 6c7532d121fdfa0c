use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use shardmc_client::{ShardClient, ShardConfig, ShardedClient, StatFilter, Status};

/// One decoded binary request as seen by the mock server.
struct Request {
    opcode: u8,
    extras: Vec<u8>,
    key: Vec<u8>,
    value: Vec<u8>,
    cas: u64,
}

fn spawn_server(expected_requests: usize, handler: fn(usize, Request, &mut TcpStream)) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
        for idx in 0..expected_requests {
            let request = read_request(&mut stream).expect("read request");
            handler(idx, request, &mut stream);
        }
    });

    addr
}

fn read_request(stream: &mut TcpStream) -> std::io::Result<Request> {
    let mut header = [0u8; 24];
    stream.read_exact(&mut header)?;
    assert_eq!(header[0], 0x80, "request magic");

    let key_len = u16::from_be_bytes([header[2], header[3]]) as usize;
    let extra_len = header[4] as usize;
    let total = u32::from_be_bytes([header[8], header[9], header[10], header[11]]) as usize;
    let mut cas = [0u8; 8];
    cas.copy_from_slice(&header[16..24]);

    let mut body = vec![0u8; total];
    stream.read_exact(&mut body)?;

    Ok(Request {
        opcode: header[1],
        extras: body[..extra_len].to_vec(),
        key: body[extra_len..extra_len + key_len].to_vec(),
        value: body[extra_len + key_len..].to_vec(),
        cas: u64::from_be_bytes(cas),
    })
}

fn response_packet(opcode: u8, status: u16, cas: u64, key: &[u8], value: &[u8]) -> Vec<u8> {
    let total = key.len() + value.len();
    let mut packet = vec![0u8; 24 + total];
    packet[0] = 0x81;
    packet[1] = opcode;
    packet[2..4].copy_from_slice(&(key.len() as u16).to_be_bytes());
    packet[6..8].copy_from_slice(&status.to_be_bytes());
    packet[8..12].copy_from_slice(&(total as u32).to_be_bytes());
    packet[16..24].copy_from_slice(&cas.to_be_bytes());
    packet[24..24 + key.len()].copy_from_slice(key);
    packet[24 + key.len()..].copy_from_slice(value);
    packet
}

fn write_response(stream: &mut TcpStream, opcode: u8, status: u16, cas: u64, value: &[u8]) {
    let packet = response_packet(opcode, status, cas, b"", value);
    stream.write_all(&packet).expect("write response");
    stream.flush().expect("flush");
}

fn client_with_addr(addr: String) -> ShardClient {
    let mut config = ShardConfig::new(addr);
    config.pool_size = 1;
    config.read_timeout = Some(Duration::from_secs(2));
    config.write_timeout = Some(Duration::from_secs(2));
    config.connect_timeout = Some(Duration::from_secs(2));
    ShardClient::with_config(config).expect("client")
}

#[test]
fn set_then_get_roundtrip() {
    let addr = spawn_server(2, |idx, request, stream| {
        if idx == 0 {
            assert_eq!(request.opcode, 0x01);
            assert_eq!(request.key, b"greeting");
            assert_eq!(request.value, b"\"hello\"");
            // flags 0 then expiry, both big-endian
            assert_eq!(request.extras, [0, 0, 0, 0, 0, 0, 0, 60]);
            assert_eq!(request.cas, 0);
            write_response(stream, 0x01, 0, 9, b"");
        } else {
            assert_eq!(request.opcode, 0x00);
            assert_eq!(request.key, b"greeting");
            assert!(request.extras.is_empty());
            write_response(stream, 0x00, 0, 9, b"\"hello\"");
        }
    });

    let client = client_with_addr(addr);
    let status = client
        .set("greeting", &"hello", Duration::from_secs(60), 0)
        .expect("set");
    assert_eq!(status, Status::NoError);

    let result = client.get::<String>("greeting").expect("get");
    assert_eq!(result.status, Status::NoError);
    assert_eq!(result.cas, 9);
    assert_eq!(result.value, "hello");
}

#[test]
fn conditional_store_sends_cas() {
    let addr = spawn_server(1, |_, request, stream| {
        assert_eq!(request.opcode, 0x03);
        assert_eq!(request.cas, 7);
        write_response(stream, 0x03, 0x0002, 0, b"");
    });

    let client = client_with_addr(addr);
    let status = client
        .replace("contended", &42u32, Duration::from_secs(0), 7)
        .expect("replace");
    assert_eq!(status, Status::KeyExists);
}

#[test]
fn missing_key_surfaces_status_and_default_value() {
    let addr = spawn_server(1, |_, request, stream| {
        assert_eq!(request.opcode, 0x00);
        write_response(stream, 0x00, 0x0001, 0, b"");
    });

    let client = client_with_addr(addr);
    let result = client.get::<String>("absent").expect("get");
    assert_eq!(result.status, Status::KeyNotFound);
    assert_eq!(result.cas, 0);
    assert_eq!(result.value, "");
}

#[test]
fn undecodable_payload_is_best_effort() {
    let addr = spawn_server(1, |_, _, stream| {
        write_response(stream, 0x00, 0, 3, b"{not json");
    });

    let client = client_with_addr(addr);
    let result = client.get::<String>("mangled").expect("get");
    assert_eq!(result.status, Status::NoError);
    assert_eq!(result.cas, 3);
    assert_eq!(result.value, "");
}

#[test]
fn response_split_across_reads_still_parses() {
    let addr = spawn_server(1, |_, request, stream| {
        assert_eq!(request.opcode, 0x0b);
        let packet = response_packet(0x0b, 0, 0, b"", b"1.6.21");
        for chunk in [&packet[..10], &packet[10..20], &packet[20..]] {
            stream.write_all(chunk).expect("write chunk");
            stream.flush().expect("flush");
            thread::sleep(Duration::from_millis(20));
        }
    });

    let client = client_with_addr(addr);
    let result = client.version().expect("version");
    assert_eq!(result.status, Status::NoError);
    assert_eq!(result.value, "1.6.21");
}

#[test]
fn stat_aggregates_frames_until_terminator() {
    let addr = spawn_server(1, |_, request, stream| {
        assert_eq!(request.opcode, 0x10);
        assert!(request.key.is_empty());
        let mut burst = Vec::new();
        burst.extend_from_slice(&response_packet(0x10, 0, 0, b"pid", b"1234"));
        burst.extend_from_slice(&response_packet(0x10, 0, 0, b"uptime", b"60"));
        burst.extend_from_slice(&response_packet(0x10, 0, 0, b"threads", b"4"));
        burst.extend_from_slice(&response_packet(0x10, 0, 0, b"", b""));
        stream.write_all(&burst).expect("write burst");
    });

    let client = client_with_addr(addr);
    let pairs = client.stat(StatFilter::All).expect("stat");
    assert_eq!(
        pairs,
        vec![
            ("pid".to_string(), "1234".to_string()),
            ("uptime".to_string(), "60".to_string()),
            ("threads".to_string(), "4".to_string()),
        ]
    );
}

#[test]
fn stat_filter_travels_as_the_key() {
    let addr = spawn_server(1, |_, request, stream| {
        assert_eq!(request.opcode, 0x10);
        assert_eq!(request.key, b"slabs");
        stream
            .write_all(&response_packet(0x10, 0, 0, b"", b""))
            .expect("write terminator");
    });

    let client = client_with_addr(addr);
    let pairs = client.stat(StatFilter::Slabs).expect("stat");
    assert!(pairs.is_empty());
}

#[test]
fn stat_error_is_single_frame() {
    let addr = spawn_server(1, |_, _, stream| {
        stream
            .write_all(&response_packet(0x10, 0x0085, 0, b"", b""))
            .expect("write error");
    });

    let client = client_with_addr(addr);
    let pairs = client.stat(StatFilter::All).expect("stat");
    assert!(pairs.is_empty());
}

#[test]
fn delete_and_touch_statuses_pass_through() {
    let addr = spawn_server(2, |idx, request, stream| {
        if idx == 0 {
            assert_eq!(request.opcode, 0x04);
            assert_eq!(request.key, b"stale");
            write_response(stream, 0x04, 0, 0, b"");
        } else {
            assert_eq!(request.opcode, 0x1c);
            assert_eq!(request.extras, [0, 0, 0, 30]);
            write_response(stream, 0x1c, 0x0083, 0, b"");
        }
    });

    let client = client_with_addr(addr);
    assert_eq!(client.delete("stale").expect("delete"), Status::NoError);
    assert_eq!(
        client.touch("stale", Duration::from_secs(30)).expect("touch"),
        Status::NotSupported
    );
}

#[test]
fn get_and_touch_returns_value_and_cas() {
    let addr = spawn_server(1, |_, request, stream| {
        assert_eq!(request.opcode, 0x1d);
        assert_eq!(request.extras, [0, 0, 1, 44]);
        write_response(stream, 0x1d, 0, 21, b"\"kept\"");
    });

    let client = client_with_addr(addr);
    let result = client
        .get_and_touch::<String>("session", Duration::from_secs(300))
        .expect("gat");
    assert_eq!(result.cas, 21);
    assert_eq!(result.value, "kept");
}

#[test]
fn sharded_flush_fans_out_to_every_shard() {
    let flush_handler: fn(usize, Request, &mut TcpStream) = |_, request, stream| {
        assert_eq!(request.opcode, 0x08);
        assert_eq!(request.extras, [0, 0, 0, 0]);
        write_response(stream, 0x08, 0, 0, b"");
    };
    let addr_a = spawn_server(1, flush_handler);
    let addr_b = spawn_server(1, flush_handler);

    let mut config_a = ShardConfig::new(addr_a);
    config_a.pool_size = 1;
    let mut config_b = ShardConfig::new(addr_b);
    config_b.pool_size = 1;

    let client = ShardedClient::with_configs(vec![config_a, config_b]).expect("client");
    client.flush(Duration::from_secs(0)).expect("flush");
}

#[test]
fn endpoint_addressed_version_bypasses_the_ring() {
    // Shard A never accepts a request; only B may be contacted.
    let addr_a = spawn_server(0, |_, _, _| {});
    let addr_b = spawn_server(1, |_, request, stream| {
        assert_eq!(request.opcode, 0x0b);
        write_response(stream, 0x0b, 0, 0, b"1.5.0");
    });

    let mut config_a = ShardConfig::new(addr_a);
    config_a.pool_size = 1;
    let mut config_b = ShardConfig::new(addr_b.clone());
    config_b.pool_size = 1;

    let client = ShardedClient::with_configs(vec![config_a, config_b]).expect("client");
    let result = client.version(&addr_b).expect("version");
    assert_eq!(result.value, "1.5.0");

    let missing = client.version("203.0.113.9:11211");
    assert!(missing.is_err());
}

#[test]
fn sharded_routing_is_deterministic() {
    let addr_a = spawn_server(0, |_, _, _| {});
    let addr_b = spawn_server(0, |_, _, _| {});

    let client = ShardedClient::connect([addr_a, addr_b]).expect("client");
    let shards = client.shards();
    assert_eq!(shards.len(), 2);

    // Routing is observable through the ring without any I/O.
    use shardmc_client::ConsistentHashRing;
    let ring = ConsistentHashRing::with_nodes(shards.iter().cloned());
    for key in ["alpha", "beta", "gamma"] {
        let first = ring.resolve(key).map(|s| s.endpoint());
        assert_eq!(ring.resolve(key).map(|s| s.endpoint()), first);
    }
}
