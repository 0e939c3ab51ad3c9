//! End-to-end service tests over real sockets.

use reef_stream::{read_message, RpcService, Transport};
use reef_wire::{Call, OpaqueAuth};
use reef_xdr::{self as xdr, Decoder, Encode};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

const PROGRAM: u32 = 0x20000099;
const VERSION: u32 = 1;
const PROC_ECHO: u32 = 1;

fn echo_service() -> RpcService {
    let mut svc = RpcService::new("echo", PROGRAM, VERSION);
    svc.register_procedure(0, |_args: &[u8]| {
        Ok(Box::new(()) as Box<dyn Encode + Send>)
    });
    svc.register_procedure(PROC_ECHO, |args: &[u8]| {
        let (text, _) = xdr::from_bytes::<String>(args)?;
        Ok(Box::new(text) as Box<dyn Encode + Send>)
    });
    svc
}

fn echo_request(xid: u32, text: &str) -> Vec<u8> {
    let call = Call {
        xid,
        rpc_version: 2,
        program: PROGRAM,
        version: VERSION,
        procedure: PROC_ECHO,
        credentials: OpaqueAuth::null(),
        verifier: OpaqueAuth::null(),
    };
    let mut message = call.serialize();
    message.extend_from_slice(&xdr::to_bytes(text).unwrap());
    message
}

/// Reads the accepted-success prefix and returns (xid, result bytes).
fn split_reply(reply: &[u8]) -> (u32, Vec<u8>) {
    let mut dec = Decoder::new(reply);
    let xid = dec.take_u32().unwrap();
    assert_eq!(dec.take_u32().unwrap(), reef_wire::REPLY);
    assert_eq!(dec.take_u32().unwrap(), reef_wire::MSG_ACCEPTED);
    assert_eq!(dec.take_u32().unwrap(), reef_wire::AUTH_NULL);
    assert_eq!(dec.take_u32().unwrap(), 0);
    assert_eq!(dec.take_u32().unwrap(), reef_wire::SUCCESS);
    (xid, dec.take_rest().to_vec())
}

/// Writes `message` as `pieces` record-marking fragments, splitting the
/// payload evenly. Only the final fragment carries the last bit.
async fn write_fragmented(stream: &mut TcpStream, message: &[u8], pieces: usize) {
    let chunk = message.len().div_ceil(pieces);
    let parts: Vec<&[u8]> = message.chunks(chunk).collect();
    for (index, part) in parts.iter().enumerate() {
        let last = index == parts.len() - 1;
        let mut word = part.len() as u32;
        if last {
            word |= 1 << 31;
        }
        stream.write_all(&word.to_be_bytes()).await.unwrap();
        stream.write_all(part).await.unwrap();
    }
    stream.flush().await.unwrap();
}

#[tokio::test]
async fn fragmented_pipelined_requests_get_ordered_replies() {
    let mut svc = echo_service();
    let addr = svc
        .add_listener(Transport::Tcp, "127.0.0.1:0")
        .await
        .unwrap();
    svc.handle_clients();

    let mut stream = TcpStream::connect(addr).await.unwrap();

    // Two requests on one connection, each split across two fragments.
    write_fragmented(&mut stream, &echo_request(0xAAAA0001, "first"), 2).await;
    write_fragmented(&mut stream, &echo_request(0xAAAA0002, "second"), 2).await;

    let reply_one = read_message(&mut stream).await.unwrap().unwrap();
    let reply_two = read_message(&mut stream).await.unwrap().unwrap();

    let (xid_one, result_one) = split_reply(&reply_one);
    assert_eq!(xid_one, 0xAAAA0001);
    assert_eq!(xdr::from_bytes::<String>(&result_one).unwrap().0, "first");

    let (xid_two, result_two) = split_reply(&reply_two);
    assert_eq!(xid_two, 0xAAAA0002);
    assert_eq!(xdr::from_bytes::<String>(&result_two).unwrap().0, "second");

    svc.shutdown();
    svc.wait_until_done().await;
}

#[tokio::test]
async fn concurrent_connections_are_served_in_parallel() {
    let mut svc = echo_service();
    let addr = svc
        .add_listener(Transport::Tcp, "127.0.0.1:0")
        .await
        .unwrap();
    svc.handle_clients();

    let mut tasks = Vec::new();
    for index in 0..8u32 {
        tasks.push(tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let text = format!("client-{index}");
            write_fragmented(&mut stream, &echo_request(index, &text), 1).await;
            let reply = read_message(&mut stream).await.unwrap().unwrap();
            let (xid, result) = split_reply(&reply);
            assert_eq!(xid, index);
            assert_eq!(xdr::from_bytes::<String>(&result).unwrap().0, text);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    svc.shutdown();
    svc.wait_until_done().await;
}

#[tokio::test]
async fn udp_and_tcp_listeners_can_share_a_service() {
    let mut svc = echo_service();
    let tcp_addr = svc
        .add_listener(Transport::Tcp, "127.0.0.1:0")
        .await
        .unwrap();
    let udp_addr = svc
        .add_listener(Transport::Udp, "127.0.0.1:0")
        .await
        .unwrap();
    svc.handle_clients();

    // TCP side.
    let mut stream = TcpStream::connect(tcp_addr).await.unwrap();
    write_fragmented(&mut stream, &echo_request(1, "over tcp"), 1).await;
    let reply = read_message(&mut stream).await.unwrap().unwrap();
    assert_eq!(split_reply(&reply).0, 1);

    // UDP side: one datagram in, one datagram out.
    let client = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client
        .send_to(&echo_request(2, "over udp"), udp_addr)
        .await
        .unwrap();
    let mut buf = [0u8; 2048];
    let (len, _) = client.recv_from(&mut buf).await.unwrap();
    let (xid, result) = split_reply(&buf[..len]);
    assert_eq!(xid, 2);
    assert_eq!(xdr::from_bytes::<String>(&result).unwrap().0, "over udp");

    svc.shutdown();
    svc.wait_until_done().await;
}

#[tokio::test]
async fn shutdown_drains_all_workers() {
    let mut svc = echo_service();
    svc.add_listener(Transport::Tcp, "127.0.0.1:0")
        .await
        .unwrap();
    svc.add_listener(Transport::Udp, "127.0.0.1:0")
        .await
        .unwrap();
    svc.handle_clients();

    let handle = svc.shutdown_handle();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        handle.shutdown();
    });

    // Returns only once both listener workers observed the shutdown.
    tokio::time::timeout(std::time::Duration::from_secs(5), svc.wait_until_done())
        .await
        .expect("workers did not drain");
}

#[tokio::test]
async fn bind_conflict_surfaces_as_an_error() {
    let mut first = echo_service();
    let addr = first
        .add_listener(Transport::Tcp, "127.0.0.1:0")
        .await
        .unwrap();

    let mut second = echo_service();
    let result = second
        .add_listener(Transport::Tcp, &addr.to_string())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn malformed_request_drops_the_connection_but_not_the_service() {
    let mut svc = echo_service();
    let addr = svc
        .add_listener(Transport::Tcp, "127.0.0.1:0")
        .await
        .unwrap();
    svc.handle_clients();

    // A complete record whose body is too short to be a call envelope.
    let mut stream = TcpStream::connect(addr).await.unwrap();
    write_fragmented(&mut stream, &[0, 0, 0, 1], 1).await;
    assert!(read_message(&mut stream).await.unwrap().is_none());

    // The listener is still healthy.
    let mut stream = TcpStream::connect(addr).await.unwrap();
    write_fragmented(&mut stream, &echo_request(3, "still up"), 1).await;
    let reply = read_message(&mut stream).await.unwrap().unwrap();
    assert_eq!(split_reply(&reply).0, 3);

    svc.shutdown();
    svc.wait_until_done().await;
}
