use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use nightqueue::server::transport::{TcpTransport, Transport};
use tokio_util::sync::CancellationToken;

#[test]
fn tcp_transport_answers_each_line_then_stops_on_cancel() {
    let cancel = CancellationToken::new();
    let mut transport = TcpTransport::bind(0, cancel.clone()).unwrap();
    let port = transport.local_addr().unwrap().port();

    let client = thread::spawn(move || {
        let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let mut replies = Vec::new();
        for message in ["{\"magic\": 1}", "{\"magic\": 2}"] {
            writer.write_all(message.as_bytes()).unwrap();
            writer.write_all(b"\n").unwrap();
            let mut reply = String::new();
            reader.read_line(&mut reply).unwrap();
            replies.push(reply.trim_end().to_string());
        }
        replies
    });

    for expected in ["{\"magic\": 1}", "{\"magic\": 2}"] {
        let line = transport.recv().unwrap();
        assert_eq!(line.as_deref(), Some(expected));
        transport.reply(&format!("ack {expected}")).unwrap();
    }
    assert_eq!(
        client.join().unwrap(),
        vec!["ack {\"magic\": 1}", "ack {\"magic\": 2}"]
    );

    let stopper = cancel.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        stopper.cancel();
    });
    assert_eq!(transport.recv().unwrap(), None);
}

#[test]
fn reply_without_client_is_ignored() {
    let mut transport = TcpTransport::bind(0, CancellationToken::new()).unwrap();
    assert!(transport.peer().is_none());
    transport.reply("nobody").unwrap();
}
