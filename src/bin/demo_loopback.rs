// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Two in-process endpoints trading frames over a plain Vec<u8> "wire",
// standing in for demo_send_recv's two shared-memory processes.
//
// Usage:
//   demo_loopback [message]

use tinyframe::{ChecksumKind, Config, Consumed, Peer};

type Link = tinyframe::Endpoint<256, 256, 8, 8, 4>;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let message = args.get(1).cloned().unwrap_or_else(|| "hello from master".to_string());

    let cfg = Config::new(256, 256).checksum(ChecksumKind::Crc16);
    let mut master: Link = Link::new(cfg, Peer::Master).expect("valid config");
    let mut slave: Link = Link::new(cfg, Peer::Slave).expect("valid config");

    const MSG_TYPE_GREETING: u32 = 0x01;
    const MSG_TYPE_REPLY: u32 = 0x02;

    slave
        .add_type_listener(
            MSG_TYPE_GREETING,
            Box::new(|msg| {
                println!("slave: received {:?}", String::from_utf8_lossy(msg.payload));
                Consumed::Yes
            }),
        )
        .expect("listener table has room");

    let mut master_to_slave = Vec::new();
    let frame_id = master
        .send_with_listener(
            &mut master_to_slave,
            MSG_TYPE_GREETING,
            message.as_bytes(),
            Some(5),
            Box::new(|msg| {
                println!("master: got reply {:?}", String::from_utf8_lossy(msg.payload));
                Consumed::Yes
            }),
        )
        .expect("encodes within TX_CAP");

    println!("master: sent frame_id {frame_id:#x}, {} bytes on the wire", master_to_slave.len());
    slave.accept(&master_to_slave);

    let mut slave_to_master = Vec::new();
    let request = tinyframe::Message::new(frame_id, MSG_TYPE_GREETING, message.as_bytes(), false);
    slave
        .respond(&mut slave_to_master, &request, MSG_TYPE_REPLY, b"hi back", false)
        .expect("encodes within TX_CAP");

    master.accept(&slave_to_master);

    // Ticking with nothing pending is a no-op; shown here to illustrate
    // the call a real poll loop would make once per timer interrupt.
    master.tick();
    slave.tick();
}
