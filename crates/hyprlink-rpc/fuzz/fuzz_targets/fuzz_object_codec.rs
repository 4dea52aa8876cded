#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes in two chunks; decoding may fail but must never panic
    let mut codec = hyprlink_rpc::JsonObjectCodec::new();
    let split = data.len() / 2;
    let mut buf = BytesMut::from(&data[..split]);

    while let Ok(Some(_)) = codec.decode(&mut buf) {}

    buf.extend_from_slice(&data[split..]);
    while let Ok(Some(_)) = codec.decode(&mut buf) {}
});
