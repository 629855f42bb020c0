mod ring_bytes;

pub use ring_bytes::{tail_str, RingBytes};
