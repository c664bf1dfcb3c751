//! End-to-end buffer scenarios: framing, pooling discipline, text and
//! drain flows exercised together the way protocol code uses them.

mod common;

use chainbuf::codec::{Text, U16Be, U32Be, VarU64};
use chainbuf::{Buffer, BufferError, Unit};
use common::{buffer_with, init_test_logging, CountingPool};

#[test]
fn five_bytes_over_tiny_units() {
    init_test_logging();
    let mut buf = Buffer::with_unit_capacity(4);
    buf.write_slice(&[0x01, 0x02, 0x03, 0x04, 0x05]);

    // Five bytes over four-byte units: two units, second holding one.
    assert_eq!(buf.unit_count(), 2);
    assert_eq!(buf.size(), 5);
    assert_eq!(buf.index_of(0x04), Some(3));

    let tail = buf.split(4).unwrap();
    assert_eq!(buf.to_vec(), [0x01, 0x02, 0x03, 0x04]);
    assert_eq!(tail.to_vec(), [0x05]);
    assert!(buf < tail);
}

#[test]
fn length_prefix_framing_roundtrip() {
    init_test_logging();
    let mut frame = Buffer::with_unit_capacity(8);
    frame.write_value(VarU64, 7);
    frame.write_str("payload").unwrap();
    frame.write_value(U32Be, 0xCAFE_F00D);
    frame
        .prepend_value(U16Be, u16::try_from(frame.size()).unwrap())
        .unwrap();

    let total = usize::from(frame.read_value(U16Be).unwrap());
    assert_eq!(total, frame.remaining());
    let text_len = usize::try_from(frame.read_value(VarU64).unwrap()).unwrap();
    assert_eq!(frame.read_str(text_len).unwrap(), "payload");
    assert_eq!(frame.read_value(U32Be).unwrap(), 0xCAFE_F00D);
    assert_eq!(frame.remaining(), 0);
}

#[test]
fn pool_sees_every_unit_back() {
    init_test_logging();
    let pool = CountingPool::new();
    let taken = pool.taken.clone();
    let given = pool.given.clone();

    {
        let mut buf = Buffer::with_pool(pool, 4);
        buf.write_slice(&[0u8; 20]); // forces several fresh units
        buf.skip(10);
        buf.compact(); // consumed units go back immediately
        assert!(given.get() > 0);
        buf.drain();
    }
    // Chain drop returns whatever was still linked.
    assert_eq!(taken.get(), given.get());
    assert!(taken.get() >= 5);
}

#[test]
fn split_tail_unit_comes_from_the_pool() {
    init_test_logging();
    let pool = CountingPool::new();
    let taken = pool.taken.clone();

    let mut buf = Buffer::with_pool(pool, 4);
    buf.write_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    let before = taken.get();

    // Cutting inside a unit needs exactly one fresh unit for the
    // straddling bytes, and the pool must see that request.
    let tail = buf.split(2).unwrap();
    assert_eq!(taken.get(), before + 1);
    assert_eq!(buf.to_vec(), [0x01, 0x02]);
    assert_eq!(tail.to_vec(), [0x03, 0x04, 0x05, 0x06]);

    // A cut on a unit boundary relinks whole units and takes nothing.
    let pool = CountingPool::new();
    let taken = pool.taken.clone();
    let mut buf = Buffer::with_pool(pool, 4);
    buf.write_slice(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    let before = taken.get();
    let tail = buf.split(4).unwrap();
    assert_eq!(taken.get(), before);
    assert_eq!(tail.to_vec(), [0x05, 0x06]);
}

#[test]
fn drain_returns_units_but_keeps_buffer_usable() {
    init_test_logging();
    let mut buf = buffer_with(2, b"abcdef");
    buf.drain();
    assert_eq!(buf.size(), 0);
    assert_eq!(buf.unit_count(), 1);

    buf.write_slice(b"xy");
    assert_eq!(buf.to_vec(), b"xy");
}

#[test]
fn multibyte_text_across_many_units() {
    init_test_logging();
    let sample = "héllo — προσ 示例 🦀";
    let mut buf = Buffer::with_unit_capacity(3);
    buf.write_str(sample).unwrap();
    assert!(buf.unit_count() > 3);

    assert_eq!(buf.get_str(0, sample.len()).unwrap(), sample);
    assert_eq!(buf.read_str(sample.len()).unwrap(), sample);
    assert_eq!(buf.remaining(), 0);
}

#[test]
fn malformed_text_leaves_cursor_alone() {
    init_test_logging();
    let mut buf = buffer_with(2, &[0xE2, 0x28, 0xA1, b'x']);
    assert!(matches!(
        buf.read_str(3),
        Err(BufferError::InvalidArgument(_))
    ));
    assert_eq!(buf.position(), 0);
    assert_eq!(buf.remaining(), 4);
}

#[test]
fn appended_unit_is_spliced_not_copied() {
    init_test_logging();
    let mut side = Unit::new(8);
    side.push_slice(b"spliced");
    let mut buf = buffer_with(4, b"head");
    buf.append_unit(side);

    assert_eq!(buf.to_vec(), b"headspliced");
    assert_eq!(buf.unit_count(), 2);
}

#[test]
fn custom_charset_plugs_into_text_codec() {
    init_test_logging();

    /// Latin-1: one byte per char, rejecting anything above U+00FF.
    struct Latin1;

    impl chainbuf::Charset for Latin1 {
        fn encode(
            &self,
            text: &str,
            out: &mut dyn chainbuf::ByteSink,
        ) -> chainbuf::Result<()> {
            for ch in text.chars() {
                let code = u32::from(ch);
                if code > 0xFF {
                    return Err(BufferError::InvalidArgument(
                        "character outside latin-1",
                    ));
                }
                out.put_slice(&[code as u8]);
            }
            Ok(())
        }

        fn decode(
            &self,
            windows: &mut dyn Iterator<Item = &[u8]>,
            out: &mut String,
        ) -> chainbuf::Result<()> {
            for window in windows {
                out.extend(window.iter().map(|&b| char::from(b)));
            }
            Ok(())
        }
    }

    let codec = Text::new(Latin1);
    let mut buf = Buffer::with_unit_capacity(2);
    buf.write_text(&codec, "café").unwrap();
    assert_eq!(buf.size(), 4); // é is one byte here, two in utf-8

    assert_eq!(buf.get_text(&codec, 1, 3).unwrap(), "afé");
    assert_eq!(buf.read_text(&codec, 4).unwrap(), "café");

    assert!(buf.write_text(&codec, "🦀").is_err());
}
