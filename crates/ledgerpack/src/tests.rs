use crate::*;

// ============================================================================
//  SCALAR TESTS (Happy Path)
// ============================================================================

#[test]
fn test_bool_roundtrip() -> Result<()> {
    let mut enc = Encoder::new();
    enc.bool(true)?;
    enc.bool(false)?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.bool()?, true);
    assert_eq!(dec.bool()?, false);
    assert_eq!(dec.remaining(), 0);
    Ok(())
}

#[test]
fn test_u32_s32_roundtrip() -> Result<()> {
    let mut enc = Encoder::new();
    enc.u32(0)?;
    enc.u32(u32::MAX)?;
    enc.s32(i32::MAX)?;
    enc.s32(i32::MIN)?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.u32()?, 0);
    assert_eq!(dec.u32()?, u32::MAX);
    assert_eq!(dec.s32()?, i32::MAX);
    assert_eq!(dec.s32()?, i32::MIN);
    Ok(())
}

#[test]
fn test_u64_s64_roundtrip() -> Result<()> {
    let mut enc = Encoder::new();
    enc.u64(0)?;
    enc.u64(u64::MAX)?;
    enc.s64(i64::MAX)?;
    enc.s64(i64::MIN)?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.u64()?, 0);
    assert_eq!(dec.u64()?, u64::MAX);
    assert_eq!(dec.s64()?, i64::MAX);
    assert_eq!(dec.s64()?, i64::MIN);
    Ok(())
}

#[test]
fn test_u128_s128_roundtrip() -> Result<()> {
    let mut enc = Encoder::new();
    enc.u128(u128::MAX)?;
    enc.s128(i128::MIN)?;
    enc.s128(-1)?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.u128()?, u128::MAX);
    assert_eq!(dec.s128()?, i128::MIN);
    assert_eq!(dec.s128()?, -1);
    Ok(())
}

#[test]
fn test_256_bit_words() -> Result<()> {
    let mut word = [0u8; 32];
    word[31] = 7;
    let mut enc = Encoder::new();
    enc.u256(&word)?;
    enc.s256(&[0xFF; 32])?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.u256()?, word);
    assert_eq!(dec.s256()?, [0xFF; 32]);
    Ok(())
}

#[test]
fn test_integers_are_big_endian() -> Result<()> {
    let mut enc = Encoder::new();
    enc.u32(0x0102_0304)?;
    let bytes = enc.into_bytes()?;
    assert_eq!(bytes, vec![Tag::U32 as u8, 0x01, 0x02, 0x03, 0x04]);

    let mut enc = Encoder::new();
    enc.s16(-2)?;
    let bytes = enc.into_bytes()?;
    assert_eq!(bytes, vec![Tag::S16 as u8, 0xFF, 0xFE]);
    Ok(())
}

#[test]
fn test_void_and_none() -> Result<()> {
    let mut enc = Encoder::new();
    enc.void()?;
    enc.option_none()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    dec.void()?;
    dec.option_none()?;
    assert_eq!(dec.remaining(), 0);
    Ok(())
}

// ============================================================================
//  BLOB TESTS (Happy Path)
// ============================================================================

#[test]
fn test_strings() -> Result<()> {
    let mut enc = Encoder::new();
    enc.str("hello")?;
    enc.str("")?;
    enc.str("❤️")?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.str()?, "hello");
    assert_eq!(dec.str()?, "");
    assert_eq!(dec.str()?, "❤️");
    Ok(())
}

#[test]
fn test_bytes_and_address() -> Result<()> {
    let mut enc = Encoder::new();
    enc.bytes(&[1, 2, 3])?;
    enc.bytes(&[])?;
    enc.address("GABC")?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    assert_eq!(dec.bytes()?, &[1, 2, 3]);
    assert_eq!(dec.bytes()?, &[] as &[u8]);
    assert_eq!(dec.address()?, "GABC");
    Ok(())
}

// ============================================================================
//  CONTAINER TESTS (Happy Path)
// ============================================================================

#[test]
fn test_list_simple() -> Result<()> {
    let mut enc = Encoder::new();
    enc.list_begin()?;
    enc.u32(1)?;
    enc.u32(2)?;
    enc.list_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut list = dec.list()?;

    assert_eq!(list.count(), 2);
    assert_eq!(list.next()?.unwrap().u32()?, 1);
    assert_eq!(list.next()?.unwrap().u32()?, 2);
    assert!(list.next()?.is_none());
    Ok(())
}

#[test]
fn test_list_header_layout() -> Result<()> {
    let mut enc = Encoder::new();
    enc.list_begin()?;
    enc.bool(true)?;
    enc.list_end()?;

    let bytes = enc.into_bytes()?;
    assert_eq!(bytes, vec![
        Tag::List as u8,
        0, 0, 0, 1, // body length
        0, 0, 0, 1, // item count
        Tag::BoolTrue as u8,
    ]);
    Ok(())
}

#[test]
fn test_list_nested() -> Result<()> {
    let mut enc = Encoder::new();
    enc.list_begin()?;
        enc.list_begin()?;
            enc.u32(10)?;
        enc.list_end()?;
        enc.u32(20)?;
    enc.list_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut outer = dec.list()?;

    let mut inner = outer.next()?.unwrap().list()?;
    assert_eq!(inner.next()?.unwrap().u32()?, 10);

    assert_eq!(outer.next()?.unwrap().u32()?, 20);
    Ok(())
}

#[test]
fn test_map_pairs() -> Result<()> {
    // Map of { 1: "one", 2: "two" }
    let mut enc = Encoder::new();
    enc.map_begin()?;
        enc.u32(1)?;
        enc.str("one")?;
        enc.u32(2)?;
        enc.str("two")?;
    enc.map_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut map = dec.map()?;
    assert_eq!(map.count(), 2);

    let (mut k1, mut v1) = map.next()?.unwrap();
    assert_eq!(k1.u32()?, 1);
    assert_eq!(v1.str()?, "one");

    let (mut k2, mut v2) = map.next()?.unwrap();
    assert_eq!(k2.u32()?, 2);
    assert_eq!(v2.str()?, "two");

    assert!(map.next()?.is_none());
    Ok(())
}

#[test]
fn test_map_empty() -> Result<()> {
    let mut enc = Encoder::new();
    enc.map_begin()?;
    enc.map_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut map = dec.map()?;

    assert!(map.next()?.is_none());
    Ok(())
}

#[test]
fn test_record_fields() -> Result<()> {
    let mut enc = Encoder::new();
    enc.record_begin()?;
        enc.variant_begin("a")?;
            enc.u32(1)?;
        enc.variant_end()?;
        enc.variant_begin("b")?;
            enc.str("two")?;
        enc.variant_end()?;
    enc.record_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut rec = dec.record()?;
    assert_eq!(rec.count(), 2);

    let (k1, mut v1) = rec.next()?.unwrap();
    assert_eq!(k1, "a");
    assert_eq!(v1.u32()?, 1);

    let (k2, mut v2) = rec.next()?.unwrap();
    assert_eq!(k2, "b");
    assert_eq!(v2.str()?, "two");

    assert!(rec.next()?.is_none());
    Ok(())
}

#[test]
fn test_tuple_and_option() -> Result<()> {
    let mut enc = Encoder::new();
    enc.tuple_begin()?;
        enc.option_some_begin()?;
            enc.u64(100)?;
        enc.option_some_end()?;
        enc.option_none()?;
    enc.tuple_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut tup = dec.tuple()?;

    let mut first = tup.next()?.unwrap();
    assert_eq!(first.option()?.unwrap().u64()?, 100);
    let mut second = tup.next()?.unwrap();
    assert!(second.option()?.is_none());
    assert!(tup.next()?.is_none());
    Ok(())
}

#[test]
fn test_result_workflows() -> Result<()> {
    let mut enc = Encoder::new();
    enc.result_ok_begin()?;
    enc.str("ok")?;
    enc.result_ok_end()?;
    enc.result_err_begin()?;
    enc.u32(500)?;
    enc.result_err_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);

    match dec.result()? {
        Ok(mut d) => assert_eq!(d.str()?, "ok"),
        Err(_) => panic!("Expected Ok"),
    }
    match dec.result()? {
        Ok(_) => panic!("Expected Err"),
        Err(mut d) => assert_eq!(d.u32()?, 500),
    }
    Ok(())
}

// ============================================================================
//  COMPLEX INTEGRATION
// ============================================================================

#[test]
fn test_skip_logic() -> Result<()> {
    // Structure: List [ U32(1), Record(skipped), U32(2) ]
    let mut enc = Encoder::new();
    enc.list_begin()?;
        enc.u32(1)?;

        enc.record_begin()?;
            enc.variant_begin("key")?;
                enc.u128(99)?;
            enc.variant_end()?;
        enc.record_end()?;

        enc.u32(2)?;
    enc.list_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut list = dec.list()?;

    assert_eq!(list.next()?.unwrap().u32()?, 1);

    let mut skipped = list.next()?.unwrap();
    skipped.skip()?;
    assert_eq!(skipped.remaining(), 0);

    assert_eq!(list.next()?.unwrap().u32()?, 2);
    Ok(())
}

#[test]
fn test_raw_item_splices_encoded_value() -> Result<()> {
    let mut inner = Encoder::new();
    inner.str("spliced")?;
    let item = inner.into_bytes()?;

    let mut enc = Encoder::new();
    enc.list_begin()?;
    enc.raw_item(&item)?;
    enc.list_end()?;

    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    let mut list = dec.list()?;
    assert_eq!(list.count(), 1);
    assert_eq!(list.next()?.unwrap().str()?, "spliced");
    Ok(())
}

// ============================================================================
//  ENCODER STRICTNESS FAILURE MODES
// ============================================================================

#[test]
fn test_strict_option_empty() {
    let mut enc = Encoder::new();
    enc.option_some_begin().unwrap();
    assert_eq!(enc.option_some_end(), Err(Error::EmptyAdt(Scope::Option)));
}

#[test]
fn test_strict_variant_overflow() {
    let mut enc = Encoder::new();
    enc.variant_begin("v").unwrap();
    enc.u32(1).unwrap();
    assert_eq!(enc.u32(2), Err(Error::TooManyItems(Scope::Variant)));
}

#[test]
fn test_strict_record_rejects_bare_values() {
    let mut enc = Encoder::new();
    enc.record_begin().unwrap();
    assert_eq!(enc.u32(1), Err(Error::InvalidRecordEntry));
}

#[test]
fn test_strict_map_dangling_key() {
    let mut enc = Encoder::new();
    enc.map_begin().unwrap();
    enc.u32(1).unwrap();
    assert_eq!(enc.map_end(), Err(Error::DanglingMapKey));
}

#[test]
fn test_scope_mismatch_and_open_scope() {
    let mut enc = Encoder::new();
    enc.list_begin().unwrap();
    assert!(matches!(enc.map_end(), Err(Error::ScopeMismatch { expected: Scope::Map, actual: Scope::List })));
    assert!(matches!(enc.into_bytes(), Err(Error::ScopeStillOpen)));
}

#[test]
fn test_scope_underflow() {
    let mut enc = Encoder::new();
    assert_eq!(enc.list_end(), Err(Error::ScopeUnderflow));
}

// ============================================================================
//  DECODER FAILURE MODES
// ============================================================================

#[test]
fn test_decode_unknown_tag() {
    let bytes = [0xEE, 0x00];
    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.peek_tag(), Err(Error::InvalidTag(0xEE)));
    assert_eq!(dec.u32(), Err(Error::InvalidTag(0xEE)));
}

#[test]
fn test_decode_wrong_tag() -> Result<()> {
    let mut enc = Encoder::new();
    enc.u64(5)?;
    let bytes = enc.into_bytes()?;
    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.u32(), Err(Error::UnexpectedTag { expected: Tag::U32, found: Tag::U64 }));
    Ok(())
}

#[test]
fn test_decode_truncated_scalar() {
    let bytes = [Tag::U64 as u8, 0, 0, 0];
    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.u64(), Err(Error::UnexpectedEnd));
}

#[test]
fn test_decode_truncated_blob() {
    let bytes = [Tag::String as u8, 0, 0, 0, 10, b'h', b'i'];
    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.str(), Err(Error::UnexpectedEnd));
}

#[test]
fn test_decode_invalid_utf8() {
    let bytes = [Tag::String as u8, 0, 0, 0, 2, 0xC3, 0x28];
    let mut dec = Decoder::new(&bytes);
    assert_eq!(dec.str(), Err(Error::InvalidUtf8));
}

#[test]
fn test_decode_count_overstated() {
    // List header claims two items but the body holds one.
    let bytes = [Tag::List as u8, 0, 0, 0, 1, 0, 0, 0, 2, Tag::BoolTrue as u8];
    let mut dec = Decoder::new(&bytes);
    let mut list = dec.list().unwrap();
    assert!(list.next().unwrap().is_some());
    assert_eq!(list.next().unwrap_err(), Error::CountMismatch { declared: 2, found: 1 });
}

#[test]
fn test_decode_count_understated() {
    // List header claims one item but the body holds two.
    let bytes = [Tag::List as u8, 0, 0, 0, 2, 0, 0, 0, 1, Tag::BoolTrue as u8, Tag::BoolFalse as u8];
    let mut dec = Decoder::new(&bytes);
    let mut list = dec.list().unwrap();
    assert!(list.next().unwrap().is_some());
    assert!(matches!(list.next(), Err(Error::CountMismatch { declared: 1, .. })));
}
