//! Property tests for share file framing

use std::path::Path;

use quickcheck_macros::quickcheck;

use shardpipe::codec;

/// Tag headers round-trip through the big-endian encode/decode pair
#[quickcheck]
fn prop_tag_round_trip(tag: u32) -> bool {
    codec::decode_tag(codec::encode_tag(tag)) == tag
}

/// `read_tag` consumes exactly the 4 header bytes, leaving the payload
#[quickcheck]
fn prop_read_tag_leaves_payload(tag: u32, payload: Vec<u8>) -> bool {
    let mut framed = codec::encode_tag(tag).to_vec();
    framed.extend_from_slice(&payload);

    let mut reader = framed.as_slice();
    let Ok(parsed) = codec::read_tag(&mut reader) else {
        return false;
    };
    parsed == tag && reader == payload.as_slice()
}

/// Share filenames carry the zero-padded index their header claims
#[quickcheck]
fn prop_share_path_suffix_matches_index(index: u32) -> bool {
    let index = index % 1000;
    let path = codec::share_path(Path::new("base.dat"), index);
    let name = path.file_name().unwrap().to_str().unwrap();

    let Some(suffix) = name.strip_prefix("base.dat.") else {
        return false;
    };
    suffix.len() == 3 && suffix.parse::<u32>() == Ok(index)
}
