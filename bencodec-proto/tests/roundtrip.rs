use bencodec_proto::bencode::{Element, Value, decode, encode, encode_element};

/// A small single-file torrent, in canonical form, whose `pieces` field holds raw binary.
fn metainfo() -> Vec<u8> {
    let pieces: Vec<u8> = (0u8..40).collect();
    let parts: [&[u8]; 6] = [
        b"d8:announce40:http://tracker.example.org:6969/announce",
        b"13:announce-listll25:http://a.example/announceel18:udp://b.example:80ee",
        b"13:creation datei1700000000e",
        b"4:infod6:lengthi1048576e4:name10:debian.iso12:piece lengthi262144e6:pieces40:",
        &pieces,
        b"ee",
    ];
    parts.concat()
}

fn assert_raw_fidelity(element: &Element) {
    let redecoded = decode(element.raw()).unwrap();
    assert_eq!(redecoded, vec![element.clone()]);
    match element.value() {
        Value::List(list) => list.iter().for_each(assert_raw_fidelity),
        Value::Dict(dict) => dict.values().for_each(assert_raw_fidelity),
        _ => {}
    }
}

#[test]
fn metainfo_round_trips() {
    let input = metainfo();
    let elements = decode(&input).unwrap();
    assert_eq!(elements.len(), 1);
    assert_eq!(encode(&elements), input);
}

#[test]
fn metainfo_fields() {
    let input = metainfo();
    let elements = decode(&input).unwrap();
    let root = &elements[0];

    assert_eq!(
        root.get("announce").and_then(Element::as_str),
        Some("http://tracker.example.org:6969/announce")
    );
    assert_eq!(root.get("creation date").and_then(Element::as_int), Some(1_700_000_000));

    let tiers = root.get("announce-list").and_then(Element::as_list).unwrap();
    assert_eq!(tiers.len(), 2);
    assert_eq!(tiers[1].raw(), b"l18:udp://b.example:80e");

    let info = root.get("info").unwrap();
    assert_eq!(info.get("piece length").and_then(Element::as_int), Some(262_144));
    let pieces = info.get("pieces").and_then(Element::as_bytes).unwrap();
    assert_eq!(pieces.len(), 40);
    assert_eq!(pieces[39], 39);

    // The info dictionary is usually hashed as found in the file.
    let start = input.windows(6).position(|w| w == b"4:info").unwrap() + 6;
    assert_eq!(info.raw(), &input[start..input.len() - 1]);
}

#[test]
fn raw_spans_decode_to_their_element() {
    let input = metainfo();
    for element in decode(&input).unwrap().iter() {
        assert_raw_fidelity(element);
    }

    let input = b"i-7el0:i0eed1:ad1:adeee4:spam";
    for element in decode(input).unwrap().iter() {
        assert_raw_fidelity(element);
    }
}

#[test]
fn structure_survives_re_encoding() {
    // Not canonical: keys out of order and a duplicate key, so bytes change but structure holds.
    let input = b"d4:spami1e3:cowl1:ae4:spami2ee";
    let decoded = decode(input).unwrap();
    let encoded = encode(&decoded);
    assert_ne!(&encoded[..], &input[..]);
    assert_eq!(encoded, b"d3:cowl1:ae4:spami2ee");

    let redecoded = decode(&encoded).unwrap();
    assert_eq!(redecoded, decoded);
}

#[test]
fn canonical_samples_round_trip() {
    let samples: [&[u8]; 9] = [
        b"i42e",
        b"4:spam",
        b"l4:spam4:eggse",
        b"d3:cow3:moo4:spam4:eggse",
        b"d1:ad1:adeee",
        b"llli42ei42eeli42eeeli42eee",
        b"0:",
        b"i-9223372036854775808e",
        b"i1e2:abli2eed0:lee",
    ];
    for sample in samples {
        let elements = decode(sample).unwrap();
        assert_eq!(encode(&elements), sample);
    }
}

#[test]
fn hand_built_dict_is_emitted_sorted() {
    let element = Element::dict([
        ("zeta", Element::from(1)),
        ("alpha", Element::from(2)),
        ("mid", Element::list([Element::from("x")])),
    ]);
    let encoded = encode_element(&element);
    assert_eq!(encoded, b"d5:alphai2e3:midl1:xe4:zetai1ee");
    assert_eq!(decode(&encoded).unwrap(), vec![element]);
}

#[test]
fn decoded_tree_can_outlive_input_once_detached() {
    let detached = {
        let input = b"l4:spami1ee".to_vec();
        let mut elements = decode(&input).unwrap();
        elements.remove(0).into_static()
    };
    assert_eq!(
        detached,
        Element::list([Element::from("spam"), Element::from(1)])
    );
    assert!(detached.raw().is_empty());
}
