use super::Rope;

use quickcheck::{quickcheck, Arbitrary, Gen};

impl Arbitrary for Rope {
    fn arbitrary(g: &mut Gen) -> Rope {
        let bytes = Vec::<u8>::arbitrary(g);
        Rope::from_bytes(bytes).expect("allocating a rope in a quickcheck generator")
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Rope>> {
        let bytes = self.to_bytes();
        Box::new(bytes.shrink().map(|b| Rope::from_bytes(b).expect("allocating a shrunk rope")))
    }
}

#[test]
fn empty_rope_has_zero_length() {
    let r = Rope::new();
    assert_eq!(r.len(), 0);
    assert!(r.is_empty());
    assert_eq!(r.to_bytes(), Vec::<u8>::new());
}

#[test]
fn from_bytes_round_trips() {
    let r = Rope::from_bytes(b"hello, world").unwrap();
    assert_eq!(r.to_bytes(), b"hello, world");
    assert_eq!(r.len(), 12);
}

#[test]
fn concat_joins_bytes_in_order() {
    let a = Rope::from_bytes(b"foo").unwrap();
    let b = Rope::from_bytes(b"bar").unwrap();
    let joined = a.concat(&b);
    assert_eq!(joined.to_bytes(), b"foobar");
    assert_eq!(joined.len(), 6);
}

#[test]
fn concat_with_empty_is_identity() {
    let a = Rope::from_bytes(b"foo").unwrap();
    let empty = Rope::new();
    assert_eq!(a.concat(&empty).to_bytes(), b"foo");
    assert_eq!(empty.concat(&a).to_bytes(), b"foo");
}

#[test]
fn concat_of_two_empties_is_empty() {
    let joined = Rope::new().concat(&Rope::new());
    assert!(joined.is_empty());
}

#[test]
fn repeat_builds_n_copies() {
    let unit = Rope::from_bytes(b"ab").unwrap();
    let r = unit.repeat(3);
    assert_eq!(r.to_bytes(), b"ababab");
    assert_eq!(r.len(), 6);
}

#[test]
fn repeat_by_zero_or_negative_is_empty() {
    let unit = Rope::from_bytes(b"ab").unwrap();
    assert!(unit.repeat(0).is_empty());
    assert!(unit.repeat(-5).is_empty());
}

#[test]
fn repeat_by_one_is_identity() {
    let unit = Rope::from_bytes(b"ab").unwrap();
    assert_eq!(unit.repeat(1).to_bytes(), b"ab");
}

#[test]
fn repeat_of_empty_is_empty() {
    let r = Rope::new().repeat(10);
    assert!(r.is_empty());
}

#[test]
fn index_and_get_agree() {
    let r = Rope::from_bytes(b"abcdef").unwrap();
    for i in 0..r.len() {
        assert_eq!(r[i], r.get(i).unwrap());
    }
}

#[test]
fn get_out_of_range_is_none() {
    let r = Rope::from_bytes(b"abc").unwrap();
    assert_eq!(r.get(3), None);
    assert!(r.try_get(3).is_err());
}

#[test]
#[should_panic]
fn indexing_out_of_range_panics() {
    let r = Rope::from_bytes(b"abc").unwrap();
    let _ = r[3];
}

#[test]
fn slice_within_a_literal() {
    let r = Rope::from_bytes(b"hello, world").unwrap();
    let s = r.slice(0..5).unwrap();
    assert_eq!(s.to_bytes(), b"hello");
}

#[test]
fn slice_spanning_a_concat() {
    let a = Rope::from_bytes(b"hello, ").unwrap();
    let b = Rope::from_bytes(b"world").unwrap();
    let joined = a.concat(&b);
    let s = joined.slice(3..9).unwrap();
    assert_eq!(s.to_bytes(), b"lo, wo");
}

#[test]
fn slice_entire_rope_shares_the_root() {
    let r = Rope::from_bytes(b"hello").unwrap();
    let s = r.slice(..).unwrap();
    assert_eq!(s.to_bytes(), b"hello");
}

#[test]
fn slice_within_a_single_repetition() {
    let unit = Rope::from_bytes(b"abc").unwrap();
    let r = unit.repeat(4); // "abcabcabcabc"
    let s = r.slice(4..6).unwrap(); // inside the second "abc"
    assert_eq!(s.to_bytes(), b"bc");
}

#[test]
fn slice_spanning_several_repetitions() {
    let unit = Rope::from_bytes(b"ab").unwrap();
    let r = unit.repeat(5); // "ababababab", length 10
    let s = r.slice(1..9).unwrap();
    assert_eq!(s.to_bytes(), b"babababa");
    // The slice spans several whole repetitions of "ab", so the result
    // must keep a `Repeat` node rather than eagerly materializing it.
    assert!(
        contains_repeat_node(&s),
        "slicing across repeat boundaries should preserve a Repeat node"
    );
}

/// Walks `r`'s tree looking for a `Repeat` node, without materializing
/// anything — used to check that repeat-slicing stays structural.
fn contains_repeat_node(r: &Rope) -> bool {
    fn walk(node: &crate::internals::NodeLink) -> bool {
        match &node.value {
            crate::internals::Value::Repeat { .. } => true,
            crate::internals::Value::Concat { left, right } => walk(left) || walk(right),
            crate::internals::Value::Literal(_) => false,
        }
    }
    walk(&r.root)
}

#[test]
fn slice_aligned_on_repeat_boundaries() {
    let unit = Rope::from_bytes(b"xy").unwrap();
    let r = unit.repeat(4); // "xyxyxyxy"
    let s = r.slice(2..6).unwrap();
    assert_eq!(s.to_bytes(), b"xyxy");
}

#[test]
fn slice_stop_past_length_clamps_instead_of_erroring() {
    let r = Rope::from_bytes(b"abc").unwrap();
    assert_eq!(r.slice(0..10).unwrap().to_bytes(), b"abc");
}

#[test]
fn slice_inverted_bounds_errors() {
    let r = Rope::from_bytes(b"abc").unwrap();
    assert!(r.slice(5..2).is_err());
}

#[test]
fn slice_to_empty_range_is_empty() {
    let r = Rope::from_bytes(b"abc").unwrap();
    assert!(r.slice(1..1).unwrap().is_empty());
}

#[test]
fn deep_concatenation_stays_balanced() {
    let mut r = Rope::from_bytes(b"x").unwrap();
    for _ in 0..2000 {
        r = r.concat(&Rope::from_bytes(b"x").unwrap());
    }
    assert_eq!(r.len(), 2001);
    assert!(crate::internals::is_balanced(&r.root));
}

#[test]
fn deep_concatenation_preserves_byte_order_after_rebalance() {
    // Every piece is a distinct byte (position mod 256), so a reversed- or
    // shuffled-operand bug in the balancer's slot insertion/collapse would
    // show up as a content mismatch, not just a wrong length — unlike
    // `deep_concatenation_stays_balanced` above, which repeats a single
    // byte and so can't catch that class of bug.
    let n = 2000usize;
    let mut r = Rope::from_bytes([0u8]).unwrap();
    let mut expected = vec![0u8];
    for i in 1..n {
        let byte = i as u8;
        r = r.concat(&Rope::from_bytes([byte]).unwrap());
        expected.push(byte);
    }
    assert_eq!(r.len(), n);
    assert!(crate::internals::is_balanced(&r.root));
    assert_eq!(r.to_bytes(), expected);
}

#[test]
fn contains_finds_a_substring() {
    let haystack = Rope::from_bytes(b"the quick brown fox").unwrap();
    let needle = Rope::from_bytes(b"brown").unwrap();
    assert!(haystack.contains(&needle));
}

#[test]
fn contains_rejects_a_missing_substring() {
    let haystack = Rope::from_bytes(b"the quick brown fox").unwrap();
    let needle = Rope::from_bytes(b"purple").unwrap();
    assert!(!haystack.contains(&needle));
}

#[test]
fn contains_empty_needle_is_always_true() {
    let haystack = Rope::from_bytes(b"anything").unwrap();
    assert!(haystack.contains(&Rope::new()));
}

#[test]
fn contains_across_a_concat_boundary() {
    let a = Rope::from_bytes(b"hello, ").unwrap();
    let b = Rope::from_bytes(b"world").unwrap();
    let joined = a.concat(&b);
    let needle = Rope::from_bytes(b", wor").unwrap();
    assert!(joined.contains(&needle));
}

#[test]
fn hash_is_stable_across_equivalent_trees() {
    let direct = Rope::from_bytes(b"abcdef").unwrap();
    let a = Rope::from_bytes(b"abc").unwrap();
    let b = Rope::from_bytes(b"def").unwrap();
    let built = a.concat(&b);
    assert_eq!(direct.content_hash(), built.content_hash());
}

#[test]
fn hash_is_memoized() {
    let r = Rope::from_bytes(b"abc").unwrap();
    let first = r.content_hash();
    let second = r.content_hash();
    assert_eq!(first, second);
}

#[test]
fn equality_is_by_content_not_by_shape() {
    let a = Rope::from_bytes(b"abc").unwrap();
    let b = Rope::from_bytes(b"a").unwrap().concat(&Rope::from_bytes(b"bc").unwrap());
    assert_eq!(a, b);
}

#[test]
fn ordering_is_lexicographic_not_length_first() {
    let short = Rope::from_bytes(b"b").unwrap();
    let long = Rope::from_bytes(b"aa").unwrap();
    assert!(long < short);
}

#[test]
fn add_operator_concatenates() {
    let a = Rope::from_bytes(b"foo").unwrap();
    let b = Rope::from_bytes(b"bar").unwrap();
    assert_eq!((a + b).to_bytes(), b"foobar");
}

#[test]
fn mul_operator_repeats() {
    let a = Rope::from_bytes(b"ab").unwrap();
    assert_eq!((a * 3).to_bytes(), b"ababab");
}

#[test]
fn from_str_and_from_vec() {
    let from_str: Rope = "hello".into();
    let from_vec: Rope = b"hello".to_vec().into();
    assert_eq!(from_str, from_vec);
}

#[test]
fn collects_from_a_byte_iterator() {
    let r: Rope = [b'a', b'b', b'c'].into_iter().collect();
    assert_eq!(r.to_bytes(), b"abc");
}

quickcheck! {
    fn concat_length_is_additive(a: Rope, b: Rope) -> bool {
        a.concat(&b).len() == a.len() + b.len()
    }

    fn concat_bytes_are_concatenated(a: Rope, b: Rope) -> bool {
        let mut expected = a.to_bytes();
        expected.extend_from_slice(&b.to_bytes());
        a.concat(&b).to_bytes() == expected
    }

    fn repeat_length_matches_non_negative_count(r: Rope, n: i64) -> bool {
        let expected = r.len() * (n.max(0) as usize);
        r.repeat(n).len() == expected
    }

    fn round_trip_through_bytes_iterator(r: Rope) -> bool {
        r.bytes().collect::<Vec<u8>>() == r.to_bytes()
    }

    fn slice_then_materialize_matches_plain_slice(r: Rope, a: usize, b: usize) -> bool {
        let len = r.len();
        let (start, stop) = if a <= b { (a, b) } else { (b, a) };
        let start = start % (len + 1);
        let stop = (stop % (len + 1)).max(start);
        let bytes = r.to_bytes();
        match r.slice(start..stop) {
            Ok(sliced) => sliced.to_bytes() == bytes[start..stop],
            Err(_) => false,
        }
    }

    fn equal_ropes_hash_equal(r: Rope) -> bool {
        let clone = Rope::from_bytes(r.to_bytes()).unwrap();
        r.content_hash() == clone.content_hash()
    }
}
