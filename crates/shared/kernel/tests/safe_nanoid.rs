use std::collections::HashSet;
use wayfare_kernel::{SAFE_ALPHABET, safe_nanoid};

#[test]
fn default_ids_use_only_unambiguous_characters() {
    let id = safe_nanoid!();
    assert_eq!(id.len(), 12);
    assert!(id.chars().all(|ch| SAFE_ALPHABET.contains(&ch)), "unexpected character in {id}");
    assert!(!id.contains(['I', 'O', 'l', '0', '1']));
}

#[test]
fn reference_sized_ids_are_distinct() {
    let ids: HashSet<String> = (0..500).map(|_| safe_nanoid!(8)).collect();
    assert_eq!(ids.len(), 500);
    assert!(ids.iter().all(|id| id.len() == 8));
}
