//! Property-based tests over the store contract.

use pastedb_store::{InMemoryPasteStore, PasteStore, StoreError};
use pastedb_testkit::prelude::*;
use proptest::prelude::*;

proptest! {
    // Keep the on-disk case count modest; each runs through real files.
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn plain_payloads_roundtrip(
        id in paste_id_strategy(),
        payload in payload_strategy(),
        language in language_strategy(),
    ) {
        let store = TestStore::new();
        let mut paste = store.create(id.clone(), None);
        paste.set_language(language.clone());

        write_content(&store.store, &paste, &payload);

        let fetched = store.fetch(id, None).unwrap();
        prop_assert_eq!(fetched.language(), language);
        prop_assert_eq!(read_content(&store.store, &fetched), payload);
    }

    #[test]
    fn encrypted_payloads_roundtrip(
        id in paste_id_strategy(),
        payload in payload_strategy(),
        (key, wrong_key) in distinct_key_pair_strategy(),
    ) {
        let store = TestStore::new();
        let paste = store.create(id.clone(), Some(key.clone()));

        write_content(&store.store, &paste, &payload);

        // Ciphertext never equals plaintext for payloads long enough that a
        // coincidental keystream match is out of the question.
        if payload.len() >= 8 {
            let raw = std::fs::read(store.root().join(id.as_str())).unwrap();
            prop_assert_ne!(&raw, &payload);
        }

        let wrong_key_rejected = matches!(
            store.fetch(id.clone(), Some(wrong_key)),
            Err(StoreError::InvalidKey { .. })
        );
        prop_assert!(wrong_key_rejected);
        let missing_key_rejected = matches!(
            store.fetch(id.clone(), None),
            Err(StoreError::EncryptionRequired { .. })
        );
        prop_assert!(missing_key_rejected);

        let fetched = store.fetch(id, Some(key)).unwrap();
        prop_assert_eq!(read_content(&store.store, &fetched), payload);
    }

    #[test]
    fn memory_store_honors_the_same_contract(
        id in paste_id_strategy(),
        payload in payload_strategy(),
        key in key_strategy(),
    ) {
        let store = InMemoryPasteStore::new();
        let paste = store.create(id.clone(), Some(key.clone()));

        write_content(&store, &paste, &payload);

        if payload.len() >= 8 {
            prop_assert_ne!(&store.raw_content(&id).unwrap(), &payload);
        }

        let fetched = store.fetch(id, Some(key)).unwrap();
        prop_assert_eq!(read_content(&store, &fetched), payload);
    }
}
