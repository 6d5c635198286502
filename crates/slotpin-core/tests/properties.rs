mod common;

use std::path::Path;

use proptest::prelude::*;

use common::{ROOT, abs};
use slotpin_core::resolver::Resolver;
use slotpin_core::store::SlotDocument;
use slotpin_core::tracking::Tracker;
use slotpin_core::{MemoryStore, Position, Slot, SlotStore, TrackingMode};

fn arb_position() -> impl Strategy<Value = Position> {
    (0u32..10_000, 0u32..500).prop_map(|(line, character)| Position::new(line, character))
}

proptest! {
    /// For every slot count and every enabled slot, a static pin restores
    /// exactly the pinned position no matter where the user went since.
    #[test]
    fn static_pin_then_jump_restores_position(
        slot_count in 1u8..=9,
        pick in 0u8..9,
        pinned in arb_position(),
        wandering in proptest::collection::vec(arb_position(), 0..8),
    ) {
        let slot = Slot::new(pick % slot_count + 1).expect("in range");
        let store = MemoryStore::with_settings(i64::from(slot_count), 3);
        let root = Path::new(ROOT);
        let resolver = Resolver::new(&store, root);

        resolver.pin(slot, &abs("src/main.rs"), pinned).expect("pin");
        resolver.set_mode(slot, Some(TrackingMode::Static)).expect("mode");

        let tracker = Tracker::new(&store, root);
        for pos in wandering {
            tracker.focus_left(&abs("src/main.rs"), pos).expect("track");
            tracker.focus_left(&abs("other.rs"), pos).expect("track");
        }

        let target = resolver.jump_target(slot).expect("target");
        prop_assert_eq!(target.binding.position(), pinned);
        prop_assert_eq!(target.path, abs("src/main.rs"));
    }

    /// Slots above the configured count never accept a pin.
    #[test]
    fn slots_above_count_are_inert(slot_count in 1u8..9, extra in 1u8..9) {
        let n = slot_count + extra;
        prop_assume!(n <= 9);
        let slot = Slot::new(n).expect("in range");
        let store = MemoryStore::with_settings(i64::from(slot_count), 3);
        let resolver = Resolver::new(&store, Path::new(ROOT));

        prop_assert!(resolver.pin(slot, &abs("a.rs"), Position::default()).is_err());
        prop_assert!(resolver.clear(slot).is_err());
        prop_assert!(resolver.jump_target(slot).is_err());
        prop_assert_eq!(store.write_count(), 0);
    }

    /// However files are pinned, no path ever sits in two slots.
    #[test]
    fn pins_preserve_uniqueness(
        pins in proptest::collection::vec((1u8..=9, 0usize..4), 1..30),
    ) {
        let files = ["a.rs", "b.rs", "c.rs", "d.rs"];
        let store = MemoryStore::with_settings(9, 3);
        let resolver = Resolver::new(&store, Path::new(ROOT));

        for (n, f) in pins {
            let slot = Slot::new(n).expect("in range");
            resolver.pin(slot, &abs(files[f]), Position::default()).expect("pin");
        }

        let table = store.read().expect("read");
        let mut seen = std::collections::HashSet::new();
        for (_, binding) in table.iter() {
            prop_assert!(seen.insert(binding.file_path.clone()));
        }
    }
}

#[test]
fn legacy_document_migrates_through_store() {
    let store = MemoryStore::with_document(
        serde_json::from_value::<SlotDocument>(serde_json::json!({"slots": {"1": "a.txt"}}))
            .expect("document"),
    );

    assert_eq!(
        serde_json::to_value(store.read().expect("read")).expect("json"),
        serde_json::json!({
            "1": {"filePath": "a.txt", "line": 0, "character": 0, "mode": "auto"}
        })
    );
}
