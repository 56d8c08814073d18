use std::collections::BTreeSet;

use anyhow::Result;
use cnote::{ItemId, NoteError, NoteStore, keys};
use tempfile::tempdir;

fn item_key_count(store: &NoteStore, note: &str) -> Result<usize> {
    Ok(store
        .database()
        .scan_prefix(keys::item_prefix(note).as_bytes())?
        .len())
}

#[test]
fn scenario_add_and_query_by_tag() -> Result<()> {
    let mut store = NoteStore::in_memory()?;
    store.new_note("work")?;

    let item = store.add_item("x,y", "buy milk")?;
    assert_eq!(item.id.to_string(), "1");
    assert_eq!(item.tags, vec!["x", "y"]);

    let found = store.items_by_tag(&["x"])?;
    assert_eq!(found.items, vec![item]);

    let missing = store.items_by_tag(&["z"])?;
    assert!(missing.items.is_empty());
    assert_eq!(missing.missing, vec!["z"]);
    Ok(())
}

#[test]
fn scenario_remove_first_of_two() -> Result<()> {
    let mut store = NoteStore::in_memory()?;
    store.new_note("work")?;
    store.add_item("a", "one")?;
    store.add_item("a,b", "two")?;

    store.remove_item("work", ItemId::new(1))?;

    let note = store.current_note().expect("selected");
    assert_eq!(note.sum, 1);
    assert!(note.tags.values().all(|ids| !ids.contains(&ItemId::new(1))));
    assert_eq!(store.read_item("work", ItemId::new(2))?.content, "two");
    Ok(())
}

#[test]
fn scenario_pattern_search() -> Result<()> {
    let mut store = NoteStore::in_memory()?;
    store.new_note("work")?;
    store.add_item("s", "buy milk")?;
    store.add_item("s", "buy bread")?;

    let items = store.items_by_pattern(&["milk"])?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].content, "buy milk");
    Ok(())
}

#[test]
fn sum_tracks_live_items_through_mixed_operations() -> Result<()> {
    let mut store = NoteStore::in_memory()?;
    store.new_note("work")?;

    let mut live = BTreeSet::new();
    let mut last = 0;
    for round in 0..20u64 {
        let item = store.add_item(if round % 2 == 0 { "even" } else { "odd" }, "c")?;
        assert!(item.id.get() > last, "ids must strictly increase");
        last = item.id.get();
        live.insert(item.id);

        if round % 3 == 2 {
            let victim = *live.iter().next().expect("non-empty");
            store.remove_item("work", victim)?;
            live.remove(&victim);
        }
        assert_eq!(store.current_note().map(|n| n.sum), Some(live.len() as u64));
    }

    let tagged: BTreeSet<ItemId> = store
        .items_by_tag(&["even", "odd"])?
        .items
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(tagged, live);
    assert_eq!(item_key_count(&store, "work")?, live.len());
    Ok(())
}

#[test]
fn delete_note_leaves_no_item_records() -> Result<()> {
    let mut store = NoteStore::in_memory()?;
    store.new_note("work")?;
    for n in 0..12 {
        store.add_item("a,b,c", &format!("item {n}"))?;
    }
    assert_eq!(item_key_count(&store, "work")?, 12);

    store.delete_note("work")?;

    assert_eq!(item_key_count(&store, "work")?, 0);
    assert!(store.note_names().is_empty());
    assert!(matches!(
        store.add_item("a", "orphan"),
        Err(NoteError::NoCurrentNote { .. })
    ));
    Ok(())
}

#[test]
fn state_survives_reopen() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("cnote.db");

    {
        let mut store = NoteStore::open(&path)?;
        store.new_note("work")?;
        store.add_item("x", "persisted")?;
        store.close()?;
    }

    let mut store = NoteStore::open(&path)?;
    assert_eq!(store.current_note().map(|n| n.name.as_str()), Some("work"));
    let next = store.add_item("x", "after reopen")?;
    assert_eq!(next.id, ItemId::new(2));
    assert_eq!(store.items_by_pattern(&["persisted"])?.len(), 1);
    Ok(())
}
