use proptest::prelude::*;
use regdash_core::{Collection, DashError, ListEngine, PageSize, Record, SortDirection, Value};

// Strategy to generate collections with unique `cedula` identities
fn arb_collection() -> impl Strategy<Value = Collection> {
    prop::collection::vec(
        (
            "[a-zA-ZñÁé ]{0,8}",
            prop_oneof![Just(Value::Null), (0i64..120).prop_map(Value::from)],
            prop_oneof![
                Just(Value::Null),
                (2000i32..2025, 1u32..13, 1u32..29)
                    .prop_map(|(y, m, d)| Value::from(format!("{:04}-{:02}-{:02}", y, m, d))),
                "[a-z]{1,5}".prop_map(Value::from),
            ],
        ),
        0..60,
    )
    .prop_map(|rows| {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, (nombre, edad, fecha))| {
                Record::new()
                    .with("cedula", (i + 1).to_string())
                    .with("nombre", nombre)
                    .with("edad", edad)
                    .with("fecha", fecha)
            })
            .collect();
        Collection::new("cedula", records).unwrap()
    })
}

fn arb_column() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("cedula"), Just("nombre"), Just("edad"), Just("fecha")]
}

fn arb_page_size() -> impl Strategy<Value = PageSize> {
    prop_oneof![Just(PageSize::Ten), Just(PageSize::Twenty), Just(PageSize::Fifty)]
}

fn ids(engine: &ListEngine) -> Vec<String> {
    engine.filtered().map(|r| r.value("cedula").key()).collect()
}

proptest! {
    /// Property: every filtered record contains the term in some field
    #[test]
    fn prop_search_matches_some_field(collection in arb_collection(), term in "[a-zA-Z0-9]{0,3}") {
        let mut engine = ListEngine::new(collection);
        engine.set_search_term(term.clone());
        let needle = term.to_lowercase();

        for record in engine.filtered() {
            prop_assert!(record
                .fields()
                .any(|(_, v)| v.to_string().to_lowercase().contains(&needle)));
        }
        prop_assert_eq!(engine.state().page, 1);
    }

    /// Property: the empty term returns the whole collection in order
    #[test]
    fn prop_empty_search_is_identity(collection in arb_collection()) {
        let expected: Vec<String> = collection.iter().map(|r| r.value("cedula").key()).collect();
        let mut engine = ListEngine::new(collection);
        engine.set_search_term("");
        prop_assert_eq!(ids(&engine), expected);
    }

    /// Property: sorting is stable and re-sorting changes nothing
    #[test]
    fn prop_sort_is_stable(collection in arb_collection(), column in arb_column()) {
        let mut engine = ListEngine::new(collection);
        engine.set_sort(column);
        let once = ids(&engine);

        let rows: Vec<&Record> = engine.filtered().collect();
        for pair in rows.windows(2) {
            let ord = pair[0].value(column).natural_cmp(pair[1].value(column));
            prop_assert!(ord.is_le());
            if ord.is_eq() {
                // ties keep collection order
                let a: usize = pair[0].value("cedula").key().parse().unwrap();
                let b: usize = pair[1].value("cedula").key().parse().unwrap();
                prop_assert!(a < b);
            }
        }

        // re-deriving the view sorts again from scratch
        engine.set_search_term("");
        prop_assert_eq!(ids(&engine), once);
    }

    /// Property: toggling twice returns to the ascending result
    #[test]
    fn prop_double_toggle_restores_ascending(collection in arb_collection(), column in arb_column()) {
        let mut engine = ListEngine::new(collection);
        engine.set_sort(column);
        let ascending = ids(&engine);

        engine.set_sort(column);
        prop_assert_eq!(engine.state().sort.as_ref().unwrap().direction, SortDirection::Descending);
        engine.set_sort(column);
        prop_assert_eq!(engine.state().sort.as_ref().unwrap().direction, SortDirection::Ascending);
        prop_assert_eq!(ids(&engine), ascending);
    }

    /// Property: the visible slice has the size pagination promises
    #[test]
    fn prop_visible_slice_len(collection in arb_collection(), size in arb_page_size(), page in 0usize..10) {
        let count = collection.len();
        let mut engine = ListEngine::with_page_size(collection, size);
        let page = engine.go_to_page(page);
        let size = size.get();

        let visible = engine.visible_slice().count();
        prop_assert!(visible <= size);
        let offset = (page - 1) * size;
        let expected = if count > offset { size.min(count - offset) } else { 0 };
        prop_assert_eq!(visible, expected);
        prop_assert_eq!(visible, engine.page_info().visible_len());
    }

    /// Property: deleting removes exactly one record, and only once
    #[test]
    fn prop_delete_once(collection in arb_collection(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!collection.is_empty());
        let n = collection.len();
        let id = collection.records()[pick.index(n)].value("cedula").key();

        let mut engine = ListEngine::new(collection);
        engine.set_sort("nombre");
        prop_assert!(engine.apply_delete(&id).is_some());
        prop_assert_eq!(engine.collection().len(), n - 1);
        prop_assert_eq!(engine.filtered_len(), n - 1);
        prop_assert!(engine.collection().find(&id).is_none());
        prop_assert!(engine.filtered().all(|r| r.value("cedula").key() != id));

        prop_assert!(engine.apply_delete(&id).is_none());
        prop_assert_eq!(engine.collection().len(), n - 1);
    }

    /// Property: updates replace one record in place
    #[test]
    fn prop_update_in_place(collection in arb_collection(), pick in any::<prop::sample::Index>(), column in arb_column()) {
        prop_assume!(!collection.is_empty());
        let n = collection.len();
        let idx = pick.index(n);
        let id = collection.records()[idx].value("cedula").key();

        let mut engine = ListEngine::new(collection.clone());
        engine.set_sort(column);
        let view_before = ids(&engine);

        let updated = collection.records()[idx].clone().with("nombre", "Actualizado");
        engine.apply_update(updated.clone()).unwrap();

        for (i, record) in engine.collection().iter().enumerate() {
            if i == idx {
                prop_assert_eq!(record, &updated);
            } else {
                prop_assert_eq!(record, &collection.records()[i]);
            }
        }
        prop_assert_eq!(ids(&engine), view_before);
        prop_assert!(engine.collection().find(&id).is_some());

        let before = engine.collection().clone();
        let missing = Record::new().with("cedula", "no-such-id");
        let err = engine.apply_update(missing).unwrap_err();
        prop_assert!(matches!(err, DashError::NotFound { .. }), "unexpected error: {:?}", err);
        prop_assert_eq!(engine.collection(), &before);
    }
}

#[test]
fn test_empty_collection_has_one_empty_page() {
    let mut engine = ListEngine::new(Collection::empty("cedula"));
    assert_eq!(engine.go_to_page(3), 1);
    assert_eq!(engine.visible_slice().count(), 0);
    assert_eq!(engine.page_info().total_pages(), 1);
}
