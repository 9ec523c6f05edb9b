//! Quantified invariants over arbitrary mutation sequences

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{abbrs, state_rows, states_table};
use rowdex::{EventSink, Row, Table, TableEvent, Value, ValueRange, ValueSet};

/// Sink that records every event for later inspection
#[derive(Clone, Default)]
struct RecordingSink {
    events: Rc<RefCell<Vec<TableEvent>>>,
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &TableEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[test]
fn row_count_tracks_inserts_and_removes() {
    let mut table = states_table();
    assert_eq!(table.get_count().unwrap(), 50);

    let west = table
        .find_where("region", "==", "West")
        .unwrap()
        .get_rows()
        .unwrap();
    table.remove(&west).unwrap();
    assert_eq!(table.get_count().unwrap(), 41);

    table
        .insert(vec![Row::from_pairs([("abbr", "PR"), ("name", "Puerto Rico")])])
        .unwrap();
    assert_eq!(table.get_count().unwrap(), 42);
}

#[test]
fn every_access_path_returns_the_same_multiset() {
    // The same queries must answer identically no matter which indexes
    // exist, hence which path the planner picks.
    let index_configs: &[&[&[&str]]] = &[
        &[],
        &[&["region"]],
        &[&["population"]],
        &[&["region", "population"]],
        &[&["abbr"], &["inducted"]],
        &[&["region"], &["population"], &["region", "population"]],
    ];

    let mut baselines: Option<Vec<Vec<String>>> = None;
    for config in index_configs {
        let mut table = states_table();
        table.paranoia(true);
        for columns in config.iter() {
            table.ensure_index(columns).unwrap();
        }

        let results = vec![
            abbrs(&table.find_where("region", "==", "West").unwrap().get_rows().unwrap()),
            abbrs(
                &table
                    .find_where("population", "between", ValueRange::new(1_000_000i64, 2_000_000i64))
                    .unwrap()
                    .get_rows()
                    .unwrap(),
            ),
            abbrs(
                &table
                    .find_where("region", "==", "West")
                    .unwrap()
                    .and("population", ">", 2_000_000i64)
                    .unwrap()
                    .get_rows()
                    .unwrap(),
            ),
            abbrs(
                &table
                    .find_where("abbr", "in", ValueSet::of(["CA", "TX", "NY", "XX"]))
                    .unwrap()
                    .get_rows()
                    .unwrap(),
            ),
            abbrs(&table.find_where("inducted", ">", 1900i64).unwrap().get_rows().unwrap()),
            abbrs(
                &table
                    .find_where("region", "!=", "South")
                    .unwrap()
                    .and("population", "<=", 1_000_000i64)
                    .unwrap()
                    .get_rows()
                    .unwrap(),
            ),
        ];

        match &baselines {
            None => baselines = Some(results),
            Some(expected) => assert_eq!(expected, &results, "config {:?} diverged", config),
        }
    }
}

#[test]
fn paranoia_validates_after_every_mutation() {
    let mut table = states_table();
    table.paranoia(true);
    table.ensure_index(&["region"]).unwrap();
    table.ensure_index(&["region", "population"]).unwrap();
    table.ensure_index(&["population"]).unwrap();

    // A burst of mutations; paranoia re-validates inside each call
    let mut clones = table
        .find_where("region", "==", "Midwest")
        .unwrap()
        .get_rows()
        .unwrap();
    for clone in clones.iter_mut() {
        let next = match clone.get("population") {
            Value::Int(v) => v + 1,
            _ => 0,
        };
        clone.set("population", next);
    }
    table.update(&mut clones).unwrap();

    let pacific = table
        .find_where("region", "==", "Pacific")
        .unwrap()
        .get_rows()
        .unwrap();
    table.remove(&pacific).unwrap();

    table
        .insert(vec![
            Row::from_pairs([("abbr", "GU"), ("region", "Pacific")]),
            Row::from_pairs([("abbr", "AS"), ("region", "Pacific")]),
        ])
        .unwrap();

    table.validate_index().unwrap();
    assert_eq!(table.get_count().unwrap(), 50);
}

#[test]
fn insert_remove_round_trip() {
    let mut table = Table::new(["abbr", "region"]).unwrap();
    let clones = table
        .insert(vec![
            Row::from_pairs([("abbr", "CA"), ("region", "West")]),
            Row::from_pairs([("abbr", "OR"), ("region", "West")]),
        ])
        .unwrap();

    let all = table.get_rows().unwrap();
    assert_eq!(abbrs(&all), vec!["CA", "OR"]);

    table.remove(&clones).unwrap();
    assert_eq!(table.get_count().unwrap(), 0);
    assert!(table.get_rows().unwrap().is_empty());
}

#[test]
fn unchanged_update_is_a_no_op() {
    let sink = RecordingSink::default();
    let mut table = states_table();
    table.set_event_sink(Box::new(sink.clone()));
    table.verbose(true);
    table.ensure_index(&["population"]).unwrap();
    table.ensure_index(&["name"]).unwrap();

    let mut ca = table
        .find_where("abbr", "==", "CA")
        .unwrap()
        .get_rows()
        .unwrap();

    sink.events.borrow_mut().clear();
    table.update(&mut ca).unwrap();
    let update_events: Vec<TableEvent> = sink
        .events
        .borrow()
        .iter()
        .filter(|e| matches!(e, TableEvent::Update { .. }))
        .cloned()
        .collect();
    assert!(update_events.is_empty(), "no-op update must touch nothing");

    // Changing population reports exactly that column
    ca[0].set("population", 39_000_000i64);
    sink.events.borrow_mut().clear();
    table.update(&mut ca).unwrap();
    let changed: Vec<Vec<String>> = sink
        .events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            TableEvent::Update { changed, .. } => Some(changed.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(changed, vec![vec!["population".to_string()]]);

    // The untouched [name] index must still be intact
    table.validate_index().unwrap();
}

#[test]
fn planner_cost_never_exceeds_baseline() {
    let bare = states_table();
    let mut indexed = states_table();
    indexed.ensure_index(&["region"]).unwrap();
    indexed.ensure_index(&["region", "population"]).unwrap();
    indexed.ensure_index(&["abbr"]).unwrap();

    let queries: &[(&str, &str)] = &[
        ("region", "West"),
        ("region", "Pacific"),
        ("abbr", "CA"),
        ("capital", "Denver"),
    ];
    for (column, value) in queries {
        let baseline = bare
            .find_where(column, "==", *value)
            .unwrap()
            .explain()
            .unwrap();
        assert!(baseline.is_scan());

        let chosen = indexed
            .find_where(column, "==", *value)
            .unwrap()
            .explain()
            .unwrap();
        assert!(
            chosen.cost <= baseline.cost,
            "{} == {}: {} > {}",
            column,
            value,
            chosen.cost,
            baseline.cost
        );
    }
}

#[test]
fn clone_mutation_is_invisible_until_update() {
    let table = states_table();
    let mut rows = table
        .find_where("abbr", "==", "CA")
        .unwrap()
        .get_rows()
        .unwrap();

    rows[0].set("population", 1i64);
    rows[0].set("capital", "Nowhere");

    let canonical = table
        .find_where("abbr", "==", "CA")
        .unwrap()
        .get_rows()
        .unwrap();
    assert_eq!(
        canonical[0].get("population"),
        &Value::Int(36_553_215),
        "clone edits must not leak"
    );
    assert_eq!(canonical[0].get("capital"), &Value::from("Sacramento"));

    // refresh() re-reads canonical state, not the edited clone
    let fresh = table.refresh(&rows[0]).unwrap();
    assert_eq!(fresh.get("population"), &Value::Int(36_553_215));
}

#[test]
fn batched_inserts_match_bulk_build() {
    // Incremental merge-add across many batches must converge on the
    // same structures a one-shot build produces.
    let mut batched = Table::new(common::COLUMNS).unwrap();
    batched.paranoia(true);
    batched.ensure_index(&["region", "population"]).unwrap();
    batched.ensure_index(&["inducted"]).unwrap();

    let mut rows = state_rows();
    while !rows.is_empty() {
        let batch: Vec<Row> = rows.drain(..rows.len().min(7)).collect();
        batched.insert(batch).unwrap();
    }

    let mut bulk = states_table();
    bulk.ensure_index(&["region", "population"]).unwrap();
    bulk.ensure_index(&["inducted"]).unwrap();

    for table in [&batched, &bulk] {
        table.validate_index().unwrap();
    }
    for query in [("region", "==", "West"), ("region", "!=", "South")] {
        let a = abbrs(&batched.find_where(query.0, query.1, query.2).unwrap().get_rows().unwrap());
        let b = abbrs(&bulk.find_where(query.0, query.1, query.2).unwrap().get_rows().unwrap());
        assert_eq!(a, b);
    }
    assert_eq!(batched.get_count().unwrap(), bulk.get_count().unwrap());
}

#[test]
fn removals_keep_indexes_consistent() {
    let mut table = states_table();
    table.paranoia(true);
    table.ensure_index(&["region", "population"]).unwrap();

    // Remove an entire region; its entry must disappear
    let west = table
        .find_where("region", "==", "West")
        .unwrap()
        .get_rows()
        .unwrap();
    table.remove(&west).unwrap();

    let rows = table
        .find_where("region", "==", "West")
        .unwrap()
        .get_rows()
        .unwrap();
    assert!(rows.is_empty());

    let snapshot = table
        .ensure_index(&["region", "population"])
        .unwrap()
        .snapshot()
        .unwrap();
    assert!(snapshot
        .root
        .entries()
        .iter()
        .all(|e| e.value() != &Value::from("West")));
    assert_eq!(snapshot.root.total(), 41);
}

#[test]
fn verbose_events_describe_operations() {
    let sink = RecordingSink::default();
    let mut table = states_table();
    table.set_event_sink(Box::new(sink.clone()));

    // Silent while verbose is off
    table.ensure_index(&["region"]).unwrap();
    assert!(sink.events.borrow().is_empty());

    table.verbose(true);
    table
        .find_where("region", "==", "West")
        .unwrap()
        .get_rows()
        .unwrap();
    table.ensure_index(&["abbr"]).unwrap();
    table.drop();

    let events = sink.events.borrow();
    assert!(matches!(
        events[0],
        TableEvent::Query { matched: 9, signature: Some(_), .. }
    ));
    assert!(matches!(events[1], TableEvent::IndexBuilt { rows: 50, .. }));
    assert!(matches!(events.last(), Some(TableEvent::Dropped)));
}
