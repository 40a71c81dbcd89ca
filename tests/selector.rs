// tests/selector.rs

mod common;

use std::collections::BTreeSet;

use pipeline_console::dag::{GraphModel, Selector, SelectorEngine, SelectorTarget};
use pipeline_console::errors::SelectorError;
use pipeline_console::types::Layer;

use crate::common::builders::{model_id, source_id, trips_chain, GraphBuilder};

fn ids(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| model_id(n)).collect()
}

#[test]
fn parses_closure_markers() {
    let sel = Selector::parse("+fct_trips+").unwrap();
    assert_eq!(sel.target, SelectorTarget::Model("fct_trips".into()));
    assert!(sel.upstream);
    assert!(sel.downstream);
    assert_eq!(sel.to_string(), "+fct_trips+");

    let sel: Selector = "source:raw.trips+".parse().unwrap();
    assert_eq!(sel.target, SelectorTarget::Source("raw.trips".into()));
    assert!(!sel.upstream);
    assert!(sel.downstream);
}

#[test]
fn rejects_empty_and_malformed_selectors() {
    assert_eq!(Selector::parse(""), Err(SelectorError::Empty));
    assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
    assert!(matches!(Selector::parse("++a"), Err(SelectorError::Malformed(_))));
    assert!(matches!(Selector::parse("a b"), Err(SelectorError::Malformed(_))));
    assert!(matches!(
        Selector::parse("+source:raw.trips"),
        Err(SelectorError::Malformed(_))
    ));
}

#[test]
fn bare_name_selects_only_that_node() {
    let model = trips_chain().build();
    let result = SelectorEngine.resolve(&model, "fct_trips").unwrap();
    assert_eq!(result.selected_nodes, ids(&["fct_trips"]));
    assert_eq!(result.raw_selector, "fct_trips");
    assert_eq!(result.explanation, "Model 'fct_trips' only");
}

#[test]
fn upstream_closure() {
    let model = trips_chain().build();
    let result = SelectorEngine.resolve(&model, "+fct_trips").unwrap();
    assert_eq!(result.selected_nodes, ids(&["a", "b", "fct_trips"]));
    assert_eq!(
        result.explanation,
        "Model 'fct_trips' and all upstream dependencies"
    );
}

#[test]
fn downstream_closure() {
    let model = trips_chain().build();
    let result = SelectorEngine.resolve(&model, "fct_trips+").unwrap();
    assert_eq!(result.selected_nodes, ids(&["fct_trips", "c", "d"]));
}

#[test]
fn both_closures() {
    let model = trips_chain().build();
    let result = SelectorEngine.resolve(&model, "+fct_trips+").unwrap();
    assert_eq!(result.selected_nodes, ids(&["a", "b", "fct_trips", "c", "d"]));
}

#[test]
fn closures_follow_diamonds_once() {
    let model = GraphBuilder::new()
        .model("base", Layer::Staging, &[])
        .model("left", Layer::Intermediate, &["base"])
        .model("right", Layer::Intermediate, &["base"])
        .model("top", Layer::Marts, &["left", "right"])
        .build();

    let result = SelectorEngine.resolve(&model, "base+").unwrap();
    assert_eq!(result.selected_nodes, ids(&["base", "left", "right", "top"]));

    let result = SelectorEngine.resolve(&model, "+left").unwrap();
    assert_eq!(result.selected_nodes, ids(&["base", "left"]));
}

#[test]
fn source_selector_matches_only_sources() {
    let model = GraphBuilder::new()
        .source("raw.trips")
        .model("stg_trips", Layer::Staging, &["raw.trips"])
        .model("fct_trips", Layer::Marts, &["stg_trips"])
        .build();

    let result = SelectorEngine.resolve(&model, "source:raw.trips+").unwrap();
    let expected: BTreeSet<String> = [
        source_id("raw.trips"),
        model_id("stg_trips"),
        model_id("fct_trips"),
    ]
    .into_iter()
    .collect();
    assert_eq!(result.selected_nodes, expected);
    assert_eq!(
        result.explanation,
        "Source 'raw.trips' and all downstream models"
    );

    assert!(matches!(
        SelectorEngine.resolve(&model, "source:stg_trips"),
        Err(SelectorError::UnknownNode(_))
    ));
}

#[test]
fn unknown_name_is_an_error() {
    let model = trips_chain().build();
    assert!(matches!(
        SelectorEngine.resolve(&model, "+dim_zones"),
        Err(SelectorError::UnknownNode(_))
    ));
}

#[test]
fn duplicate_display_name_resolves_to_last_fetched_node() {
    let mut payload = GraphBuilder::new()
        .model("stg_trips", Layer::Staging, &[])
        .model("stg_trips_v2", Layer::Staging, &[])
        .build_payload();
    payload.nodes[1].display_name = "stg_trips".into();
    let model = GraphModel::from_payload(payload);

    let node = model.node_by_name("stg_trips").unwrap();
    assert_eq!(node.unique_id, model_id("stg_trips_v2"));

    let result = SelectorEngine.resolve(&model, "stg_trips").unwrap();
    assert_eq!(result.selected_nodes, ids(&["stg_trips_v2"]));
}
