// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used)]
mod common;

use std::collections::BTreeSet;

use bigraph_core::{BigraphBuilder, ControlKind, Signature};
use bigraph_match::Matcher;
use common::{assert_reassembles, building, building_signature, holes, init_tracing, labels};

#[test]
fn one_hole_room_matches_every_room() {
    init_tracing();
    let agent = building();
    let redex = holes(&building_signature(), &["Room"]);
    let matches = Matcher::new().match_all(&agent, &redex).unwrap();
    let found: Vec<_> = matches.iter().collect();
    assert_eq!(found.len(), 3);

    let rooms: BTreeSet<&str> = found
        .iter()
        .map(|m| m.node_mapping()[0].1.as_str())
        .collect();
    assert_eq!(rooms, BTreeSet::from(["Room1", "Room1a", "Room2"]));

    let contexts: BTreeSet<_> = found.iter().map(|m| m.context().digest()).collect();
    assert_eq!(contexts.len(), 3, "every occurrence has its own context");

    for m in &found {
        assert_reassembles(&agent, m);
        assert!(m.context().is_active());
        assert!(m.redex_identity().nodes().is_empty());
    }
}

#[test]
fn parameters_carry_the_room_contents() {
    let agent = building();
    let redex = holes(&building_signature(), &["Room"]);
    let matches = Matcher::new().match_all(&agent, &redex).unwrap();
    for m in &matches {
        let room = m.node_mapping()[0].1.as_str();
        let inside = labels(&m.parameters()[0]);
        let expected: BTreeSet<String> = match room {
            "Room1" => ["Room1a", "User1"].map(str::to_owned).into(),
            "Room1a" => ["User1"].map(str::to_owned).into(),
            "Room2" => ["User2"].map(str::to_owned).into(),
            _ => BTreeSet::new(),
        };
        assert_eq!(inside, expected);
    }
}

#[test]
fn two_room_redex_pairs_unrelated_rooms() {
    let agent = building();
    let redex = holes(&building_signature(), &["Room", "Room"]);
    let matches = Matcher::new().match_all(&agent, &redex).unwrap();
    let found: Vec<_> = matches.iter().collect();
    assert_eq!(found.len(), 4);

    let mut ordered = BTreeSet::new();
    for m in &found {
        let rooms: Vec<&str> = m.node_mapping().iter().map(|(_, a)| a.as_str()).collect();
        ordered.insert((rooms[0], rooms[1]));
        assert_eq!(m.context().sites().len(), 2);
        assert_reassembles(&agent, m);

        let ctx = m.context();
        let site_parents: BTreeSet<Option<&str>> = ctx
            .sites()
            .iter()
            .map(|&s| ctx.parent(s).and_then(|p| ctx.label(p)))
            .collect();
        if m.root_images()[0] == m.root_images()[1] {
            // Siblings: both sites hang under the building.
            assert_eq!(site_parents, BTreeSet::from([Some("Building")]));
        } else {
            assert_eq!(site_parents, BTreeSet::from([Some("Building"), Some("Room1")]));
        }
    }
    assert_eq!(
        ordered,
        BTreeSet::from([
            ("Room1", "Room2"),
            ("Room2", "Room1"),
            ("Room1a", "Room2"),
            ("Room2", "Room1a"),
        ])
    );
}

#[test]
fn swapped_nesting_yields_nothing() {
    let signature = Signature::builder()
        .control("A", 0, ControlKind::Active)
        .and_then(|b| b.control("B", 0, ControlKind::Active))
        .unwrap()
        .finish();
    let nest = |outer: &str, inner: &str| {
        let mut b = BigraphBuilder::new(&signature);
        let r = b.root(0).unwrap();
        let o = b.child(r, outer).unwrap();
        b.child(o, inner).unwrap();
        b.finish().unwrap()
    };
    let agent = nest("A", "B");
    let matcher = Matcher::new();

    let redex = nest("B", "A");
    let matches = matcher.match_all(&agent, &redex).unwrap();
    assert!(matches.is_empty());
    assert!(matches.root_hits().is_empty());

    let redex = nest("A", "B");
    assert_eq!(matcher.match_all(&agent, &redex).unwrap().iter().count(), 1);
}

#[test]
fn deeper_redex_keeps_nesting() {
    let agent = building();
    let sig = building_signature();
    let mut b = BigraphBuilder::new(&sig);
    let r = b.root(0).unwrap();
    let outer = b.child(r, "Room").unwrap();
    let inner = b.child(outer, "Room").unwrap();
    let site = b.site(0).unwrap();
    b.set_parent(site, inner).unwrap();
    let redex = b.finish().unwrap();

    let matches = Matcher::new().match_all(&agent, &redex).unwrap();
    let found: Vec<_> = matches.iter().collect();
    assert_eq!(found.len(), 1);
    let mapped: Vec<&str> = found[0].node_mapping().iter().map(|(_, a)| a.as_str()).collect();
    assert_eq!(mapped, ["Room1", "Room1a"]);
    assert_eq!(labels(&found[0].parameters()[0]), BTreeSet::from(["User1".to_owned()]));
    assert_reassembles(&agent, &found[0]);
}
