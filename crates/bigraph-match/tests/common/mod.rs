// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::BTreeSet;

use bigraph_core::{Bigraph, BigraphBuilder, ControlKind, PlaceIx, Signature};
use bigraph_match::ParametricMatch;
use tracing_subscriber::EnvFilter;

/// Routes engine logs to the test harness; `RUST_LOG=bigraph_match=trace` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn building_signature() -> Signature {
    Signature::builder()
        .control("Building", 0, ControlKind::Active)
        .and_then(|b| b.control("Room", 0, ControlKind::Active))
        .and_then(|b| b.control("User", 0, ControlKind::Atomic))
        .and_then(|b| b.control("Locked", 0, ControlKind::Passive))
        .unwrap()
        .finish()
}

/// `Building[Room1[Room1a[User1]], Room2[User2]]`.
pub fn building() -> Bigraph {
    let mut b = BigraphBuilder::new(&building_signature());
    let root = b.root(0).unwrap();
    let building = b.node("Building", "Building").unwrap();
    b.set_parent(building, root).unwrap();
    let room1 = b.node("Room", "Room1").unwrap();
    b.set_parent(room1, building).unwrap();
    let room1a = b.node("Room", "Room1a").unwrap();
    b.set_parent(room1a, room1).unwrap();
    let user1 = b.node("User", "User1").unwrap();
    b.set_parent(user1, room1a).unwrap();
    let room2 = b.node("Room", "Room2").unwrap();
    b.set_parent(room2, building).unwrap();
    let user2 = b.node("User", "User2").unwrap();
    b.set_parent(user2, room2).unwrap();
    b.finish().unwrap()
}

/// `Building[Room_0[User_0], ..., Room_{k-1}[User_{k-1}]]`.
pub fn flat_building(rooms: usize) -> Bigraph {
    let mut b = BigraphBuilder::new(&building_signature());
    let root = b.root(0).unwrap();
    let building = b.node("Building", "Building").unwrap();
    b.set_parent(building, root).unwrap();
    for i in 0..rooms {
        let room = b.node("Room", format!("Room{i}")).unwrap();
        b.set_parent(room, building).unwrap();
        let user = b.node("User", format!("User{i}")).unwrap();
        b.set_parent(user, room).unwrap();
    }
    b.finish().unwrap()
}

/// One root per entry, each holding a single `control[site]`.
pub fn holes(signature: &Signature, controls: &[&str]) -> Bigraph {
    let mut b = BigraphBuilder::new(signature);
    for (i, control) in controls.iter().enumerate() {
        let root = b.root(i).unwrap();
        let node = b.child(root, control).unwrap();
        let site = b.site(i).unwrap();
        b.set_parent(site, node).unwrap();
    }
    b.finish().unwrap()
}

/// Node labels of `g`.
pub fn labels(g: &Bigraph) -> BTreeSet<String> {
    g.nodes()
        .iter()
        .filter_map(|&n| g.label(n))
        .map(str::to_owned)
        .collect()
}

fn agent_parent_label(agent: &Bigraph, label: &str) -> Option<String> {
    let node = agent.node_by_label(label)?;
    let parent = agent.parent(node)?;
    agent.label(parent).map(str::to_owned)
}

/// Checks that `m` splits `agent` without losing or duplicating anything.
///
/// Node labels survive the split, so reassembly is checked by label:
/// context, matched and parameter nodes partition the agent's nodes, every
/// copied node keeps its control and (where it stays in the same piece) its
/// parent, parameter tops hang under matched nodes, matched nodes hang
/// under each other or under their root's image, and the interfaces of the
/// pieces compose.
pub fn assert_reassembles(agent: &Bigraph, m: &ParametricMatch) {
    let context = labels(m.context());
    let matched: BTreeSet<String> = m.node_mapping().iter().map(|(_, a)| a.clone()).collect();
    let mut parameters = BTreeSet::new();
    for p in m.parameters() {
        for label in labels(p) {
            assert!(parameters.insert(label.clone()), "{label} appears in two parameters");
        }
    }
    assert_eq!(matched.len(), m.node_mapping().len(), "mapping is not injective");
    assert!(context.is_disjoint(&matched));
    assert!(context.is_disjoint(&parameters));
    assert!(matched.is_disjoint(&parameters));
    let whole: BTreeSet<String> = context.iter().chain(&matched).chain(&parameters).cloned().collect();
    assert_eq!(whole, labels(agent));

    let same_control = |piece: &Bigraph, n: PlaceIx| {
        let label = piece.label(n).unwrap();
        let original = agent.node_by_label(label).unwrap();
        assert_eq!(piece.control(n), agent.control(original), "control of {label}");
    };

    let ctx = m.context();
    for &n in ctx.nodes() {
        same_control(ctx, n);
        let label = ctx.label(n).unwrap();
        let parent = ctx.parent(n).unwrap();
        match ctx.label(parent) {
            Some(p) => assert_eq!(agent_parent_label(agent, label).as_deref(), Some(p)),
            None => {
                let original = agent.node_by_label(label).unwrap();
                let agent_parent = agent.parent(original).unwrap();
                assert_eq!(agent.root_index(agent_parent), ctx.root_index(parent));
            }
        }
    }

    for p in m.parameters() {
        assert_eq!(p.roots().len(), 1);
        for &n in p.nodes() {
            same_control(p, n);
            let label = p.label(n).unwrap();
            let parent = p.parent(n).unwrap();
            let expected = agent_parent_label(agent, label).unwrap();
            match p.label(parent) {
                Some(l) => assert_eq!(l, expected),
                None => assert!(matched.contains(&expected), "{label} not under a matched node"),
            }
        }
    }

    let redex = m.redex();
    for (redex_label, agent_label) in m.node_mapping() {
        let x = redex.node_by_label(redex_label).unwrap();
        let y = agent.node_by_label(agent_label).unwrap();
        assert_eq!(redex.control(x), agent.control(y));
        let redex_parent = redex.parent(x).unwrap();
        let agent_parent = agent.parent(y).unwrap();
        if let Some(position) = redex.roots().iter().position(|&r| r == redex_parent) {
            assert_eq!(m.root_images()[position], agent_parent);
        } else {
            let parent_label = redex.label(redex_parent).unwrap();
            let image = m
                .node_mapping()
                .iter()
                .find(|(r, _)| r == parent_label)
                .map(|(_, a)| a.as_str());
            assert_eq!(image, agent.label(agent_parent));
        }
    }

    let agent_ports: usize = agent.nodes().iter().map(|&n| agent.ports_of(n).len()).sum();
    let split_ports: usize = std::iter::once(ctx)
        .chain(std::iter::once(redex))
        .chain(m.parameters())
        .map(|g| g.nodes().iter().map(|&n| g.ports_of(n).len()).sum::<usize>())
        .sum();
    assert_eq!(agent_ports, split_ports);
    assert_eq!(m.context().sites().len(), redex.roots().len());
    assert_eq!(m.parameters().len(), redex.sites().len());

    // Names line up for `context ∘ (redex ⊗ redex_identity) ∘ parameters`.
    let identity = m.redex_identity();
    let mut parameter_names = BTreeSet::new();
    for p in m.parameters() {
        for name in p.outer_face().names {
            assert!(parameter_names.insert(name.clone()), "{name} names two parameter links");
        }
    }
    let below: BTreeSet<String> = redex
        .inner_face()
        .names
        .into_iter()
        .chain(identity.inner_face().names)
        .collect();
    assert_eq!(parameter_names, below);
    let above: BTreeSet<String> = redex
        .outer_face()
        .names
        .into_iter()
        .chain(identity.outer_face().names)
        .collect();
    let context_inner: BTreeSet<String> = ctx.inner_face().names.into_iter().collect();
    assert_eq!(context_inner, above);
}
