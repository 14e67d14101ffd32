// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs, clippy::unwrap_used)]

use bigraph_core::{make_node_id, Bigraph, BigraphBuilder, ControlKind, PlaceKind, Signature};

fn signature() -> Signature {
    Signature::builder()
        .control("Room", 1, ControlKind::Active)
        .and_then(|b| b.control("Token", 1, ControlKind::Atomic))
        .unwrap()
        .finish()
}

#[test]
fn sibling_sites_break_monomorphism_and_root_sites_break_guarding() {
    let mut b = BigraphBuilder::new(&signature());
    let r = b.root(0).unwrap();
    let s0 = b.site(0).unwrap();
    let s1 = b.site(1).unwrap();
    b.set_parent(s0, r).unwrap();
    b.set_parent(s1, r).unwrap();
    let g = b.finish().unwrap();

    assert!(!g.is_monomorphic());
    assert!(!g.is_guarding());
    assert!(g.is_active());
    assert_eq!(g.inner_face().places, 2);
}

#[test]
fn inner_name_reaching_an_outer_name_is_not_guarding() {
    let sig = signature();
    let id = Bigraph::identity_linking(&sig, &["x", "y"]).unwrap();
    assert!(!id.is_guarding());
    assert!(id.is_discrete());
    assert!(id.is_monomorphic());
    assert_eq!(id.inner_face().names, id.outer_face().names);
    assert_eq!(id.inner_face().places, 0);
}

#[test]
fn nodes_carry_label_ids_and_controls() {
    let mut b = BigraphBuilder::new(&signature());
    let r = b.root(0).unwrap();
    let room = b.node("Room", "kitchen").unwrap();
    b.set_parent(room, r).unwrap();
    let token = b.child(room, "Token").unwrap();
    let wire = b.fresh_edge();
    b.connect_port(room, wire).unwrap();
    b.connect_port(token, wire).unwrap();
    let g = b.finish().unwrap();

    assert!(matches!(g.kind(room), PlaceKind::Node(data)
        if data.id() == make_node_id("kitchen") && data.control().to_string() == "Room:1"));
    assert_eq!(g.node_by_label("kitchen"), Some(room));
    assert_eq!(g.edges().count(), 1);
    assert!(!g.is_discrete());
    assert!(g.is_lean());
}

mod digest_props {
    #![allow(clippy::unwrap_used)]
    use bigraph_core::{BigraphBuilder, ControlKind, Signature};
    use proptest::prelude::*;

    fn rooms(order: &[usize]) -> bigraph_core::Bigraph {
        let sig = Signature::builder()
            .control("Room", 0, ControlKind::Active)
            .unwrap()
            .finish();
        let mut b = BigraphBuilder::new(&sig);
        let r = b.root(0).unwrap();
        for i in order {
            let n = b.node("Room", format!("room{i}")).unwrap();
            b.set_parent(n, r).unwrap();
        }
        b.finish().unwrap()
    }

    proptest! {
        #[test]
        fn digest_is_independent_of_sibling_order(order in Just((0..8).collect::<Vec<usize>>()).prop_shuffle()) {
            let sorted: Vec<usize> = (0..8).collect();
            prop_assert_eq!(rooms(&order).digest(), rooms(&sorted).digest());
        }
    }
}
