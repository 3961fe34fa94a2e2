use std::collections::BTreeSet;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use retinues::id::is_custom_id;
use retinues::testutil::ready_session;

#[test]
fn faction_setup_builds_sound_trees() {
    let mut session = ready_session();
    assert!(session.ensure_troops_exist("player_clan"));

    let roster = session.roster("player_clan").unwrap().clone();
    for slot in [
        roster.elite_root.as_deref(),
        roster.basic_root.as_deref(),
        roster.retinue_elite.as_deref(),
        roster.retinue_basic.as_deref(),
    ] {
        let root = slot.expect("every slot is filled");
        assert!(session.check_tree(root));
    }

    // 3 basic + 2 elite + 2 retinues, all namespaced, all indexed.
    assert_eq!(session.registry().len(), 7);
    for node in session.registry().iter() {
        assert!(is_custom_id(&node.id));
        assert_eq!(
            session.index().try_get_faction(&node.id),
            Some("player_clan")
        );
    }
}

#[test]
fn ids_stay_unique_across_factions() {
    let mut session = ready_session();
    session.register_faction("rival_clan", "The Pact", "vlandia");
    session.ensure_troops_exist("player_clan");
    session.ensure_troops_exist("rival_clan");

    let ids: BTreeSet<&str> = session.registry().ids().collect();
    assert_eq!(ids.len(), 14);

    let rival_root = session
        .roster("rival_clan")
        .unwrap()
        .basic_root
        .clone()
        .unwrap();
    assert_eq!(
        session.index().try_get_faction(&rival_root),
        Some("rival_clan")
    );
}

#[test]
fn volunteer_refresh_walks_to_the_reference_tier() {
    let mut session = ready_session();
    session.ensure_troops_exist("player_clan");
    let mut rng = SmallRng::seed_from_u64(11);

    // The cloned basic line is t1 -> t2 -> t3, so a t3 reference lands on
    // the t3 clone and a t2 reference on the t2 clone.
    let picked = session
        .on_volunteer_refresh("vlandia_sergeant", "player_clan", &mut rng)
        .unwrap();
    assert_eq!(session.registry().get(&picked).unwrap().level, 3);

    let picked = session
        .on_volunteer_refresh("vlandia_footman", "player_clan", &mut rng)
        .unwrap();
    assert_eq!(session.registry().get(&picked).unwrap().level, 2);
}

#[test]
fn volunteer_refresh_ignores_unknown_factions() {
    let mut session = ready_session();
    session.ensure_troops_exist("player_clan");
    let mut rng = SmallRng::seed_from_u64(11);
    assert!(
        session
            .on_volunteer_refresh("vlandia_footman", "nobody", &mut rng)
            .is_none()
    );
}

#[test]
fn recruit_swap_falls_back_to_the_closest_tier() {
    let mut session = ready_session();
    session.ensure_troops_exist("player_clan");
    let mut rng = SmallRng::seed_from_u64(11);

    let root = session
        .roster("player_clan")
        .unwrap()
        .basic_root
        .clone()
        .unwrap();
    let middle = session.registry().get(&root).unwrap().children[0].clone();
    assert_eq!(session.registry().get(&middle).unwrap().level, 2);

    // Exact tier available.
    let picked = session
        .on_recruit("vlandia_footman", "player_clan", &mut rng)
        .unwrap();
    assert_eq!(picked, middle);

    // Remove the t2 node; t1 and t3 are equally close and the root is
    // visited first.
    assert!(session.remove_troop(&middle));
    let picked = session
        .on_recruit("vlandia_footman", "player_clan", &mut rng)
        .unwrap();
    assert_eq!(session.registry().get(&picked).unwrap().level, 1);
}

#[test]
fn elite_references_swap_on_the_elite_tree() {
    let mut session = ready_session();
    session.ensure_troops_exist("player_clan");
    let mut rng = SmallRng::seed_from_u64(11);

    // vlandia_knight is t4 on the elite line; the cloned elite tree tops
    // out at the knight clone.
    let picked = session
        .on_volunteer_refresh("vlandia_knight", "player_clan", &mut rng)
        .unwrap();
    let node = session.registry().get(&picked).unwrap();
    assert!(node.is_elite);
    assert_eq!(node.level, 4);
    assert_eq!(node.vanilla_id.as_deref(), Some("vlandia_knight"));
}

#[test]
fn mutations_keep_trees_sound() {
    let mut session = ready_session();
    session.ensure_troops_exist("player_clan");
    let root = session
        .roster("player_clan")
        .unwrap()
        .basic_root
        .clone()
        .unwrap();

    let added = session.add_child(&root, "vlandia_squire").unwrap();
    assert!(session.check_tree(&root));

    assert!(session.rename(&added, "Clan Vanguard"));
    let sibling = session.registry().get(&root).unwrap().children[0].clone();
    assert!(session.reparent(&added, &sibling));
    assert!(session.check_tree(&root));

    assert!(session.remove_troop(&added));
    assert!(session.check_tree(&root));
    assert!(!session.registry().contains(&added));
}

#[test]
fn cloning_unlocks_every_referenced_item() {
    let mut session = ready_session();
    session.ensure_troops_exist("player_clan");
    for item in ["gambeson", "helm_a", "mail_a", "greathelm", "plate", "charger"] {
        assert!(session.unlocks().is_unlocked(item), "missing unlock: {item}");
    }
}
