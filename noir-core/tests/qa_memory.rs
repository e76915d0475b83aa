//! QA scenarios for world memory durability across many turns.

use noir_core::engine::{EventType, GeneratedItem, GeneratedNpc, NarratorEvent};
use noir_core::testing::{decision_with_event, TestHarness};

fn event(event_type: EventType, description: &str) -> NarratorEvent {
    NarratorEvent {
        event_type,
        description: description.to_string(),
        items_visible: Vec::new(),
        npcs_present: Vec::new(),
        npc_name: None,
        dialogue: None,
        npc_emotion: None,
        block_reason: None,
    }
}

/// Every item id accounted for exactly once, across location lists and
/// inventory containers together.
fn assert_items_conserved(harness: &TestHarness) {
    let memory = harness.memory();
    for id in memory.generated_items.keys() {
        let in_locations = memory
            .generated_locations
            .values()
            .filter(|record| record.items.contains(id))
            .count();
        let in_inventory = memory
            .team_inventory
            .values()
            .filter(|ids| ids.contains(id))
            .count();
        assert_eq!(
            in_locations + in_inventory,
            1,
            "item {id} appears {in_locations} times in locations and {in_inventory} in inventory"
        );
    }
}

#[tokio::test]
async fn qa_items_conserved_across_generate_and_take() {
    let mut harness = TestHarness::new().await;
    harness.start().await;

    let mut found = decision_with_event(event(EventType::ItemFound, "Two things of note."));
    found.generated_items = vec![
        GeneratedItem {
            id: "gen_ledger_001".to_string(),
            name: "Bar Ledger".to_string(),
            description: "Numbers that don't add up.".to_string(),
            portable: true,
            category: "papers".to_string(),
        },
        GeneratedItem {
            id: "gen_stool_001".to_string(),
            name: "Bar Stool".to_string(),
            description: "One leg shorter than the rest.".to_string(),
            portable: false,
            category: "chairs".to_string(),
        },
    ];
    harness.expect_decision(found);
    harness.act("search behind the bar").await;
    assert_items_conserved(&harness);

    let mut take = decision_with_event(event(EventType::ItemTaken, "You take the ledger."));
    take.items_taken = vec!["gen_ledger_001".to_string()];
    harness.expect_decision(take);
    harness.act("take the ledger").await;
    assert_items_conserved(&harness);

    // Taking it again is a no-op, not a duplicate.
    let mut take_again = decision_with_event(event(EventType::ItemTaken, "Already bagged."));
    take_again.items_taken = vec!["gen_ledger_001".to_string()];
    harness.expect_decision(take_again);
    harness.act("take the ledger again").await;
    assert_items_conserved(&harness);
    assert_eq!(harness.memory().team_inventory["bag"].len(), 1);
}

#[tokio::test]
async fn qa_regenerated_id_does_not_clobber() {
    let mut harness = TestHarness::new().await;
    harness.start().await;

    let mut first = decision_with_event(event(EventType::ItemFound, "A photograph."));
    first.generated_items = vec![GeneratedItem {
        id: "gen_photo_001".to_string(),
        name: "Signed Photograph".to_string(),
        description: "Iris, smiling at someone off-camera.".to_string(),
        portable: true,
        category: "photographs".to_string(),
    }];
    harness.expect_decision(first);
    harness.act("look at the wall of photos").await;

    // A later decision re-emits the same id with different content.
    let mut second = decision_with_event(event(EventType::ItemFound, "That photo again."));
    second.generated_items = vec![GeneratedItem {
        id: "gen_photo_001".to_string(),
        name: "Different Photograph".to_string(),
        description: "Should not replace the original.".to_string(),
        portable: true,
        category: "photographs".to_string(),
    }];
    harness.expect_decision(second);
    harness.act("look again").await;

    let item = harness.memory().item("gen_photo_001").unwrap();
    assert_eq!(item.name, "Signed Photograph");
    assert_items_conserved(&harness);
}

#[tokio::test]
async fn qa_npc_statements_accumulate_with_turns() {
    let mut harness = TestHarness::new().await;
    harness.start().await;

    let mut seed = decision_with_event(event(EventType::NpcDialogue, "The bartender nods."));
    seed.generated_npcs = vec![GeneratedNpc {
        id: "gen_bartender_001".to_string(),
        name: "Sal".to_string(),
        role: "bartender".to_string(),
        personality: "tired, careful".to_string(),
        knowledge: vec!["Saw Miriam leave late".to_string()],
    }];
    seed.narrator_event.npc_name = Some("Sal".to_string());
    seed.narrator_event.dialogue = Some("Iris sang her last set at midnight.".to_string());
    harness.expect_decision(seed);
    harness.act("ask the bartender about Iris").await;

    let mut followup = decision_with_event(event(EventType::NpcDialogue, "Sal leans in."));
    followup.narrator_event.npc_name = Some("Sal".to_string());
    followup.narrator_event.dialogue = Some("Miriam left by the alley door.".to_string());
    harness.expect_decision(followup);
    harness.act("ask who left last").await;

    let npc = harness.memory().npc("gen_bartender_001").unwrap();
    assert_eq!(npc.statements.len(), 2);
    assert_eq!(npc.statements[0].turn, 1);
    assert_eq!(npc.statements[1].turn, 2);
}

#[tokio::test]
async fn qa_memory_survives_long_session_under_prune() {
    let mut harness = TestHarness::new().await;
    harness.start().await;

    // Discover c1 at the dressing room, then wander far past the prune cap.
    let mut to_dressing = decision_with_event(event(EventType::LocationReveal, "Dressing room."));
    to_dressing.new_location = Some("The Silver Gull - dressing room".to_string());
    harness.expect_decision(to_dressing);
    harness.act("go to the dressing room").await;

    let mut discover = decision_with_event(event(EventType::ItemFound, "A torn page."));
    discover.clues_discovered = vec!["c1".to_string()];
    harness.expect_decision(discover);
    harness.act("open the vanity drawer").await;

    for i in 0..15 {
        let mut wander = decision_with_event(event(EventType::LocationReveal, "Somewhere new."));
        wander.new_location = Some(format!("backlot corner {i}"));
        harness.expect_decision(wander);
        harness.act("keep walking").await;
    }

    // The dressing room hosts an un-taken key clue and must survive pruning.
    assert!(harness
        .memory()
        .location("The Silver Gull - dressing room")
        .is_some());
    let clue = harness.memory().item("c1").unwrap();
    assert!(!clue.taken);
    // The wander locations themselves got capped.
    assert!(harness.memory().generated_locations.len() <= 11);
}

#[tokio::test]
async fn qa_inventory_travels_with_the_team() {
    let mut harness = TestHarness::new().await;
    harness.start().await;

    let mut found = decision_with_event(event(EventType::ItemFound, "A brass key."));
    found.generated_items = vec![GeneratedItem {
        id: "gen_key_001".to_string(),
        name: "Brass Key".to_string(),
        description: "Stamped 4-B.".to_string(),
        portable: true,
        category: "keys".to_string(),
    }];
    found.items_taken = vec!["gen_key_001".to_string()];
    harness.expect_decision(found);
    harness.act("grab the key").await;

    let mut travel = decision_with_event(event(EventType::LocationReveal, "The alley."));
    travel.new_location = Some("The Silver Gull - alley".to_string());
    harness.expect_decision(travel);
    harness.act("head to the alley").await;

    // The context at the new location still includes the inventory.
    let context = harness.memory().relevant_context("The Silver Gull - alley");
    assert!(context.inventory.iter().any(|i| i.id == "gen_key_001"));
}
