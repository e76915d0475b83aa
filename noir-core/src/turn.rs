//! The turn pipeline.
//!
//! One player action in, one committed turn out. The pipeline is strictly
//! linear: build the director's context, call the director, call the
//! narrator, then apply every mutation in a single commit step. Nothing is
//! written before both engine calls have succeeded, so an aborted turn
//! leaves the world state and the memory store exactly as they were.
//!
//! Turns never interleave: the caller holds `&mut` on both documents, and
//! the server serializes callers behind one async mutex.

use crate::case::CaseFile;
use crate::engine::{
    Director, DirectorDecision, EngineError, EventType, Narrator, Scene,
};
use crate::memory::{Item, Npc, WorldMemory, DEFAULT_CONTAINER};
use crate::world::{ConversationEntry, WorldState};
use thiserror::Error;

/// Generated location records kept before pruning kicks in.
pub const LOCATION_KEEP_COUNT: usize = 10;

/// Errors that abort a turn. On any of these, no state was changed.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Decision engine failed: {0}")]
    Director(#[source] EngineError),

    #[error("Rendering engine failed: {0}")]
    Narrator(#[source] EngineError),
}

/// The result of a committed turn.
#[derive(Debug)]
pub struct TurnOutcome {
    pub decision: DirectorDecision,
    pub scene: Scene,
}

/// Run one complete turn.
pub async fn run_turn(
    action: &str,
    world: &mut WorldState,
    memory: &mut WorldMemory,
    case: &CaseFile,
    director: &dyn Director,
    narrator: &dyn Narrator,
) -> Result<TurnOutcome, TurnError> {
    tracing::info!(action, location = %world.current_location, "Turn started");

    let context = memory.relevant_context(&world.current_location);

    let decision = director
        .decide(action, world, &context, case)
        .await
        .map_err(TurnError::Director)?;

    let scene = narrator
        .render(&decision.narrator_event)
        .await
        .map_err(TurnError::Narrator)?;

    commit(action, &decision, &scene, world, memory, case);

    tracing::info!(
        event = ?decision.narrator_event.event_type,
        progress = world.progress,
        "Turn committed"
    );

    Ok(TurnOutcome { decision, scene })
}

/// Apply every mutation for a successful turn. Infallible by construction:
/// invalid pieces of the decision are dropped with a warning rather than
/// poisoning the commit.
fn commit(
    action: &str,
    decision: &DirectorDecision,
    scene: &Scene,
    world: &mut WorldState,
    memory: &mut WorldMemory,
    case: &CaseFile,
) {
    memory.turn += 1;

    // Generated content lands at the turn's effective location, so a revisit
    // after a move finds it where the scene placed it.
    let location = decision
        .new_location
        .clone()
        .unwrap_or_else(|| world.current_location.clone());

    for generated in &decision.generated_items {
        memory.save_item(Item {
            id: generated.id.clone(),
            name: generated.name.clone(),
            description: generated.description.clone(),
            portable: generated.portable,
            category: generated.category.clone(),
            original_location: location.clone(),
            current_location: location.clone(),
            inspected: false,
            taken: false,
            is_key_clue: case.is_key_clue(&generated.id),
        });
    }

    for generated in &decision.generated_npcs {
        memory.save_npc(Npc {
            id: generated.id.clone(),
            name: generated.name.clone(),
            role: generated.role.clone(),
            personality: generated.personality.clone(),
            knowledge: generated.knowledge.clone(),
            current_location: location.clone(),
            statements: Vec::new(),
        });
    }

    // Discovered key clues materialize as real items at their anchored
    // location, so a later take has something to transfer. Discovery is not
    // possession.
    for clue_id in &decision.clues_discovered {
        if case.is_key_clue(clue_id) {
            materialize_key_clue(memory, case, clue_id);
        } else {
            tracing::warn!(clue = %clue_id, "Ignoring unknown clue id from director");
        }
    }
    world.discover_clues(
        decision
            .clues_discovered
            .iter()
            .filter(|id| case.is_key_clue(id))
            .cloned(),
    );

    for item_id in &decision.items_taken {
        if case.is_key_clue(item_id) {
            materialize_key_clue(memory, case, item_id);
        }
        if !memory.transfer_to_inventory(item_id, DEFAULT_CONTAINER) {
            tracing::warn!(item = %item_id, "Take rejected during commit");
        }
    }

    if decision.narrator_event.event_type == EventType::ItemInspected {
        let inspected: Vec<String> = memory
            .generated_items
            .values()
            .filter(|item| {
                item.current_location == location
                    && decision
                        .narrator_event
                        .items_visible
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(&item.name))
            })
            .map(|item| item.id.clone())
            .collect();
        for id in inspected {
            memory.note_inspected(&id);
        }
    }

    if let Some(ref destination) = decision.new_location {
        world.current_location = destination.clone();
        world.note_visited(destination);
    }
    memory.record_visit(&world.current_location);

    world.note_interviewed(decision.suspects_interviewed.iter().cloned());

    if let Some(progress) = decision.progress_update {
        world.progress = progress.clamp(0.0, 1.0);
    }

    // NPC statements recorded from the decided event, not the rendered
    // paraphrase; the director checks consistency against these.
    if let (Some(name), Some(dialogue)) = (
        decision.narrator_event.npc_name.as_deref(),
        decision.narrator_event.dialogue.as_deref(),
    ) {
        let turn = memory.turn;
        if let Some(npc_id) = memory.npc_by_name(name).map(|npc| npc.id.clone()) {
            memory.add_npc_statement(&npc_id, dialogue, turn);
        }
    }

    world.push_history(ConversationEntry::Player {
        action: action.to_string(),
    });
    for line in &scene.lines {
        if line.is_dialogue() {
            world.push_history(ConversationEntry::Dialogue {
                speaker: line.speaker.clone(),
                text: line.text.clone(),
            });
        }
    }

    memory.prune_old_locations(LOCATION_KEEP_COUNT);
}

/// Put the canonical record for a key clue into memory at its anchored
/// location. Idempotent; an existing record is left alone.
fn materialize_key_clue(memory: &mut WorldMemory, case: &CaseFile, clue_id: &str) {
    if memory.item(clue_id).is_some() {
        return;
    }
    let Some(clue) = case.key_clue(clue_id) else {
        return;
    };
    let Some(anchor) = case
        .solution
        .anchors
        .iter()
        .find(|a| a.clue_id == clue_id)
    else {
        tracing::warn!(clue = %clue_id, "Key clue has no anchor");
        return;
    };

    memory.save_item(Item {
        id: clue.id.clone(),
        name: clue.name.clone(),
        description: clue.description.clone(),
        portable: true,
        category: "evidence".to_string(),
        original_location: anchor.location.clone(),
        current_location: anchor.location.clone(),
        inspected: false,
        taken: false,
        is_key_clue: true,
    });
}
