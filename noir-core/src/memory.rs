//! The world memory store.
//!
//! Everything the director has invented lives here: generated locations,
//! items, and NPCs, plus the team's shared inventory. The store is the
//! single source of truth for generated content and survives arbitrary
//! numbers of turns and process restarts (it is persisted as one document,
//! see [`crate::persist`]).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Inventory path prefix recorded on a taken item's `current_location`.
pub const INVENTORY_PREFIX: &str = "inventory.";

/// Default container for taken items.
pub const DEFAULT_CONTAINER: &str = "bag";

/// Memory record for one generated/visited location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationMemory {
    /// Ids of generated items present at this location.
    pub items: Vec<String>,

    /// Ids of generated NPCs present at this location.
    pub npcs: Vec<String>,

    /// Whether the team has been here.
    pub visited: bool,

    /// Recency stamp for pruning (monotonic visit counter, not wall time).
    pub last_visited: u64,
}

/// A generated (or materialized key-clue) item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub portable: bool,
    pub category: String,
    pub original_location: String,
    /// A location id, or "inventory.<container>" once taken.
    pub current_location: String,
    #[serde(default)]
    pub inspected: bool,
    #[serde(default)]
    pub taken: bool,
    #[serde(default)]
    pub is_key_clue: bool,
}

/// A generated NPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub id: String,
    pub name: String,
    pub role: String,
    pub personality: String,
    pub knowledge: Vec<String>,
    pub current_location: String,
    /// Ordered log of what this NPC has said, for consistency checking.
    #[serde(default)]
    pub statements: Vec<Statement>,
}

/// One recorded NPC statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub turn: u64,
    pub said: String,
}

/// The memory handed to the director for one turn.
///
/// This is the only read surface the decision engine gets: the current
/// location's record, the inventory, and the NPCs standing here. It never
/// sees other locations' contents.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryContext {
    pub current_location_memory: Option<LocationMemory>,
    pub location_visited_before: bool,
    pub inventory: Vec<Item>,
    pub nearby_npcs: Vec<Npc>,
}

/// Durable store of generated world content and the team inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldMemory {
    pub generated_locations: HashMap<String, LocationMemory>,
    pub generated_items: HashMap<String, Item>,
    pub generated_npcs: HashMap<String, Npc>,
    /// Container name -> item ids. An id appears in at most one container.
    pub team_inventory: BTreeMap<String, Vec<String>>,
    pub player_notes: Vec<String>,
    /// Committed turn counter; stamps NPC statements and visit recency.
    #[serde(default)]
    pub turn: u64,
}

impl Default for WorldMemory {
    fn default() -> Self {
        let mut team_inventory = BTreeMap::new();
        team_inventory.insert("bag".to_string(), Vec::new());
        team_inventory.insert("pockets".to_string(), Vec::new());
        Self {
            generated_locations: HashMap::new(),
            generated_items: HashMap::new(),
            generated_npcs: HashMap::new(),
            team_inventory,
            player_notes: Vec::new(),
            turn: 0,
        }
    }
}

impl WorldMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the fresh default structure.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // --- Locations ---

    /// Memory for a location, or None if never visited.
    pub fn location(&self, location_id: &str) -> Option<&LocationMemory> {
        self.generated_locations.get(location_id)
    }

    /// Save (replace) a location's memory record.
    pub fn save_location(&mut self, location_id: impl Into<String>, record: LocationMemory) {
        self.generated_locations.insert(location_id.into(), record);
    }

    /// Mark a location visited at the current turn, creating its record if
    /// this is first contact.
    pub fn record_visit(&mut self, location_id: &str) {
        let turn = self.turn;
        let record = self
            .generated_locations
            .entry(location_id.to_string())
            .or_default();
        record.visited = true;
        record.last_visited = turn;
    }

    // --- Items ---

    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.generated_items.get(item_id)
    }

    /// Save an item and register it on its location's item list.
    ///
    /// An existing item with the same id is left untouched; the director is
    /// not allowed to re-generate known content.
    pub fn save_item(&mut self, item: Item) {
        if self.generated_items.contains_key(&item.id) {
            tracing::debug!(item = %item.id, "Item already in memory, ignoring regenerate");
            return;
        }
        let location = self
            .generated_locations
            .entry(item.current_location.clone())
            .or_default();
        if !location.items.contains(&item.id) {
            location.items.push(item.id.clone());
        }
        self.generated_items.insert(item.id.clone(), item);
    }

    /// Mark an item inspected.
    pub fn note_inspected(&mut self, item_id: &str) {
        if let Some(item) = self.generated_items.get_mut(item_id) {
            item.inspected = true;
        }
    }

    /// Move an item from its location into a team inventory container.
    ///
    /// Returns false (without mutating) when the item is unknown or not
    /// portable. Idempotent when the item is already in that container.
    pub fn transfer_to_inventory(&mut self, item_id: &str, container: &str) -> bool {
        let portable = match self.generated_items.get(item_id) {
            Some(item) => item.portable,
            None => {
                tracing::warn!(item = item_id, "Transfer of unknown item refused");
                return false;
            }
        };
        if !portable {
            tracing::warn!(item = item_id, "Transfer of non-portable item refused");
            return false;
        }
        // Already carried, possibly in another container: success, no move.
        if self.in_inventory(item_id) {
            return true;
        }

        self.team_inventory
            .entry(container.to_string())
            .or_default()
            .push(item_id.to_string());

        // Checked present above.
        let Some(item) = self.generated_items.get_mut(item_id) else {
            return false;
        };
        item.current_location = format!("{INVENTORY_PREFIX}{container}");
        item.taken = true;
        let origin = item.original_location.clone();

        if let Some(location) = self.generated_locations.get_mut(&origin) {
            location.items.retain(|id| id != item_id);
        }

        tracing::info!(item = item_id, container, "Item transferred to inventory");
        true
    }

    /// Full item records for everything in the inventory.
    pub fn inventory_items(&self) -> Vec<&Item> {
        self.team_inventory
            .values()
            .flatten()
            .filter_map(|id| self.generated_items.get(id))
            .collect()
    }

    /// Whether an item id is in any inventory container.
    pub fn in_inventory(&self, item_id: &str) -> bool {
        self.team_inventory
            .values()
            .any(|ids| ids.iter().any(|id| id == item_id))
    }

    // --- NPCs ---

    pub fn npc(&self, npc_id: &str) -> Option<&Npc> {
        self.generated_npcs.get(npc_id)
    }

    /// Save an NPC and register it on its location's NPC list. Existing ids
    /// are left untouched.
    pub fn save_npc(&mut self, npc: Npc) {
        if self.generated_npcs.contains_key(&npc.id) {
            return;
        }
        let location = self
            .generated_locations
            .entry(npc.current_location.clone())
            .or_default();
        if !location.npcs.contains(&npc.id) {
            location.npcs.push(npc.id.clone());
        }
        self.generated_npcs.insert(npc.id.clone(), npc);
    }

    /// Record something an NPC said at a given turn.
    pub fn add_npc_statement(&mut self, npc_id: &str, said: impl Into<String>, turn: u64) {
        if let Some(npc) = self.generated_npcs.get_mut(npc_id) {
            npc.statements.push(Statement {
                turn,
                said: said.into(),
            });
        }
    }

    /// Find a generated NPC by display name (case-insensitive).
    pub fn npc_by_name(&self, name: &str) -> Option<&Npc> {
        self.generated_npcs
            .values()
            .find(|npc| npc.name.eq_ignore_ascii_case(name))
    }

    // --- Context building ---

    /// The bounded read surface handed to the director for one location.
    pub fn relevant_context(&self, location_id: &str) -> MemoryContext {
        let nearby_npcs = self
            .generated_npcs
            .values()
            .filter(|npc| npc.current_location == location_id)
            .cloned()
            .collect();

        MemoryContext {
            current_location_memory: self.generated_locations.get(location_id).cloned(),
            location_visited_before: self.generated_locations.contains_key(location_id),
            inventory: self.inventory_items().into_iter().cloned().collect(),
            nearby_npcs,
        }
    }

    // --- Pruning ---

    /// Cap location memory to the `keep_count` most recently visited.
    ///
    /// A location still hosting an un-taken key-clue item is never evicted,
    /// even when that leaves more than `keep_count` records.
    pub fn prune_old_locations(&mut self, keep_count: usize) {
        if self.generated_locations.len() <= keep_count {
            return;
        }

        let mut by_recency: Vec<(String, u64)> = self
            .generated_locations
            .iter()
            .map(|(id, record)| (id.clone(), record.last_visited))
            .collect();
        by_recency.sort_by(|a, b| b.1.cmp(&a.1));

        for (location_id, _) in by_recency.into_iter().skip(keep_count) {
            if self.hosts_untaken_key_clue(&location_id) {
                tracing::debug!(location = %location_id, "Prune skipped: holds un-taken key clue");
                continue;
            }
            self.generated_locations.remove(&location_id);
        }
    }

    fn hosts_untaken_key_clue(&self, location_id: &str) -> bool {
        let Some(record) = self.generated_locations.get(location_id) else {
            return false;
        };
        record.items.iter().any(|id| {
            self.generated_items
                .get(id)
                .map(|item| item.is_key_clue && !item.taken)
                .unwrap_or(false)
        })
    }
}
