//! Authored case data.
//!
//! A case file is the static, hand-written half of a mystery: the secret
//! solution (culprit, motive, key clues and where they are anchored), the
//! location catalog the director may send players to, and the physics rules
//! it validates actions against. The solution travels to the director as a
//! separate input and is never echoed to clients.

use serde::{Deserialize, Serialize};

/// Default case when a start request names no case or an unknown one.
pub const DEFAULT_CASE: &str = "iris_bell";

/// A complete authored mystery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFile {
    /// Stable case identifier (e.g. "iris_bell").
    pub id: String,

    /// Display title.
    pub title: String,

    /// Intro narration broadcast when the game starts.
    pub intro: String,

    /// Location the team starts at.
    pub starting_location: String,

    /// The secret solution. Never sent to clients.
    pub solution: Solution,

    /// Static location catalog handed to the director.
    pub locations: Vec<LocationInfo>,

    /// Physics rules for action validation.
    pub physics: PhysicsRules,
}

/// The secret solution to a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub victim: String,
    pub culprit: String,
    pub motive: String,
    pub key_clues: Vec<KeyClue>,
    pub anchors: Vec<Anchor>,
    pub suspects: Vec<Suspect>,
}

/// One of the small fixed set of evidence items tied to the solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyClue {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// The authored (location, container) pair at which a key clue is found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anchor {
    pub clue_id: String,
    pub location: String,
    pub container: String,
}

/// A suspect the players can interview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suspect {
    pub name: String,
    pub description: String,
    pub alibi: String,
    pub connection: String,
}

/// Static data about an authored location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationInfo {
    pub id: String,
    pub atmosphere: String,
    #[serde(default)]
    pub ambient_npcs: Vec<String>,
    #[serde(default)]
    pub sub_locations: Vec<String>,
    pub initially_accessible: bool,
}

/// Category lists the director validates take/move actions against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsRules {
    /// Can be picked up and carried.
    pub portable: Vec<String>,
    /// Can be pushed or shifted, not carried.
    pub heavy: Vec<String>,
    /// Cannot be moved at all.
    pub immovable: Vec<String>,
}

impl CaseFile {
    /// Look up a case by id, falling back to the default case.
    pub fn by_id(case_id: &str) -> Self {
        match case_id {
            "iris_bell" => Self::iris_bell(),
            other => {
                tracing::warn!(case = other, "Unknown case id, using default case");
                Self::iris_bell()
            }
        }
    }

    /// The built-in case: the murder of torch singer Iris Bell.
    pub fn iris_bell() -> Self {
        Self {
            id: "iris_bell".to_string(),
            title: "The Silver Gull".to_string(),
            intro: "The rain hammers against your fedora as you push through the \
                    doors of The Silver Gull. A torch singer lies dead in her \
                    dressing room. Three suspects, one truth. Time to work."
                .to_string(),
            starting_location: "The Silver Gull - main bar".to_string(),
            solution: Solution {
                victim: "Iris Bell, torch singer at The Silver Gull".to_string(),
                culprit: "Miriam Kline".to_string(),
                motive: "Iris was about to take Miriam's arrangement credits and her \
                         chair on the coast tour. Miriam strangled her with a length \
                         of piano wire after the last set."
                    .to_string(),
                key_clues: vec![
                    KeyClue {
                        id: "c1".to_string(),
                        name: "Torn Contract Page".to_string(),
                        description: "A torn page from a tour contract naming Iris \
                                      Bell as lead arranger. Miriam's name is struck \
                                      through in pen."
                            .to_string(),
                    },
                    KeyClue {
                        id: "c2".to_string(),
                        name: "Piano Wire Sleeve".to_string(),
                        description: "A paper sleeve for replacement piano wire, \
                                      torn open. One wire is missing."
                            .to_string(),
                    },
                    KeyClue {
                        id: "c3".to_string(),
                        name: "Bloodied Glove".to_string(),
                        description: "A lady's glove, seam split at the palm, with \
                                      a thin dark line pressed into the leather."
                            .to_string(),
                    },
                ],
                anchors: vec![
                    Anchor {
                        clue_id: "c1".to_string(),
                        location: "The Silver Gull - dressing room".to_string(),
                        container: "vanity drawer".to_string(),
                    },
                    Anchor {
                        clue_id: "c2".to_string(),
                        location: "The Silver Gull - rehearsal room".to_string(),
                        container: "piano".to_string(),
                    },
                    Anchor {
                        clue_id: "c3".to_string(),
                        location: "The Silver Gull - alley".to_string(),
                        container: "trash barrel".to_string(),
                    },
                ],
                suspects: vec![
                    Suspect {
                        name: "Miriam Kline".to_string(),
                        description: "House pianist. Played behind Iris for six years."
                            .to_string(),
                        alibi: "Claims she was restringing the rehearsal piano alone \
                                after the last set."
                            .to_string(),
                        connection: "Was being replaced as arranger on the coast tour."
                            .to_string(),
                    },
                    Suspect {
                        name: "Victor Crane".to_string(),
                        description: "Owner of The Silver Gull.".to_string(),
                        alibi: "Counting the till in the office with the door open."
                            .to_string(),
                        connection: "Owed Iris three weeks' pay and a cut of the door."
                            .to_string(),
                    },
                    Suspect {
                        name: "Eddie Moss".to_string(),
                        description: "Off-duty beat cop, regular at the bar.".to_string(),
                        alibi: "Nursing a rye at the bar until close, per the bartender."
                            .to_string(),
                        connection: "Walked Iris home twice last month. She stopped \
                                     answering his calls."
                            .to_string(),
                    },
                ],
            },
            locations: vec![
                LocationInfo {
                    id: "The Silver Gull - main bar".to_string(),
                    atmosphere: "Stale beer, cheaper perfume, a stage nobody is \
                                 looking at."
                        .to_string(),
                    ambient_npcs: vec!["bartender".to_string(), "waitress".to_string()],
                    sub_locations: vec![
                        "The Silver Gull - dressing room".to_string(),
                        "The Silver Gull - rehearsal room".to_string(),
                        "The Silver Gull - alley".to_string(),
                    ],
                    initially_accessible: true,
                },
                LocationInfo {
                    id: "The Silver Gull - dressing room".to_string(),
                    atmosphere: "Cold cream and cigarette smoke. The mirror bulbs \
                                 are still warm."
                        .to_string(),
                    ambient_npcs: vec![],
                    sub_locations: vec![],
                    initially_accessible: true,
                },
                LocationInfo {
                    id: "The Silver Gull - rehearsal room".to_string(),
                    atmosphere: "An upright piano, a dead radiator, sheet music \
                                 nobody filed."
                        .to_string(),
                    ambient_npcs: vec![],
                    sub_locations: vec![],
                    initially_accessible: true,
                },
                LocationInfo {
                    id: "The Silver Gull - alley".to_string(),
                    atmosphere: "Rain off the gutters, a door that doesn't latch, \
                                 and everything the Gull throws away."
                        .to_string(),
                    ambient_npcs: vec![],
                    sub_locations: vec![],
                    initially_accessible: true,
                },
                LocationInfo {
                    id: "Oak Street boarding house".to_string(),
                    atmosphere: "Iris's last address. A landlady who sees everything \
                                 and says nothing for free."
                        .to_string(),
                    ambient_npcs: vec!["landlady".to_string()],
                    sub_locations: vec![],
                    initially_accessible: false,
                },
            ],
            physics: PhysicsRules {
                portable: vec![
                    "clothing".to_string(),
                    "papers".to_string(),
                    "photographs".to_string(),
                    "small_object".to_string(),
                    "keys".to_string(),
                    "letters".to_string(),
                    "evidence".to_string(),
                ],
                heavy: vec![
                    "chairs".to_string(),
                    "small tables".to_string(),
                    "crates".to_string(),
                ],
                immovable: vec![
                    "furniture".to_string(),
                    "safes".to_string(),
                    "pianos".to_string(),
                    "fixtures".to_string(),
                    "radiators".to_string(),
                ],
            },
        }
    }

    /// Find the anchor (if any) for a clue at the given location+container.
    pub fn anchor_at(&self, location: &str, container: &str) -> Option<&Anchor> {
        self.solution
            .anchors
            .iter()
            .find(|a| a.location == location && a.container == container)
    }

    /// Look up a key clue by id.
    pub fn key_clue(&self, clue_id: &str) -> Option<&KeyClue> {
        self.solution.key_clues.iter().find(|c| c.id == clue_id)
    }

    /// Whether an id belongs to the fixed key-clue set.
    pub fn is_key_clue(&self, id: &str) -> bool {
        self.key_clue(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_case_loads() {
        let case = CaseFile::by_id(DEFAULT_CASE);
        assert_eq!(case.id, "iris_bell");
        assert_eq!(case.solution.key_clues.len(), 3);
        assert_eq!(case.solution.anchors.len(), 3);
        assert_eq!(case.solution.suspects.len(), 3);
    }

    #[test]
    fn test_unknown_case_falls_back() {
        let case = CaseFile::by_id("no_such_case");
        assert_eq!(case.id, "iris_bell");
    }

    #[test]
    fn test_every_key_clue_has_an_anchor() {
        let case = CaseFile::iris_bell();
        for clue in &case.solution.key_clues {
            assert!(
                case.solution.anchors.iter().any(|a| a.clue_id == clue.id),
                "clue {} has no anchor",
                clue.id
            );
        }
    }

    #[test]
    fn test_anchor_lookup() {
        let case = CaseFile::iris_bell();
        let anchor = case
            .anchor_at("The Silver Gull - rehearsal room", "piano")
            .expect("piano anchor");
        assert_eq!(anchor.clue_id, "c2");
        assert!(case.anchor_at("The Silver Gull - main bar", "piano").is_none());
    }

    #[test]
    fn test_key_clue_lookup() {
        let case = CaseFile::iris_bell();
        assert!(case.is_key_clue("c1"));
        assert!(case.is_key_clue("c3"));
        assert!(!case.is_key_clue("gen_matchbook_001"));
    }

    #[test]
    fn test_starting_location_in_catalog() {
        let case = CaseFile::iris_bell();
        assert!(case.locations.iter().any(|l| l.id == case.starting_location));
    }
}
