//! Finger-tapping test protocols
//!
//! Each protocol names its target keys, the keys counted as near misses by
//! the accuracy scorer, and the record slots holding the dominant and
//! non-dominant hand streams.

use crate::types::{HandRole, Targets};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestProtocol {
    pub name: String,
    pub targets: Targets,
    pub adjacent_keys: Vec<u16>,
    pub dominant_slot: String,
    pub non_dominant_slot: String,
}

impl TestProtocol {
    pub fn slot(&self, role: HandRole) -> &str {
        match role {
            HandRole::Dominant => &self.dominant_slot,
            HandRole::NonDominant => &self.non_dominant_slot,
        }
    }
}

/// QP, MN and M keyboard tests
pub fn default_protocols() -> Vec<TestProtocol> {
    vec![
        TestProtocol {
            name: "qp".to_string(),
            targets: Targets::Alternating(80, 81),
            adjacent_keys: vec![79, 48, 45, 91, 59, 76, 9, 49, 50, 87, 65, 20],
            dominant_slot: "0".to_string(),
            non_dominant_slot: "1".to_string(),
        },
        TestProtocol {
            name: "mn".to_string(),
            targets: Targets::Alternating(77, 78),
            adjacent_keys: vec![74, 75, 44, 32, 66, 72],
            dominant_slot: "2".to_string(),
            non_dominant_slot: "3".to_string(),
        },
        TestProtocol {
            name: "m".to_string(),
            targets: Targets::Single(77),
            adjacent_keys: vec![78, 74, 75, 32, 44],
            dominant_slot: "4".to_string(),
            non_dominant_slot: "5".to_string(),
        },
    ]
}
