use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A placement rule mapping pools to a subtree of the hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrushRule {
    pub id: u32,
    pub name: String,
    /// Root node the rule places under. Bucket ids may be negative.
    pub root_id: i64,
}

/// The placement hierarchy, reduced to what PG sizing needs: rule lookup and
/// the set of devices reachable from each root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrushMap {
    pub rules: Vec<CrushRule>,
    /// OSD ids reachable from each tree node
    pub root_osds: BTreeMap<i64, BTreeSet<u32>>,
}

impl CrushMap {
    pub fn rule_by_id(&self, id: u32) -> Option<&CrushRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn rule_root(&self, name: &str) -> Option<i64> {
        self.rules.iter().find(|r| r.name == name).map(|r| r.root_id)
    }

    pub fn osds_under(&self, root_id: i64) -> Option<&BTreeSet<u32>> {
        self.root_osds.get(&root_id)
    }

    /// Resolve a rule id to the root it places under, the way pools
    /// reference rules: id -> rule name -> root.
    pub fn root_for_rule(&self, rule_id: u32) -> Option<i64> {
        let rule = self.rule_by_id(rule_id)?;
        self.rule_root(&rule.name)
    }
}
