//! NPC and instance reference tables used to resolve lore hit origins.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NpcRef {
    #[serde(rename = "defaultTalks", default, deserialize_with = "null_as_default")]
    pub default_talks: Vec<u32>,
    #[serde(default)]
    pub balloon: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceRef {
    #[serde(rename = "contentText", default, deserialize_with = "null_as_default")]
    pub content_text: Vec<u32>,
}

/// Treats an explicit `null` like a missing key, so one sparse entry does
/// not fail the whole table.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ordered by id, so a reverse lookup returns the lowest matching owner.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub npcs: BTreeMap<u32, NpcRef>,
    pub instances: BTreeMap<u32, InstanceRef>,
}

impl ReferenceTables {
    /// Loads both tables. A missing or malformed file leaves that table empty;
    /// lore hits then stay unresolved.
    pub async fn load(npcs: &Path, instances: &Path) -> Self {
        let tables = Self {
            npcs: load_table(npcs).await,
            instances: load_table(instances).await,
        };
        debug!(
            npcs = tables.npcs.len(),
            instances = tables.instances.len(),
            "reference tables loaded"
        );
        tables
    }

    pub fn npc_with_default_talk(&self, talk_id: u32) -> Option<u32> {
        self.npcs
            .iter()
            .find(|(_, npc)| npc.default_talks.contains(&talk_id))
            .map(|(id, _)| *id)
    }

    pub fn npc_with_balloon(&self, balloon_id: u32) -> Option<u32> {
        self.npcs
            .iter()
            .find(|(_, npc)| npc.balloon == Some(balloon_id))
            .map(|(id, _)| *id)
    }

    pub fn instance_with_content_text(&self, text_id: u32) -> Option<u32> {
        self.instances
            .iter()
            .find(|(_, instance)| instance.content_text.contains(&text_id))
            .map(|(id, _)| *id)
    }
}

async fn load_table<T: DeserializeOwned>(path: &Path) -> BTreeMap<u32, T> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "reference table unavailable");
            return BTreeMap::new();
        }
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "reference table is not valid JSON");
        BTreeMap::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> ReferenceTables {
        let mut t = ReferenceTables::default();
        t.npcs.insert(
            9,
            NpcRef {
                default_talks: vec![77],
                balloon: None,
            },
        );
        t.npcs.insert(
            5,
            NpcRef {
                default_talks: vec![77, 78],
                balloon: Some(300),
            },
        );
        t.instances.insert(
            12,
            InstanceRef {
                content_text: vec![4000, 4001],
            },
        );
        t
    }

    #[test]
    fn reverse_lookups_pick_lowest_owner() {
        let t = tables();
        assert_eq!(t.npc_with_default_talk(77), Some(5));
        assert_eq!(t.npc_with_default_talk(78), Some(5));
        assert_eq!(t.npc_with_default_talk(79), None);
        assert_eq!(t.npc_with_balloon(300), Some(5));
        assert_eq!(t.instance_with_content_text(4001), Some(12));
        assert_eq!(t.instance_with_content_text(1), None);
    }

    #[tokio::test]
    async fn load_reads_json_tables_and_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let npcs = dir.path().join("npcs.json");
        std::fs::write(&npcs, r#"{"5": {"defaultTalks": [77], "balloon": 12}, "6": {}}"#).unwrap();

        let t = ReferenceTables::load(&npcs, &dir.path().join("instances.json")).await;
        assert_eq!(t.npcs.len(), 2);
        assert_eq!(t.npc_with_balloon(12), Some(5));
        assert!(t.instances.is_empty());
    }

    #[tokio::test]
    async fn null_lists_only_affect_their_own_entry() {
        let dir = tempfile::tempdir().unwrap();
        let npcs = dir.path().join("npcs.json");
        let instances = dir.path().join("instances.json");
        std::fs::write(
            &npcs,
            r#"{"5": {"defaultTalks": [77]}, "6": {"defaultTalks": null, "balloon": null}}"#,
        )
        .unwrap();
        std::fs::write(
            &instances,
            r#"{"30": {"contentText": [900]}, "31": {"contentText": null}}"#,
        )
        .unwrap();

        let t = ReferenceTables::load(&npcs, &instances).await;
        assert_eq!(t.npcs.len(), 2);
        assert_eq!(t.instances.len(), 2);
        assert_eq!(t.npc_with_default_talk(77), Some(5));
        assert_eq!(t.instance_with_content_text(900), Some(30));
        assert!(t.instances[&31].content_text.is_empty());
    }
}
