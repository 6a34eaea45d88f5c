//! Entity lookups.

use serde::Deserialize;
use serde_json::json;

use super::{ClientError, NewRelicClient};

const GET_ENTITY: &str = r#"query($guid: EntityGuid!) {
  actor { entity(guid: $guid) { guid name accountId domain type } }
}"#;

/// The outline fields shared by every entity type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityOutline {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub account_id: Option<i64>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, rename = "type")]
    pub entity_type: Option<String>,
}

#[derive(Deserialize)]
struct EntityData {
    actor: EntityActor,
}

#[derive(Deserialize)]
struct EntityActor {
    entity: Option<EntityOutline>,
}

impl NewRelicClient {
    /// Fetch an entity by GUID. `None` when it does not exist.
    pub async fn get_entity(&self, guid: &str) -> Result<Option<EntityOutline>, ClientError> {
        match self.query::<EntityData>(GET_ENTITY, json!({ "guid": guid })).await {
            Ok(data) => Ok(data.actor.entity),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_outline() {
        let data: EntityData = serde_json::from_value(json!({
            "actor": {"entity": {
                "guid": "abc",
                "name": "berlin",
                "accountId": 3806526,
                "domain": "SYNTH",
                "type": "PRIVATE_LOCATION"
            }}
        }))
        .unwrap();

        let entity = data.actor.entity.unwrap();
        assert_eq!(entity.name, "berlin");
        assert_eq!(entity.account_id, Some(3806526));
        assert_eq!(entity.entity_type.as_deref(), Some("PRIVATE_LOCATION"));
    }

    #[test]
    fn test_missing_entity() {
        let data: EntityData = serde_json::from_value(json!({"actor": {"entity": null}})).unwrap();
        assert!(data.actor.entity.is_none());
    }
}
