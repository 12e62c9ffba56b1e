//! Decoding of the DAO object returned by `sui_getObject`.
//!
//! The node answers with loosely-typed JSON. Every field the domain needs
//! is checked here so malformed or foreign objects fail with a precise
//! [`LedgerError`] instead of leaking half-decoded state.

use serde_json::{Map, Value as JsonValue};

use crate::domain::foundation::{ObjectId, ProposalId};
use crate::domain::proposal::{DaoState, ProposalRecord};
use crate::ports::LedgerError;

const MOVE_OBJECT: &str = "moveObject";

/// Decodes the `result` member of a `sui_getObject` response.
pub fn decode_dao_object(dao_id: &ObjectId, result: &JsonValue) -> Result<DaoState, LedgerError> {
    if let Some(error) = result.get("error") {
        return Err(decode_object_error(dao_id, error));
    }

    let data = result
        .get("data")
        .filter(|d| !d.is_null())
        .ok_or_else(|| LedgerError::malformed("response has no data"))?;
    let content = data
        .get("content")
        .filter(|c| !c.is_null())
        .ok_or_else(|| LedgerError::malformed("object has no content"))?;

    match content.get("dataType").and_then(JsonValue::as_str) {
        Some(MOVE_OBJECT) => {}
        Some(kind) => return Err(LedgerError::unsupported_kind(kind)),
        None => return Err(LedgerError::malformed("content has no dataType")),
    }

    let fields = content
        .get("fields")
        .and_then(JsonValue::as_object)
        .ok_or_else(|| LedgerError::malformed("object has no fields"))?;

    let proposals = fields
        .get("proposals")
        .ok_or_else(|| LedgerError::malformed("DAO has no proposals field"))?
        .as_array()
        .ok_or_else(|| LedgerError::malformed("proposals is not a sequence"))?
        .iter()
        .enumerate()
        .map(|(index, raw)| decode_proposal(index, raw))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DaoState {
        dao_id: dao_id.clone(),
        next_id: fields.get("next_id").and_then(scalar_to_string),
        proposals,
    })
}

fn decode_object_error(dao_id: &ObjectId, error: &JsonValue) -> LedgerError {
    match error.get("code").and_then(JsonValue::as_str) {
        Some("notExists") | Some("deleted") => LedgerError::object_not_found(dao_id.as_str()),
        Some(code) => LedgerError::malformed(format!("object error {}", code)),
        None => LedgerError::malformed(format!("object error {}", error)),
    }
}

fn decode_proposal(index: usize, raw: &JsonValue) -> Result<ProposalRecord, LedgerError> {
    let fields = unwrap_struct(raw)
        .ok_or_else(|| LedgerError::malformed(format!("proposal {} is not a struct", index)))?;

    let id = fields
        .get("id")
        .and_then(decode_id)
        .ok_or_else(|| LedgerError::malformed(format!("proposal {} has no id", index)))?;
    let id = ProposalId::new(id)
        .map_err(|_| LedgerError::malformed(format!("proposal {} has a blank id", index)))?;

    let title = fields
        .get("title")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| LedgerError::malformed(format!("proposal {} has no title", index)))?
        .to_string();

    let description = fields
        .get("description")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(ProposalRecord {
        id,
        title,
        description,
        votes: fields.get("votes").map(decode_votes).unwrap_or_default(),
        status: fields.get("status").and_then(scalar_to_string),
    })
}

/// Move structs nested in vectors arrive either bare or as `{type, fields}`.
fn unwrap_struct(raw: &JsonValue) -> Option<&Map<String, JsonValue>> {
    let object = raw.as_object()?;
    match object.get("fields").and_then(JsonValue::as_object) {
        Some(inner) if object.contains_key("type") || !object.contains_key("id") => Some(inner),
        _ => Some(object),
    }
}

/// Ids appear as strings, numbers, or `UID` structs (`{"id": "0x.."}`).
fn decode_id(raw: &JsonValue) -> Option<String> {
    match raw {
        JsonValue::Object(uid) => uid.get("id").and_then(decode_id),
        other => scalar_to_string(other),
    }
}

/// Votes are a vector, or a `VecMap`/`Table` exposing `fields.contents`.
fn decode_votes(raw: &JsonValue) -> Vec<JsonValue> {
    if let Some(votes) = raw.as_array() {
        return votes.clone();
    }
    raw.get("fields")
        .and_then(|f| f.get("contents"))
        .and_then(JsonValue::as_array)
        .cloned()
        .unwrap_or_default()
}

fn scalar_to_string(raw: &JsonValue) -> Option<String> {
    match raw {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dao_id() -> ObjectId {
        ObjectId::new("0xda0").unwrap()
    }

    fn move_object(fields: JsonValue) -> JsonValue {
        json!({
            "data": {
                "objectId": "0xda0",
                "content": {
                    "dataType": "moveObject",
                    "type": "0xabc::dao::Dao",
                    "fields": fields
                }
            }
        })
    }

    #[test]
    fn decodes_wrapped_proposals() {
        let result = move_object(json!({
            "id": {"id": "0xda0"},
            "next_id": "6",
            "proposals": [{
                "type": "0xabc::dao::Proposal",
                "fields": {
                    "id": "5",
                    "title": "Fund docs",
                    "description": "Pay writers",
                    "votes": [],
                    "status": 1
                }
            }]
        }));

        let state = decode_dao_object(&dao_id(), &result).unwrap();

        assert_eq!(state.next_id.as_deref(), Some("6"));
        assert_eq!(state.proposals.len(), 1);
        let proposal = &state.proposals[0];
        assert_eq!(proposal.id.as_str(), "5");
        assert_eq!(proposal.title, "Fund docs");
        assert_eq!(proposal.status.as_deref(), Some("1"));
    }

    #[test]
    fn decodes_bare_proposals_with_uid_ids() {
        let result = move_object(json!({
            "proposals": [{"id": {"id": "0xfeed"}, "title": "t", "description": "d"}]
        }));

        let state = decode_dao_object(&dao_id(), &result).unwrap();

        assert_eq!(state.proposals[0].id.as_str(), "0xfeed");
        assert!(state.proposals[0].votes.is_empty());
    }

    #[test]
    fn empty_proposal_list_is_valid() {
        let state = decode_dao_object(&dao_id(), &move_object(json!({"proposals": []}))).unwrap();
        assert!(state.proposals.is_empty());
    }

    #[test]
    fn package_object_is_unsupported() {
        let result = json!({
            "data": {"content": {"dataType": "package", "disassembled": {}}}
        });
        assert_eq!(
            decode_dao_object(&dao_id(), &result),
            Err(LedgerError::unsupported_kind("package"))
        );
    }

    #[test]
    fn missing_object_is_not_found() {
        let result = json!({"error": {"code": "notExists", "object_id": "0xda0"}});
        assert_eq!(
            decode_dao_object(&dao_id(), &result),
            Err(LedgerError::object_not_found("0xda0"))
        );
    }

    #[test]
    fn non_sequence_proposals_is_malformed() {
        let result = move_object(json!({"proposals": {"a": 1}}));
        assert!(matches!(
            decode_dao_object(&dao_id(), &result),
            Err(LedgerError::MalformedState { .. })
        ));
    }

    #[test]
    fn missing_proposals_is_malformed() {
        assert!(matches!(
            decode_dao_object(&dao_id(), &move_object(json!({"members": []}))),
            Err(LedgerError::MalformedState { .. })
        ));
    }

    #[test]
    fn proposal_without_title_is_malformed() {
        let result = move_object(json!({"proposals": [{"fields": {"id": "1"}}]}));
        assert!(matches!(
            decode_dao_object(&dao_id(), &result),
            Err(LedgerError::MalformedState { .. })
        ));
    }

    #[test]
    fn missing_content_is_malformed() {
        let result = json!({"data": {"objectId": "0xda0"}});
        assert!(matches!(
            decode_dao_object(&dao_id(), &result),
            Err(LedgerError::MalformedState { .. })
        ));
    }

    #[test]
    fn vec_map_votes_are_flattened() {
        let result = move_object(json!({
            "proposals": [{
                "id": "1",
                "title": "t",
                "votes": {"type": "0x2::vec_map::VecMap", "fields": {"contents": [{"k": 1}]}}
            }]
        }));
        let state = decode_dao_object(&dao_id(), &result).unwrap();
        assert_eq!(state.proposals[0].votes.len(), 1);
    }
}
