//! Query response types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One page (or the merged pages) of a query response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub total_size: u64,
    #[serde(default = "default_done")]
    pub done: bool,
    #[serde(default)]
    pub records: Vec<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
}

fn default_done() -> bool {
    true
}

impl QueryResult {
    pub fn has_more(&self) -> bool {
        !self.done && self.next_records_url.is_some()
    }

    /// Append the records of a follow-up page
    pub fn absorb(&mut self, page: QueryResult) {
        self.records.extend(page.records);
        self.done = page.done;
        self.next_records_url = page.next_records_url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paged_response() {
        let json = serde_json::json!({
            "totalSize": 3,
            "done": false,
            "nextRecordsUrl": "/services/data/v60.0/query/01g-2000",
            "records": [
                { "attributes": { "type": "Account" }, "Id": "001000000000001AAA" },
                { "attributes": { "type": "Account" }, "Id": "001000000000002AAA" }
            ]
        });

        let mut result: QueryResult = serde_json::from_value(json).unwrap();
        assert!(result.has_more());

        let page: QueryResult = serde_json::from_value(serde_json::json!({
            "totalSize": 3,
            "done": true,
            "records": [ { "attributes": { "type": "Account" }, "Id": "001000000000003AAA" } ]
        }))
        .unwrap();
        result.absorb(page);

        assert!(!result.has_more());
        assert_eq!(result.records.len(), 3);
    }

    #[test]
    fn test_count_response_without_records() {
        let result: QueryResult =
            serde_json::from_value(serde_json::json!({ "totalSize": 42, "done": true, "records": [] }))
                .unwrap();

        assert_eq!(result.total_size, 42);
        assert!(result.records.is_empty());
    }
}
