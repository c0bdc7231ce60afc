use serde::Serialize;
use ts_rs::TS;

/// A supported park. The list is static configuration, not data: park ids
/// are the upstream feed's identifiers and never change at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Park {
    pub id: u32,
    pub name: String,
    pub short_name: String,
    pub location: String,
}

/// All parks the app knows how to fetch.
pub fn supported_parks() -> Vec<Park> {
    vec![
        Park {
            id: 334,
            name: "Epic Universe".to_string(),
            short_name: "Epic".to_string(),
            location: "Orlando, FL".to_string(),
        },
        Park {
            id: 65,
            name: "Universal Studios Florida".to_string(),
            short_name: "USF".to_string(),
            location: "Orlando, FL".to_string(),
        },
        Park {
            id: 66,
            name: "Universal Studios Hollywood".to_string(),
            short_name: "USH".to_string(),
            location: "Hollywood, CA".to_string(),
        },
    ]
}

/// Look up a park by its upstream id.
pub fn park_by_id(id: u32) -> Option<Park> {
    supported_parks().into_iter().find(|p| p.id == id)
}
