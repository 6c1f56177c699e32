//! Host-facing result records.

use crate::types::IndexEntry;
use serde::{Deserialize, Serialize};

/// Label of the single action every result carries
pub const OPEN_ACTION: &str = "Open";

/// An action the host can trigger on a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultAction {
    /// Text shown for the action
    pub label: String,

    /// URI handed to the system opener
    pub url: String,
}

/// One row of query output as a launcher host displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    /// Stable identifier (the entry URI)
    pub id: String,

    /// Main display text (the entry title)
    pub text: String,

    /// Secondary line: the path, or the URI for virtual entries
    pub subtext: String,

    /// Replacement query text when the user tabs into the result
    pub completion: String,

    /// Resolved icon handle, if any
    pub icon: Option<String>,

    /// Actions offered for the result
    pub actions: Vec<ResultAction>,
}

impl From<&IndexEntry> for ResultItem {
    fn from(entry: &IndexEntry) -> Self {
        ResultItem {
            id: entry.uri().to_string(),
            text: entry.title().to_string(),
            subtext: entry.subtext().to_string(),
            completion: entry.completion(),
            icon: entry.icon().map(|icon| icon.as_str().to_string()),
            actions: vec![ResultAction {
                label: OPEN_ACTION.to_string(),
                url: entry.uri().to_string(),
            }],
        }
    }
}
