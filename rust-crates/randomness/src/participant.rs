use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

/// A social account that interacted with a tweet. Identity is the `id`;
/// `handle` and `display_name` are presentation only.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(rename = "username")]
    pub handle: String,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl Participant {
    /// Builds a participant, normalizing the handle to carry a single leading `@`.
    pub fn new(
        id: impl Into<String>,
        handle: impl AsRef<str>,
        display_name: impl Into<String>,
    ) -> Self {
        let bare = handle.as_ref().trim().trim_start_matches('@');
        Self {
            id: id.into(),
            handle: format!("@{bare}"),
            display_name: display_name.into(),
        }
    }

    pub fn bare_handle(&self) -> &str {
        self.handle.trim_start_matches('@')
    }
}

/// Collapses participants sharing an id. The first occurrence fixes the
/// position, later occurrences overwrite the display fields.
pub fn dedup_by_id(participants: impl IntoIterator<Item = Participant>) -> Vec<Participant> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Participant> = Vec::new();
    for participant in participants {
        match positions.get(&participant.id) {
            Some(&index) => unique[index] = participant,
            None => {
                positions.insert(participant.id.clone(), unique.len());
                unique.push(participant);
            }
        }
    }
    unique
}
