// Sibling detection: players registered under the same parent and address.

use std::collections::HashMap;

use crate::model::Player;

/// Family key: parent last name and street address, trimmed and
/// case-folded. Players missing either field have no family.
fn family_key(player: &Player) -> Option<(String, String)> {
    let parent = player.parent_name.as_deref()?.trim();
    let address = player.street_address.as_deref()?.trim();
    if parent.is_empty() || address.is_empty() {
        return None;
    }
    Some((parent.to_lowercase(), address.to_lowercase()))
}

/// Player IDs of every family with two or more registered children.
///
/// Groups are ordered by their first member's registration position, and
/// members keep registration order within a group.
pub fn family_groups(players: &[Player]) -> Vec<Vec<String>> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), Vec<String>> = HashMap::new();

    for player in players {
        let Some(key) = family_key(player) else {
            continue;
        };
        let members = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        members.push(player.player_id.clone());
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .filter(|members| members.len() > 1)
        .collect()
}
