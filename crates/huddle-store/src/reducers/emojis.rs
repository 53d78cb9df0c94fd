use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use huddle_shared::CustomEmoji;

use crate::action::{Action, EmojiAction};
use crate::reducers::{cleared, with_entries, with_entry, without_entry};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmojisState {
    /// Emoji id to emoji.
    pub custom_emoji: Arc<HashMap<String, CustomEmoji>>,
    /// Names the server reported as unknown, so lookups are not repeated.
    pub non_existent_emoji: Arc<HashSet<String>>,
}

fn forget_missing<'a>(
    state: &Arc<HashSet<String>>,
    names: impl IntoIterator<Item = &'a str>,
) -> Arc<HashSet<String>> {
    let found: Vec<&str> = names.into_iter().filter(|n| state.contains(*n)).collect();
    if found.is_empty() {
        return Arc::clone(state);
    }
    let mut next = (**state).clone();
    for name in found {
        next.remove(name);
    }
    Arc::new(next)
}

pub fn reduce(state: &Arc<EmojisState>, action: &Action) -> Arc<EmojisState> {
    let action = match action {
        Action::LogoutSuccess | Action::Emojis(EmojiAction::ClearCustomEmojis) => {
            return cleared(state)
        }
        Action::Emojis(a) => a,
        _ => return Arc::clone(state),
    };

    let (custom_emoji, non_existent_emoji) = match action {
        EmojiAction::ReceivedCustomEmoji(emoji) => (
            with_entry(&state.custom_emoji, emoji.id.clone(), emoji.clone()),
            forget_missing(&state.non_existent_emoji, [emoji.name.as_str()]),
        ),
        EmojiAction::ReceivedCustomEmojis(list) => (
            with_entries(&state.custom_emoji, list.iter().cloned(), |e| e.id.clone()),
            forget_missing(&state.non_existent_emoji, list.iter().map(|e| e.name.as_str())),
        ),
        EmojiAction::DeletedCustomEmoji { id } => (
            without_entry(&state.custom_emoji, id),
            Arc::clone(&state.non_existent_emoji),
        ),
        EmojiAction::CustomEmojiDoesNotExist(name) => {
            let missing = if state.non_existent_emoji.contains(name) {
                Arc::clone(&state.non_existent_emoji)
            } else {
                let mut next = (*state.non_existent_emoji).clone();
                next.insert(name.clone());
                Arc::new(next)
            };
            (Arc::clone(&state.custom_emoji), missing)
        }
        EmojiAction::ClearCustomEmojis => return cleared(state),
    };

    if Arc::ptr_eq(&custom_emoji, &state.custom_emoji)
        && Arc::ptr_eq(&non_existent_emoji, &state.non_existent_emoji)
    {
        return Arc::clone(state);
    }

    Arc::new(EmojisState {
        custom_emoji,
        non_existent_emoji,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emoji(id: &str, name: &str) -> CustomEmoji {
        CustomEmoji {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_received_emoji_clears_missing_marker() {
        let state = Arc::new(EmojisState::default());
        let state = reduce(&state, &EmojiAction::CustomEmojiDoesNotExist("party".into()).into());
        assert!(state.non_existent_emoji.contains("party"));

        let state = reduce(&state, &EmojiAction::ReceivedCustomEmoji(emoji("e1", "party")).into());
        assert!(!state.non_existent_emoji.contains("party"));
        assert!(state.custom_emoji.contains_key("e1"));
    }

    #[test]
    fn test_delete_and_clear() {
        let state = Arc::new(EmojisState::default());
        let state = reduce(
            &state,
            &EmojiAction::ReceivedCustomEmojis(vec![emoji("e1", "a"), emoji("e2", "b")]).into(),
        );
        let state = reduce(&state, &EmojiAction::DeletedCustomEmoji { id: "e1".into() }.into());
        assert_eq!(state.custom_emoji.len(), 1);

        let state = reduce(&state, &EmojiAction::ClearCustomEmojis.into());
        assert_eq!(*state, EmojisState::default());
    }

    #[test]
    fn test_repeat_missing_keeps_state() {
        let state = Arc::new(EmojisState::default());
        let action: Action = EmojiAction::CustomEmojiDoesNotExist("x".into()).into();
        let state = reduce(&state, &action);
        assert!(Arc::ptr_eq(&state, &reduce(&state, &action)));
    }
}
