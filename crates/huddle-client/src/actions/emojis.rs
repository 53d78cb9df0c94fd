use huddle_shared::CustomEmoji;
use huddle_store::{EmojiAction, RequestOp, Store};

use crate::actions::{bind_request, force_logout_if_necessary, log_error};
use crate::client::{Client, UploadFile};
use crate::error::Result;

pub async fn get_custom_emojis(client: &Client, store: &Store, page: u32, per_page: u32) -> Result<Vec<CustomEmoji>> {
    bind_request(
        client,
        store,
        RequestOp::GetCustomEmojis,
        client.get_custom_emojis(page, per_page),
        |emojis| vec![EmojiAction::ReceivedCustomEmojis(emojis.clone()).into()],
    )
    .await
}

/// Look up one emoji by name. A 404 is remembered so the name is not asked
/// for again; it is not logged as an error.
pub async fn get_custom_emoji_by_name(client: &Client, store: &Store, name: &str) -> Result<CustomEmoji> {
    match client.get_custom_emoji_by_name(name).await {
        Ok(emoji) => {
            store.dispatch(EmojiAction::ReceivedCustomEmoji(emoji.clone()));
            Ok(emoji)
        }
        Err(err) => {
            if err.status_code() == Some(404) {
                store.dispatch(EmojiAction::CustomEmojiDoesNotExist(name.to_string()));
            } else {
                force_logout_if_necessary(client, store, &err);
                store.dispatch(log_error(err.to_stored()));
            }
            Err(err)
        }
    }
}

pub async fn create_custom_emoji(
    client: &Client,
    store: &Store,
    emoji: &CustomEmoji,
    image: UploadFile,
) -> Result<CustomEmoji> {
    bind_request(
        client,
        store,
        RequestOp::CreateCustomEmoji,
        client.create_custom_emoji(emoji, image),
        |created| vec![EmojiAction::ReceivedCustomEmoji(created.clone()).into()],
    )
    .await
}

pub async fn delete_custom_emoji(client: &Client, store: &Store, id: &str) -> Result<()> {
    bind_request(
        client,
        store,
        RequestOp::DeleteCustomEmoji,
        client.delete_custom_emoji(id),
        |_| vec![EmojiAction::DeletedCustomEmoji { id: id.to_string() }.into()],
    )
    .await
}
