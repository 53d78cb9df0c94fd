use tokio_util::sync::CancellationToken;

use huddle_shared::{ChannelId, FileUploadResponse};
use huddle_store::{RequestOp, Store};

use crate::actions::bind_request;
use crate::client::{Client, UploadFile};
use crate::error::Result;

/// Upload attachments ahead of creating their post. Cancelling `cancel`
/// stops the upload and records the operation as cancelled rather than
/// failed.
pub async fn upload_files(
    client: &Client,
    store: &Store,
    channel_id: &ChannelId,
    files: Vec<UploadFile>,
    client_ids: &[String],
    cancel: &CancellationToken,
) -> Result<FileUploadResponse> {
    bind_request(
        client,
        store,
        RequestOp::UploadFiles,
        client.upload_files(channel_id, files, client_ids, cancel),
        |_| Vec::new(),
    )
    .await
}
