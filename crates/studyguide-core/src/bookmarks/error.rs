use thiserror::Error;

use crate::models::ItemType;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum BookmarkError {
    /// Another toggle for the same item has not finished yet
    #[error("A bookmark change for {item_type} {item_id} is already in progress")]
    ToggleInProgress { item_type: ItemType, item_id: String },

    /// Storage could not be read or written; in-memory state is unchanged
    #[error("Failed to persist bookmarks: {0}")]
    Storage(#[from] StorageError),
}
