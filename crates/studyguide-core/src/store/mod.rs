//! Per-collection view state: the fetched items, the filter inputs and the
//! filtered view derived from them.

mod collection;

pub use collection::{CollectionStore, CollectionView};
