//! Ordered gallery editing.
//!
//! Every operation takes a snapshot and returns the next one with `order`
//! renumbered densely from zero. The caller owns persistence of the result.

use std::sync::Arc;
use tripmedia_core::{GalleryCollection, ImageDescriptor, PipelineError, PipelineResult};
use tripmedia_storage::{Storage, StorageError};

/// Append freshly uploaded images to the end of a gallery.
pub fn append(collection: &GalleryCollection, new_images: Vec<ImageDescriptor>) -> GalleryCollection {
    let mut items = collection.as_slice().to_vec();
    items.extend(new_images);
    GalleryCollection::new(items).renumbered()
}

/// Move the image at `from` so that it ends up at `to`.
pub fn move_item(
    collection: &GalleryCollection,
    from: usize,
    to: usize,
) -> PipelineResult<GalleryCollection> {
    let len = collection.len();
    for index in [from, to] {
        if index >= len {
            return Err(PipelineError::InvalidIndex { index, len });
        }
    }

    let mut items = collection.as_slice().to_vec();
    let item = items.remove(from);
    items.insert(to, item);
    Ok(GalleryCollection::new(items).renumbered())
}

/// Gallery operations that touch remote storage.
#[derive(Clone)]
pub struct GalleryManager {
    storage: Arc<dyn Storage>,
}

impl GalleryManager {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn append(
        &self,
        collection: &GalleryCollection,
        new_images: Vec<ImageDescriptor>,
    ) -> GalleryCollection {
        append(collection, new_images)
    }

    pub fn move_item(
        &self,
        collection: &GalleryCollection,
        from: usize,
        to: usize,
    ) -> PipelineResult<GalleryCollection> {
        move_item(collection, from, to)
    }

    /// Remove the image at `index`, deleting its object first.
    ///
    /// The entry is only dropped once the delete has succeeded. Records without
    /// a storage path are dropped without a remote call.
    pub async fn remove_at(
        &self,
        collection: &GalleryCollection,
        index: usize,
    ) -> PipelineResult<GalleryCollection> {
        let target = collection.get(index).ok_or(PipelineError::InvalidIndex {
            index,
            len: collection.len(),
        })?;

        if target.path.is_empty() {
            tracing::debug!(
                index = index,
                filename = %target.filename,
                "Gallery entry has no storage path, skipping remote delete"
            );
        } else {
            self.delete_image(&target.path).await?;
        }

        let mut items = collection.as_slice().to_vec();
        items.remove(index);
        Ok(GalleryCollection::new(items).renumbered())
    }

    /// Delete one stored image by key.
    pub async fn delete_image(&self, path: &str) -> PipelineResult<()> {
        match self.storage.delete(path).await {
            Ok(()) => {
                tracing::info!(storage_key = %path, "Image deleted");
                Ok(())
            }
            Err(e) => {
                match &e {
                    StorageError::NotFound(_) => {
                        tracing::debug!(storage_key = %path, "Image not found in storage")
                    }
                    _ => tracing::warn!(
                        error = %e,
                        storage_key = %path,
                        "Failed to delete image"
                    ),
                }
                Err(PipelineError::DeleteFailed {
                    path: path.to_string(),
                    cause: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{descriptor, gallery, names, MockStorage};

    async fn stocked_storage(collection: &GalleryCollection) -> Arc<MockStorage> {
        let storage = Arc::new(MockStorage::new());
        for d in collection {
            storage.set_file(&d.path, b"jpeg").await;
        }
        storage
    }

    #[test]
    fn test_append_renumbers() {
        let existing = gallery(&["a", "b"]);
        let result = append(&existing, vec![descriptor("c", 7), descriptor("d", 0)]);
        assert_eq!(names(&result), vec!["a", "b", "c", "d"]);
        assert_eq!(result.orders(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_append_repairs_sparse_orders() {
        let sparse = GalleryCollection::new(vec![descriptor("a", 4), descriptor("b", 9)]);
        let result = append(&sparse, Vec::new());
        assert!(result.is_dense());
        assert_eq!(names(&result), vec!["a", "b"]);
    }

    #[test]
    fn test_move_forward() {
        let result = move_item(&gallery(&["A", "B", "C", "D"]), 0, 2).unwrap();
        assert_eq!(names(&result), vec!["B", "C", "A", "D"]);
        assert_eq!(result.orders(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_move_backward() {
        let result = move_item(&gallery(&["A", "B", "C", "D"]), 3, 0).unwrap();
        assert_eq!(names(&result), vec!["D", "A", "B", "C"]);
        assert!(result.is_dense());
    }

    #[test]
    fn test_move_to_same_index_is_identity() {
        let original = gallery(&["A", "B", "C"]);
        assert_eq!(move_item(&original, 1, 1).unwrap(), original);
    }

    #[test]
    fn test_move_out_of_range() {
        let original = gallery(&["A", "B"]);
        assert!(matches!(
            move_item(&original, 0, 2),
            Err(PipelineError::InvalidIndex { index: 2, len: 2 })
        ));
        assert!(matches!(
            move_item(&original, 5, 0),
            Err(PipelineError::InvalidIndex { index: 5, len: 2 })
        ));
    }

    #[tokio::test]
    async fn test_remove_at_deletes_and_renumbers() {
        let collection = gallery(&["a", "b", "c", "d", "e"]);
        let storage = stocked_storage(&collection).await;
        let manager = GalleryManager::new(storage.clone());

        let result = manager.remove_at(&collection, 2).await.unwrap();

        assert_eq!(names(&result), vec!["a", "b", "d", "e"]);
        assert_eq!(result.orders(), vec![0, 1, 2, 3]);
        assert_eq!(storage.deleted_keys(), vec![collection.as_slice()[2].path.clone()]);
        assert!(!storage.has_file(&collection.as_slice()[2].path).await);
    }

    #[tokio::test]
    async fn test_remove_at_keeps_entry_when_delete_fails() {
        let collection = gallery(&["a", "b", "c"]);
        let storage = stocked_storage(&collection).await;
        let target = collection.as_slice()[1].path.clone();
        storage.fail_delete_of(&target);
        let manager = GalleryManager::new(storage.clone());

        let err = manager.remove_at(&collection, 1).await.unwrap_err();

        assert!(matches!(&err, PipelineError::DeleteFailed { path, .. } if *path == target));
        assert_eq!(names(&collection), vec!["a", "b", "c"]);
        assert!(storage.has_file(&target).await);
    }

    #[tokio::test]
    async fn test_remove_at_missing_object_is_delete_failure() {
        let collection = gallery(&["a"]);
        let storage = Arc::new(MockStorage::new());
        let manager = GalleryManager::new(storage.clone());

        let err = manager.remove_at(&collection, 0).await.unwrap_err();
        assert!(matches!(err, PipelineError::DeleteFailed { .. }));
    }

    #[tokio::test]
    async fn test_remove_at_without_path_skips_delete() {
        let mut legacy = descriptor("old", 1);
        legacy.path = String::new();
        let collection = GalleryCollection::new(vec![descriptor("a", 0), legacy]);
        let storage = Arc::new(MockStorage::new());
        let manager = GalleryManager::new(storage.clone());

        let result = manager.remove_at(&collection, 1).await.unwrap();

        assert_eq!(names(&result), vec!["a"]);
        assert_eq!(storage.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_remove_at_out_of_range() {
        let collection = gallery(&["a", "b"]);
        let storage = Arc::new(MockStorage::new());
        let manager = GalleryManager::new(storage.clone());

        assert!(matches!(
            manager.remove_at(&collection, 2).await,
            Err(PipelineError::InvalidIndex { index: 2, len: 2 })
        ));
        assert_eq!(storage.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_image() {
        let storage = Arc::new(MockStorage::new());
        storage.set_file("trips/o/t/cover_1.jpg", b"x").await;
        let manager = GalleryManager::new(storage.clone());

        manager.delete_image("trips/o/t/cover_1.jpg").await.unwrap();
        assert!(!storage.has_file("trips/o/t/cover_1.jpg").await);
    }
}
