//! Object size lookup that runs before any output exists.

use crate::error::DownloadError;
use crate::job::ObjectRef;
use crate::store::{BlobStore, StoreError};

/// Queries the store for the size of `object`.
pub fn resolve_size(store: &dyn BlobStore, object: &ObjectRef) -> Result<u64, DownloadError> {
    match store.object_size(object) {
        Ok(size) => {
            tracing::debug!(%object, size, "resolved size");
            Ok(size)
        }
        Err(StoreError::NotFound) => Err(DownloadError::ObjectNotFound(object.clone())),
        Err(StoreError::AccessDenied) => Err(DownloadError::AccessDenied(object.clone())),
        Err(source) => Err(DownloadError::Resolve {
            object: object.clone(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBlobStore;

    #[test]
    fn maps_store_errors() {
        let present = ObjectRef::new("b", "present");
        let secret = ObjectRef::new("b", "secret");
        let mut store = MemoryBlobStore::new();
        store.insert(present.clone(), vec![0u8; 42]);
        store.insert(secret.clone(), vec![0u8; 1]);
        store.deny(secret.clone());

        assert_eq!(resolve_size(&store, &present).unwrap(), 42);
        assert!(matches!(
            resolve_size(&store, &ObjectRef::new("b", "absent")),
            Err(DownloadError::ObjectNotFound(o)) if o.key == "absent"
        ));
        assert!(matches!(
            resolve_size(&store, &secret),
            Err(DownloadError::AccessDenied(_))
        ));
    }
}
