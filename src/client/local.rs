use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::ClientError;

/// Logical collections kept on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Cart,
    Wishlist,
    Orders,
    /// Signed-in user and token.
    Session,
}

impl Collection {
    pub fn key(self) -> &'static str {
        match self {
            Collection::Cart => "cart",
            Collection::Wishlist => "wishlist",
            Collection::Orders => "orders",
            Collection::Session => "session",
        }
    }
}

/// Key-value cache on the device, one JSON document per collection.
pub trait LocalStore: Send + Sync {
    fn get(&self, collection: Collection) -> Result<Option<Value>, ClientError>;
    fn set(&self, collection: Collection, value: Value) -> Result<(), ClientError>;
    fn remove(&self, collection: Collection) -> Result<(), ClientError>;
}

pub fn load<T: DeserializeOwned>(
    store: &dyn LocalStore,
    collection: Collection,
) -> Result<Option<T>, ClientError> {
    match store.get(collection)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub fn save<T: Serialize>(
    store: &dyn LocalStore,
    collection: Collection,
    value: &T,
) -> Result<(), ClientError> {
    store.set(collection, serde_json::to_value(value)?)
}

/// Read-modify-write of a collection. A missing document starts from `T::default()`.
pub fn merge<T, F>(store: &dyn LocalStore, collection: Collection, f: F) -> Result<T, ClientError>
where
    T: DeserializeOwned + Serialize + Default,
    F: FnOnce(&mut T),
{
    let mut current: T = load(store, collection)?.unwrap_or_default();
    f(&mut current);
    save(store, collection, &current)?;
    Ok(current)
}

#[derive(Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<Collection, Value>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<Collection, Value>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, collection: Collection) -> Result<Option<Value>, ClientError> {
        Ok(self.entries().get(&collection).cloned())
    }

    fn set(&self, collection: Collection, value: Value) -> Result<(), ClientError> {
        self.entries().insert(collection, value);
        Ok(())
    }

    fn remove(&self, collection: Collection) -> Result<(), ClientError> {
        self.entries().remove(&collection);
        Ok(())
    }
}

/// Stores each collection as `<dir>/<key>.json`.
pub struct FileLocalStore {
    dir: PathBuf,
}

impl FileLocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.key()))
    }
}

impl LocalStore for FileLocalStore {
    fn get(&self, collection: Collection) -> Result<Option<Value>, ClientError> {
        match fs::read(self.path(collection)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, collection: Collection, value: Value) -> Result<(), ClientError> {
        let path = self.path(collection);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&value)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, collection: Collection) -> Result<(), ClientError> {
        match fs::remove_file(self.path(collection)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("storefront-{name}-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn memory_store_get_set_remove() {
        let store = MemoryLocalStore::new();
        assert!(store.get(Collection::Cart).unwrap().is_none());
        store.set(Collection::Cart, json!([1, 2])).unwrap();
        assert_eq!(store.get(Collection::Cart).unwrap(), Some(json!([1, 2])));
        assert!(store.get(Collection::Wishlist).unwrap().is_none());
        store.remove(Collection::Cart).unwrap();
        assert!(store.get(Collection::Cart).unwrap().is_none());
    }

    #[test]
    fn merge_starts_from_default_and_persists() {
        let store = MemoryLocalStore::new();
        let ids: Vec<i64> = merge(&store, Collection::Wishlist, |ids: &mut Vec<i64>| {
            ids.push(4)
        })
        .unwrap();
        assert_eq!(ids, vec![4]);
        let ids: Vec<i64> = merge(&store, Collection::Wishlist, |ids: &mut Vec<i64>| {
            ids.push(9)
        })
        .unwrap();
        assert_eq!(ids, vec![4, 9]);
        let loaded: Option<Vec<i64>> = load(&store, Collection::Wishlist).unwrap();
        assert_eq!(loaded, Some(vec![4, 9]));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = temp_dir("file-store");
        {
            let store = FileLocalStore::new(&dir).unwrap();
            save(&store, Collection::Orders, &vec!["ord_1".to_string()]).unwrap();
        }
        let store = FileLocalStore::new(&dir).unwrap();
        let orders: Option<Vec<String>> = load(&store, Collection::Orders).unwrap();
        assert_eq!(orders, Some(vec!["ord_1".to_string()]));

        store.remove(Collection::Orders).unwrap();
        store.remove(Collection::Orders).unwrap();
        assert!(store.get(Collection::Orders).unwrap().is_none());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn file_store_reports_corrupt_documents() {
        let dir = temp_dir("corrupt");
        let store = FileLocalStore::new(&dir).unwrap();
        fs::write(dir.join("cart.json"), b"{not json").unwrap();
        assert!(matches!(
            store.get(Collection::Cart),
            Err(ClientError::Json(_))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
