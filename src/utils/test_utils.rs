use std::path::Path;
use std::time::Duration;

use crate::core::app::App;
use crate::core::conversation::ConversationStore;
use crate::core::storage::LocalStorage;

pub fn create_test_store() -> ConversationStore {
    ConversationStore::new(LocalStorage::in_memory(), None, Duration::from_millis(75))
}

pub fn create_test_store_at(path: &Path) -> ConversationStore {
    let storage = LocalStorage::open(path).expect("Failed to open test storage");
    ConversationStore::new(storage, None, Duration::from_millis(75))
}

pub fn create_test_app() -> App {
    App::new(create_test_store(), "test-model".to_string())
}
