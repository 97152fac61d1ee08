pub mod area;
pub mod bus;
pub mod file;
pub mod keyed;
pub mod sqlite;
pub mod watcher;

pub use area::{MemoryArea, StorageArea};
pub use bus::{ContextId, StorageEvent, Subscription};
pub use file::FileArea;
pub use keyed::{KeyedStore, StorageOrigin};
pub use sqlite::SqliteArea;
pub use watcher::OriginWatcher;
