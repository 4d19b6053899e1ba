mod sqlite;

pub use sqlite::SqliteHistoryStore;
