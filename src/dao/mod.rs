/// Storage key layout for per-user records.
pub mod keys;
/// Key-value backends and the trait they implement.
pub mod kv_store;
/// Storage abstraction layer for database operations.
pub mod storage;
