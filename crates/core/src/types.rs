/// Primary keys of tables owned by this service are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Users and projects are identified by UUIDs issued by the identity provider.
pub type UserId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
