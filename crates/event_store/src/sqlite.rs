//! SQLite event store implementation.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use entities::{Event, EventScope, Role, Rsvp, RsvpScope, RsvpStatus, User};
use sqlx::{
    FromRow, QueryBuilder, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use uuid::Uuid;

use crate::{
    EventFilter, EventStore, EventStoreError, EventStoreResult, RsvpFilter, UserFilter,
};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'manager', 'admin')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    location TEXT NOT NULL DEFAULT '',
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    created_by TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    is_public INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_created_by ON events(created_by);
CREATE INDEX IF NOT EXISTS idx_events_start_time ON events(start_time);

CREATE TABLE IF NOT EXISTS rsvps (
    id TEXT PRIMARY KEY NOT NULL,
    event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'going' CHECK (status IN ('going', 'maybe', 'not_going')),
    created_at TEXT NOT NULL,
    UNIQUE (event_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_rsvps_user_id ON rsvps(user_id);
"#;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";
const EVENT_COLUMNS: &str = "id, title, description, location, start_time, end_time, \
                             created_by, is_public, created_at, updated_at";
const RSVP_COLUMNS: &str = "id, event_id, user_id, status, created_at";

/// Fixed-width UTC timestamps so that text ordering matches time ordering.
fn to_db_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(value: &str) -> EventStoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EventStoreError::Corrupt(format!("timestamp {value:?}: {e}")))
}

fn parse_id(value: &str) -> EventStoreResult<Uuid> {
    value
        .parse()
        .map_err(|_| EventStoreError::Corrupt(format!("id {value:?}")))
}

/// Maps constraint failures on insert/update to store errors.
fn write_error(e: sqlx::Error, entity_type: &'static str, id: impl Into<String>) -> EventStoreError {
    if let sqlx::Error::Database(db_error) = &e {
        if db_error.is_unique_violation() {
            return EventStoreError::already_exists(entity_type, id);
        }
        if db_error.is_foreign_key_violation() {
            return EventStoreError::ForeignKeyViolation(format!(
                "{entity_type} {} references a missing row",
                id.into()
            ));
        }
    }
    EventStoreError::Database(e)
}

/// Escapes `%`, `_` and `\` for a LIKE pattern using `\` as the escape.
/// `LIKE` folds ASCII case only, as the in-memory filters do.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Database row for User.
#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = EventStoreError;

    fn try_from(row: UserRow) -> EventStoreResult<Self> {
        Ok(User {
            id: parse_id(&row.id)?,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            role: Role::from_str(&row.role).map_err(|e| EventStoreError::Corrupt(e.to_string()))?,
            created_at: parse_time(&row.created_at)?,
            updated_at: parse_time(&row.updated_at)?,
        })
    }
}

/// Database row for Event.
#[derive(Debug, FromRow)]
struct EventRow {
    id: String,
    title: String,
    description: String,
    location: String,
    start_time: String,
    end_time: String,
    created_by: String,
    is_public: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<EventRow> for Event {
    type Error = EventStoreError;

    fn try_from(row: EventRow) -> EventStoreResult<Self> {
        Ok(Event {
            id: parse_id(&row.id)?,
            title: row.title,
            description: row.description,
            location: row.location,
            start_time: parse_time(&row.start_time)?,
            end_time: parse_time(&row.end_time)?,
            created_by: parse_id(&row.created_by)?,
            is_public: row.is_public,
            created_at: parse_time(&row.created_at)?,
            updated_at: parse_time(&row.updated_at)?,
        })
    }
}

/// Database row for Rsvp.
#[derive(Debug, FromRow)]
struct RsvpRow {
    id: String,
    event_id: String,
    user_id: String,
    status: String,
    created_at: String,
}

impl TryFrom<RsvpRow> for Rsvp {
    type Error = EventStoreError;

    fn try_from(row: RsvpRow) -> EventStoreResult<Self> {
        Ok(Rsvp {
            id: parse_id(&row.id)?,
            event_id: parse_id(&row.event_id)?,
            user_id: parse_id(&row.user_id)?,
            status: RsvpStatus::from_str(&row.status).map_err(EventStoreError::Corrupt)?,
            created_at: parse_time(&row.created_at)?,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> EventStoreResult<Vec<T>>
where
    T: TryFrom<R, Error = EventStoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn push_user_conditions(qb: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(term) = &filter.search {
        let pattern = like_pattern(term);
        qb.push(" AND (username LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR email LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

fn push_event_conditions(qb: &mut QueryBuilder<'_, Sqlite>, filter: &EventFilter) {
    match filter.scope {
        EventScope::All => {}
        EventScope::PublicOnly => {
            qb.push(" AND is_public = 1");
        }
        EventScope::PublicOrOwnedBy(user_id) => {
            qb.push(" AND (is_public = 1 OR created_by = ")
                .push_bind(user_id.to_string())
                .push(")");
        }
    }
    if let Some(is_public) = filter.is_public {
        qb.push(" AND is_public = ").push_bind(is_public);
    }
    if let Some(term) = &filter.search {
        let pattern = like_pattern(term);
        qb.push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR location LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR description LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

fn push_rsvp_conditions(qb: &mut QueryBuilder<'_, Sqlite>, filter: &RsvpFilter) {
    match filter.scope {
        RsvpScope::All => {}
        RsvpScope::OwnedBy(user_id) => {
            qb.push(" AND user_id = ").push_bind(user_id.to_string());
        }
    }
    if let Some(event_id) = filter.event_id {
        qb.push(" AND event_id = ").push_bind(event_id.to_string());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
}

fn push_pagination(qb: &mut QueryBuilder<'_, Sqlite>, limit: Option<u32>, offset: Option<u32>) {
    // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
    qb.push(" LIMIT ")
        .push_bind(limit.map_or(-1, i64::from))
        .push(" OFFSET ")
        .push_bind(i64::from(offset.unwrap_or(0)));
}

/// SQLite-backed event store.
#[derive(Debug, Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    /// Connects to the database at `url` and creates the schema if needed.
    ///
    /// In-memory databases (`sqlite::memory:`) are held on a single pooled
    /// connection that is never recycled, since every new connection would
    /// see an empty database.
    pub async fn connect(url: &str) -> EventStoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.run_migrations().await?;

        tracing::info!(in_memory, "SQLite event store ready");

        Ok(store)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_migrations(&self) -> EventStoreResult<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: User) -> EventStoreResult<User> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(to_db_time(&user.created_at))
        .bind(to_db_time(&user.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "User", user.username.clone()))?;

        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> EventStoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_user_by_username(&self, username: &str) -> EventStoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn get_users(&self, ids: &[Uuid]) -> EventStoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id IN ("
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let rows: Vec<UserRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn list_users(&self, filter: UserFilter) -> EventStoreResult<(Vec<User>, u32)> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users WHERE 1 = 1");
        push_user_conditions(&mut count, &filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1"));
        push_user_conditions(&mut select, &filter);
        select.push(" ORDER BY username ASC");
        push_pagination(&mut select, filter.limit, filter.offset);
        let rows: Vec<UserRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok((convert_all(rows)?, total as u32))
    }

    async fn update_user(&self, user: User) -> EventStoreResult<User> {
        let result = sqlx::query(
            "UPDATE users SET username = ?, email = ?, password_hash = ?, role = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(to_db_time(&user.updated_at))
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "User", user.username.clone()))?;

        if result.rows_affected() == 0 {
            return Err(EventStoreError::not_found("User", user.id.to_string()));
        }
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> EventStoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(EventStoreError::not_found("User", id.to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // Event operations
    // =========================================================================

    async fn create_event(&self, event: Event) -> EventStoreResult<Event> {
        sqlx::query(
            "INSERT INTO events (id, title, description, location, start_time, end_time, \
             created_by, is_public, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.id.to_string())
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(to_db_time(&event.start_time))
        .bind(to_db_time(&event.end_time))
        .bind(event.created_by.to_string())
        .bind(event.is_public)
        .bind(to_db_time(&event.created_at))
        .bind(to_db_time(&event.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Event", event.id.to_string()))?;

        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> EventStoreResult<Option<Event>> {
        let row: Option<EventRow> =
            sqlx::query_as(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Event::try_from).transpose()
    }

    async fn get_events(&self, ids: &[Uuid]) -> EventStoreResult<Vec<Event>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id IN ("
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let rows: Vec<EventRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn list_events(&self, filter: EventFilter) -> EventStoreResult<(Vec<Event>, u32)> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM events WHERE 1 = 1");
        push_event_conditions(&mut count, &filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE 1 = 1"
        ));
        push_event_conditions(&mut select, &filter);
        select.push(" ORDER BY start_time DESC, id ASC");
        push_pagination(&mut select, filter.limit, filter.offset);
        let rows: Vec<EventRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok((convert_all(rows)?, total as u32))
    }

    async fn update_event(&self, event: Event) -> EventStoreResult<Event> {
        let result = sqlx::query(
            "UPDATE events SET title = ?, description = ?, location = ?, start_time = ?, \
             end_time = ?, created_by = ?, is_public = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.location)
        .bind(to_db_time(&event.start_time))
        .bind(to_db_time(&event.end_time))
        .bind(event.created_by.to_string())
        .bind(event.is_public)
        .bind(to_db_time(&event.updated_at))
        .bind(event.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Event", event.id.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(EventStoreError::not_found("Event", event.id.to_string()));
        }
        Ok(event)
    }

    async fn delete_event(&self, id: Uuid) -> EventStoreResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(EventStoreError::not_found("Event", id.to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // RSVP operations
    // =========================================================================

    async fn create_rsvp(&self, rsvp: Rsvp) -> EventStoreResult<Rsvp> {
        sqlx::query(
            "INSERT INTO rsvps (id, event_id, user_id, status, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(rsvp.id.to_string())
        .bind(rsvp.event_id.to_string())
        .bind(rsvp.user_id.to_string())
        .bind(rsvp.status.as_str())
        .bind(to_db_time(&rsvp.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_error(
                e,
                "Rsvp",
                format!("event {} user {}", rsvp.event_id, rsvp.user_id),
            )
        })?;

        Ok(rsvp)
    }

    async fn get_rsvp(&self, id: Uuid) -> EventStoreResult<Option<Rsvp>> {
        let row: Option<RsvpRow> =
            sqlx::query_as(&format!("SELECT {RSVP_COLUMNS} FROM rsvps WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Rsvp::try_from).transpose()
    }

    async fn list_rsvps(&self, filter: RsvpFilter) -> EventStoreResult<(Vec<Rsvp>, u32)> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM rsvps WHERE 1 = 1");
        push_rsvp_conditions(&mut count, &filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {RSVP_COLUMNS} FROM rsvps WHERE 1 = 1"));
        push_rsvp_conditions(&mut select, &filter);
        select.push(" ORDER BY created_at ASC, id ASC");
        push_pagination(&mut select, filter.limit, filter.offset);
        let rows: Vec<RsvpRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok((convert_all(rows)?, total as u32))
    }

    async fn update_rsvp(&self, rsvp: Rsvp) -> EventStoreResult<Rsvp> {
        let result =
            sqlx::query("UPDATE rsvps SET event_id = ?, user_id = ?, status = ? WHERE id = ?")
                .bind(rsvp.event_id.to_string())
                .bind(rsvp.user_id.to_string())
                .bind(rsvp.status.as_str())
                .bind(rsvp.id.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    write_error(
                        e,
                        "Rsvp",
                        format!("event {} user {}", rsvp.event_id, rsvp.user_id),
                    )
                })?;

        if result.rows_affected() == 0 {
            return Err(EventStoreError::not_found("Rsvp", rsvp.id.to_string()));
        }
        Ok(rsvp)
    }

    async fn delete_rsvp(&self, id: Uuid) -> EventStoreResult<()> {
        let result = sqlx::query("DELETE FROM rsvps WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(EventStoreError::not_found("Rsvp", id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    async fn store() -> SqliteEventStore {
        SqliteEventStore::connect("sqlite::memory:").await.unwrap()
    }

    async fn seed_user(store: &SqliteEventStore, username: &str, role: Role) -> User {
        store
            .create_user(User::new(username, "hash").with_role(role))
            .await
            .unwrap()
    }

    async fn seed_event(store: &SqliteEventStore, owner: &User, title: &str, public: bool) -> Event {
        let start = Utc::now();
        let event = Event::new(owner.id, title, start, start + Duration::hours(1))
            .with_location("Main hall")
            .with_public(public);
        store.create_event(event).await.unwrap()
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[tokio::test]
    async fn test_user_round_trip() {
        let store = store().await;
        let created = store
            .create_user(
                User::new("alice", "$argon2id$hash")
                    .with_email("alice@example.com")
                    .with_role(Role::Manager),
            )
            .await
            .unwrap();

        let fetched = store.get_user(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "alice");
        assert_eq!(fetched.email, "alice@example.com");
        assert_eq!(fetched.role, Role::Manager);
        assert_eq!(fetched.password_hash, "$argon2id$hash");

        let duplicate = store.create_user(User::new("alice", "x")).await;
        assert!(matches!(duplicate, Err(EventStoreError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_list_users_filters() {
        let store = store().await;
        seed_user(&store, "carol", Role::Admin).await;
        seed_user(&store, "alice", Role::User).await;
        seed_user(&store, "bob", Role::Manager).await;

        let (users, total) = store.list_users(UserFilter::default()).await.unwrap();
        assert_eq!(total, 3);
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);

        let (users, total) = store
            .list_users(UserFilter {
                role: Some(Role::Manager),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(users[0].username, "bob");
    }

    #[tokio::test]
    async fn test_list_events_scoping_and_search() {
        let store = store().await;
        let alice = seed_user(&store, "alice", Role::User).await;
        let bob = seed_user(&store, "bob", Role::User).await;

        let public = seed_event(&store, &alice, "Open day", true).await;
        let alice_private = seed_event(&store, &alice, "Board meeting", false).await;
        let bob_private = seed_event(&store, &bob, "Bob's birthday", false).await;

        let (events, total) = store
            .list_events(EventFilter::new(EventScope::PublicOnly))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(events[0].id, public.id);

        let (events, total) = store
            .list_events(EventFilter::new(EventScope::PublicOrOwnedBy(bob.id)))
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert!(events.iter().any(|e| e.id == bob_private.id));
        assert!(!events.iter().any(|e| e.id == alice_private.id));

        let mut filter = EventFilter::new(EventScope::All);
        filter.search = Some("board".to_string());
        let (events, total) = store.list_events(filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(events[0].id, alice_private.id);

        // Narrowing never widens the scope.
        let mut filter = EventFilter::new(EventScope::PublicOnly);
        filter.is_public = Some(false);
        let (events, total) = store.list_events(filter).await.unwrap();
        assert_eq!(total, 0);
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_event_round_trip_and_update() {
        let store = store().await;
        let alice = seed_user(&store, "alice", Role::User).await;
        let mut event = seed_event(&store, &alice, "Meetup", true).await;

        event.toggle_public();
        event.title = "Private meetup".to_string();
        store.update_event(event.clone()).await.unwrap();

        let fetched = store.get_event(event.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Private meetup");
        assert!(!fetched.is_public);
        assert_eq!(fetched.created_by, alice.id);
        assert_eq!(fetched.location, "Main hall");
    }

    #[tokio::test]
    async fn test_event_requires_existing_owner() {
        let store = store().await;
        let now = Utc::now();

        let result = store
            .create_event(Event::new(Uuid::new_v4(), "Orphan", now, now))
            .await;
        assert!(matches!(
            result,
            Err(EventStoreError::ForeignKeyViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_rsvp_pair_is_unique() {
        let store = store().await;
        let alice = seed_user(&store, "alice", Role::User).await;
        let event = seed_event(&store, &alice, "Meetup", true).await;

        store
            .create_rsvp(Rsvp::new(event.id, alice.id, RsvpStatus::Going))
            .await
            .unwrap();
        let result = store
            .create_rsvp(Rsvp::new(event.id, alice.id, RsvpStatus::Maybe))
            .await;
        assert!(matches!(result, Err(EventStoreError::AlreadyExists { .. })));

        let (rsvps, total) = store
            .list_rsvps(RsvpFilter::new(RsvpScope::OwnedBy(alice.id)))
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rsvps[0].status, RsvpStatus::Going);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = store().await;
        let alice = seed_user(&store, "alice", Role::User).await;
        let bob = seed_user(&store, "bob", Role::User).await;
        let alice_event = seed_event(&store, &alice, "Alice's", true).await;
        let bob_event = seed_event(&store, &bob, "Bob's", true).await;

        let bob_rsvp = store
            .create_rsvp(Rsvp::new(alice_event.id, bob.id, RsvpStatus::Going))
            .await
            .unwrap();
        let alice_rsvp = store
            .create_rsvp(Rsvp::new(bob_event.id, alice.id, RsvpStatus::Maybe))
            .await
            .unwrap();

        store.delete_user(alice.id).await.unwrap();

        assert!(store.get_event(alice_event.id).await.unwrap().is_none());
        assert!(store.get_event(bob_event.id).await.unwrap().is_some());
        assert!(store.get_rsvp(bob_rsvp.id).await.unwrap().is_none());
        assert!(store.get_rsvp(alice_rsvp.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_folds_ascii_case_only() {
        let store = store().await;
        let alice = seed_user(&store, "alice", Role::User).await;
        seed_event(&store, &alice, "Fête d'été", true).await;

        let mut filter = EventFilter::new(EventScope::All);
        filter.search = Some("FÊTE".to_string());
        let (_, total) = store.list_events(filter.clone()).await.unwrap();
        assert_eq!(total, 0);

        filter.search = Some("fête D'".to_string());
        let (_, total) = store.list_events(filter.clone()).await.unwrap();
        assert_eq!(total, 1);

        filter.search = Some("été".to_string());
        let (_, total) = store.list_events(filter).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_get_events_batch() {
        let store = store().await;
        let alice = seed_user(&store, "alice", Role::User).await;
        let public = seed_event(&store, &alice, "Open day", true).await;
        let private = seed_event(&store, &alice, "Board", false).await;

        let events = store
            .get_events(&[public.id, private.id, Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        assert!(store.get_events(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_users_batch() {
        let store = store().await;
        let alice = seed_user(&store, "alice", Role::User).await;
        let bob = seed_user(&store, "bob", Role::User).await;

        let users = store
            .get_users(&[alice.id, bob.id, Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
        assert!(store.get_users(&[]).await.unwrap().is_empty());
    }
}
