use crate::Result;
use rusqlite::Connection;
use tracing::info;

pub const LATEST_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                email       TEXT NOT NULL UNIQUE,
                username    TEXT NOT NULL UNIQUE,
                full_name   TEXT NOT NULL DEFAULT '',
                bio         TEXT NOT NULL DEFAULT '',
                image       TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE channels (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE,
                tags        TEXT NOT NULL DEFAULT '[]',
                creator_id  INTEGER REFERENCES users(id) ON DELETE SET NULL,
                image       TEXT,
                description TEXT NOT NULL DEFAULT '' CHECK (length(description) <= 2048),
                type        TEXT NOT NULL CHECK (type IN ('dialog', 'group', 'general')),
                archived    INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE subscriptions (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                alert       INTEGER NOT NULL DEFAULT 1,
                unread      INTEGER NOT NULL DEFAULT 0,
                channel_id  INTEGER NOT NULL REFERENCES channels(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                type        TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, channel_id)
            );

            CREATE INDEX idx_subscriptions_channel
                ON subscriptions(channel_id);

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id   INTEGER NOT NULL REFERENCES users(id),
                channel_id  INTEGER NOT NULL REFERENCES channels(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_messages_channel
                ON messages(channel_id, created_at);

            CREATE TABLE attachments (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id  INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
                url         TEXT NOT NULL CHECK (url <> ''),
                kind        TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX idx_attachments_message
                ON attachments(message_id);

            -- Seed the default general channel
            INSERT INTO channels (id, name, type, description)
                VALUES (1, 'general', 'general', 'Company-wide announcements and chatter');

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
