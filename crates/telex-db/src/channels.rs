use std::sync::Arc;

use rusqlite::{Connection, Row, types::Type};
use telex_types::models::{Channel, ChannelType};
use tracing::debug;

use crate::subscriptions::query_subscriptions;
use crate::users::query_user;
use crate::{Database, DbError, OptionalExt, Result, parse_timestamp};

const CHANNEL_COLUMNS: &str =
    "id, name, tags, creator_id, image, description, type, archived, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewChannel {
    pub name: String,
    pub kind: ChannelType,
    pub creator_id: Option<i64>,
    pub description: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
}

impl NewChannel {
    pub fn new(name: impl Into<String>, kind: ChannelType) -> Self {
        Self {
            name: name.into(),
            kind,
            creator_id: None,
            description: String::new(),
            tags: Vec::new(),
            image: None,
        }
    }
}

#[derive(Clone)]
pub struct ChannelStore {
    db: Arc<Database>,
}

impl ChannelStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Looks a channel up by its unique name, hydrated with creator and
    /// subscriptions. `None` when no channel has that name.
    pub fn fetch(&self, name: &str) -> Result<Option<Channel>> {
        self.db.with_conn(|conn| {
            let channel = conn
                .query_row(
                    &format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE name = ?1"),
                    [name],
                    channel_from_row,
                )
                .optional()?;
            channel.map(|c| hydrate(conn, c, true)).transpose()
        })
    }

    pub fn fetch_all(&self) -> Result<Vec<Channel>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {CHANNEL_COLUMNS} FROM channels ORDER BY id"))?;
            let rows = stmt
                .query_map([], channel_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(|c| hydrate(conn, c, true)).collect()
        })
    }

    pub fn create(&self, new: &NewChannel) -> Result<Channel> {
        let tags = encode_tags(&new.tags)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO channels (name, tags, creator_id, image, description, type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    new.name,
                    tags,
                    new.creator_id,
                    new.image,
                    new.description,
                    new.kind.as_str()
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!("Created channel {} ({})", new.name, id);
            query_channel(conn, id, true)?
                .ok_or_else(|| DbError::Corrupt(format!("channel {id} vanished after insert")))
        })
    }

    /// Full-record update of the channel's own columns. Subscriptions are
    /// managed through the subscription store.
    pub fn update(&self, channel: &Channel) -> Result<()> {
        let tags = encode_tags(&channel.tags)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE channels
                 SET name = ?2, tags = ?3, creator_id = ?4, image = ?5, description = ?6,
                     type = ?7, archived = ?8, updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![
                    channel.id,
                    channel.name,
                    tags,
                    channel.creator_id,
                    channel.image,
                    channel.description,
                    channel.kind.as_str(),
                    channel.archived
                ],
            )?;
            Ok(())
        })
    }

    pub fn delete(&self, channel: &Channel) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM channels WHERE id = ?1", [channel.id])?;
            Ok(())
        })
    }
}

pub(crate) fn query_channel(conn: &Connection, id: i64, with_subscriptions: bool) -> Result<Option<Channel>> {
    let channel = conn
        .query_row(
            &format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = ?1"),
            [id],
            channel_from_row,
        )
        .optional()?;
    channel.map(|c| hydrate(conn, c, with_subscriptions)).transpose()
}

fn hydrate(conn: &Connection, mut channel: Channel, with_subscriptions: bool) -> Result<Channel> {
    if let Some(creator_id) = channel.creator_id {
        channel.creator = query_user(conn, creator_id)?;
    }
    if with_subscriptions {
        channel.subscriptions = query_subscriptions(conn, channel.id)?;
    }
    Ok(channel)
}

fn encode_tags(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).map_err(|e| DbError::Corrupt(format!("unencodable tags: {e}")))
}

fn channel_from_row(row: &Row<'_>) -> rusqlite::Result<Channel> {
    let tags: String = row.get(2)?;
    let kind: String = row.get(6)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(Channel {
        id: row.get(0)?,
        name: row.get(1)?,
        tags: serde_json::from_str(&tags)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?,
        creator_id: row.get(3)?,
        creator: None,
        image: row.get(4)?,
        description: row.get(5)?,
        kind: kind
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?,
        archived: row.get(7)?,
        subscriptions: Vec::new(),
        created_at: parse_timestamp(8, &created_at)?,
        updated_at: parse_timestamp(9, &updated_at)?,
    })
}
