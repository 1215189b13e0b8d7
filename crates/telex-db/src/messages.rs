use std::sync::Arc;

use rusqlite::{Connection, Row};
use telex_types::models::{Attachment, Message};
use tracing::{debug, warn};

use crate::channels::query_channel;
use crate::users::query_user;
use crate::{Database, DbError, OptionalExt, Result, parse_timestamp};

const MESSAGE_COLUMNS: &str = "id, author_id, channel_id, content, created_at, updated_at";

/// Equality filter over message columns. Unset fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub id: Option<i64>,
    pub channel_id: Option<i64>,
    pub author_id: Option<i64>,
}

impl MessageFilter {
    pub fn id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn channel(channel_id: i64) -> Self {
        Self {
            channel_id: Some(channel_id),
            ..Self::default()
        }
    }

    pub fn author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    fn where_clause(&self) -> (String, Vec<i64>) {
        let fields = [
            ("id", self.id),
            ("channel_id", self.channel_id),
            ("author_id", self.author_id),
        ];

        let mut conditions = Vec::new();
        let mut params = Vec::new();
        for (column, value) in fields {
            if let Some(v) = value {
                params.push(v);
                conditions.push(format!("{column} = ?{}", params.len()));
            }
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

/// Which relations to load alongside a message row.
#[derive(Clone, Copy)]
enum Preload {
    AuthorAndAttachments,
    All,
}

#[derive(Clone)]
pub struct MessageStore {
    db: Arc<Database>,
}

impl MessageStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// First message (lowest id) matching `filter`, with author, attachments
    /// and channel loaded.
    pub fn get(&self, filter: &MessageFilter) -> Result<Option<Message>> {
        self.db.with_conn(|conn| {
            let (clause, params) = filter.where_clause();
            let message = conn
                .query_row(
                    &format!("SELECT {MESSAGE_COLUMNS} FROM messages{clause} ORDER BY id LIMIT 1"),
                    rusqlite::params_from_iter(params),
                    message_from_row,
                )
                .optional()?;
            message.map(|m| hydrate(conn, m, Preload::All)).transpose()
        })
    }

    /// Every message matching `filter` in id order, with author and
    /// attachments loaded.
    pub fn get_all(&self, filter: &MessageFilter) -> Result<Vec<Message>> {
        self.db.with_conn(|conn| {
            let (clause, params) = filter.where_clause();
            let mut stmt = conn.prepare(&format!("SELECT {MESSAGE_COLUMNS} FROM messages{clause} ORDER BY id"))?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params), message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter()
                .map(|m| hydrate(conn, m, Preload::AuthorAndAttachments))
                .collect()
        })
    }

    /// Writes the message and its attachments in one transaction, then reads
    /// it back with author, attachments and channel before committing.
    ///
    /// Any failure drops the transaction uncommitted, so neither the message
    /// row nor any attachment row survives. The returned message carries the
    /// attachments exactly as submitted, with their assigned ids.
    pub fn create(&self, mut message: Message) -> Result<Message> {
        self.db
            .with_conn_mut(|conn| {
                let tx = conn.transaction()?;

                tx.execute(
                    "INSERT INTO messages (author_id, channel_id, content) VALUES (?1, ?2, ?3)",
                    rusqlite::params![message.author_id, message.channel_id, message.content],
                )?;
                let id = tx.last_insert_rowid();

                let mut attachments = std::mem::take(&mut message.attachments);
                for attachment in &mut attachments {
                    link_attachment(&tx, id, attachment)?;
                }

                let mut stored = query_message(&tx, id)?
                    .ok_or_else(|| DbError::Corrupt(format!("message {id} vanished after insert")))?;
                stored.attachments = attachments;

                tx.commit()?;
                debug!(
                    "Stored message {} in channel {} with {} attachment(s)",
                    id,
                    stored.channel_id,
                    stored.attachments.len()
                );
                Ok(stored)
            })
            .inspect_err(|e| warn!("Message write rolled back: {}", e))
    }

    /// Full-record update of the message row. Attachments are fixed at
    /// creation and left untouched.
    pub fn update(&self, message: &Message) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE messages
                 SET author_id = ?2, channel_id = ?3, content = ?4, updated_at = datetime('now')
                 WHERE id = ?1",
                rusqlite::params![message.id, message.author_id, message.channel_id, message.content],
            )?;
            Ok(())
        })
    }

    /// Hard delete. Attachments go with the message.
    pub fn delete(&self, message: &Message) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM messages WHERE id = ?1", [message.id])?;
            Ok(())
        })
    }
}

fn link_attachment(conn: &Connection, message_id: i64, attachment: &mut Attachment) -> Result<()> {
    conn.execute(
        "INSERT INTO attachments (message_id, url, kind) VALUES (?1, ?2, ?3)",
        rusqlite::params![message_id, attachment.url, attachment.kind],
    )?;
    attachment.id = conn.last_insert_rowid();
    attachment.message_id = message_id;
    Ok(())
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<Message>> {
    let message = conn
        .query_row(
            &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
            [id],
            message_from_row,
        )
        .optional()?;
    message.map(|m| hydrate(conn, m, Preload::All)).transpose()
}

fn hydrate(conn: &Connection, mut message: Message, preload: Preload) -> Result<Message> {
    message.author = query_user(conn, message.author_id)?;
    message.attachments = query_attachments(conn, message.id)?;
    if let Preload::All = preload {
        message.channel = query_channel(conn, message.channel_id, false)?;
    }
    Ok(message)
}

fn query_attachments(conn: &Connection, message_id: i64) -> Result<Vec<Attachment>> {
    let mut stmt =
        conn.prepare("SELECT id, message_id, url, kind FROM attachments WHERE message_id = ?1 ORDER BY id")?;
    let rows = stmt
        .query_map([message_id], |row| {
            Ok(Attachment {
                id: row.get(0)?,
                message_id: row.get(1)?,
                url: row.get(2)?,
                kind: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    Ok(Message {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author: None,
        channel_id: row.get(2)?,
        channel: None,
        content: row.get(3)?,
        attachments: Vec::new(),
        created_at: parse_timestamp(4, &created_at)?,
        updated_at: parse_timestamp(5, &updated_at)?,
    })
}
