use std::sync::Arc;

use rusqlite::{Connection, Row, types::Type};
use telex_types::models::{Channel, Subscription};
use tracing::debug;

use crate::{Database, DbError, OptionalExt, Result, parse_timestamp};

const SUBSCRIPTION_COLUMNS: &str = "id, alert, unread, channel_id, user_id, type, created_at";

#[derive(Clone)]
pub struct SubscriptionStore {
    db: Arc<Database>,
}

impl SubscriptionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Persists `subscription` against `channel`. A second subscription for
    /// the same (user, channel) pair fails with [`DbError::Conflict`].
    pub fn create(&self, channel: &Channel, mut subscription: Subscription) -> Result<Subscription> {
        subscription.channel_id = channel.id;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO subscriptions (alert, unread, channel_id, user_id, type)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    subscription.alert,
                    subscription.unread,
                    subscription.channel_id,
                    subscription.user_id,
                    subscription.kind.as_str()
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(
                "User {} subscribed to channel {} ({})",
                subscription.user_id, channel.name, id
            );
            query_subscription(conn, id)?
                .ok_or_else(|| DbError::Corrupt(format!("subscription {id} vanished after insert")))
        })
    }

    pub fn fetch(&self, user_id: i64, channel_id: i64) -> Result<Option<Subscription>> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?1 AND channel_id = ?2"
                ),
                [user_id, channel_id],
                subscription_from_row,
            )
            .optional()
        })
    }

    /// Removes the pair's subscription, returning the deleted row if there
    /// was one.
    pub fn delete(&self, user_id: i64, channel_id: i64) -> Result<Option<Subscription>> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "DELETE FROM subscriptions WHERE user_id = ?1 AND channel_id = ?2
                     RETURNING {SUBSCRIPTION_COLUMNS}"
                ),
                [user_id, channel_id],
                subscription_from_row,
            )
            .optional()
        })
    }
}

pub(crate) fn query_subscriptions(conn: &Connection, channel_id: i64) -> Result<Vec<Subscription>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE channel_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([channel_id], subscription_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_subscription(conn: &Connection, id: i64) -> Result<Option<Subscription>> {
    conn.query_row(
        &format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = ?1"),
        [id],
        subscription_from_row,
    )
    .optional()
}

fn subscription_from_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    let kind: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    Ok(Subscription {
        id: row.get(0)?,
        alert: row.get(1)?,
        unread: row.get(2)?,
        channel_id: row.get(3)?,
        user_id: row.get(4)?,
        kind: kind
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        created_at: parse_timestamp(6, &created_at)?,
    })
}
