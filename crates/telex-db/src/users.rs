use std::sync::Arc;

use rusqlite::{Connection, Row};
use telex_types::models::User;

use crate::{Database, OptionalExt, Result, parse_timestamp};

const USER_COLUMNS: &str = "id, email, username, full_name, bio, image, created_at";

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub image: String,
}

/// Read access to users. Accounts are provisioned by the identity subsystem;
/// `create` is here for seeding.
#[derive(Clone)]
pub struct UserStore {
    db: Arc<Database>,
}

impl UserStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create(&self, new: &NewUser) -> Result<User> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (email, username, full_name, bio, image) VALUES (?1, ?2, ?3, ?4, ?5)",
                (&new.email, &new.username, &new.full_name, &new.bio, &new.image),
            )?;
            let id = conn.last_insert_rowid();
            query_user(conn, id)?
                .ok_or_else(|| crate::DbError::Corrupt(format!("user {id} vanished after insert")))
        })
    }

    pub fn get(&self, id: i64) -> Result<Option<User>> {
        self.db.with_conn(|conn| query_user(conn, id))
    }

    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                [username],
                user_from_row,
            )
            .optional()
        })
    }
}

pub(crate) fn query_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        [id],
        user_from_row,
    )
    .optional()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(6)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        full_name: row.get(3)?,
        bio: row.get(4)?,
        image: row.get(5)?,
        created_at: parse_timestamp(6, &created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbError;

    fn store() -> UserStore {
        UserStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            email: format!("{name}@example.com"),
            username: name.to_string(),
            full_name: name.to_uppercase(),
            ..Default::default()
        }
    }

    #[test]
    fn create_and_lookup() {
        let users = store();
        let created = users.create(&new_user("ada")).unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.full_name, "ADA");

        assert_eq!(users.get(created.id).unwrap(), Some(created.clone()));
        assert_eq!(users.get_by_username("ada").unwrap(), Some(created));
        assert_eq!(users.get(99).unwrap(), None);
        assert_eq!(users.get_by_username("nobody").unwrap(), None);
    }

    #[test]
    fn duplicate_username_conflicts() {
        let users = store();
        users.create(&new_user("ada")).unwrap();
        let mut dup = new_user("ada");
        dup.email = "other@example.com".into();
        assert!(matches!(users.create(&dup), Err(DbError::Conflict(_))));
    }
}
