use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tienda_model::{AddressField, Email, NewUser, ProfileChanges, User, UserId};
use tracing::info;

use crate::rows::{user_from_row, USER_COLUMNS};
use crate::{Store, StoreError};

fn find_by_email(conn: &Connection, email: &Email) -> Result<Option<User>, StoreError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
    Ok(conn
        .query_row(&sql, params![email.as_str()], user_from_row)
        .optional()?)
}

fn find_by_id(conn: &Connection, id: UserId) -> Result<Option<User>, StoreError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id.get()], user_from_row)
        .optional()?)
}

fn insert_user(conn: &Connection, user: &NewUser, is_admin: bool) -> Result<UserId, StoreError> {
    let a = &user.address;
    conn.execute(
        "INSERT INTO users (full_name, email, password_hash, is_admin, address, city, state, postal_code, country, phone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            user.full_name.as_str(),
            user.email.as_str(),
            user.password_hash,
            is_admin,
            a.address,
            a.city,
            a.state,
            a.postal_code.as_ref().map(|p| p.as_str()),
            a.country,
            a.phone.as_ref().map(|p| p.as_str()),
        ],
    )?;
    Ok(UserId(conn.last_insert_rowid()))
}

impl Store {
    /// Registers a regular (non-admin) user. The email must be unused.
    pub fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if find_by_email(&tx, &user.email)?.is_some() {
            return Err(StoreError::Duplicate("email already registered".to_string()));
        }
        let id = insert_user(&tx, user, false)?;
        let created = find_by_id(&tx, id)?.ok_or_else(|| StoreError::not_found("user"))?;
        tx.commit()?;
        info!(user_id = %id, "user registered");
        Ok(created)
    }

    /// Creates the user as an administrator, or promotes an existing account
    /// with the same email. The stored password of an existing account is kept.
    pub fn ensure_admin(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = match find_by_email(&tx, &user.email)? {
            Some(existing) => {
                tx.execute(
                    "UPDATE users SET is_admin = 1 WHERE id = ?1",
                    params![existing.id.get()],
                )?;
                existing.id
            }
            None => insert_user(&tx, user, true)?,
        };
        let admin = find_by_id(&tx, id)?.ok_or_else(|| StoreError::not_found("user"))?;
        tx.commit()?;
        info!(user_id = %id, "admin account ensured");
        Ok(admin)
    }

    pub fn set_admin(&self, email: &Email, is_admin: bool) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE users SET is_admin = ?1 WHERE email = ?2",
            params![is_admin, email.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("user"));
        }
        Ok(())
    }

    pub fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        find_by_id(&self.connect()?, id)
    }

    pub fn user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        find_by_email(&self.connect()?, email)
    }

    /// Returns the user together with the stored password hash, for login.
    pub fn credentials_for(&self, email: &Email) -> Result<Option<(User, String)>, StoreError> {
        let conn = self.connect()?;
        let Some(user) = find_by_email(&conn, email)? else {
            return Ok(None);
        };
        let hash: String = conn.query_row(
            "SELECT password_hash FROM users WHERE id = ?1",
            params![user.id.get()],
            |row| row.get(0),
        )?;
        Ok(Some((user, hash)))
    }

    /// Applies a partial profile update. A new email must not belong to
    /// another account; fields in `changes.cleared` are emptied.
    pub fn update_profile(&self, id: UserId, changes: &ProfileChanges) -> Result<User, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut user = find_by_id(&tx, id)?.ok_or_else(|| StoreError::not_found("user"))?;
        if changes.is_empty() {
            return Ok(user);
        }

        if let Some(name) = &changes.full_name {
            user.full_name = name.clone();
        }
        if let Some(email) = &changes.email {
            if *email != user.email {
                if let Some(other) = find_by_email(&tx, email)? {
                    if other.id != id {
                        return Err(StoreError::Duplicate(
                            "new email is already registered by another user".to_string(),
                        ));
                    }
                }
                user.email = email.clone();
            }
        }
        let a = &changes.address;
        let current = &mut user.address;
        if a.address.is_some() {
            current.address.clone_from(&a.address);
        }
        if a.city.is_some() {
            current.city.clone_from(&a.city);
        }
        if a.state.is_some() {
            current.state.clone_from(&a.state);
        }
        if a.postal_code.is_some() {
            current.postal_code.clone_from(&a.postal_code);
        }
        if a.country.is_some() {
            current.country.clone_from(&a.country);
        }
        if a.phone.is_some() {
            current.phone.clone_from(&a.phone);
        }
        for field in &changes.cleared {
            match field {
                AddressField::Address => current.address = None,
                AddressField::City => current.city = None,
                AddressField::State => current.state = None,
                AddressField::Country => current.country = None,
            }
        }

        tx.execute(
            "UPDATE users SET full_name = ?1, email = ?2, address = ?3, city = ?4, state = ?5,
             postal_code = ?6, country = ?7, phone = ?8 WHERE id = ?9",
            params![
                user.full_name.as_str(),
                user.email.as_str(),
                current.address,
                current.city,
                current.state,
                current.postal_code.as_ref().map(|p| p.as_str()),
                current.country,
                current.phone.as_ref().map(|p| p.as_str()),
                id.get(),
            ],
        )?;
        tx.commit()?;
        Ok(user)
    }
}
