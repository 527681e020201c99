use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tienda_model::{Client, ClientDraft, ClientId};

use crate::rows::{client_from_row, CLIENT_COLUMNS};
use crate::{Store, StoreError};

pub(crate) fn find_client(conn: &Connection, id: ClientId) -> Result<Option<Client>, StoreError> {
    let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id.get()], client_from_row)
        .optional()?)
}

impl Store {
    pub fn list_clients(&self) -> Result<Vec<Client>, StoreError> {
        let conn = self.connect()?;
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], client_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn client_by_id(&self, id: ClientId) -> Result<Option<Client>, StoreError> {
        find_client(&self.connect()?, id)
    }

    pub fn create_client(&self, draft: &ClientDraft) -> Result<Client, StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO clients (name, email, phone, address) VALUES (?1, ?2, ?3, ?4)",
            params![
                draft.name.as_str(),
                draft.email.as_str(),
                draft.phone.as_str(),
                draft.address,
            ],
        )?;
        let id = ClientId(conn.last_insert_rowid());
        find_client(&conn, id)?.ok_or_else(|| StoreError::not_found("client"))
    }

    pub fn update_client(&self, id: ClientId, draft: &ClientDraft) -> Result<Client, StoreError> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE clients SET name = ?1, email = ?2, phone = ?3, address = ?4 WHERE id = ?5",
            params![
                draft.name.as_str(),
                draft.email.as_str(),
                draft.phone.as_str(),
                draft.address,
                id.get(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("client"));
        }
        find_client(&conn, id)?.ok_or_else(|| StoreError::not_found("client"))
    }

    pub fn delete_client(&self, id: ClientId) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if find_client(&tx, id)?.is_none() {
            return Err(StoreError::not_found("client"));
        }
        let sales: i64 = tx.query_row(
            "SELECT COUNT(*) FROM sales WHERE client_id = ?1",
            params![id.get()],
            |row| row.get(0),
        )?;
        if sales > 0 {
            return Err(StoreError::Conflict(
                "client has recorded sales and cannot be deleted".to_string(),
            ));
        }
        tx.execute("DELETE FROM clients WHERE id = ?1", params![id.get()])?;
        tx.commit()?;
        Ok(())
    }
}
