//! Identity (persona) database operations

use ocp_common::Result;
use sqlx::{Row, SqlitePool};

use super::{encode_list, parse_list};
use crate::models::Identity;

/// Insert or replace an identity owned by `company_id`
pub async fn save_identity(pool: &SqlitePool, company_id: &str, identity: &Identity) -> Result<()> {
    let expertise = encode_list(&identity.expertise)?;

    sqlx::query(
        r#"
        INSERT INTO identities (id, company_id, name, tone, expertise, account_handle)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            company_id = excluded.company_id,
            name = excluded.name,
            tone = excluded.tone,
            expertise = excluded.expertise,
            account_handle = excluded.account_handle
        "#,
    )
    .bind(&identity.id)
    .bind(company_id)
    .bind(&identity.name)
    .bind(&identity.tone)
    .bind(&expertise)
    .bind(&identity.account_handle)
    .execute(pool)
    .await?;

    Ok(())
}

/// All identities of a company, ordered by id
pub async fn load_identities(pool: &SqlitePool, company_id: &str) -> Result<Vec<Identity>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, tone, expertise, account_handle
        FROM identities
        WHERE company_id = ?
        ORDER BY id
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(Identity {
                id: row.get("id"),
                name: row.get("name"),
                tone: row.get("tone"),
                expertise: parse_list(&row.get::<String, _>("expertise"))?,
                account_handle: row.get("account_handle"),
            })
        })
        .collect()
}
