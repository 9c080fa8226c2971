//! Company database operations

use ocp_common::Result;
use sqlx::{Row, SqlitePool};

use super::{encode_list, parse_list};
use crate::models::Company;

/// Insert or replace a company profile
pub async fn save_company(pool: &SqlitePool, company: &Company) -> Result<()> {
    let target_users = encode_list(&company.target_users)?;
    let pain_points = encode_list(&company.pain_points)?;
    let search_queries = encode_list(&company.search_queries)?;

    sqlx::query(
        r#"
        INSERT INTO companies (id, name, description, target_users, pain_points, tone, search_queries)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            target_users = excluded.target_users,
            pain_points = excluded.pain_points,
            tone = excluded.tone,
            search_queries = excluded.search_queries
        "#,
    )
    .bind(&company.id)
    .bind(&company.name)
    .bind(&company.description)
    .bind(&target_users)
    .bind(&pain_points)
    .bind(&company.tone)
    .bind(&search_queries)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a company by id
pub async fn load_company(pool: &SqlitePool, company_id: &str) -> Result<Option<Company>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, description, target_users, pain_points, tone, search_queries
        FROM companies
        WHERE id = ?
        "#,
    )
    .bind(company_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(Company {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        target_users: parse_list(&row.get::<String, _>("target_users"))?,
        pain_points: parse_list(&row.get::<String, _>("pain_points"))?,
        tone: row.get("tone"),
        search_queries: parse_list(&row.get::<String, _>("search_queries"))?,
    }))
}
