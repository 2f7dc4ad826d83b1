//! Questionnaire template database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Template, TemplateField};

impl Database {
    /// Insert a new template. Returns the assigned ID; `template.id` is ignored.
    pub fn insert_template(&self, template: &Template) -> DbResult<i64> {
        let fields_json = serde_json::to_string(&template.fields)?;

        self.conn.execute(
            "INSERT INTO templates (name, description, fields) VALUES (?1, ?2, ?3)",
            params![template.name, template.description, fields_json],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update an existing template.
    pub fn update_template(&self, template: &Template) -> DbResult<bool> {
        let fields_json = serde_json::to_string(&template.fields)?;

        let rows_affected = self.conn.execute(
            "UPDATE templates SET name = ?2, description = ?3, fields = ?4 WHERE id = ?1",
            params![template.id, template.name, template.description, fields_json],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a template by ID.
    pub fn get_template(&self, id: i64) -> DbResult<Option<Template>> {
        self.conn
            .query_row(
                "SELECT id, name, description, fields FROM templates WHERE id = ?",
                [id],
                template_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List templates, newest first.
    pub fn list_templates(&self) -> DbResult<Vec<Template>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, fields FROM templates ORDER BY id DESC")?;

        let rows = stmt.query_map([], template_from_row)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a template.
    pub fn delete_template(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM templates WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    let id: i64 = row.get(0)?;
    let fields_json: String = row.get(3)?;
    let fields = serde_json::from_str::<Vec<TemplateField>>(&fields_json).unwrap_or_else(|error| {
        tracing::warn!(template_id = id, %error, "unreadable template fields, using empty list");
        Vec::new()
    });

    Ok(Template {
        id,
        name: row.get(1)?,
        description: row.get(2)?,
        fields,
    })
}
