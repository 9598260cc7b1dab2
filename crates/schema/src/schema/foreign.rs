//! Staged foreign-key declarations
//!
//! `TableBuilder::foreign_id` opens a draft and hands back a
//! [`ForeignKeyRef`] to fill it in. Drafts stay staged until the compiler
//! finalizes the table: complete drafts (both `references` and `on` set)
//! are promoted to named constraint specs appended after every other spec,
//! incomplete drafts are silently dropped.

use super::table::TableBuilder;

#[derive(Debug, Clone, Default)]
pub(crate) struct ForeignKeyDraft {
    pub(crate) column: String,
    pub(crate) references: Option<String>,
    pub(crate) on: Option<String>,
    pub(crate) on_delete: Option<String>,
    pub(crate) on_update: Option<String>,
}

impl ForeignKeyDraft {
    pub(crate) fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            ..Default::default()
        }
    }

    /// Render the named constraint fragment; `None` until both `references`
    /// and `on` are set.
    pub(crate) fn constraint_text(&self, table: &str, prefix: &str) -> Option<String> {
        let references = self.references.as_deref()?;
        let on = self.on.as_deref()?;
        let mut text = format!(
            "CONSTRAINT {}_{}_foreign FOREIGN KEY ({}) REFERENCES {}{} ({})",
            table, self.column, self.column, prefix, on, references
        );
        if let Some(action) = &self.on_delete {
            text.push_str(&format!(" ON DELETE {}", action));
        }
        if let Some(action) = &self.on_update {
            text.push_str(&format!(" ON UPDATE {}", action));
        }
        Some(text)
    }
}

/// Handle to one staged foreign-key draft
pub struct ForeignKeyRef<'a> {
    table: &'a mut TableBuilder,
    index: usize,
}

impl<'a> ForeignKeyRef<'a> {
    pub(crate) fn new(table: &'a mut TableBuilder, index: usize) -> Self {
        Self { table, index }
    }

    /// The column on the referenced table
    pub fn references(mut self, column: &str) -> Self {
        self.table.draft_mut(self.index).references = Some(column.to_string());
        self
    }

    /// The referenced table (prefixed like any other table at compile time)
    pub fn on(mut self, table: &str) -> Self {
        self.table.draft_mut(self.index).on = Some(table.to_string());
        self
    }

    /// Referential action on delete, e.g. `cascade`
    pub fn on_delete(mut self, action: &str) -> Self {
        self.table.draft_mut(self.index).on_delete = Some(action.to_uppercase());
        self
    }

    /// Referential action on update
    pub fn on_update(mut self, action: &str) -> Self {
        self.table.draft_mut(self.index).on_update = Some(action.to_uppercase());
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::column::ColumnSpec;
    use crate::schema::table::TableBuilder;

    #[test]
    fn complete_draft_promotes_to_a_named_constraint() {
        let mut table = TableBuilder::new("posts");
        table.foreign_id("user_id").references("id").on("users");
        table.finalize_foreign_keys();

        let texts: Vec<&str> = table.specs().iter().filter_map(ColumnSpec::text).collect();
        assert_eq!(texts[0], "user_id BIGINT UNSIGNED NOT NULL");
        assert_eq!(
            texts[1],
            "CONSTRAINT posts_user_id_foreign FOREIGN KEY (user_id) REFERENCES users (id)"
        );
    }

    #[test]
    fn incomplete_draft_contributes_nothing() {
        let mut table = TableBuilder::new("posts");
        table.foreign_id("user_id");
        table.finalize_foreign_keys();

        assert_eq!(table.specs().len(), 1);
        assert_eq!(
            table.specs()[0].text(),
            Some("user_id BIGINT UNSIGNED NOT NULL")
        );
    }

    #[test]
    fn actions_are_uppercased_and_optional() {
        let mut table = TableBuilder::new("posts");
        table
            .foreign_id("user_id")
            .references("id")
            .on("users")
            .on_delete("cascade")
            .on_update("set null");
        table.finalize_foreign_keys();

        let text = table.specs()[1].text().unwrap();
        assert!(text.ends_with("ON DELETE CASCADE ON UPDATE SET NULL"));
    }

    #[test]
    fn drafts_promote_independently_in_order() {
        let mut table = TableBuilder::new("comments");
        table.foreign_id("post_id").references("id").on("posts");
        table.foreign_id("orphan_id");
        table.foreign_id("user_id").references("id").on("users");
        table.finalize_foreign_keys();

        let texts: Vec<&str> = table.specs().iter().filter_map(ColumnSpec::text).collect();
        // three columns, then the two complete constraints in draft order
        assert_eq!(texts.len(), 5);
        assert!(texts[3].starts_with("CONSTRAINT comments_post_id_foreign"));
        assert!(texts[4].starts_with("CONSTRAINT comments_user_id_foreign"));
    }

    #[test]
    fn referenced_table_gets_the_storage_prefix() {
        let mut table = TableBuilder::with_prefix("wp_posts", "wp_");
        table.foreign_id("user_id").references("id").on("users");
        table.finalize_foreign_keys();

        let text = table.specs()[1].text().unwrap();
        assert!(text.contains("REFERENCES wp_users (id)"));
    }
}
