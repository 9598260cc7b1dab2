//! Fluent table definition builder
//!
//! A `TableBuilder` accumulates [`ColumnSpec`]s for one table. Every
//! column-defining call appends exactly one Add-kind spec and returns a
//! [`ColumnRef`] handle; modifiers go through the handle and edit only the
//! spec it was created for, so alternating add/modify/drop declarations
//! can never retarget the wrong column.
//!
//! Declaration order is significant: it is the column order in CREATE and
//! the statement order in ALTER.

use crate::error::{SchemaError, SchemaResult};
use crate::value::{quote_literal, DatabaseValue};

use super::column::{self, ColumnSpec};
use super::foreign::{ForeignKeyDraft, ForeignKeyRef};

/// Accumulates the definition of one table
#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    prefix: String,
    specs: Vec<ColumnSpec>,
    foreign_keys: Vec<ForeignKeyDraft>,
}

impl TableBuilder {
    /// Builders are normally handed to a definition closure by
    /// [`Schema`](crate::schema::Schema); constructing one directly is
    /// useful for inspecting generated DDL.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_prefix(name, "")
    }

    pub(crate) fn with_prefix(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            specs: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// The fully-qualified table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The accumulated specs, in declaration order
    pub fn specs(&self) -> &[ColumnSpec] {
        &self.specs
    }

    fn append(&mut self, spec: ColumnSpec) -> usize {
        self.specs.push(spec);
        self.specs.len() - 1
    }

    fn add_column(&mut self, name: &str) -> ColumnRef<'_> {
        let column = name.to_string();
        let index = self.append(ColumnSpec::Add {
            text: name.to_string(),
        });
        ColumnRef {
            table: self,
            index,
            column,
        }
    }

    /// Auto-incrementing unsigned integer primary key named `id`
    pub fn id(&mut self) -> ColumnRef<'_> {
        self.increments("id")
    }

    /// Auto-incrementing unsigned integer primary key
    pub fn increments(&mut self, name: &str) -> ColumnRef<'_> {
        let column = name.to_string();
        let index = self.append(ColumnSpec::Add {
            text: format!("{} INT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY", name),
        });
        ColumnRef {
            table: self,
            index,
            column,
        }
    }

    /// VARCHAR column; length defaults to 255
    pub fn string(&mut self, name: &str, length: Option<u32>) -> ColumnRef<'_> {
        self.add_column(name).string_type(length)
    }

    /// Fixed-length CHAR column
    pub fn char(&mut self, name: &str, length: u32) -> ColumnRef<'_> {
        self.add_column(name).char_type(length)
    }

    pub fn text(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).text_type()
    }

    pub fn long_text(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).long_text_type()
    }

    pub fn json(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).json_type()
    }

    pub fn blob(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).blob_type()
    }

    pub fn integer(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).integer_type()
    }

    pub fn big_integer(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).big_integer_type()
    }

    pub fn unsigned_integer(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).integer_type().unsigned()
    }

    pub fn unsigned_big_integer(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).big_integer_type().unsigned()
    }

    pub fn float(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).float_type()
    }

    pub fn double(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).double_type()
    }

    pub fn decimal(&mut self, name: &str, precision: u8, scale: u8) -> ColumnRef<'_> {
        self.add_column(name).decimal_type(precision, scale)
    }

    /// ENUM column restricted to `values`.
    ///
    /// Fails eagerly with [`SchemaError::InvalidInput`] if `values` is empty
    /// or the default is not a member of the set.
    pub fn enumeration(
        &mut self,
        name: &str,
        values: &[&str],
        default: Option<&str>,
    ) -> SchemaResult<ColumnRef<'_>> {
        self.add_column(name).enumeration_type(values, default)
    }

    pub fn boolean(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).boolean_type()
    }

    pub fn date(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).date_type()
    }

    pub fn time(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).time_type()
    }

    pub fn date_time(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).date_time_type()
    }

    pub fn timestamp(&mut self, name: &str) -> ColumnRef<'_> {
        self.add_column(name).timestamp_type()
    }

    /// `created_at` and `updated_at` with automatic stamping
    pub fn timestamps(&mut self) -> &mut Self {
        self.timestamp("created_at").use_current();
        self.timestamp("updated_at")
            .use_current()
            .on_update_current();
        self
    }

    /// Nullable `deleted_at` marker for soft deletion
    pub fn soft_deletes(&mut self) -> &mut Self {
        self.timestamp("deleted_at").nullable();
        self
    }

    /// Redefine an existing column on the alter path. The returned handle is
    /// extended exactly like a fresh definition: a type-fragment call, then
    /// modifiers.
    pub fn modify_column(&mut self, name: &str) -> ColumnRef<'_> {
        let column = name.to_string();
        let index = self.append(ColumnSpec::Modify {
            column: name.to_string(),
            text: name.to_string(),
        });
        ColumnRef {
            table: self,
            index,
            column,
        }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> &mut Self {
        self.append(ColumnSpec::Rename {
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }

    pub fn drop_column(&mut self, name: &str) -> &mut Self {
        self.append(ColumnSpec::Drop {
            column: name.to_string(),
        });
        self
    }

    /// Unsigned big-integer column plus a staged foreign-key draft.
    ///
    /// The draft only becomes a constraint once `references` and `on` are
    /// both set; otherwise it is dropped at finalize.
    pub fn foreign_id(&mut self, column: &str) -> ForeignKeyRef<'_> {
        self.append(ColumnSpec::Add {
            text: format!("{} BIGINT UNSIGNED NOT NULL", column),
        });
        self.foreign_keys.push(ForeignKeyDraft::new(column));
        let index = self.foreign_keys.len() - 1;
        ForeignKeyRef::new(self, index)
    }

    pub(crate) fn draft_mut(&mut self, index: usize) -> &mut ForeignKeyDraft {
        &mut self.foreign_keys[index]
    }

    /// Index over an explicit column list
    pub fn index_on(&mut self, columns: &[&str]) -> &mut Self {
        let text = format!(
            "INDEX {} ({})",
            self.constraint_name(columns, "index"),
            columns.join(", ")
        );
        self.append(ColumnSpec::Add { text });
        self
    }

    /// Unique key over an explicit column list
    pub fn unique_on(&mut self, columns: &[&str]) -> &mut Self {
        let text = format!(
            "UNIQUE KEY {} ({})",
            self.constraint_name(columns, "unique"),
            columns.join(", ")
        );
        self.append(ColumnSpec::Add { text });
        self
    }

    /// Primary key over an explicit column list
    pub fn primary_on(&mut self, columns: &[&str]) -> &mut Self {
        let text = format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            self.constraint_name(columns, "primary"),
            columns.join(", ")
        );
        self.append(ColumnSpec::Add { text });
        self
    }

    fn constraint_name(&self, columns: &[&str], kind: &str) -> String {
        format!("{}_{}_{}", self.name, columns.join("_"), kind)
    }

    /// Promote complete foreign-key drafts to constraint specs, appended
    /// after every other spec; drop incomplete ones. Invoked by the compiler
    /// before statements are rendered.
    pub(crate) fn finalize_foreign_keys(&mut self) {
        let drafts = std::mem::take(&mut self.foreign_keys);
        for draft in drafts {
            match draft.constraint_text(&self.name, &self.prefix) {
                Some(text) => {
                    self.specs.push(ColumnSpec::Add { text });
                }
                None => tracing::debug!(
                    table = %self.name,
                    column = %draft.column,
                    "incomplete foreign key draft dropped"
                ),
            }
        }
    }

    /// Render the CREATE TABLE statement: one fragment per Add-kind spec,
    /// in declaration order
    pub fn create_statement(&self, table_options: &str) -> String {
        let fragments: Vec<&str> = self
            .specs
            .iter()
            .filter_map(|spec| match spec {
                ColumnSpec::Add { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        format!(
            "CREATE TABLE {} (\n  {}\n) {}",
            self.name,
            fragments.join(",\n  "),
            table_options
        )
        .trim_end()
        .to_string()
    }

    /// Render one ALTER statement per spec, in declaration order
    pub fn alter_statements(&self) -> Vec<String> {
        self.specs
            .iter()
            .map(|spec| match spec {
                ColumnSpec::Add { text } => {
                    format!("ALTER TABLE {} ADD COLUMN {}", self.name, text)
                }
                ColumnSpec::Modify { text, .. } => {
                    format!("ALTER TABLE {} MODIFY COLUMN {}", self.name, text)
                }
                ColumnSpec::Drop { column } => {
                    format!("ALTER TABLE {} DROP COLUMN {}", self.name, column)
                }
                ColumnSpec::Rename { from, to } => {
                    format!("ALTER TABLE {} RENAME COLUMN {} TO {}", self.name, from, to)
                }
            })
            .collect()
    }
}

/// Handle to one just-appended column spec.
///
/// Type-fragment methods (`*_type`) set the column type; modifiers edit the
/// referenced fragment in place. Both only ever touch the spec this handle
/// was created for.
#[derive(Debug)]
pub struct ColumnRef<'a> {
    table: &'a mut TableBuilder,
    index: usize,
    column: String,
}

impl<'a> ColumnRef<'a> {
    fn edit(&mut self, apply: impl FnOnce(&mut String)) {
        if let Some(text) = self.table.specs[self.index].text_mut() {
            apply(text);
        }
    }

    fn apply_type(mut self, type_sql: &str) -> Self {
        self.edit(|text| column::apply_type(text, type_sql));
        self
    }

    pub fn string_type(self, length: Option<u32>) -> Self {
        let sql = format!("VARCHAR({})", length.unwrap_or(255));
        self.apply_type(&sql)
    }

    pub fn char_type(self, length: u32) -> Self {
        let sql = format!("CHAR({})", length);
        self.apply_type(&sql)
    }

    pub fn text_type(self) -> Self {
        self.apply_type("TEXT")
    }

    pub fn long_text_type(self) -> Self {
        self.apply_type("LONGTEXT")
    }

    pub fn json_type(self) -> Self {
        self.apply_type("JSON")
    }

    pub fn blob_type(self) -> Self {
        self.apply_type("BLOB")
    }

    pub fn integer_type(self) -> Self {
        self.apply_type("INT")
    }

    pub fn big_integer_type(self) -> Self {
        self.apply_type("BIGINT")
    }

    pub fn float_type(self) -> Self {
        self.apply_type("FLOAT")
    }

    pub fn double_type(self) -> Self {
        self.apply_type("DOUBLE")
    }

    pub fn decimal_type(self, precision: u8, scale: u8) -> Self {
        let sql = format!("DECIMAL({}, {})", precision, scale);
        self.apply_type(&sql)
    }

    pub fn boolean_type(self) -> Self {
        self.apply_type("TINYINT(1)")
    }

    pub fn date_type(self) -> Self {
        self.apply_type("DATE")
    }

    pub fn time_type(self) -> Self {
        self.apply_type("TIME")
    }

    pub fn date_time_type(self) -> Self {
        self.apply_type("DATETIME")
    }

    pub fn timestamp_type(self) -> Self {
        self.apply_type("TIMESTAMP")
    }

    /// ENUM type restricted to `values`; validated before anything is
    /// folded into the fragment
    pub fn enumeration_type(
        mut self,
        values: &[&str],
        default: Option<&str>,
    ) -> SchemaResult<Self> {
        if values.is_empty() {
            return Err(SchemaError::InvalidInput(format!(
                "enum column {} requires at least one allowed value",
                self.column
            )));
        }
        if let Some(default) = default {
            if !values.contains(&default) {
                return Err(SchemaError::InvalidInput(format!(
                    "enum column {} default '{}' is not an allowed value",
                    self.column, default
                )));
            }
        }
        let allowed = values
            .iter()
            .map(|value| quote_literal(value))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("ENUM({})", allowed);
        self.edit(|text| column::apply_type(text, &sql));
        if let Some(default) = default {
            let literal = quote_literal(default);
            self.edit(|text| column::set_default(text, &literal));
        }
        Ok(self)
    }

    /// Allow NULL for this column
    pub fn nullable(mut self) -> Self {
        self.edit(column::set_nullable);
        self
    }

    /// Mark an integer type unsigned
    pub fn unsigned(mut self) -> Self {
        self.edit(column::set_unsigned);
        self
    }

    /// Set the default value, replacing any previously set default
    pub fn default_value(mut self, value: impl Into<DatabaseValue>) -> Self {
        let literal = value.into().to_sql_literal();
        self.edit(|text| column::set_default(text, &literal));
        self
    }

    /// Default to the current timestamp
    pub fn use_current(mut self) -> Self {
        self.edit(|text| column::set_default(text, "CURRENT_TIMESTAMP"));
        self
    }

    /// Re-stamp the column on every row update
    pub fn on_update_current(mut self) -> Self {
        self.edit(|text| text.push_str(" ON UPDATE CURRENT_TIMESTAMP"));
        self
    }

    /// Attach a column comment
    pub fn comment(mut self, comment: &str) -> Self {
        self.edit(|text| column::append_comment(text, comment));
        self
    }

    /// Position the column after another one
    pub fn after(mut self, column_name: &str) -> Self {
        self.edit(|text| column::append_after(text, column_name));
        self
    }

    /// Index this column; the name is derived from table and column
    pub fn index(mut self) -> Self {
        let column = self.column.clone();
        self.table.index_on(&[column.as_str()]);
        self
    }

    /// Unique key on this column
    pub fn unique(mut self) -> Self {
        let column = self.column.clone();
        self.table.unique_on(&[column.as_str()]);
        self
    }

    /// Primary key on this column
    pub fn primary(mut self) -> Self {
        let column = self.column.clone();
        self.table.primary_on(&[column.as_str()]);
        self
    }
}
