//! Column specs and fragment editing
//!
//! A table definition is an ordered list of `ColumnSpec`s. `Add` and
//! `Modify` specs carry a plain SQL fragment that modifier calls edit in
//! place; by the time a statement is compiled the fragment is complete
//! (name, type, nullability, default, comment, position all folded in).

/// One structural element of a table definition
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSpec {
    /// A new column, index, or constraint fragment
    Add { text: String },
    /// A column redefinition for the alter path
    Modify { column: String, text: String },
    /// A column removal
    Drop { column: String },
    /// A column rename
    Rename { from: String, to: String },
}

impl ColumnSpec {
    /// The SQL fragment, for text-bearing kinds
    pub fn text(&self) -> Option<&str> {
        match self {
            ColumnSpec::Add { text } | ColumnSpec::Modify { text, .. } => Some(text),
            _ => None,
        }
    }

    pub(crate) fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            ColumnSpec::Add { text } | ColumnSpec::Modify { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Append the type and the default `NOT NULL` marker to a bare column name
pub(crate) fn apply_type(text: &mut String, type_sql: &str) {
    text.push_str(&format!(" {} NOT NULL", type_sql));
}

/// Swap the `NOT NULL` marker for `NULL`; no-op if the fragment has none
pub(crate) fn set_nullable(text: &mut String) {
    if let Some(pos) = text.find(" NOT NULL") {
        text.replace_range(pos..pos + " NOT NULL".len(), " NULL");
    }
}

/// Insert `UNSIGNED` between the type and the null marker
pub(crate) fn set_unsigned(text: &mut String) {
    if text.contains(" UNSIGNED") {
        return;
    }
    match text.find(" NOT NULL").or_else(|| text.find(" NULL")) {
        Some(pos) => text.insert_str(pos, " UNSIGNED"),
        None => text.push_str(" UNSIGNED"),
    }
}

/// Replace any existing DEFAULT clause with `DEFAULT <literal>`.
///
/// The clause lands ahead of COMMENT/AFTER so a late `default` call still
/// produces a valid fragment.
pub(crate) fn set_default(text: &mut String, literal: &str) {
    strip_default(text);
    let clause = format!(" DEFAULT {}", literal);
    let insert_at = text
        .find(" COMMENT ")
        .or_else(|| text.find(" AFTER "))
        .unwrap_or(text.len());
    text.insert_str(insert_at, &clause);
}

/// Remove an existing `DEFAULT <literal>` clause, if present
pub(crate) fn strip_default(text: &mut String) {
    let Some(start) = text.find(" DEFAULT ") else {
        return;
    };
    let value_start = start + " DEFAULT ".len();
    let value_len = literal_len(&text[value_start..]);
    text.replace_range(start..value_start + value_len, "");
}

/// Length of the single literal at the head of `rest`: either a quoted
/// string with `''` escaping, or a bare token ending at the next space.
fn literal_len(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    if bytes.first() == Some(&b'\'') {
        let mut i = 1;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                return i + 1;
            }
            i += 1;
        }
        rest.len()
    } else {
        rest.find(' ').unwrap_or(rest.len())
    }
}

/// Append a COMMENT clause, ahead of any AFTER clause
pub(crate) fn append_comment(text: &mut String, comment: &str) {
    let clause = format!(" COMMENT {}", crate::value::quote_literal(comment));
    match text.find(" AFTER ") {
        Some(pos) => text.insert_str(pos, &clause),
        None => text.push_str(&clause),
    }
}

/// Append an AFTER clause positioning the column
pub(crate) fn append_after(text: &mut String, column: &str) {
    text.push_str(&format!(" AFTER {}", column));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_swaps_the_marker_in_place() {
        let mut text = "age INT NOT NULL DEFAULT 1".to_string();
        set_nullable(&mut text);
        assert_eq!(text, "age INT NULL DEFAULT 1");
    }

    #[test]
    fn nullable_is_a_noop_without_marker() {
        let mut text = "age INT NULL".to_string();
        set_nullable(&mut text);
        assert_eq!(text, "age INT NULL");
    }

    #[test]
    fn unsigned_lands_between_type_and_marker() {
        let mut text = "count INT NOT NULL".to_string();
        set_unsigned(&mut text);
        assert_eq!(text, "count INT UNSIGNED NOT NULL");
    }

    #[test]
    fn default_replaces_a_previous_clause() {
        let mut text = "retries INT NOT NULL".to_string();
        set_default(&mut text, "3");
        set_default(&mut text, "5");
        assert_eq!(text, "retries INT NOT NULL DEFAULT 5");
    }

    #[test]
    fn strip_default_handles_quoted_literals_with_spaces() {
        let mut text = "name VARCHAR(255) NOT NULL DEFAULT 'a b' COMMENT 'c'".to_string();
        strip_default(&mut text);
        assert_eq!(text, "name VARCHAR(255) NOT NULL COMMENT 'c'");
    }

    #[test]
    fn strip_default_handles_escaped_quotes() {
        let mut text = "name VARCHAR(255) NOT NULL DEFAULT 'o''brien' AFTER title".to_string();
        strip_default(&mut text);
        assert_eq!(text, "name VARCHAR(255) NOT NULL AFTER title");
    }

    #[test]
    fn strip_default_keeps_a_trailing_on_update_clause() {
        let mut text =
            "updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP"
                .to_string();
        strip_default(&mut text);
        assert_eq!(
            text,
            "updated_at TIMESTAMP NOT NULL ON UPDATE CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn default_inserts_ahead_of_comment_and_after() {
        let mut text = "slug VARCHAR(255) NOT NULL COMMENT 'url key' AFTER title".to_string();
        set_default(&mut text, "'x'");
        assert_eq!(
            text,
            "slug VARCHAR(255) NOT NULL DEFAULT 'x' COMMENT 'url key' AFTER title"
        );
    }
}
