use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::RawIndex;
use crate::types::FkAction;

/// Column-level foreign key edge: `source_table.source_column -> table_name.column_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyReference {
    pub schema_name: String,
    pub source_table: String,
    pub source_column: String,
    /// Referenced (parent) table.
    pub table_name: String,
    /// Referenced (parent) column.
    pub column_name: String,
    pub on_update: FkAction,
    pub on_delete: FkAction,
    /// Constraint name.
    pub name: String,
}

/// Identity of a constraint within the catalog: schema plus constraint name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId {
    pub schema: String,
    pub name: String,
}

impl ConstraintId {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

/// Foreign key constraint with member columns in constraint order.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDefinition {
    pub id: ConstraintId,
    pub table: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

/// Index definition preserving member column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    pub is_primary: bool,
    pub is_foreign_key: bool,
    pub is_auto_number: bool,
}

/// How an index is rendered into DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexClass {
    Primary,
    ForeignKey,
    Unique,
    Plain,
}

impl Index {
    pub fn class(&self) -> IndexClass {
        if self.is_primary {
            IndexClass::Primary
        } else if self.is_foreign_key {
            IndexClass::ForeignKey
        } else if self.is_unique {
            IndexClass::Unique
        } else {
            IndexClass::Plain
        }
    }

    /// Comma-joined member list as written inside DDL parentheses.
    pub fn column_list(&self) -> String {
        self.columns.join(",")
    }
}

impl From<&RawIndex> for Index {
    fn from(raw: &RawIndex) -> Self {
        Self {
            name: raw.index_name.clone(),
            columns: raw.columns.clone(),
            is_unique: raw.is_unique,
            is_primary: raw.is_primary,
            is_foreign_key: raw.is_foreign_key,
            is_auto_number: raw.is_auto_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(unique: bool, primary: bool, fk: bool) -> Index {
        Index {
            name: "idx".to_string(),
            columns: vec!["a".to_string(), "b".to_string()],
            is_unique: unique,
            is_primary: primary,
            is_foreign_key: fk,
            is_auto_number: false,
        }
    }

    #[test]
    fn classification_has_one_class_per_index() {
        assert_eq!(index(true, true, false).class(), IndexClass::Primary);
        assert_eq!(index(true, false, true).class(), IndexClass::ForeignKey);
        assert_eq!(index(false, false, true).class(), IndexClass::ForeignKey);
        assert_eq!(index(true, false, false).class(), IndexClass::Unique);
        assert_eq!(index(false, false, false).class(), IndexClass::Plain);
    }

    #[test]
    fn column_list_keeps_member_order() {
        assert_eq!(index(false, false, false).column_list(), "a,b");
    }
}
