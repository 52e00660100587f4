//! Operation risk tiers
//!
//! A failed-over operation may have already reached the first endpoint, so
//! anything that is not safe to apply twice is classified above `Safe`.

use serde::{Deserialize, Serialize};

/// Risk tier of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerClass {
    /// Reads and idempotent writes
    #[default]
    Safe,
    /// Writes that may duplicate when applied twice
    Medium,
    /// Counters and conditional mutations
    Dangerous,
}

impl DangerClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DangerClass::Safe => "safe",
            DangerClass::Medium => "medium",
            DangerClass::Dangerous => "dangerous",
        }
    }
}

impl std::fmt::Display for DangerClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass-through operation catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Find,
    FindOne,
    Count,
    Distinct,
    Aggregate,
    Exists,
    /// Write addressed by id with full replacement semantics
    UpsertById,
    ReplaceById,
    Insert,
    InsertMany,
    Update,
    UpdateMany,
    Delete,
    DeleteMany,
    Increment,
    FindAndModify,
    ConditionalUpdate,
}

impl OperationKind {
    /// Every kind, reads first
    pub const ALL: [OperationKind; 17] = [
        OperationKind::Find,
        OperationKind::FindOne,
        OperationKind::Count,
        OperationKind::Distinct,
        OperationKind::Aggregate,
        OperationKind::Exists,
        OperationKind::UpsertById,
        OperationKind::ReplaceById,
        OperationKind::Insert,
        OperationKind::InsertMany,
        OperationKind::Update,
        OperationKind::UpdateMany,
        OperationKind::Delete,
        OperationKind::DeleteMany,
        OperationKind::Increment,
        OperationKind::FindAndModify,
        OperationKind::ConditionalUpdate,
    ];

    /// Risk tier for this kind of operation
    pub fn danger_class(&self) -> DangerClass {
        use OperationKind::*;
        match self {
            Find | FindOne | Count | Distinct | Aggregate | Exists | UpsertById | ReplaceById => {
                DangerClass::Safe
            }
            Insert | InsertMany | Update | UpdateMany | Delete | DeleteMany => DangerClass::Medium,
            Increment | FindAndModify | ConditionalUpdate => DangerClass::Dangerous,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use OperationKind::*;
        match self {
            Find => "find",
            FindOne => "find_one",
            Count => "count",
            Distinct => "distinct",
            Aggregate => "aggregate",
            Exists => "exists",
            UpsertById => "upsert_by_id",
            ReplaceById => "replace_by_id",
            Insert => "insert",
            InsertMany => "insert_many",
            Update => "update",
            UpdateMany => "update_many",
            Delete => "delete",
            DeleteMany => "delete_many",
            Increment => "increment",
            FindAndModify => "find_and_modify",
            ConditionalUpdate => "conditional_update",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
