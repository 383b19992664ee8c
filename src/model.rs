//! Typed views over the header-keyed records the repo hands back.
//!
//! Mapping fails loudly when a column is missing or renamed instead of
//! silently misindexing; values stay free-form strings where the sheet
//! itself enforces nothing (task category, project status).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repo::Record;
use crate::{AppError, AppResult};

pub const TASK_STATUS_PENDING: &str = "未";
pub const TASK_STATUS_DONE: &str = "済";

pub const PROJECT_STATUS_ACTIVE: &str = "進行中";
pub const PROJECT_STATUS_DONE: &str = "完了";
pub const PROJECT_STATUS_ON_HOLD: &str = "保留";

/// Shortcut placement that pins a bookmark to the quick-launch row.
pub const PLACEMENT_HEADER: &str = "header";

fn field(record: &Record, table: &str, name: &str) -> AppResult<String> {
    record.get(name).cloned().ok_or_else(|| {
        AppError::new("MODEL/MISSING_FIELD", "Record is missing an expected column")
            .with_context("table", table.to_string())
            .with_context("field", name.to_string())
    })
}

/// Task categories offered by the UI. The sheet does not validate the
/// column, so `Task::category` stays a plain string and this enum only
/// drives input choices and icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskCategory {
    Production,
    Development,
    Learning,
    Admin,
    Other,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 5] = [
        TaskCategory::Production,
        TaskCategory::Development,
        TaskCategory::Learning,
        TaskCategory::Admin,
        TaskCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskCategory::Production => "制作",
            TaskCategory::Development => "開発",
            TaskCategory::Learning => "学習",
            TaskCategory::Admin => "事務",
            TaskCategory::Other => "その他",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            TaskCategory::Production => "🎨",
            TaskCategory::Development => "💻",
            TaskCategory::Learning => "📚",
            TaskCategory::Admin => "📎",
            TaskCategory::Other => "🤔",
        }
    }

    pub fn from_label(label: &str) -> Option<TaskCategory> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }

    /// Icon for a stored category value; unknown categories get the pin.
    pub fn icon_for(label: &str) -> &'static str {
        Self::from_label(label).map_or("📌", |c| c.icon())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown task category: {0}")]
pub struct ParseCategoryError(String);

impl FromStr for TaskCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskCategory::from_label(s.trim()).ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub category: String,
    pub status: String,
    pub memo: String,
    pub created_at: String,
    pub completed_at: String,
}

impl Task {
    pub fn from_record(record: &Record) -> AppResult<Self> {
        Ok(Task {
            id: field(record, "tasks", "id")?,
            title: field(record, "tasks", "title")?,
            category: field(record, "tasks", "category")?,
            status: field(record, "tasks", "status")?,
            memo: field(record, "tasks", "memo")?,
            created_at: field(record, "tasks", "created_at")?,
            completed_at: field(record, "tasks", "completed_at")?,
        })
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.title.clone(),
            self.category.clone(),
            self.status.clone(),
            self.memo.clone(),
            self.created_at.clone(),
            self.completed_at.clone(),
        ]
    }

    pub fn is_pending(&self) -> bool {
        self.status == TASK_STATUS_PENDING
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub theme: String,
    pub status: String,
    pub links: String,
    pub memo: String,
    pub updated_at: String,
    pub memo_updated_at: String,
}

impl Project {
    pub fn from_record(record: &Record) -> AppResult<Self> {
        Ok(Project {
            id: field(record, "projects", "id")?,
            theme: field(record, "projects", "theme")?,
            status: field(record, "projects", "status")?,
            links: field(record, "projects", "links")?,
            memo: field(record, "projects", "memo")?,
            updated_at: field(record, "projects", "updated_at")?,
            memo_updated_at: field(record, "projects", "memo_updated_at")?,
        })
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.theme.clone(),
            self.status.clone(),
            self.links.clone(),
            self.memo.clone(),
            self.updated_at.clone(),
            self.memo_updated_at.clone(),
        ]
    }

    pub fn is_active(&self) -> bool {
        self.status == PROJECT_STATUS_ACTIVE
    }

    pub fn is_done(&self) -> bool {
        self.status == PROJECT_STATUS_DONE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub content: String,
    pub created_at: String,
}

impl Idea {
    pub fn from_record(record: &Record) -> AppResult<Self> {
        Ok(Idea {
            id: field(record, "ideas", "id")?,
            content: field(record, "ideas", "content")?,
            created_at: field(record, "ideas", "created_at")?,
        })
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.content.clone(),
            self.created_at.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub id: String,
    pub category: String,
    pub label: String,
    pub url: String,
    pub icon: String,
    pub placement: String,
}

impl Shortcut {
    pub fn from_record(record: &Record) -> AppResult<Self> {
        Ok(Shortcut {
            id: field(record, "shortcuts", "id")?,
            category: field(record, "shortcuts", "category")?,
            label: field(record, "shortcuts", "label")?,
            url: field(record, "shortcuts", "url")?,
            icon: field(record, "shortcuts", "icon")?,
            placement: field(record, "shortcuts", "placement")?,
        })
    }

    pub fn is_header_placement(&self) -> bool {
        self.placement.trim().eq_ignore_ascii_case(PLACEMENT_HEADER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn from_record(record: &Record) -> AppResult<Self> {
        Ok(Setting {
            key: field(record, "settings", "key")?,
            value: field(record, "settings", "value")?,
        })
    }
}

/// Action types the application writes into the activity log. The log
/// column itself is free text; unknown values render with the fallback
/// icon in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    TaskAdded,
    TaskCompleted,
    ProjectCreated,
    ProjectStatusUpdated,
    ProjectThemeUpdated,
    ProjectCommentUpdated,
    IdeaAdded,
    IdeaEdited,
}

impl ActionType {
    pub fn label(&self) -> &'static str {
        match self {
            ActionType::TaskAdded => "タスク追加",
            ActionType::TaskCompleted => "タスク完了",
            ActionType::ProjectCreated => "プロジェクト作成",
            ActionType::ProjectStatusUpdated => "プロジェクトステータス更新",
            ActionType::ProjectThemeUpdated => "プロジェクトテーマ更新",
            ActionType::ProjectCommentUpdated => "プロジェクトコメント更新",
            ActionType::IdeaAdded => "アイデア追加",
            ActionType::IdeaEdited => "アイデア編集",
        }
    }

    /// Report icon for a stored action type string.
    pub fn icon_for(label: &str) -> &'static str {
        match label {
            "タスク追加" => "➕",
            "タスク完了" => "✅",
            "プロジェクト作成" => "🆕",
            "プロジェクトステータス更新" => "🔄",
            "プロジェクトテーマ更新" => "✏️",
            "プロジェクトコメント更新" => "💬",
            "アイデア追加" => "💡",
            _ => "📝",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: String,
    pub old_value: String,
    pub new_value: String,
    pub details: String,
    pub created_at: String,
}

impl ActivityEntry {
    pub fn from_record(record: &Record) -> AppResult<Self> {
        Ok(ActivityEntry {
            id: field(record, "activity_history", "id")?,
            action_type: field(record, "activity_history", "action_type")?,
            entity_type: field(record, "activity_history", "entity_type")?,
            entity_id: field(record, "activity_history", "entity_id")?,
            entity_name: field(record, "activity_history", "entity_name")?,
            old_value: field(record, "activity_history", "old_value")?,
            new_value: field(record, "activity_history", "new_value")?,
            details: field(record, "activity_history", "details")?,
            created_at: field(record, "activity_history", "created_at")?,
        })
    }
}

/// Input for one activity-log append; the repo allocates the id and
/// stamps `created_at`.
#[derive(Debug, Clone, Default)]
pub struct NewActivity {
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: String,
    pub old_value: String,
    pub new_value: String,
    pub details: String,
}

impl NewActivity {
    pub fn new(
        action: ActionType,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        entity_name: impl Into<String>,
    ) -> Self {
        NewActivity {
            action_type: action.label().to_string(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            entity_name: entity_name.into(),
            ..NewActivity::default()
        }
    }

    pub fn change(mut self, old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        self.old_value = old_value.into();
        self.new_value = new_value.into();
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }
}
