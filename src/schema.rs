//! Table names and header-row contracts.
//!
//! These constants are the wire format shared with the spreadsheet: any
//! external consumer of the same document must honour identical column
//! ordering per table.

pub const TASKS: &str = "tasks";
pub const PROJECTS: &str = "projects";
pub const IDEAS: &str = "ideas";
pub const SHORTCUTS: &str = "shortcuts";
pub const SETTINGS: &str = "settings";
pub const ACTIVITY_HISTORY: &str = "activity_history";
pub const PROJECT_COMMENTS_HISTORY: &str = "project_comments_history";

pub const TASK_HEADERS: &[&str] = &[
    "id",
    "title",
    "category",
    "status",
    "memo",
    "created_at",
    "completed_at",
];

pub const PROJECT_HEADERS: &[&str] = &[
    "id",
    "theme",
    "status",
    "links",
    "memo",
    "updated_at",
    "memo_updated_at",
];

pub const IDEA_HEADERS: &[&str] = &["id", "content", "created_at"];

pub const SHORTCUT_HEADERS: &[&str] = &["id", "category", "label", "url", "icon", "placement"];

pub const SETTING_HEADERS: &[&str] = &["key", "value"];

pub const ACTIVITY_HEADERS: &[&str] = &[
    "id",
    "action_type",
    "entity_type",
    "entity_id",
    "entity_name",
    "old_value",
    "new_value",
    "details",
    "created_at",
];

pub const PROJECT_COMMENT_HEADERS: &[&str] = &["id", "project_id", "theme", "memo", "updated_at"];

/// The settings key consumed by the report differ.
pub const LAST_REPORT_AT_KEY: &str = "last_report_at";

/// Every table the application provisions, with its header contract.
pub const ALL_TABLES: &[(&str, &[&str])] = &[
    (TASKS, TASK_HEADERS),
    (PROJECTS, PROJECT_HEADERS),
    (IDEAS, IDEA_HEADERS),
    (SHORTCUTS, SHORTCUT_HEADERS),
    (SETTINGS, SETTING_HEADERS),
    (ACTIVITY_HISTORY, ACTIVITY_HEADERS),
    (PROJECT_COMMENTS_HISTORY, PROJECT_COMMENT_HEADERS),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_always_the_first_column() {
        for (table, headers) in ALL_TABLES {
            if *table == SETTINGS {
                continue;
            }
            assert_eq!(headers[0], "id", "table {table} must key rows by id");
        }
    }

    #[test]
    fn table_names_are_unique() {
        let mut names: Vec<&str> = ALL_TABLES.iter().map(|(t, _)| *t).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_TABLES.len());
    }
}
