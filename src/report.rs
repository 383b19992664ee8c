//! Activity report differ.
//!
//! Builds a Markdown delta of everything logged since the
//! `last_report_at` watermark, and advances the watermark on
//! confirmation. Advancing is destructive: the same delta cannot be
//! regenerated afterwards.

use crate::model::{ActionType, ActivityEntry, Setting};
use crate::repo::Repo;
use crate::schema;
use crate::time::{now_jst_string, parse_timestamp, today_jst_string, DEFAULT_WATERMARK};
use crate::AppResult;

#[derive(Debug, Clone)]
pub struct Report {
    pub watermark: String,
    pub entries: Vec<ActivityEntry>,
    pub markdown: String,
}

/// Current watermark, defaulting to the fixed epoch when the settings
/// row has never been written.
pub async fn last_report_at(repo: &Repo) -> AppResult<String> {
    let records = repo.get_records(schema::SETTINGS).await?;
    for record in &records {
        let setting = Setting::from_record(record)?;
        if setting.key == schema::LAST_REPORT_AT_KEY {
            return Ok(setting.value);
        }
    }
    Ok(DEFAULT_WATERMARK.to_string())
}

/// True when `created_at` is strictly newer than the watermark.
///
/// Both sides parse with the fixed timestamp format; an entry that does
/// not parse falls back to lexicographic comparison, which stays
/// monotonic only because the format is fixed-width and zero-padded.
fn is_after_watermark(created_at: &str, watermark: &str) -> bool {
    let watermark_dt = parse_timestamp(watermark)
        .or_else(|| parse_timestamp(DEFAULT_WATERMARK))
        .expect("default watermark parses");
    match parse_timestamp(created_at) {
        Some(dt) => dt > watermark_dt,
        None => created_at > watermark,
    }
}

/// Activity entries newer than the watermark, ascending by `created_at`.
pub async fn pending_activities(repo: &Repo, watermark: &str) -> AppResult<Vec<ActivityEntry>> {
    let records = repo.get_records(schema::ACTIVITY_HISTORY).await?;
    let mut entries = Vec::new();
    for record in &records {
        let entry = ActivityEntry::from_record(record)?;
        if entry.created_at.trim().is_empty() {
            continue;
        }
        if is_after_watermark(&entry.created_at, watermark) {
            entries.push(entry);
        }
    }
    entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(entries)
}

pub async fn build_report(repo: &Repo) -> AppResult<Report> {
    let watermark = last_report_at(repo).await?;
    let entries = pending_activities(repo, &watermark).await?;
    let markdown = render_markdown(&entries);
    Ok(Report {
        watermark,
        entries,
        markdown,
    })
}

fn render_markdown(entries: &[ActivityEntry]) -> String {
    let mut out = format!("## 🚀 活動レポート ({})\n\n", today_jst_string());

    if entries.is_empty() {
        out.push_str("（前回の出力から更新されたデータはありません）\n\n");
    } else {
        out.push_str("### 📋 活動履歴（時系列）\n\n");
        for entry in entries {
            let icon = ActionType::icon_for(&entry.action_type);
            out.push_str(&format!(
                "**{icon} {}** ({})\n",
                entry.action_type, entry.created_at
            ));
            out.push_str(&format!(
                "- **対象**: {} ({})\n",
                entry.entity_name, entry.entity_type
            ));

            let comment_update =
                entry.action_type == ActionType::ProjectCommentUpdated.label();
            if comment_update && !entry.new_value.is_empty() {
                let lines: Vec<&str> = entry
                    .new_value
                    .trim()
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .collect();
                if !lines.is_empty() {
                    out.push_str("- **コメント内容**:\n");
                    for line in lines {
                        out.push_str(&format!("  - {}\n", line.trim()));
                    }
                }
            } else if !entry.old_value.is_empty() && !entry.new_value.is_empty() {
                out.push_str(&format!(
                    "- **変更**: {} → {}\n",
                    entry.old_value, entry.new_value
                ));
            } else if !entry.new_value.is_empty() {
                out.push_str(&format!("- **内容**: {}\n", entry.new_value));
            }

            if !entry.details.is_empty() {
                out.push_str(&format!("- **詳細**: {}\n", entry.details));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str("### 💭 振り返り・メモ\n(ここに本日の感想を記入...)\n");
    out
}

/// Advance the watermark to now: update the settings row in place when it
/// exists, append it otherwise, then invalidate the read cache.
pub async fn confirm_report(repo: &Repo) -> AppResult<String> {
    repo.ensure_sheet_exists(schema::SETTINGS, schema::SETTING_HEADERS)
        .await?;
    let now = now_jst_string();
    let existing = repo
        .store()
        .find_in_column(schema::SETTINGS, 1, schema::LAST_REPORT_AT_KEY)
        .await?;
    match existing {
        Some(row) => {
            repo.store()
                .update_cell(schema::SETTINGS, row, 2, &now)
                .await?;
            repo.clear_cache();
        }
        None => {
            repo.add_row(
                schema::SETTINGS,
                &[schema::LAST_REPORT_AT_KEY.to_string(), now.clone()],
            )
            .await?;
        }
    }
    tracing::info!(target: "cockpit", event = "report_confirmed", watermark = %now);
    Ok(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: &str, created_at: &str) -> ActivityEntry {
        ActivityEntry {
            id: "1".into(),
            action_type: action.into(),
            entity_type: "tasks".into(),
            entity_id: "1".into(),
            entity_name: "demo".into(),
            old_value: String::new(),
            new_value: String::new(),
            details: String::new(),
            created_at: created_at.into(),
        }
    }

    #[test]
    fn watermark_comparison_is_strict() {
        let wm = "2024-01-01 00:00:00";
        assert!(!is_after_watermark("2023-12-31 23:59:59", wm));
        assert!(!is_after_watermark("2024-01-01 00:00:00", wm));
        assert!(is_after_watermark("2024-01-01 00:00:01", wm));
    }

    #[test]
    fn unparsable_entry_falls_back_to_string_order() {
        let wm = "2024-01-01 00:00:00";
        assert!(is_after_watermark("2024-06-01T10:00:00", wm));
        assert!(!is_after_watermark("2023-06-01T10:00:00", wm));
    }

    #[test]
    fn unparsable_watermark_defaults_to_the_epoch() {
        assert!(is_after_watermark("2001-01-01 00:00:00", "garbage"));
    }

    #[test]
    fn empty_delta_renders_the_no_updates_line() {
        let markdown = render_markdown(&[]);
        assert!(markdown.contains("（前回の出力から更新されたデータはありません）"));
        assert!(markdown.contains("### 💭 振り返り・メモ"));
        assert!(!markdown.contains("### 📋 活動履歴"));
    }

    #[test]
    fn change_line_requires_both_sides() {
        let mut e = entry("タスク完了", "2024-01-02 09:00:00");
        e.old_value = "未".into();
        e.new_value = "済".into();
        let markdown = render_markdown(&[e]);
        assert!(markdown.contains("**✅ タスク完了** (2024-01-02 09:00:00)"));
        assert!(markdown.contains("- **変更**: 未 → 済"));

        let mut only_new = entry("アイデア追加", "2024-01-02 09:00:00");
        only_new.new_value = "podcast series".into();
        let markdown = render_markdown(&[only_new]);
        assert!(markdown.contains("- **内容**: podcast series"));
        assert!(!markdown.contains("- **変更**:"));
    }

    #[test]
    fn comment_updates_render_per_line() {
        let mut e = entry("プロジェクトコメント更新", "2024-01-02 09:00:00");
        e.new_value = "first point\n\nsecond point".into();
        let markdown = render_markdown(&[e]);
        assert!(markdown.contains("- **コメント内容**:\n  - first point\n  - second point\n"));
        assert!(!markdown.contains("- **内容**:"));
    }

    #[test]
    fn details_line_is_optional() {
        let mut e = entry("タスク追加", "2024-01-02 09:00:00");
        e.details = "カテゴリ: 開発".into();
        let markdown = render_markdown(&[e]);
        assert!(markdown.contains("- **詳細**: カテゴリ: 開発"));
    }
}
