mod util;

use cockpit_lib::commands::{self, Ctx};
use cockpit_lib::links::Link;
use cockpit_lib::model::{TaskCategory, TASK_STATUS_DONE};
use cockpit_lib::schema;
use cockpit_lib::session::SessionStore;
use util::{seeded_repo, table};

macro_rules! ctx {
    ($repo:expr, $sessions:expr) => {
        Ctx::new(&$repo, &$sessions, "test-session")
    };
}

#[tokio::test]
async fn adding_a_task_appends_the_row_and_the_activity_entry() {
    let (store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    let task = commands::add_task(&ctx, "edit the video", TaskCategory::Production, "cut intro")
        .await
        .unwrap();
    assert_eq!(task.id, "1");
    assert!(task.is_pending());

    let rows = store.table(schema::TASKS).unwrap().rows;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][1], "edit the video");
    assert_eq!(rows[0][3], "未");

    let activity = repo.get_records(schema::ACTIVITY_HISTORY).await.unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(
        activity[0].get("action_type").map(String::as_str),
        Some("タスク追加")
    );
    assert_eq!(
        activity[0].get("details").map(String::as_str),
        Some("カテゴリ: 制作, メモ: cut intro")
    );
    assert_eq!(activity[0].get("new_value").map(String::as_str), Some("未"));
}

#[tokio::test]
async fn blank_task_titles_are_rejected() {
    let (_store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    let err = commands::add_task(&ctx, "   ", TaskCategory::Other, "")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "COMMANDS/TITLE_REQUIRED");
}

#[tokio::test]
async fn completing_a_task_stamps_both_cells_and_counts_the_quest() {
    let (store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    commands::add_task(&ctx, "write the script", TaskCategory::Development, "")
        .await
        .unwrap();
    let done = commands::complete_task(&ctx, "1").await.unwrap();
    assert_eq!(done.status, TASK_STATUS_DONE);
    assert!(!done.completed_at.is_empty());

    let rows = store.table(schema::TASKS).unwrap().rows;
    assert_eq!(rows[0][3], "済");
    assert!(!rows[0][6].is_empty());

    let pending = commands::pending_tasks(&ctx).await.unwrap();
    assert!(pending.is_empty());

    let activity = repo.get_records(schema::ACTIVITY_HISTORY).await.unwrap();
    assert_eq!(activity.len(), 2);
    assert_eq!(
        activity[1].get("action_type").map(String::as_str),
        Some("タスク完了")
    );
    assert_eq!(activity[1].get("old_value").map(String::as_str), Some("未"));
    assert_eq!(activity[1].get("new_value").map(String::as_str), Some("済"));

    let session = sessions.snapshot("test-session");
    assert_eq!(session.daily_quests, 1);
    assert!(session
        .log
        .iter()
        .any(|line| line.contains("クエスト完了: write the script")));
}

#[tokio::test]
async fn completing_an_unknown_task_fails() {
    let (_store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    let err = commands::complete_task(&ctx, "42").await.unwrap_err();
    assert_eq!(err.code(), "COMMANDS/TASK_NOT_FOUND");
}

#[tokio::test]
async fn creating_a_project_with_a_memo_writes_the_comment_history() {
    let (store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    let links = vec![Link::new("Note", "https://note.com/x")];
    let project = commands::create_project(&ctx, "spring campaign", &links, "kickoff memo")
        .await
        .unwrap();
    assert_eq!(project.status, "進行中");
    assert_eq!(project.links, "Note: https://note.com/x");
    assert_eq!(project.memo_updated_at, project.updated_at);

    let comments = store.table(schema::PROJECT_COMMENTS_HISTORY).unwrap().rows;
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0][3], "kickoff memo");

    let activity = repo.get_records(schema::ACTIVITY_HISTORY).await.unwrap();
    assert_eq!(
        activity[0].get("action_type").map(String::as_str),
        Some("プロジェクト作成")
    );
    assert_eq!(
        activity[0].get("details").map(String::as_str),
        Some("メモ: kickoff memo")
    );
}

#[tokio::test]
async fn creating_a_project_without_a_memo_skips_the_comment_history() {
    let (store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    let project = commands::create_project(&ctx, "silent start", &[], "")
        .await
        .unwrap();
    assert!(project.memo_updated_at.is_empty());
    assert!(store
        .table(schema::PROJECT_COMMENTS_HISTORY)
        .unwrap()
        .rows
        .is_empty());
}

#[tokio::test]
async fn project_updates_log_one_entry_per_changed_field() {
    let (_store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    commands::create_project(&ctx, "old theme", &[], "").await.unwrap();
    commands::update_project(&ctx, "1", Some("new theme"), Some("保留"))
        .await
        .unwrap();

    let activity = repo.get_records(schema::ACTIVITY_HISTORY).await.unwrap();
    let actions: Vec<&str> = activity
        .iter()
        .filter_map(|r| r.get("action_type").map(String::as_str))
        .collect();
    assert_eq!(
        actions,
        vec![
            "プロジェクト作成",
            "プロジェクトテーマ更新",
            "プロジェクトステータス更新"
        ]
    );

    // Re-running with the same values changes nothing.
    commands::update_project(&ctx, "1", Some("new theme"), Some("保留"))
        .await
        .unwrap();
    let activity = repo.get_records(schema::ACTIVITY_HISTORY).await.unwrap();
    assert_eq!(activity.len(), 3);
}

#[tokio::test]
async fn free_form_status_values_are_accepted() {
    let (store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    commands::create_project(&ctx, "experiment", &[], "").await.unwrap();
    let project = commands::update_project(&ctx, "1", None, Some("検証中"))
        .await
        .unwrap();
    assert_eq!(project.status, "検証中");
    assert_eq!(store.table(schema::PROJECTS).unwrap().rows[0][2], "検証中");
}

#[tokio::test]
async fn saving_details_with_a_changed_memo_stamps_memo_updated_at() {
    let (store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    commands::create_project(&ctx, "docs", &[], "first").await.unwrap();
    let links = vec![Link::new("", "https://docs.example")];
    let project = commands::save_project_details(&ctx, "1", &links, "second")
        .await
        .unwrap();
    assert_eq!(project.links, "https://docs.example");
    assert!(!project.memo_updated_at.is_empty());

    let comments = store.table(schema::PROJECT_COMMENTS_HISTORY).unwrap().rows;
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[1][3], "second");

    let activity = repo.get_records(schema::ACTIVITY_HISTORY).await.unwrap();
    let last = activity.last().unwrap();
    assert_eq!(
        last.get("action_type").map(String::as_str),
        Some("プロジェクトコメント更新")
    );
    assert_eq!(last.get("old_value").map(String::as_str), Some("first"));
    assert_eq!(last.get("new_value").map(String::as_str), Some("second"));
}

#[tokio::test]
async fn saving_details_with_the_same_memo_only_rewrites_links() {
    let (store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    commands::create_project(&ctx, "docs", &[], "same").await.unwrap();
    let before = repo.get_records(schema::ACTIVITY_HISTORY).await.unwrap().len();

    commands::save_project_details(&ctx, "1", &[], "same").await.unwrap();

    let activity = repo.get_records(schema::ACTIVITY_HISTORY).await.unwrap();
    assert_eq!(activity.len(), before);
    assert_eq!(store.table(schema::PROJECT_COMMENTS_HISTORY).unwrap().rows.len(), 1);
}

#[tokio::test]
async fn idea_lifecycle_append_edit_delete() {
    let (store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    commands::add_idea(&ctx, "a shorts series about rust").await.unwrap();
    commands::add_idea(&ctx, "collab livestream").await.unwrap();

    let edited = commands::edit_idea(&ctx, "1", "a shorts series about cooking")
        .await
        .unwrap();
    assert_eq!(edited.content, "a shorts series about cooking");

    let activity = repo.get_records(schema::ACTIVITY_HISTORY).await.unwrap();
    let last = activity.last().unwrap();
    assert_eq!(
        last.get("action_type").map(String::as_str),
        Some("アイデア編集")
    );
    assert_eq!(
        last.get("old_value").map(String::as_str),
        Some("a shorts series about rust")
    );

    commands::delete_idea(&ctx, "1").await.unwrap();
    let rows = store.table(schema::IDEAS).unwrap().rows;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "2");

    // Deleting leaves no activity entry; the id gap simply remains.
    let after = repo.get_records(schema::ACTIVITY_HISTORY).await.unwrap();
    assert_eq!(after.len(), activity.len());
}

#[tokio::test]
async fn long_idea_content_is_truncated_in_the_activity_name() {
    let (_store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    let content = "x".repeat(60);
    commands::add_idea(&ctx, &content).await.unwrap();

    let activity = repo.get_records(schema::ACTIVITY_HISTORY).await.unwrap();
    let name = activity[0].get("entity_name").unwrap();
    assert_eq!(name.chars().count(), 53);
    assert!(name.ends_with("..."));
}

#[tokio::test]
async fn idea_listing_filters_case_insensitively_and_sorts_newest_first() {
    let (store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    store.insert_table(
        schema::IDEAS,
        table(
            schema::IDEA_HEADERS,
            &[
                &["1", "Podcast pilot", "2024-01-01 08:00:00"],
                &["2", "newsletter", "2024-02-01 08:00:00"],
                &["3", "PODCAST guests", "2024-03-01 08:00:00"],
            ],
        ),
    );

    let all = commands::list_ideas(&ctx, None).await.unwrap();
    assert_eq!(all[0].id, "3");
    assert_eq!(all[2].id, "1");

    let filtered = commands::list_ideas(&ctx, Some("podcast")).await.unwrap();
    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered[0].id, "3");
}

#[tokio::test]
async fn shortcut_listing_narrows_to_the_header_placement() {
    let (store, repo) = seeded_repo();
    let sessions = SessionStore::new();
    let ctx = ctx!(repo, sessions);

    store.insert_table(
        schema::SHORTCUTS,
        table(
            schema::SHORTCUT_HEADERS,
            &[
                &["1", "SNS", "Note", "https://note.com", "📝", "header"],
                &["2", "SNS", "X", "https://x.com", "🐦", "Header"],
                &["3", "Tools", "CMS", "https://cms.example", "🛠", "library"],
            ],
        ),
    );

    let all = commands::list_shortcuts(&ctx, false).await.unwrap();
    assert_eq!(all.len(), 3);

    let header = commands::list_shortcuts(&ctx, true).await.unwrap();
    assert_eq!(header.len(), 2);
    assert!(header.iter().all(|s| s.is_header_placement()));
}
