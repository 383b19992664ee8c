//! Application command handlers.
//!
//! Every mutating handler writes its activity-history record in the same
//! shape the spreadsheet has always carried, so the report differ and any
//! external consumer of the document see one consistent log.

use crate::links::{format_links, Link};
use crate::model::{
    ActionType, Idea, NewActivity, Project, Shortcut, Task, TaskCategory, PROJECT_STATUS_ACTIVE,
    TASK_STATUS_DONE, TASK_STATUS_PENDING,
};
use crate::repo::Repo;
use crate::schema;
use crate::session::SessionStore;
use crate::time::now_jst_string;
use crate::util::truncate_label;
use crate::{AppError, AppResult};

/// How many characters of free text land in an activity entry's name.
const ENTITY_NAME_CHARS: usize = 50;

/// Request-scoped context passed into every handler.
pub struct Ctx<'a> {
    pub repo: &'a Repo,
    pub sessions: &'a SessionStore,
    pub session_id: &'a str,
}

impl<'a> Ctx<'a> {
    pub fn new(repo: &'a Repo, sessions: &'a SessionStore, session_id: &'a str) -> Self {
        Ctx {
            repo,
            sessions,
            session_id,
        }
    }

    fn log(&self, message: &str) {
        self.sessions.add_log(self.session_id, message);
    }
}

fn require_text(value: &str, code: &str, message: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::new(code, message));
    }
    Ok(trimmed.to_string())
}

fn task_details(category: &str, memo: &str) -> String {
    if memo.is_empty() {
        format!("カテゴリ: {category}")
    } else {
        format!("カテゴリ: {category}, メモ: {memo}")
    }
}

// ---------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------

pub async fn list_tasks(ctx: &Ctx<'_>) -> AppResult<Vec<Task>> {
    let records = ctx.repo.get_records(schema::TASKS).await?;
    records.iter().map(Task::from_record).collect()
}

/// Tasks still marked 未, in sheet order.
pub async fn pending_tasks(ctx: &Ctx<'_>) -> AppResult<Vec<Task>> {
    Ok(list_tasks(ctx)
        .await?
        .into_iter()
        .filter(Task::is_pending)
        .collect())
}

pub async fn add_task(
    ctx: &Ctx<'_>,
    title: &str,
    category: TaskCategory,
    memo: &str,
) -> AppResult<Task> {
    let title = require_text(title, "COMMANDS/TITLE_REQUIRED", "Task title is required")?;
    let memo = memo.trim().to_string();

    let id = ctx.repo.get_next_id(schema::TASKS).await?;
    let task = Task {
        id: id.to_string(),
        title,
        category: category.label().to_string(),
        status: TASK_STATUS_PENDING.to_string(),
        memo,
        created_at: now_jst_string(),
        completed_at: String::new(),
    };
    ctx.repo.add_row(schema::TASKS, &task.to_row()).await?;

    ctx.repo
        .log_activity(
            NewActivity::new(ActionType::TaskAdded, schema::TASKS, &task.id, &task.title)
                .change("", TASK_STATUS_PENDING)
                .details(task_details(&task.category, &task.memo)),
        )
        .await?;
    ctx.log(&format!("新規クエスト追加: {}", task.title));
    Ok(task)
}

/// Flip a task to 済 and stamp its completion time. Returns the updated
/// task and bumps the session's daily quest counter.
pub async fn complete_task(ctx: &Ctx<'_>, id: &str) -> AppResult<Task> {
    let mut task = list_tasks(ctx)
        .await?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| {
            AppError::new("COMMANDS/TASK_NOT_FOUND", "Task not found")
                .with_context("id", id.to_string())
        })?;

    let now = now_jst_string();
    ctx.repo
        .update_cell_by_id(schema::TASKS, id, "status", TASK_STATUS_DONE)
        .await?;
    ctx.repo
        .update_cell_by_id(schema::TASKS, id, "completed_at", &now)
        .await?;

    ctx.repo
        .log_activity(
            NewActivity::new(
                ActionType::TaskCompleted,
                schema::TASKS,
                &task.id,
                &task.title,
            )
            .change(TASK_STATUS_PENDING, TASK_STATUS_DONE)
            .details(task_details(&task.category, &task.memo)),
        )
        .await?;

    let quests = ctx.sessions.record_quest(ctx.session_id);
    ctx.log(&format!("クエスト完了: {}", task.title));
    tracing::info!(
        target: "cockpit",
        event = "task_completed",
        id = %task.id,
        daily_quests = quests
    );

    task.status = TASK_STATUS_DONE.to_string();
    task.completed_at = now;
    Ok(task)
}

// ---------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------

pub async fn list_projects(ctx: &Ctx<'_>, include_done: bool) -> AppResult<Vec<Project>> {
    let records = ctx.repo.get_records(schema::PROJECTS).await?;
    let projects: Vec<Project> = records
        .iter()
        .map(Project::from_record)
        .collect::<AppResult<_>>()?;
    Ok(projects
        .into_iter()
        .filter(|p| include_done || !p.is_done())
        .collect())
}

/// Dashboard ordering: active projects first, then everything that is
/// neither active nor done.
pub async fn dashboard_projects(ctx: &Ctx<'_>) -> AppResult<Vec<Project>> {
    let projects = list_projects(ctx, true).await?;
    let (active, rest): (Vec<Project>, Vec<Project>) =
        projects.into_iter().partition(Project::is_active);
    let mut out = active;
    out.extend(rest.into_iter().filter(|p| !p.is_done()));
    Ok(out)
}

pub async fn create_project(
    ctx: &Ctx<'_>,
    theme: &str,
    links: &[Link],
    memo: &str,
) -> AppResult<Project> {
    let theme = require_text(theme, "COMMANDS/THEME_REQUIRED", "Project theme is required")?;
    let now = now_jst_string();
    let memo = memo.trim().to_string();
    let memo_updated_at = if memo.is_empty() {
        String::new()
    } else {
        now.clone()
    };

    let id = ctx.repo.get_next_id(schema::PROJECTS).await?;
    let project = Project {
        id: id.to_string(),
        theme,
        status: PROJECT_STATUS_ACTIVE.to_string(),
        links: format_links(links),
        memo,
        updated_at: now.clone(),
        memo_updated_at,
    };
    ctx.repo.add_row(schema::PROJECTS, &project.to_row()).await?;

    let details = if project.memo.is_empty() {
        String::new()
    } else {
        format!("メモ: {}", project.memo)
    };
    ctx.repo
        .log_activity(
            NewActivity::new(
                ActionType::ProjectCreated,
                schema::PROJECTS,
                &project.id,
                &project.theme,
            )
            .change("", PROJECT_STATUS_ACTIVE)
            .details(details),
        )
        .await?;

    if !project.memo.is_empty() {
        ctx.repo
            .log_project_comment(&project.id, &project.theme, &project.memo, &now)
            .await?;
    }
    ctx.log(&format!("新規プロジェクト作成: {}", project.theme));
    Ok(project)
}

async fn find_project(ctx: &Ctx<'_>, id: &str) -> AppResult<Project> {
    let records = ctx.repo.get_records(schema::PROJECTS).await?;
    for record in &records {
        let project = Project::from_record(record)?;
        if project.id == id {
            return Ok(project);
        }
    }
    Err(AppError::new("COMMANDS/PROJECT_NOT_FOUND", "Project not found")
        .with_context("id", id.to_string()))
}

/// Update theme and/or status, logging one activity entry per field that
/// actually changed. `updated_at` is stamped regardless.
pub async fn update_project(
    ctx: &Ctx<'_>,
    id: &str,
    new_theme: Option<&str>,
    new_status: Option<&str>,
) -> AppResult<Project> {
    let mut project = find_project(ctx, id).await?;

    if let Some(theme) = new_theme {
        let theme =
            require_text(theme, "COMMANDS/THEME_REQUIRED", "Project theme is required")?;
        if theme != project.theme {
            ctx.repo
                .update_cell_by_id(schema::PROJECTS, id, "theme", &theme)
                .await?;
            ctx.repo
                .log_activity(
                    NewActivity::new(
                        ActionType::ProjectThemeUpdated,
                        schema::PROJECTS,
                        id,
                        &theme,
                    )
                    .change(project.theme.clone(), theme.clone()),
                )
                .await?;
            project.theme = theme;
        }
    }

    if let Some(status) = new_status {
        // Status transitions are free-form: any value may follow any other.
        let status = status.trim().to_string();
        if !status.is_empty() && status != project.status {
            ctx.repo
                .update_cell_by_id(schema::PROJECTS, id, "status", &status)
                .await?;
            ctx.repo
                .log_activity(
                    NewActivity::new(
                        ActionType::ProjectStatusUpdated,
                        schema::PROJECTS,
                        id,
                        &project.theme,
                    )
                    .change(project.status.clone(), status.clone()),
                )
                .await?;
            project.status = status;
        }
    }

    let now = now_jst_string();
    ctx.repo
        .update_cell_by_id(schema::PROJECTS, id, "updated_at", &now)
        .await?;
    project.updated_at = now;
    Ok(project)
}

/// Replace a project's links and memo. A changed memo also stamps
/// `memo_updated_at`, logs the comment activity, and appends the comment
/// history snapshot.
pub async fn save_project_details(
    ctx: &Ctx<'_>,
    id: &str,
    links: &[Link],
    memo: &str,
) -> AppResult<Project> {
    let mut project = find_project(ctx, id).await?;
    let formatted = format_links(links);
    let memo = memo.trim_end().to_string();

    ctx.repo
        .update_cell_by_id(schema::PROJECTS, id, "links", &formatted)
        .await?;
    ctx.repo
        .update_cell_by_id(schema::PROJECTS, id, "memo", &memo)
        .await?;

    if memo != project.memo {
        let now = now_jst_string();
        ctx.repo
            .update_cell_by_id(schema::PROJECTS, id, "memo_updated_at", &now)
            .await?;
        ctx.repo
            .log_activity(
                NewActivity::new(
                    ActionType::ProjectCommentUpdated,
                    schema::PROJECTS,
                    id,
                    &project.theme,
                )
                .change(project.memo.clone(), memo.clone()),
            )
            .await?;
        ctx.repo
            .log_project_comment(id, &project.theme, &memo, &now)
            .await?;
        ctx.log(&format!("プロジェクトメモ更新: {}", project.theme));
        project.memo_updated_at = now;
    }

    project.links = formatted;
    project.memo = memo;
    Ok(project)
}

// ---------------------------------------------------------------------
// Ideas
// ---------------------------------------------------------------------

/// Ideas, newest first, optionally filtered by a case-insensitive
/// keyword on the content.
pub async fn list_ideas(ctx: &Ctx<'_>, keyword: Option<&str>) -> AppResult<Vec<Idea>> {
    let records = ctx.repo.get_records(schema::IDEAS).await?;
    let mut ideas: Vec<Idea> = records
        .iter()
        .map(Idea::from_record)
        .collect::<AppResult<_>>()?;
    if let Some(keyword) = keyword {
        let needle = keyword.to_lowercase();
        ideas.retain(|idea| idea.content.to_lowercase().contains(&needle));
    }
    ideas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(ideas)
}

pub async fn add_idea(ctx: &Ctx<'_>, content: &str) -> AppResult<Idea> {
    let content = require_text(content, "COMMANDS/CONTENT_REQUIRED", "Idea content is required")?;
    let id = ctx.repo.get_next_id(schema::IDEAS).await?;
    let idea = Idea {
        id: id.to_string(),
        content,
        created_at: now_jst_string(),
    };
    ctx.repo.add_row(schema::IDEAS, &idea.to_row()).await?;

    ctx.repo
        .log_activity(
            NewActivity::new(
                ActionType::IdeaAdded,
                schema::IDEAS,
                &idea.id,
                truncate_label(&idea.content, ENTITY_NAME_CHARS),
            )
            .change("", idea.content.clone()),
        )
        .await?;
    ctx.log(&format!(
        "新規アイデア追加: {}",
        truncate_label(&idea.content, 20)
    ));
    Ok(idea)
}

pub async fn edit_idea(ctx: &Ctx<'_>, id: &str, content: &str) -> AppResult<Idea> {
    let content = require_text(content, "COMMANDS/CONTENT_REQUIRED", "Idea content is required")?;
    let records = ctx.repo.get_records(schema::IDEAS).await?;
    let mut idea = records
        .iter()
        .map(Idea::from_record)
        .collect::<AppResult<Vec<_>>>()?
        .into_iter()
        .find(|idea| idea.id == id)
        .ok_or_else(|| {
            AppError::new("COMMANDS/IDEA_NOT_FOUND", "Idea not found")
                .with_context("id", id.to_string())
        })?;

    ctx.repo
        .update_cell_by_id(schema::IDEAS, id, "content", &content)
        .await?;
    ctx.repo
        .log_activity(
            NewActivity::new(
                ActionType::IdeaEdited,
                schema::IDEAS,
                id,
                truncate_label(&content, ENTITY_NAME_CHARS),
            )
            .change(idea.content.clone(), content.clone()),
        )
        .await?;
    ctx.log(&format!("アイデア編集: id={id}"));

    idea.content = content;
    Ok(idea)
}

/// Hard delete. The activity log intentionally records nothing here; the
/// row simply disappears and its id leaves a gap.
pub async fn delete_idea(ctx: &Ctx<'_>, id: &str) -> AppResult<()> {
    ctx.repo.delete_row_by_id(schema::IDEAS, id).await?;
    ctx.log(&format!("アイデア削除: id={id}"));
    Ok(())
}

// ---------------------------------------------------------------------
// Shortcuts
// ---------------------------------------------------------------------

/// Bookmark shortcuts, read-only reference data. `header_only` narrows to
/// the quick-launch row.
pub async fn list_shortcuts(ctx: &Ctx<'_>, header_only: bool) -> AppResult<Vec<Shortcut>> {
    let records = ctx.repo.get_records(schema::SHORTCUTS).await?;
    let shortcuts: Vec<Shortcut> = records
        .iter()
        .map(Shortcut::from_record)
        .collect::<AppResult<_>>()?;
    Ok(shortcuts
        .into_iter()
        .filter(|s| !header_only || s.is_header_placement())
        .collect())
}
