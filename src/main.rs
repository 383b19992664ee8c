use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cockpit_lib::commands;
use cockpit_lib::config::AppConfig;
use cockpit_lib::links::{parse_links, Link};
use cockpit_lib::model::TaskCategory;
use cockpit_lib::repo::Repo;
use cockpit_lib::report;
use cockpit_lib::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "cockpit", about = "Creator's cockpit over a remote spreadsheet", version)]
struct Cli {
    /// Optional explicit config path (default: $COCKPIT_CONFIG, then the
    /// user config directory).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Session id used for the quest counter and the event log.
    #[arg(long, default_value = "cli", global = true)]
    session: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Dashboard summary: pending tasks, active projects, last report.
    Status,
    /// Task ("quest") management.
    #[command(subcommand)]
    Tasks(TaskCommand),
    /// Project management.
    #[command(subcommand)]
    Projects(ProjectCommand),
    /// Idea stock.
    #[command(subcommand)]
    Ideas(IdeaCommand),
    /// Bookmark shortcuts.
    #[command(subcommand)]
    Shortcuts(ShortcutCommand),
    /// Activity report generation.
    #[command(subcommand)]
    Report(ReportCommand),
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    /// List tasks; pending only unless --all is given.
    List {
        #[arg(long)]
        all: bool,
    },
    /// Register a new task.
    Add {
        title: String,
        /// Category label (制作, 開発, 学習, 事務, その他).
        #[arg(long, default_value = "その他")]
        category: String,
        #[arg(long, default_value = "")]
        memo: String,
    },
    /// Mark a task as completed.
    Done { id: String },
}

#[derive(Debug, Subcommand)]
enum ProjectCommand {
    /// List projects; completed ones only with --all.
    List {
        #[arg(long)]
        all: bool,
    },
    /// Create a project.
    Create {
        theme: String,
        /// Link entry, repeatable ("label: url", markdown, or a bare url).
        #[arg(long = "link")]
        links: Vec<String>,
        #[arg(long, default_value = "")]
        memo: String,
    },
    /// Update theme and/or status.
    Update {
        id: String,
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Replace a project's links and memo.
    SetDetails {
        id: String,
        #[arg(long = "link")]
        links: Vec<String>,
        #[arg(long, default_value = "")]
        memo: String,
    },
}

#[derive(Debug, Subcommand)]
enum IdeaCommand {
    /// List ideas, newest first.
    List {
        #[arg(long)]
        keyword: Option<String>,
    },
    Add { content: String },
    Edit { id: String, content: String },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum ShortcutCommand {
    /// List shortcuts; --header narrows to the quick-launch row.
    List {
        #[arg(long)]
        header: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ReportCommand {
    /// Render the pending delta without advancing the watermark.
    Preview,
    /// Advance the watermark to now.
    Confirm,
}

#[tokio::main]
async fn main() {
    cockpit_lib::init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let path = AppConfig::resolve_path(cli.config).context("resolve config path")?;
    let config = AppConfig::load(&path).context("load configuration")?;
    let store = config.store_handle().context("build store client")?;
    let state = AppState::new(Repo::new(store));
    let ctx = state.ctx(&cli.session);

    match cli.command {
        Commands::Status => {
            let pending = commands::pending_tasks(&ctx).await?;
            let projects = commands::dashboard_projects(&ctx).await?;
            let last_report = report::last_report_at(state.repo.as_ref()).await?;
            println!("Creator's Cockpit");
            println!("Pending quests   : {}", pending.len());
            println!("Active projects  : {}", projects.len());
            println!("Last report      : {}", short_time(&last_report));
            Ok(0)
        }
        Commands::Tasks(command) => handle_tasks(&ctx, command).await,
        Commands::Projects(command) => handle_projects(&ctx, command).await,
        Commands::Ideas(command) => handle_ideas(&ctx, command).await,
        Commands::Shortcuts(command) => handle_shortcuts(&ctx, command).await,
        Commands::Report(command) => handle_report(&state, command).await,
    }
}

/// Shorten a stored timestamp to `MM-DD HH:MM` for the status line.
fn short_time(value: &str) -> String {
    if value.len() > 10 {
        value
            .get(5..16)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string())
    } else {
        value.to_string()
    }
}

fn parse_link_args(raw: &[String]) -> Vec<Link> {
    raw.iter().flat_map(|entry| parse_links(entry)).collect()
}

async fn handle_tasks(ctx: &commands::Ctx<'_>, command: TaskCommand) -> Result<i32> {
    match command {
        TaskCommand::List { all } => {
            let tasks = if all {
                commands::list_tasks(ctx).await?
            } else {
                commands::pending_tasks(ctx).await?
            };
            if tasks.is_empty() {
                println!("No tasks.");
                return Ok(0);
            }
            for task in tasks {
                let icon = TaskCategory::icon_for(&task.category);
                let memo = if task.memo.is_empty() {
                    String::new()
                } else {
                    format!(" : {}", task.memo)
                };
                println!("[{}] {} {} {}{}", task.id, task.status, icon, task.title, memo);
            }
            Ok(0)
        }
        TaskCommand::Add {
            title,
            category,
            memo,
        } => {
            let category: TaskCategory = category.parse().context("parse task category")?;
            let task = commands::add_task(ctx, &title, category, &memo).await?;
            println!("Added task {} ({})", task.id, task.title);
            Ok(0)
        }
        TaskCommand::Done { id } => {
            let task = commands::complete_task(ctx, &id).await?;
            println!("Completed task {} ({})", task.id, task.title);
            Ok(0)
        }
    }
}

async fn handle_projects(ctx: &commands::Ctx<'_>, command: ProjectCommand) -> Result<i32> {
    match command {
        ProjectCommand::List { all } => {
            let projects = commands::list_projects(ctx, all).await?;
            if projects.is_empty() {
                println!("No projects.");
                return Ok(0);
            }
            for project in projects {
                println!("[{}] {} ({})", project.id, project.theme, project.status);
                for link in parse_links(&project.links) {
                    if link.label.is_empty() {
                        println!("    🔗 {}", link.url);
                    } else {
                        println!("    🔗 {}: {}", link.label, link.url);
                    }
                }
                if !project.memo.is_empty() {
                    println!("    💬 {}", project.memo.replace('\n', " / "));
                }
            }
            Ok(0)
        }
        ProjectCommand::Create { theme, links, memo } => {
            let links = parse_link_args(&links);
            let project = commands::create_project(ctx, &theme, &links, &memo).await?;
            println!("Created project {} ({})", project.id, project.theme);
            Ok(0)
        }
        ProjectCommand::Update { id, theme, status } => {
            let project =
                commands::update_project(ctx, &id, theme.as_deref(), status.as_deref()).await?;
            println!("Updated project {} ({})", project.id, project.status);
            Ok(0)
        }
        ProjectCommand::SetDetails { id, links, memo } => {
            let links = parse_link_args(&links);
            let project = commands::save_project_details(ctx, &id, &links, &memo).await?;
            println!("Saved details for project {}", project.id);
            Ok(0)
        }
    }
}

async fn handle_ideas(ctx: &commands::Ctx<'_>, command: IdeaCommand) -> Result<i32> {
    match command {
        IdeaCommand::List { keyword } => {
            let ideas = commands::list_ideas(ctx, keyword.as_deref()).await?;
            if ideas.is_empty() {
                println!("No ideas.");
                return Ok(0);
            }
            for idea in ideas {
                println!("[{}] {} ({})", idea.id, idea.content, idea.created_at);
            }
            Ok(0)
        }
        IdeaCommand::Add { content } => {
            let idea = commands::add_idea(ctx, &content).await?;
            println!("Added idea {}", idea.id);
            Ok(0)
        }
        IdeaCommand::Edit { id, content } => {
            commands::edit_idea(ctx, &id, &content).await?;
            println!("Updated idea {id}");
            Ok(0)
        }
        IdeaCommand::Delete { id } => {
            commands::delete_idea(ctx, &id).await?;
            println!("Deleted idea {id}");
            Ok(0)
        }
    }
}

async fn handle_shortcuts(ctx: &commands::Ctx<'_>, command: ShortcutCommand) -> Result<i32> {
    match command {
        ShortcutCommand::List { header } => {
            let shortcuts = commands::list_shortcuts(ctx, header).await?;
            if shortcuts.is_empty() {
                println!("No shortcuts.");
                return Ok(0);
            }
            for shortcut in shortcuts {
                let category = if shortcut.category.trim().is_empty() {
                    "その他".to_string()
                } else {
                    shortcut.category.clone()
                };
                println!(
                    "{} {} [{}] {}",
                    shortcut.icon, shortcut.label, category, shortcut.url
                );
            }
            Ok(0)
        }
    }
}

async fn handle_report(state: &AppState, command: ReportCommand) -> Result<i32> {
    match command {
        ReportCommand::Preview => {
            let built = report::build_report(state.repo.as_ref()).await?;
            println!("前回のセーブ日時: {}", built.watermark);
            println!();
            println!("{}", built.markdown);
            Ok(0)
        }
        ReportCommand::Confirm => {
            let watermark = report::confirm_report(state.repo.as_ref()).await?;
            println!("セーブ完了: 基準日時を {watermark} に更新しました");
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_time_trims_full_timestamps() {
        assert_eq!(short_time("2024-05-01 09:30:00"), "05-01 09:30");
        assert_eq!(short_time("未記録"), "未記録");
    }

    #[test]
    fn link_args_accept_every_entry_shape() {
        let raw = vec![
            "Note: https://note.com/x".to_string(),
            "[blog](https://blog.example)".to_string(),
            "https://a.b".to_string(),
        ];
        let links = parse_link_args(&raw);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].label, "Note");
        assert_eq!(links[2].label, "");
    }

    #[test]
    fn action_icons_are_wired_for_the_report_preview() {
        use cockpit_lib::model::ActionType;
        assert_eq!(ActionType::icon_for("タスク追加"), "➕");
    }
}
