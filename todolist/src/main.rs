use std::{path::PathBuf, rc::Rc};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use todolist::editor::DetailEditor;
use todolist::reminders::ReminderAuthorizer;
use todolist::{
    ItemStore, JsonFileRepository, ListController, StaticAuthorizer, format_due, parse_due,
    resolve_data_file,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "todolist",
    about = "Keep an ordered to-do list in a local JSON file",
    version
)]
struct Cli {
    /// Enable verbose logging for debugging.
    #[arg(long, global = true)]
    verbose: bool,
    /// JSON file holding the list. Defaults to the platform data directory.
    #[arg(long, global = true, env = "TODOLIST_FILE")]
    file: Option<PathBuf>,
    /// Behave as if reminder notifications were not allowed.
    #[arg(long, global = true)]
    notifications_denied: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the list in order.
    List(ListArgs),

    /// Print a single item.
    Show(ShowArgs),

    /// Append a new item.
    Add(AddArgs),

    /// Change fields of an existing item.
    Edit(EditArgs),

    /// Remove an item.
    Delete(DeleteArgs),

    /// Move an item to another position.
    Move(MoveArgs),

    /// Print the path of the data file in use.
    Path,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Emit JSON instead of a human-readable list.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ShowArgs {
    index: usize,
    /// Emit JSON instead of a human-readable record.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct AddArgs {
    name: String,
    /// Due date: YYYY-MM-DD [HH:MM], RFC 3339, or an offset like +2h / +3d. Defaults to +1d.
    #[arg(long)]
    due: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    /// Turn the reminder on.
    #[arg(long)]
    reminder: bool,
}

#[derive(Debug, Args)]
struct EditArgs {
    index: usize,
    #[arg(long)]
    name: Option<String>,
    /// Due date: YYYY-MM-DD [HH:MM], RFC 3339, or an offset like +2h / +3d.
    #[arg(long)]
    due: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long, value_enum)]
    reminder: Option<Toggle>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Debug, Args)]
struct DeleteArgs {
    index: usize,
}

#[derive(Debug, Args)]
struct MoveArgs {
    from: usize,
    /// Destination, counted after the item has been taken out.
    to: usize,
}

type Controller = ListController<JsonFileRepository>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = resolve_data_file(cli.file)
        .context("no data directory on this platform; pass --file or set TODOLIST_FILE")?;

    if let Commands::Path = cli.command {
        println!("{}", path.display());
        return Ok(());
    }

    let authorizer: Rc<dyn ReminderAuthorizer> = if cli.notifications_denied {
        Rc::new(StaticAuthorizer::denied())
    } else {
        Rc::new(StaticAuthorizer::allowed())
    };
    let mut controller = open_controller(path, authorizer);

    match cli.command {
        Commands::List(args) => handle_list(&controller, args),
        Commands::Show(args) => handle_show(&controller, args),
        Commands::Add(args) => handle_add(&mut controller, args),
        Commands::Edit(args) => handle_edit(&mut controller, args),
        Commands::Delete(args) => handle_delete(&mut controller, args),
        Commands::Move(args) => handle_move(&mut controller, args),
        Commands::Path => Ok(()),
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_controller(path: PathBuf, authorizer: Rc<dyn ReminderAuthorizer>) -> Controller {
    tracing::debug!(path = %path.display(), "opening list");
    ListController::new(ItemStore::open(JsonFileRepository::new(path)), authorizer)
}

fn handle_list(controller: &Controller, args: ListArgs) -> Result<()> {
    let rows = controller.rows(&Local);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        eprintln!("The list is empty.");
        return Ok(());
    }
    for row in rows {
        let check = if row.completed { "[x]" } else { "[ ]" };
        let bell = if row.reminder_set { " (reminder)" } else { "" };
        println!("{:>3} {} {:<18} {}{}", row.index, check, row.due, row.name, bell);
    }
    Ok(())
}

fn handle_show(controller: &Controller, args: ShowArgs) -> Result<()> {
    let item = controller.item(args.index)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(item)?);
        return Ok(());
    }
    println!("name:      {}", item.name);
    println!("due:       {}", format_due(&item.date, &Local));
    println!("reminder:  {}", if item.reminder_set { "on" } else { "off" });
    println!("completed: {}", if item.completed { "yes" } else { "no" });
    if !item.notes.is_empty() {
        println!("notes:");
        for line in item.notes.lines() {
            println!("  {line}");
        }
    }
    Ok(())
}

fn handle_add(controller: &mut Controller, args: AddArgs) -> Result<()> {
    let AddArgs {
        name,
        due,
        notes,
        reminder,
    } = args;

    let mut editor = controller.begin_add(Utc::now())?;
    editor.set_name(name);
    if let Some(due) = due {
        editor.set_date(parse_due(&due, &Local::now())?);
    }
    if let Some(notes) = notes {
        editor.set_notes(notes);
    }
    if reminder {
        editor.set_reminder(true);
    }
    let index = commit(controller, editor)?;
    let item = controller.item(index)?;
    println!("Added #{index}: {} (due {})", item.name, format_due(&item.date, &Local));
    Ok(())
}

fn handle_edit(controller: &mut Controller, args: EditArgs) -> Result<()> {
    let EditArgs {
        index,
        name,
        due,
        notes,
        reminder,
    } = args;

    let mut editor = controller.begin_edit(index)?;
    if let Some(name) = name {
        editor.set_name(name);
    }
    if let Some(due) = due {
        editor.set_date(parse_due(&due, &Local::now())?);
    }
    if let Some(notes) = notes {
        editor.set_notes(notes);
    }
    if let Some(toggle) = reminder {
        editor.set_reminder(matches!(toggle, Toggle::On));
    }
    let index = commit(controller, editor)?;
    println!("Updated #{index}: {}", controller.item(index)?.name);
    Ok(())
}

fn handle_delete(controller: &mut Controller, args: DeleteArgs) -> Result<()> {
    let removed = controller.delete(args.index)?;
    ensure_saved(controller)?;
    println!("Deleted #{}: {}", args.index, removed.name);
    Ok(())
}

fn handle_move(controller: &mut Controller, args: MoveArgs) -> Result<()> {
    controller.move_item(args.from, args.to)?;
    ensure_saved(controller)?;
    println!("Moved #{} to #{}", args.from, args.to);
    Ok(())
}

/// Settle the permission check, confirm the editor and write the result back.
fn commit(controller: &mut Controller, mut editor: DetailEditor) -> Result<usize> {
    if let Some(notice) = editor.poll_authorization() {
        eprintln!("warning: {}. {}", notice.title(), notice.message());
    }
    let outcome = editor.confirm()?;
    let index = controller
        .finish(outcome)?
        .context("editor produced no item")?;
    ensure_saved(controller)?;
    Ok(index)
}

/// A one-shot command that could not write its change has done nothing useful.
fn ensure_saved(controller: &Controller) -> Result<()> {
    if !controller.store().is_persisted() {
        anyhow::bail!(
            "could not write {:?}; the change was not saved",
            controller.store().repository().path()
        );
    }
    Ok(())
}
