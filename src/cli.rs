use std::{error::Error, io::Write};

use clap::Subcommand;

use crate::{app::TodoApp, task::DEFAULT_TIME};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print all tasks in order
    List,
    /// Add a task
    Add {
        text: String,
        /// Due time, e.g. "02:30 PM"
        #[arg(long, default_value = DEFAULT_TIME)]
        time: String,
        /// Optional image path
        #[arg(long, default_value = "")]
        image: String,
    },
    /// Delete every task with this text and due time
    Delete {
        text: String,
        #[arg(long)]
        time: String,
    },
}

pub fn run_command(
    app: &mut TodoApp,
    command: Command,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    match command {
        Command::List => {
            if app.tasks().is_empty() {
                writeln!(out, "No tasks")?;
            }
            for (index, task) in app.tasks().iter().enumerate() {
                write!(out, "{}. {}  {}", index + 1, task.time, task.text)?;
                if let Some(image) = task.image() {
                    write!(out, "  [{}]", image)?;
                }
                writeln!(out)?;
            }
        }
        Command::Add { text, time, image } => match app.add_task(&text, &time, &image)? {
            Some(id) => writeln!(out, "Added {}", id)?,
            None => writeln!(out, "Nothing added: task text is empty")?,
        },
        Command::Delete { text, time } => {
            let removed = app.delete_task(&text, &time)?;
            writeln!(out, "Deleted {} task(s)", removed)?;
        }
    }
    Ok(())
}
