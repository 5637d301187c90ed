//! Numbered task manager menu.

use std::io::{self, BufRead, Write};

use ragdesk_core::{break_down_task, LoadOutcome, Storage, TaskManager, LLM};

/// An entry of the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    Add,
    List,
    Complete,
    Delete,
    Exit,
    Save,
    Load,
    BreakDown,
}

impl MenuChoice {
    fn from_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(Self::Add),
            2 => Some(Self::List),
            3 => Some(Self::Complete),
            4 => Some(Self::Delete),
            5 => Some(Self::Exit),
            6 => Some(Self::Save),
            7 => Some(Self::Load),
            8 => Some(Self::BreakDown),
            _ => None,
        }
    }
}

const MENU: &str = "\nTask Manager
1. Add Task
2. List Tasks
3. Complete Task
4. Delete Task
5. Exit
6. Save Tasks
7. Load Tasks
8. Break Down Task (AI)";

/// Reads prompts from `input` and writes everything to `output`.
struct Console<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> Console<'_, R, W> {
    /// Prints `prompt` and reads one line. `None` on end of input.
    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Reads an integer, reporting bad input. `Some(None)` means the line
    /// was not a number.
    fn prompt_int(&mut self, prompt: &str) -> io::Result<Option<Option<i64>>> {
        let Some(line) = self.prompt(prompt)? else {
            return Ok(None);
        };
        match line.trim().parse() {
            Ok(n) => Ok(Some(Some(n))),
            Err(_) => {
                writeln!(self.output, "Invalid ID. Please enter a number.")?;
                Ok(Some(None))
            }
        }
    }

    fn say(&mut self, text: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }
}

/// Runs the menu until the user exits or input ends.
pub async fn run_menu<R, W, S>(
    input: &mut R,
    output: &mut W,
    manager: &mut TaskManager<S>,
    llm: Option<&dyn LLM>,
    default_file: &str,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    S: Storage,
{
    let mut console = Console { input, output };

    loop {
        console.say(MENU)?;
        let Some(choice) = console.prompt_int("Choose an option: ")? else {
            console.say("")?;
            return Ok(());
        };

        match choice.and_then(MenuChoice::from_number) {
            Some(MenuChoice::Exit) => {
                console.say("Exiting Task Manager.")?;
                return Ok(());
            }
            Some(choice) => {
                if !handle_choice(&mut console, choice, manager, llm, default_file).await? {
                    return Ok(());
                }
            }
            None => console.say("Invalid choice. Please try again.")?,
        }
    }
}

/// Runs one menu action. Returns `false` when input ended mid-action.
async fn handle_choice<R: BufRead, W: Write, S: Storage>(
    console: &mut Console<'_, R, W>,
    choice: MenuChoice,
    manager: &mut TaskManager<S>,
    llm: Option<&dyn LLM>,
    default_file: &str,
) -> io::Result<bool> {
    match choice {
        MenuChoice::Add => {
            let Some(title) = console.prompt("Enter task title: ")? else {
                return Ok(false);
            };
            let Some(description) = console.prompt("Enter task description: ")? else {
                return Ok(false);
            };
            let task = manager.add_task(&title, &description);
            let message = format!("Task '{}' added with ID {}.", task.title, task.id);
            console.say(message)?;
        }
        MenuChoice::List => {
            let tasks = manager.list_tasks();
            if tasks.is_empty() {
                console.say("No tasks available.")?;
            }
            for task in tasks {
                console.say(format!("ID: {} - {}", task.id, task))?;
                console.say("-".repeat(20))?;
            }
        }
        MenuChoice::Complete => {
            let Some(id) = console.prompt_int("Enter task ID to complete: ")? else {
                return Ok(false);
            };
            if let Some(id) = id.and_then(|n| u64::try_from(n).ok()) {
                match manager.complete_task(id) {
                    Ok(_) => console.say(format!("Task ID {} marked as completed.", id))?,
                    Err(e) => console.say(e)?,
                }
            } else if let Some(n) = id {
                console.say(format!("Task ID {} not found.", n))?;
            }
        }
        MenuChoice::Delete => {
            let Some(id) = console.prompt_int("Enter task ID to delete: ")? else {
                return Ok(false);
            };
            if let Some(id) = id.and_then(|n| u64::try_from(n).ok()) {
                match manager.delete_task(id) {
                    Ok(_) => console.say(format!("Task ID {} deleted.", id))?,
                    Err(e) => console.say(e)?,
                }
            } else if let Some(n) = id {
                console.say(format!("Task ID {} not found.", n))?;
            }
        }
        MenuChoice::Save => {
            let Some(name) = console.prompt("Enter filename to save tasks: ")? else {
                return Ok(false);
            };
            let filename = or_default(&name, default_file);
            match manager.save_tasks(filename) {
                Ok(()) => console.say(format!("Tasks saved to {}.", filename))?,
                Err(e) => console.say(format!("Error: {}", e))?,
            }
        }
        MenuChoice::Load => {
            let Some(name) = console.prompt("Enter filename to load tasks from: ")? else {
                return Ok(false);
            };
            let filename = or_default(&name, default_file);
            match manager.load_tasks(filename) {
                Ok(LoadOutcome::Missing) => {
                    console.say(format!("No saved tasks found in {}.", filename))?;
                }
                Ok(LoadOutcome::Loaded(count)) => {
                    console.say(format!("Loaded {} tasks from {}.", count, filename))?;
                    console.say(format!("Tasks loaded from {}.", filename))?;
                }
                Err(e) => console.say(format!("Error: {}", e))?,
            }
        }
        MenuChoice::BreakDown => {
            let Some(task) = console.prompt("Enter a task to break down: ")? else {
                return Ok(false);
            };
            let Some(llm) = llm else {
                console.say("AI breakdown is unavailable. Set an API key and try again.")?;
                return Ok(true);
            };
            match break_down_task(llm, &task).await {
                Ok(result) => {
                    console.say("\nAI-generated breakdown:")?;
                    console.say(result)?;
                }
                Err(e) => console.say(format!("Error: {}", e))?,
            }
        }
        MenuChoice::Exit => return Ok(false),
    }

    Ok(true)
}

fn or_default<'a>(name: &'a str, default_file: &'a str) -> &'a str {
    let name = name.trim();
    if name.is_empty() {
        default_file
    } else {
        name
    }
}
