//! Interactive terminal conversation over the chat orchestrator.
//!
//! Plain lines are sent to the agent. `:N` clicks follow-up chip N,
//! `:export` saves the latest export, `:quit` exits. The reset command is
//! handled by the orchestrator like any other message.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, BufReader};

use finch_chat::{ChatError, ChatOrchestrator, ExportReplayer, ExportedFile, Turn};
use finch_core::error::{FinchError, Result};
use finch_core::FinchConfig;

/// One parsed line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Quit,
    Help,
    Export,
    /// 1-based follow-up chip index.
    Chip(usize),
    Text(String),
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix(':') else {
        return Input::Text(line.to_string());
    };
    match command.trim().to_lowercase().as_str() {
        "q" | "quit" | "exit" => Input::Quit,
        "h" | "help" => Input::Help,
        "export" => Input::Export,
        other => match other.parse::<usize>() {
            Ok(n) if n > 0 => Input::Chip(n),
            _ => Input::Unknown(line.to_string()),
        },
    }
}

/// Agent turn as printed to the terminal.
pub fn render_turn(turn: &Turn) -> String {
    let mut out = format!("agent> {}", turn.text);
    if let Some(ref chart) = turn.chart_reference {
        out.push_str(&format!("\n  chart: {}", chart));
    }
    if turn.export_reference.is_some() {
        out.push_str("\n  export available (:export)");
    }
    out
}

/// Numbered follow-up chips, or `None` when there are none.
pub fn render_followups(followups: &[String]) -> Option<String> {
    if followups.is_empty() {
        return None;
    }
    let chips: Vec<String> = followups
        .iter()
        .enumerate()
        .map(|(i, f)| format!("[{}] {}", i + 1, f))
        .collect();
    Some(format!("  {}", chips.join("  ")))
}

/// Write an exported file into `dir`, creating it if needed.
pub fn save_export(dir: &Path, file: &ExportedFile) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let name = Path::new(&file.filename)
        .file_name()
        .ok_or_else(|| FinchError::Chat(format!("invalid export filename: {}", file.filename)))?;
    let path = dir.join(name);
    std::fs::write(&path, &file.bytes)?;
    Ok(path)
}

const HELP: &str = "Type a question and press enter.\n  \
    :N       send follow-up suggestion N\n  \
    :export  download the latest CSV export\n  \
    reset    forget the current context\n  \
    :quit    exit";

/// Run the conversation loop until EOF or `:quit`.
pub async fn run(config: &FinchConfig) -> Result<()> {
    let orchestrator = ChatOrchestrator::from_config(config)?;
    let replayer = ExportReplayer::from_config(&config.chat)
        .map_err(|e| FinchError::Chat(e.to_string()))?;
    let download_dir = PathBuf::from(&config.chat.download_dir);

    tracing::info!(
        session_id = %orchestrator.session_id(),
        proxy = %config.chat.proxy_base,
        company_id = config.chat.company_id,
        "Chat session started"
    );
    println!("Finch chat. Type :help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let result = match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => {
                println!("{}", HELP);
                continue;
            }
            Input::Unknown(cmd) => {
                println!("Unknown command {}. Type :help for commands.", cmd);
                continue;
            }
            Input::Export => {
                match orchestrator.export_latest(&replayer).await {
                    Ok(file) => match save_export(&download_dir, &file) {
                        Ok(path) => println!("Saved {} ({} bytes)", path.display(), file.bytes.len()),
                        Err(e) => eprintln!("Could not save export: {}", e),
                    },
                    Err(ChatError::NoExport) => println!("Nothing to export yet."),
                    Err(e) => eprintln!("Export failed: {}", e),
                }
                continue;
            }
            Input::Chip(n) => {
                let followups = orchestrator.followups()?;
                match followups.get(n - 1) {
                    Some(label) => {
                        println!("you> {}", label);
                        orchestrator.send_followup(label).await
                    }
                    None => {
                        println!("No follow-up #{}.", n);
                        continue;
                    }
                }
            }
            Input::Text(text) => orchestrator.send(&text).await,
        };

        match result {
            Ok(turn) => {
                println!("{}", render_turn(&turn));
                if let Some(chips) = render_followups(&orchestrator.followups()?) {
                    println!("{}", chips);
                }
            }
            Err(ChatError::Dispatch(e)) => println!("agent> Oops: {}", e.user_message()),
            Err(ChatError::Superseded(_)) | Err(ChatError::EmptyMessage) => {}
            Err(ChatError::Busy) => println!("Still waiting for the previous answer."),
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(session_id = %orchestrator.session_id(), "Chat session ended");
    Ok(())
}

fn print_prompt() {
    use std::io::Write;
    print!("you> ");
    let _ = std::io::stdout().flush();
}
