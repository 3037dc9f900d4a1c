//! Interactive question loop for the terminal.

use anyhow::Result;
use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::pipeline::Pipeline;

const BANNER: &str = "\
TravelBot — military travel regulation assistant
Do not enter names, SSNs, DoD ID numbers, or other personal or
operationally sensitive information. Questions are logged for review.
Type 'help' for commands, 'exit' to quit.";

const HELP: &str = "\
Commands:
  help      show this message
  history   show questions asked this session
  exit      quit (also: quit)
Anything else is treated as a question.";

#[derive(Debug, PartialEq, Eq)]
enum ChatCommand {
    Empty,
    Exit,
    Help,
    History,
    Question,
}

/// Command words are matched case-insensitively; anything else is a
/// question, passed through verbatim.
fn classify(input: &str) -> ChatCommand {
    match input.trim().to_lowercase().as_str() {
        "" => ChatCommand::Empty,
        "exit" | "quit" => ChatCommand::Exit,
        "help" => ChatCommand::Help,
        "history" => ChatCommand::History,
        _ => ChatCommand::Question,
    }
}

pub async fn run_chat(pipeline: Arc<Pipeline>) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut history: Vec<String> = Vec::new();

    println!("{}", BANNER);

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();

        match classify(input) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => break,
            ChatCommand::Help => println!("{}", HELP),
            ChatCommand::History => {
                if history.is_empty() {
                    println!("No questions asked yet.");
                } else {
                    for (i, question) in history.iter().enumerate() {
                        println!("{}. {}", i + 1, question);
                    }
                }
            }
            ChatCommand::Question => {
                history.push(input.to_string());
                let answer = pipeline.answer(input).await;
                println!("\n{}\n", answer);
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}
