//! Interactive question loop for the CLI.
//!
//! Reads questions from stdin and answers them through the shared query
//! engine. Per-query errors are reported and the loop continues; only EOF
//! or an exit command ends the session.

use std::io::{BufRead, Write};

use crate::engine::QueryEngine;

pub async fn run_chat(engine: &QueryEngine, restaurant: &str) -> anyhow::Result<()> {
    println!("CAG — context-augmented answers about {restaurant}");
    println!("Type a question, 'help' for commands, or 'quit' to exit.");
    println!();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let query = line.trim();

        match query {
            "" => continue,
            "help" => {
                println!("Commands:");
                println!("  <question>     ask anything about {restaurant}'s menu");
                println!("  help           show this help message");
                println!("  quit / exit    leave the session");
                continue;
            }
            "quit" | "exit" | "q" => break,
            _ => {}
        }

        match engine.process_query(query).await {
            Ok(outcome) => {
                println!();
                println!("{}", outcome.answer);

                let mut sources: Vec<&str> = Vec::new();
                for ctx in &outcome.initial_context {
                    if !sources.contains(&ctx.source.as_str()) {
                        sources.push(&ctx.source);
                    }
                }
                if !sources.is_empty() {
                    println!();
                    println!("sources: {}", sources.join(", "));
                }
                println!();
            }
            Err(e) => {
                eprintln!("error: {e}");
                eprintln!("Please try again with a different question.");
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}
