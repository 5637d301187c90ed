//! Terminal chat with the RAG agent.

use std::io::{self, Write};
use std::time::Duration;

use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use ragdesk_core::llm::StreamChunk;
use ragdesk_core::RagAgent;

const HELP: &str = "Commands: /status, /clear, /search <query>, /quit";

/// Reads messages from stdin and streams replies until EOF or `/quit`.
pub async fn run(agent: &mut RagAgent) -> Result<()> {
    run_with(agent, BufReader::new(tokio::io::stdin())).await
}

async fn run_with<R: AsyncBufRead + Unpin>(agent: &mut RagAgent, input: R) -> Result<()> {
    println!("Chat with the assistant. {}", HELP);
    let mut lines = input.lines();

    loop {
        print!("\nYou: ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let message = line.trim();
        match message {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/clear" => {
                agent.clear_conversation_history();
                println!("Chat history cleared.");
            }
            "/status" => {
                println!("Documents in knowledge base: {}", agent.knowledge_base_info().document_count);
            }
            _ if message.starts_with("/search ") => {
                let query = message.trim_start_matches("/search ").trim();
                match agent.search(query).await {
                    Ok(hits) if hits.is_empty() => println!("No relevant documents found."),
                    Ok(hits) => {
                        for (i, hit) in hits.iter().enumerate() {
                            let source = hit.metadata.get("source").map(String::as_str).unwrap_or("Unknown");
                            println!("[{}] {} (score {:.2})\n{}\n", i + 1, source, hit.score, hit.preview);
                        }
                    }
                    Err(e) => println!("Error searching documents: {}", e),
                }
            }
            _ => stream_reply(agent, message).await?,
        }
    }

    Ok(())
}

async fn stream_reply(agent: &mut RagAgent, message: &str) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let (tx, mut rx) = mpsc::unbounded_channel::<StreamChunk>();

    let printer_spinner = spinner.clone();
    let printer = tokio::spawn(async move {
        let mut started = false;
        while let Some(chunk) = rx.recv().await {
            if !started && !chunk.text.is_empty() {
                printer_spinner.finish_and_clear();
                print!("Assistant: ");
                started = true;
            }
            print!("{}", chunk.text);
            let _ = io::stdout().flush();
        }
        if started {
            println!();
        }
    });

    let result = agent.chat_stream(message, tx).await;
    let _ = printer.await;
    spinner.finish_and_clear();

    if let Err(e) = result {
        tracing::debug!(error = ?e, "Chat turn failed");
        println!("Error: {}", e);
    }

    Ok(())
}
