use anyhow::Result;
use gizmo_core::agent::{ChatSession, SessionEvent};
use gizmo_core::{ChatMessage, ChatRequest, Provider};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;

/// Plain conversation with the configured backend, no tools. The session
/// state machine owns the history; this function only does I/O.
pub async fn run(provider: Arc<dyn Provider>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut session = ChatSession::new();

    println!("gizmo chat — type \"exit\" to quit\n");

    while !session.is_terminated() {
        match rl.readline("> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                match session.accept_input(&line) {
                    SessionEvent::Submit(_) => {
                        let request = ChatRequest {
                            messages: session.history(),
                            tools: None,
                        };

                        match provider.chat(request).await {
                            Ok(response) => {
                                let reply = response.text_or_empty().to_string();
                                println!("\nAssistant:");
                                termimad::print_text(&reply);
                                println!();
                                session.record_reply(reply);
                            }
                            Err(e) => {
                                eprintln!("❌ Error: {}", e);
                                session.record_failure();
                            }
                        }
                    }
                    SessionEvent::Ignored | SessionEvent::Terminated => {}
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    println!("👋 Goodbye!");
    Ok(())
}

/// Single message in, single reply out.
pub async fn one_shot(provider: Arc<dyn Provider>, message: &str) -> Result<()> {
    let messages = [ChatMessage::user(message)];
    let request = ChatRequest {
        messages: &messages,
        tools: None,
    };

    let response = provider.chat(request).await?;
    termimad::print_text(response.text_or_empty());
    Ok(())
}
