//! Assistant chat: a line-oriented REPL over stdin, and the health check.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use clinic_async::chat::{
    ChatClient, ChatSession, ChatTransport, PatientContextMode, PatientInfo, SendOutcome,
};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::context::AppContext;

#[derive(Args)]
pub struct ChatArgs {
    /// Send one message, print the reply and exit
    message: Option<String>,

    /// Share the patient context below with the assistant
    #[arg(long)]
    with_context: bool,

    /// Patient age
    #[arg(long, requires = "with_context")]
    age: Option<String>,

    /// Patient gender
    #[arg(long, requires = "with_context")]
    gender: Option<String>,

    /// Medical history
    #[arg(long, requires = "with_context")]
    history: Option<String>,

    /// Current medications
    #[arg(long, requires = "with_context")]
    medications: Option<String>,
}

pub async fn execute(ctx: &AppContext, args: ChatArgs) -> Result<()> {
    let session = ChatSession::new(Arc::new(ctx.chat_client()), PatientContextMode::Optional);

    if args.with_context {
        session.set_patient_info(PatientInfo {
            age: args.age,
            gender: args.gender,
            history: args.history,
            medications: args.medications,
        });
        session.set_share_patient_context(true);
    }

    if let Some(message) = args.message {
        return match session.send(&message).await {
            SendOutcome::Replied => {
                print_last_reply(&session).await;
                Ok(())
            }
            SendOutcome::Failed => {
                let error = session.snapshot().last_error.unwrap_or_default();
                anyhow::bail!("Assistant unavailable: {error}")
            }
            SendOutcome::Ignored | SendOutcome::Discarded => {
                anyhow::bail!("Nothing to send")
            }
        };
    }

    repl(&session).await
}

async fn repl(session: &ChatSession<ChatClient>) -> Result<()> {
    println!("Assistant ready. Commands: /clear, /history, /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", ">".cyan());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "" => {}
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear().await;
                println!("{} Conversation cleared", "OK".green());
            }
            "/history" => print_history(session).await,
            text => match session.send(text).await {
                SendOutcome::Replied => print_last_reply(session).await,
                SendOutcome::Failed => {
                    let error = session.snapshot().last_error.unwrap_or_default();
                    eprintln!("{} {}", "ERROR".red(), error);
                }
                SendOutcome::Ignored | SendOutcome::Discarded => {}
            },
        }
    }
    Ok(())
}

async fn print_last_reply<T: ChatTransport + ?Sized>(session: &ChatSession<T>) {
    if let Some(reply) = session.snapshot().messages.last() {
        println!("{} {}", "assistant:".magenta(), reply.content);
    }
}

async fn print_history<T: ChatTransport + ?Sized>(session: &ChatSession<T>) {
    match session.fetch_history().await {
        None => println!("No conversation yet"),
        Some(Ok(entries)) => {
            for entry in entries {
                let role = entry.role.as_deref().unwrap_or("?");
                println!("[{role}] {}", entry.content);
            }
        }
        Some(Err(failure)) => eprintln!("{} {}", "ERROR".red(), failure),
    }
}

/// Prints the chat service status. A down service is reported, not an error.
pub async fn health(ctx: &AppContext) -> Result<()> {
    let session = ChatSession::new(Arc::new(ctx.chat_client()), PatientContextMode::Disabled);
    let health = session.refresh_health().await;

    if health.success {
        println!("{} Chat service is up", "OK".green());
        if let Some(data) = &health.data {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    } else {
        println!(
            "{} Chat service unavailable: {}",
            "WARN".yellow(),
            health.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
