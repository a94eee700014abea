//! Interactive terminal chat loop.
//!
//! Reads one question per line from stdin and prints the grounded answer.
//! `exit` or `quit` (or EOF) ends the session. Pipeline errors are printed
//! and the loop continues, so a flaky model server does not kill the chat.

use std::io::{self, BufRead, Write};

use crate::config::Config;
use crate::query::QueryContext;

pub async fn run_chat(config: &Config) -> anyhow::Result<()> {
    let ctx = QueryContext::connect(config.clone()).await?;

    println!("Dr. HealthMate — ask a health question, or type 'exit' to quit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("you> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        match ctx.ask(question).await {
            Ok(answer) => {
                println!();
                println!("{}", answer);
                println!();
            }
            Err(e) => {
                eprintln!("error: {:#}", e);
                eprintln!("⚠️ I'm experiencing technical difficulties. Please try again in a moment.");
            }
        }
    }

    ctx.close().await;
    println!("Goodbye.");
    Ok(())
}
