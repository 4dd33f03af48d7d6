//! Chat command - interactive session.

use ollabot_chat::{ChatConfig, ChatRequestOrchestrator, ChatSession, Role, SessionMetrics};
use ollabot_service::ServiceRecoveryController;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{recovery_controller, restart, status};

const HELP: &str = "\
Commands:
  /help              Show this help
  /quit              Leave the chat
  /clear             Forget the conversation
  /restart           Restart the backend service
  /status            Check the backend and model
  /metrics           Show response statistics
  /temperature <v>   Set sampling temperature (0-1)
  /top-p <v>         Set top-p (0-1)
  /system [text]     Show or replace the system prompt
  /history           Show the conversation so far";

enum Flow {
    Continue,
    Quit,
}

pub(crate) async fn run(config: &ChatConfig) -> miette::Result<()> {
    let mut chat = ChatRequestOrchestrator::from_config(config)
        .map_err(|e| miette::miette!("Failed to create chat client: {}", e))?;
    let recovery = recovery_controller(config).await;
    let mut session = ChatSession::new(config);

    println!("Ollabot - chatting with {} at {}", config.model, config.base_url);
    let (service, model) = status::check(chat.health(), chat.model()).await;
    status::print_report(chat.model(), &service, model.as_ref());
    println!("Type /help for commands, /quit to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nYou: ");
        std::io::stdout().flush().ok();

        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| miette::miette!("Failed to read input: {}", e))?
        else {
            println!();
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            match handle_command(command, &mut chat, &mut session, &recovery).await {
                Flow::Continue => continue,
                Flow::Quit => break,
            }
        }

        let result = chat.respond(input, &mut session).await;
        println!("\nAssistant: {}", result);
        if let Some(warning) = chat.warning() {
            println!("\nWarning: {}", warning);
        }
    }

    print_metrics(session.metrics());
    Ok(())
}

async fn handle_command(
    command: &str,
    chat: &mut ChatRequestOrchestrator,
    session: &mut ChatSession,
    recovery: &ServiceRecoveryController,
) -> Flow {
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((command, ""));

    match name {
        "quit" | "exit" => return Flow::Quit,
        "help" => println!("{}", HELP),
        "clear" => {
            session.clear_history();
            println!("Conversation cleared.");
        }
        "restart" => match restart::restart(recovery, chat.health()).await {
            Ok(true) => chat.reset_failures(),
            Ok(false) => {}
            Err(e) => println!("Restart failed: {}", e),
        },
        "status" => {
            let (service, model) = status::check(chat.health(), chat.model()).await;
            status::print_report(chat.model(), &service, model.as_ref());
        }
        "metrics" => print_metrics(session.metrics()),
        "temperature" => match arg.parse::<f32>() {
            Ok(value) => println!("Temperature set to {:.2}", session.set_temperature(value)),
            Err(_) => println!(
                "Temperature is {:.2}. Usage: /temperature <0-1>",
                session.sampling().temperature()
            ),
        },
        "top-p" => match arg.parse::<f32>() {
            Ok(value) => println!("Top-p set to {:.2}", session.set_top_p(value)),
            Err(_) => println!(
                "Top-p is {:.2}. Usage: /top-p <0-1>",
                session.sampling().top_p()
            ),
        },
        "system" if arg.is_empty() => println!("System prompt: {}", session.system_prompt()),
        "system" => {
            session.set_system_prompt(arg);
            println!("System prompt updated.");
        }
        "history" => {
            if session.messages().is_empty() {
                println!("No messages yet.");
            }
            for message in session.messages() {
                let speaker = match message.role {
                    Role::User => "You",
                    Role::Assistant => "Assistant",
                };
                println!("{}: {}", speaker, message.content);
            }
        }
        other => println!("Unknown command: /{}. Type /help for commands.", other),
    }
    Flow::Continue
}

fn print_metrics(metrics: &SessionMetrics) {
    println!();
    println!("Session metrics:");
    println!("  Total queries:      {}", metrics.total_queries());
    println!("  Successful:         {}", metrics.successful_queries());
    println!("  Success rate:       {:.1}%", metrics.success_rate());
    println!(
        "  Avg response time:  {:.2}s",
        metrics.average_response_time().as_secs_f64()
    );

    let history = metrics.history();
    for sample in &history[history.len().saturating_sub(10)..] {
        println!(
            "    {}  {:>6.2}s  {}",
            sample.timestamp.format("%H:%M:%S"),
            sample.elapsed.as_secs_f64(),
            if sample.success { "ok" } else { "failed" }
        );
    }
}
