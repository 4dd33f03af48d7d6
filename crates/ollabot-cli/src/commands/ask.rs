//! Ask command - a single chat turn.

use ollabot_chat::{ChatConfig, ChatRequestOrchestrator, ChatSession, GenerationResult};

pub(crate) async fn run(config: &ChatConfig, prompt: &str) -> miette::Result<()> {
    let mut chat = ChatRequestOrchestrator::from_config(config)
        .map_err(|e| miette::miette!("Failed to create chat client: {}", e))?;
    let mut session = ChatSession::new(config);

    match chat.respond(prompt, &mut session).await {
        GenerationResult::Success { text, .. } => {
            println!("{}", text);
            Ok(())
        }
        GenerationResult::Failure { kind, detail } => {
            Err(miette::miette!("{} ({})", detail, kind))
        }
    }
}
