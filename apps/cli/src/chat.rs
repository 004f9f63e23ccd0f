//! Chat command

use super::Config;
use anyhow::Result;
use clap::Args;
use futures_util::StreamExt;
use model::Provider;
use sbcore::{Adapter, CancellationToken, Message, Prompt, StreamEvent, StreamOptions};
use std::io::{BufRead, Write};

/// Chat command arguments
#[derive(Debug, Args)]
pub struct ChatCmd {
    /// The provider to use, e.g. claude, openai, google
    #[arg(short, long)]
    pub provider: Option<String>,

    /// The model or alias to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Answer from the offline demo adapter
    #[arg(long)]
    pub demo: bool,

    /// The message to send (if empty, starts interactive mode)
    pub message: Option<String>,
}

/// A conversation kept in memory for the session.
struct Session {
    adapter: Provider,
    history: Vec<Message>,
    name: String,
    turns: usize,
}

impl ChatCmd {
    /// Run the chat command
    pub async fn run(&self, stream: bool) -> Result<()> {
        let config = Config::load_or_default()?;
        let provider = self.provider.as_deref().unwrap_or(&config.provider);
        let adapter = config
            .factory(self.demo)
            .create(config.adapter(provider, self.model.as_deref()))?;
        tracing::debug!("chatting with {provider}: {:?}", adapter.capabilities());

        let mut session = Session {
            adapter,
            history: Vec::new(),
            name: provider.to_owned(),
            turns: 0,
        };

        if let Some(msg) = &self.message {
            return session.send(msg, stream).await;
        }

        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("> ");
            stdout.flush()?;

            let mut input = String::new();
            if stdin.lock().read_line(&mut input)? == 0 {
                break;
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }
            if input == "/quit" || input == "/exit" {
                break;
            }

            if let Err(e) = session.send(input, stream).await {
                eprintln!("error: {e}");
            }
        }

        Ok(())
    }
}

impl Session {
    async fn send(&mut self, input: &str, stream: bool) -> Result<()> {
        self.turns += 1;
        let message = Message::user(format!("user-{}", self.turns), input);
        let prompt = Prompt::new(message.clone()).with_history(self.history.clone());

        let reply = if stream {
            self.stream(prompt).await?
        } else {
            let response = self.adapter.send(&prompt).await?;
            println!("{}", response.text());
            if let Some(usage) = response.usage() {
                tracing::info!(
                    "tokens: {} in, {} out",
                    usage.prompt_tokens,
                    usage.completion_tokens
                );
            }
            for citation in response.citations() {
                println!("[{}] {}", citation.index, citation.url);
            }
            response.text().to_owned()
        };

        self.history.push(message);
        self.history.push(Message::ai(
            format!("ai-{}", self.turns),
            self.name.clone(),
            reply,
        ));
        Ok(())
    }

    /// Print chunks as they arrive; Ctrl-C stops the reply.
    async fn stream(&self, prompt: Prompt) -> Result<String> {
        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        let options = StreamOptions::default()
            .with_cancel(cancel)
            .on_event(|event| match event {
                StreamEvent::Started { model } => tracing::debug!("model: {model}"),
                StreamEvent::Citations(citations) => {
                    for citation in citations {
                        tracing::info!("[{}] {}", citation.index, citation.url);
                    }
                }
                StreamEvent::Usage(usage) => tracing::info!(
                    "tokens: {} in, {} out",
                    usage.prompt_tokens,
                    usage.completion_tokens
                ),
                StreamEvent::Finished { reason } => tracing::debug!("finished: {reason:?}"),
            });

        let mut reply = String::new();
        let mut stdout = std::io::stdout();
        let mut chunks = std::pin::pin!(self.adapter.stream(prompt, options));
        let outcome = loop {
            match chunks.next().await {
                Some(Ok(chunk)) => {
                    print!("{chunk}");
                    stdout.flush()?;
                    reply.push_str(&chunk);
                }
                Some(Err(e)) => break Err(e.into()),
                None => break Ok(()),
            }
        };
        watcher.abort();
        println!();
        outcome.map(|()| reply)
    }
}
