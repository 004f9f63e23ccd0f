use anyhow::Result;
use clap::Parser;
use switchboard_cli::{App, Command, Config, print_models};

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();
    app.init_tracing();

    match app.command {
        Command::Chat(chat) => chat.run(app.stream).await?,
        Command::Models => print_models(),
        Command::Capabilities(cmd) => cmd.run()?,
        Command::Generate => Config::default().save()?,
    }

    Ok(())
}
