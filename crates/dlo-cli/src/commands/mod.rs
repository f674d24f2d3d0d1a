use crate::app::App;
use crate::cli::Command;

pub mod deliver;
pub mod memory;
pub mod message;
pub mod user;

pub async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve => deliver::serve(app).await,
        Command::DeliverOnce => deliver::once(app).await,
        Command::User { action } => user::run(app, action),
        Command::Memory { action } => memory::run(app, action).await,
        Command::Message { action } => message::run(app, action),
    }
}
