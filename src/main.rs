use flashcards::app::CardService;
use flashcards::backends::SqliteBackend;
use flashcards::setup::arguments::{self, Command};
use flashcards::setup::logging;
use flashcards::ui::cli;
use flashcards::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    arguments::load_env();
    logging::setup_log();

    let (config, command) = arguments::handle_args();

    match command {
        Command::Serve => web::serve(config).await,
        Command::List { filter } => {
            let service = CardService::new(Box::new(SqliteBackend::new(&config.database)));
            cli::show_cards(filter, service.filter_cards(filter)?);
            Ok(())
        }
        Command::Add {
            card_type,
            front,
            back,
        } => {
            let service = CardService::new(Box::new(SqliteBackend::new(&config.database)));
            let id = service.add_card(card_type, front, back)?;
            cli::show_text(&format!("Added card #{id}"));
            Ok(())
        }
    }
}
