//! Telegram bot glue: command routing over teloxide
//!
//! Deliberately thin — subscription accounting and FSM flows live in their
//! own handlers and never touch the backup pipeline; the pipeline in turn
//! only ever sees the database file path, never these routers.

use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use crate::storage::db::{self, DbPool};

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Я умею:")]
pub enum Command {
    #[command(description = "запустить бота")]
    Start,
    #[command(description = "мой профиль")]
    Profile,
    #[command(description = "купить подписку")]
    Subscribe,
    #[command(description = "помощь")]
    Help,
    #[command(description = "проверить статус")]
    Status,
}

/// Sets up bot commands in the Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(vec![
        BotCommand::new("start", "запустить бота"),
        BotCommand::new("profile", "мой профиль"),
        BotCommand::new("subscribe", "купить подписку"),
        BotCommand::new("help", "помощь"),
        BotCommand::new("status", "проверить статус"),
    ])
    .await?;

    Ok(())
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command, db_pool: Arc<DbPool>) -> ResponseResult<()> {
    // Record the user on any command; failures are logged, never user-visible
    if let Some(user) = msg.from.as_ref() {
        match db::get_connection(&db_pool) {
            Ok(conn) => {
                if let Err(e) = db::upsert_user(&conn, user.id.0 as i64, user.username.as_deref()) {
                    log::error!("Failed to upsert user {}: {}", user.id, e);
                }
            }
            Err(e) => log::error!("Failed to get DB connection: {}", e),
        }
    }

    let text = match cmd {
        Command::Start => "Привет! Я бот подписок. Команда /subscribe откроет тарифы.".to_string(),
        Command::Profile => "Ваш профиль: план Free, 0 кредитов.".to_string(),
        Command::Subscribe => "Тарифы: basic — 100₽ / 10 кредитов, standard — 250₽ / 30, premium — 500₽ / 70.".to_string(),
        Command::Help => Command::descriptions().to_string(),
        Command::Status => "Бот работает.".to_string(),
    };
    bot.send_message(msg.chat.id, text).await?;

    Ok(())
}

/// Runs the dispatcher until shutdown (ctrl-c or listener error).
pub async fn run_dispatcher(bot: Bot, db_pool: Arc<DbPool>) {
    let handler = Update::filter_message().branch(
        dptree::entry()
            .filter_command::<Command>()
            .endpoint(handle_command),
    );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![db_pool])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
