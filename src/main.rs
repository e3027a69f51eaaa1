use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use teloxide::prelude::*;
use tokio::sync::mpsc;

use beauty_time_bot::config::Config;
use beauty_time_bot::database::Database;
use beauty_time_bot::handlers::{
    callback_handler, check_lapsed_appointments_task, command_handler, message_handler, Command,
};
use beauty_time_bot::models::{Catalog, SlotGenerator};
use beauty_time_bot::store::{AppointmentStore, SqlitePinRegistry};
use beauty_time_bot::transport::TelegramTransport;
use beauty_time_bot::{BotState, ConversationStateMachine, PinnedSummaryBroadcaster};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Загружаем .env и инициализируем логирование
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting beauty time bot...");

    let config = Config::from_env().context("invalid configuration")?;
    let catalog = Catalog::default();
    catalog.validate().context("invalid catalog")?;
    let catalog = Arc::new(catalog);

    let db = Database::new(&config.database_url)
        .await
        .context("failed to open database")?;
    db.init().await.context("failed to initialize database")?;
    log::info!("✅ Database initialized");

    let (changes_tx, changes_rx) = mpsc::unbounded_channel();
    let store = AppointmentStore::load(db.clone())
        .await
        .context("failed to load appointments")?
        .with_change_feed(changes_tx);

    let bot = Bot::from_env();
    let transport = Arc::new(TelegramTransport::new(bot.clone(), config.platform_timeout));
    let registry = Arc::new(SqlitePinRegistry::new(db));

    let broadcaster = Arc::new(PinnedSummaryBroadcaster::new(
        transport.clone(),
        registry,
        store.clone(),
        config.admin_chat_id,
    ));
    let machine = Arc::new(ConversationStateMachine::new(
        catalog,
        SlotGenerator::new(config.utc_offset),
        store.clone(),
    ));

    // После рестарта продолжаем редактировать тот же закреп
    broadcaster.refresh_admin(Utc::now()).await;
    tokio::spawn(broadcaster.run(changes_rx));

    let state = BotState {
        machine,
        store,
        transport,
        admin_chat_id: config.admin_chat_id,
    };

    // Фоновая задача для прошедших записей
    let state_clone = state.clone();
    let sweep_interval = config.sweep_interval;
    tokio::spawn(async move {
        check_lapsed_appointments_task(state_clone, sweep_interval).await;
    });

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
