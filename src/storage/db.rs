use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Result;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Создает пул соединений с базой данных
///
/// Инициализирует пул (до 10 соединений) и создает схему при первом
/// подключении.
///
/// # Arguments
///
/// * `database_path` - Путь к файлу базы данных SQLite
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    let conn = pool.get()?;
    if let Err(e) = init_schema(&conn) {
        log::error!("Failed to initialize schema: {}", e);
    }

    Ok(pool)
}

/// Получает соединение из пула
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Создает таблицы бота если их нет
///
/// Схема подписочного бота: пользователи, подписки и платежи. Пайплайн
/// бэкапов эту схему не трогает — он видит только файл БД целиком.
fn init_schema(conn: &rusqlite::Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            telegram_id     INTEGER PRIMARY KEY,
            username        TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE TABLE IF NOT EXISTS subscriptions (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id     INTEGER NOT NULL REFERENCES users(telegram_id),
            plan            TEXT NOT NULL,
            credits         INTEGER NOT NULL DEFAULT 0,
            expires_at      TEXT
        );
        CREATE TABLE IF NOT EXISTS payments (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id     INTEGER NOT NULL REFERENCES users(telegram_id),
            amount_rub      INTEGER NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    Ok(())
}

/// Регистрирует пользователя при первом обращении
pub fn upsert_user(conn: &rusqlite::Connection, telegram_id: i64, username: Option<&str>) -> Result<()> {
    conn.execute(
        "INSERT INTO users (telegram_id, username) VALUES (?1, ?2)
         ON CONFLICT(telegram_id) DO UPDATE SET username = excluded.username",
        rusqlite::params![telegram_id, username],
    )?;

    Ok(())
}
