use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::{path::PathBuf, time::Duration};
use tokio::fs;

pub const MIGRATIONS_DIR: &str = "migrations";

pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(20)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Applies every `migrations/*.sql` file in name order and returns how many
/// files ran. The files only use `IF NOT EXISTS` DDL, so reruns are no-ops.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<usize> {
    let mut entries = fs::read_dir(MIGRATIONS_DIR)
        .await
        .with_context(|| format!("reading {MIGRATIONS_DIR}/"))?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();

    let backend = conn.get_database_backend();
    for file in &files {
        tracing::debug!(file = %file.display(), "applying migration");
        let sql = fs::read_to_string(file).await?;
        // one command per prepared statement in Postgres
        for stmt in statements(&sql) {
            conn.execute(Statement::from_string(backend, stmt))
                .await
                .with_context(|| format!("migration {} failed", file.display()))?;
        }
    }

    Ok(files.len())
}

/// Split a migration file into single statements, dropping `--` comment lines.
fn statements(sql: &str) -> Vec<String> {
    let body: String = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");
    body.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(|stmt| format!("{stmt};"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::statements;

    #[test]
    fn splits_statements_and_skips_comments() {
        let sql = "-- users; and more\nCREATE TABLE a (id INT);\n\n  CREATE INDEX b ON a (id);\n";
        assert_eq!(
            statements(sql),
            vec!["CREATE TABLE a (id INT);", "CREATE INDEX b ON a (id);"]
        );
    }

    #[test]
    fn blank_file_has_no_statements() {
        assert!(statements("\n-- nothing here\n").is_empty());
    }
}
