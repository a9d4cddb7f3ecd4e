use std::{str::FromStr, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use thiserror::Error;
use uuid::Uuid;

use reserve_core::types::{Customer, CustomerId, NewCustomer, VisitRecord};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    ///
    /// The database file is created when missing.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::InvalidUrl)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle to operate on customer records.
    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid sqlite connection string: {0}")]
    InvalidUrl(sqlx::Error),
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository for the `customers` table.
///
/// Visit history is stored inline as a JSON array, newest visit first.
#[derive(Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Inserts a new customer with no visits and returns the generated id.
    pub async fn insert(
        &self,
        draft: &NewCustomer,
        created_at: DateTime<Utc>,
    ) -> Result<CustomerId, CustomerStoreError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO customers \
             (id, name, kana, phone, email, visit_count, history_json, created_at) \
             VALUES (?, ?, ?, ?, ?, 0, '[]', ?)",
        )
        .bind(&id)
        .bind(&draft.name)
        .bind(&draft.kana)
        .bind(&draft.phone)
        .bind(&draft.email)
        .bind(to_rfc3339(created_at))
        .execute(&self.pool)
        .await?;

        Ok(CustomerId::new(id))
    }

    /// Overwrites the visit count and history of an existing customer.
    pub async fn update_visits(&self, customer: &Customer) -> Result<(), CustomerStoreError> {
        let history_json = serde_json::to_string(&customer.history)?;
        let result = sqlx::query(
            "UPDATE customers SET visit_count = ?, history_json = ? WHERE id = ?",
        )
        .bind(i64::from(customer.visit_count))
        .bind(history_json)
        .bind(customer.id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CustomerStoreError::NotFound(customer.id.clone()));
        }
        Ok(())
    }

    /// Deletes a customer together with its history.
    pub async fn delete(&self, id: &CustomerId) -> Result<(), CustomerStoreError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CustomerStoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    /// Lists every customer in registration order.
    pub async fn list_all(&self) -> Result<Vec<Customer>, CustomerStoreError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, kana, phone, email, visit_count, history_json, created_at \
             FROM customers ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CustomerRow::into_domain).collect()
    }
}

/// Raw row of the `customers` table.
#[derive(Debug, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub kana: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub visit_count: i64,
    pub history_json: String,
    pub created_at: DateTime<Utc>,
}

impl CustomerRow {
    /// Converts the database row into a domain customer.
    pub fn into_domain(self) -> Result<Customer, CustomerStoreError> {
        let history: Vec<VisitRecord> = serde_json::from_str(&self.history_json)?;
        let visit_count = u32::try_from(self.visit_count)
            .map_err(|_| CustomerStoreError::InvalidVisitCount(self.visit_count))?;
        if visit_count as usize != history.len() {
            return Err(CustomerStoreError::VisitCountMismatch {
                stored: visit_count,
                history: history.len(),
            });
        }

        Ok(Customer {
            id: CustomerId::new(self.id),
            name: self.name,
            kana: self.kana,
            phone: self.phone,
            email: self.email,
            visit_count,
            history,
            created_at: self.created_at,
        })
    }
}

/// Errors that can occur while reading or mutating customers.
#[derive(Debug, Error)]
pub enum CustomerStoreError {
    #[error("customer not found: {0}")]
    NotFound(CustomerId),
    #[error("stored visit count is out of range: {0}")]
    InvalidVisitCount(i64),
    #[error("stored visit count {stored} does not match {history} history entries")]
    VisitCountMismatch { stored: u32, history: usize },
    #[error("failed to encode or decode visit history json: {0}")]
    HistoryJson(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reserve_core::ledger::VisitLedger;

    async fn setup_db() -> Database {
        let db = Database::connect("sqlite::memory:?cache=shared")
            .await
            .expect("connect");
        db.run_migrations().await.expect("migrations");
        db
    }

    async fn only_customer(repo: &CustomerRepository) -> Customer {
        let mut customers = repo.list_all().await.expect("list customers");
        assert_eq!(customers.len(), 1, "expected exactly one stored customer");
        customers.remove(0)
    }

    fn created_at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn migrations_apply() {
        let db = setup_db().await;

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'customers'",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 1);
    }

    #[tokio::test]
    async fn insert_then_list_returns_fresh_customer() {
        let db = setup_db().await;
        let repo = db.customers();
        let draft = NewCustomer::new("山田 花子", "ヤマダ ハナコ").with_phone("090-1234-5678");

        let id = repo
            .insert(&draft, created_at("2024-01-01T09:00:00Z"))
            .await
            .expect("insert succeeds");
        let customer = only_customer(&repo).await;

        assert_eq!(customer.id, id);
        assert_eq!(customer.name, "山田 花子");
        assert_eq!(customer.kana, "ヤマダ ハナコ");
        assert_eq!(customer.phone.as_deref(), Some("090-1234-5678"));
        assert_eq!(customer.email, None);
        assert_eq!(customer.visit_count, 0);
        assert!(customer.history.is_empty());
        assert_eq!(customer.created_at, created_at("2024-01-01T09:00:00Z"));
    }

    #[tokio::test]
    async fn update_visits_persists_history_order() {
        let db = setup_db().await;
        let repo = db.customers();
        repo.insert(&NewCustomer::new("佐藤", "サトウ"), Utc::now())
            .await
            .expect("insert");

        let mut customer = only_customer(&repo).await;
        for (date, note) in [("2024-01-05", "カット"), ("2024-02-10", "Cut \"short\"")] {
            customer = VisitLedger::record_visit(&customer, date, note).expect("visit");
        }
        repo.update_visits(&customer).await.expect("update");

        let reloaded = only_customer(&repo).await;
        assert_eq!(reloaded.visit_count, 2);
        assert_eq!(reloaded.history, customer.history);
        assert_eq!(reloaded.history[0].note, "Cut \"short\"");
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let db = setup_db().await;
        let repo = db.customers();
        let ghost = Customer::registered(
            CustomerId::new("ghost"),
            NewCustomer::new("幽霊", ""),
            Utc::now(),
        );

        let err = repo.update_visits(&ghost).await.unwrap_err();
        assert!(matches!(err, CustomerStoreError::NotFound(_)));

        let err = repo.delete(&ghost.id).await.unwrap_err();
        assert!(matches!(err, CustomerStoreError::NotFound(id) if id.as_str() == "ghost"));
    }

    #[tokio::test]
    async fn list_all_orders_by_registration_and_skips_deleted() {
        let db = setup_db().await;
        let repo = db.customers();
        let later = repo
            .insert(
                &NewCustomer::new("後藤", "ゴトウ"),
                created_at("2024-03-01T00:00:00Z"),
            )
            .await
            .expect("insert later");
        let earlier = repo
            .insert(
                &NewCustomer::new("青木", "アオキ"),
                created_at("2024-02-01T00:00:00Z"),
            )
            .await
            .expect("insert earlier");
        let removed = repo
            .insert(
                &NewCustomer::new("田中", "タナカ"),
                created_at("2024-02-15T00:00:00Z"),
            )
            .await
            .expect("insert removed");

        repo.delete(&removed).await.expect("delete");

        let ids: Vec<CustomerId> = repo
            .list_all()
            .await
            .expect("list")
            .into_iter()
            .map(|customer| customer.id)
            .collect();
        assert_eq!(ids, vec![earlier, later]);
    }

    #[tokio::test]
    async fn corrupt_history_surfaces_decode_error() {
        let db = setup_db().await;
        let repo = db.customers();
        let id = repo
            .insert(&NewCustomer::new("山田", "ヤマダ"), Utc::now())
            .await
            .expect("insert");

        sqlx::query("UPDATE customers SET history_json = 'not json' WHERE id = ?")
            .bind(id.as_str())
            .execute(db.pool())
            .await
            .expect("corrupt row");

        let err = repo.list_all().await.unwrap_err();
        assert!(matches!(err, CustomerStoreError::HistoryJson(_)));
    }

    #[tokio::test]
    async fn visit_count_out_of_step_with_history_is_rejected() {
        let db = setup_db().await;
        let repo = db.customers();
        repo.insert(&NewCustomer::new("山田", "ヤマダ"), Utc::now())
            .await
            .expect("insert");
        let customer = VisitLedger::record_visit(&only_customer(&repo).await, "2024-01-05", "")
            .expect("visit");
        repo.update_visits(&customer).await.expect("update");

        sqlx::query("UPDATE customers SET visit_count = 5 WHERE id = ?")
            .bind(customer.id.as_str())
            .execute(db.pool())
            .await
            .expect("corrupt row");

        let err = repo.list_all().await.unwrap_err();
        assert!(matches!(
            err,
            CustomerStoreError::VisitCountMismatch {
                stored: 5,
                history: 1
            }
        ));
    }

    #[tokio::test]
    async fn rejects_blank_names_at_the_schema_level() {
        let db = setup_db().await;
        let err = db
            .customers()
            .insert(&NewCustomer::new("", ""), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, CustomerStoreError::Database(_)));
    }
}
