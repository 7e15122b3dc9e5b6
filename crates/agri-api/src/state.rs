//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! Every entity lives in an in-memory [`Store`]. When a database pool is
//! configured, services write each mutation through to Postgres and the
//! stores are hydrated from it on startup; reads never touch the database.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use agri_core::{Crop, Plot, User, UserId, UserRole, Variety};
use agri_state::{Expense, Season, Task};
use parking_lot::RwLock;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::mail::{LogMailer, Mailer};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because we never hold the lock across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records, in no particular order.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// List the records matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| predicate(v))
            .cloned()
            .collect()
    }

    /// Whether any record matches `predicate`.
    pub fn any(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.data.read().values().any(predicate)
    }

    /// Update a record in place. Returns the record before and after `f`,
    /// or `None` if not found.
    pub fn update_returning(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<(T, T)> {
        let mut guard = self.data.write();
        let entry = guard.get_mut(id)?;
        let before = entry.clone();
        f(entry);
        Some((before, entry.clone()))
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure may inspect the record, validate preconditions, mutate it
    /// and return `Ok(R)` or `Err(E)`, all under a single write lock.
    /// Returns `None` if the record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Run `f` with exclusive access to the whole map.
    ///
    /// Used when a change must be validated against other records (e.g. the
    /// sibling seasons of a plot) and applied without a gap in between.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, T>) -> R) -> R {
        f(&mut self.data.write())
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync + PartialEq> Store<T> {
    /// Put `previous` back under `id` only while the record still equals
    /// `written`. Returns whether the restore happened; a record changed by
    /// a later writer is left alone.
    pub fn restore_if_unchanged(&self, id: &Uuid, written: &T, previous: T) -> bool {
        self.with_write(|map| match map.get_mut(id) {
            Some(current) if current == written => {
                *current = previous;
                true
            }
            _ => false,
        })
    }

    /// Re-insert a removed record unless the id has been taken since.
    pub fn restore_if_absent(&self, id: Uuid, value: T) -> bool {
        self.with_write(|map| match map.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        })
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Application State --------------------------------------------------------

/// Id of the built-in administrator. Requests authenticated with the plain
/// secret, or made while auth is disabled, act as this user.
pub const BOOTSTRAP_ADMIN_ID: UserId = UserId(Uuid::nil());

fn bootstrap_admin() -> User {
    let mut admin = User::new("admin", "Administrator", UserRole::Admin);
    admin.id = BOOTSTRAP_ADMIN_ID;
    admin
}

/// Shared application state accessible to all route handlers.
/// Clone-friendly via `Arc` internals in each `Store`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub users: Store<User>,
    pub plots: Store<Plot>,
    pub crops: Store<Crop>,
    pub varieties: Store<Variety>,
    pub seasons: Store<Season>,
    pub tasks: Store<Task>,
    pub expenses: Store<Expense>,

    /// PostgreSQL pool for write-through persistence. `None` means
    /// in-memory only.
    pub db_pool: Option<PgPool>,

    pub mailer: Arc<dyn Mailer>,

    pub config: AppConfig,
}

impl AppState {
    /// Default configuration, in-memory only, log mail transport.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None, Arc::new(LogMailer::new()))
    }

    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>, mailer: Arc<dyn Mailer>) -> Self {
        let state = Self {
            users: Store::new(),
            plots: Store::new(),
            crops: Store::new(),
            varieties: Store::new(),
            seasons: Store::new(),
            tasks: Store::new(),
            expenses: Store::new(),
            db_pool,
            mailer,
            config,
        };
        let admin = bootstrap_admin();
        state.users.insert(admin.id.0, admin);
        state
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a database pool is available. A persisted
    /// row for the bootstrap administrator replaces the built-in one.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let users = crate::db::users::load_all(pool)
            .await
            .map_err(|e| format!("failed to load users: {e}"))?;
        let user_count = users.len();
        for user in users {
            self.users.insert(user.id.0, user);
        }

        let plots = crate::db::plots::load_all(pool)
            .await
            .map_err(|e| format!("failed to load plots: {e}"))?;
        let plot_count = plots.len();
        for plot in plots {
            self.plots.insert(plot.id.0, plot);
        }

        let crops = crate::db::crops::load_all(pool)
            .await
            .map_err(|e| format!("failed to load crops: {e}"))?;
        let crop_count = crops.len();
        for crop in crops {
            self.crops.insert(crop.id.0, crop);
        }

        let varieties = crate::db::crops::load_all_varieties(pool)
            .await
            .map_err(|e| format!("failed to load varieties: {e}"))?;
        let variety_count = varieties.len();
        for variety in varieties {
            self.varieties.insert(variety.id.0, variety);
        }

        let seasons = crate::db::seasons::load_all(pool)
            .await
            .map_err(|e| format!("failed to load seasons: {e}"))?;
        let season_count = seasons.len();
        for season in seasons {
            self.seasons.insert(season.id.0, season);
        }

        let tasks = crate::db::tasks::load_all(pool)
            .await
            .map_err(|e| format!("failed to load tasks: {e}"))?;
        let task_count = tasks.len();
        for task in tasks {
            self.tasks.insert(task.id.0, task);
        }

        let expenses = crate::db::expenses::load_all(pool)
            .await
            .map_err(|e| format!("failed to load expenses: {e}"))?;
        let expense_count = expenses.len();
        for expense in expenses {
            self.expenses.insert(expense.id.0, expense);
        }

        tracing::info!(
            users = user_count,
            plots = plot_count,
            crops = crop_count,
            varieties = variety_count,
            seasons = season_count,
            tasks = task_count,
            expenses = expense_count,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
