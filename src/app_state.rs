//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    auth::{AuthProvider, AuthSubscription, SupabaseAuth},
    config::SupabaseConfig,
    db::initialize,
    local_store::load_household_context,
    preferences::SharedPreferences,
    set_password::{AdminUserApi, SupabaseAdminApi},
    sync::{PersistenceMode, SupabaseTransactionService, SyncPolicy, TransactionService},
};

/// The hosted services the app talks to. Any of them may be missing, in which
/// case the features that need them are disabled.
#[derive(Clone, Default)]
pub struct Integrations {
    /// The household transaction store used in remote mode.
    pub transactions: Option<Arc<dyn TransactionService>>,
    /// Passwordless sign in.
    pub auth: Option<Arc<dyn AuthProvider>>,
    /// User management for the set password endpoint.
    pub admin_api: Option<Arc<dyn AdminUserApi>>,
}

impl Integrations {
    /// Create the Supabase clients that `config` has credentials for.
    pub fn from_config(config: &SupabaseConfig) -> Self {
        let mut integrations = Self::default();

        match config.public_credentials() {
            Some((url, anon_key)) => {
                integrations.transactions =
                    Some(Arc::new(SupabaseTransactionService::new(url, anon_key)));
                integrations.auth = Some(Arc::new(SupabaseAuth::new(url, anon_key)));
            }
            None => tracing::info!(
                "Supabase URL or anon key not set, transactions will only be stored locally"
            ),
        }

        match config.admin_credentials() {
            Some((url, service_role_key)) => {
                integrations.admin_api = Some(Arc::new(SupabaseAdminApi::new(url, service_role_key)));
            }
            None => tracing::info!("Supabase service role key not set, password endpoint disabled"),
        }

        integrations
    }
}

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The local storage database.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The transaction list and the rules for where changes are stored.
    pub sync: SyncPolicy,

    /// The sign in provider, if one is configured.
    pub auth: Option<Arc<dyn AuthProvider>>,

    /// The privileged user management API, if one is configured.
    pub admin_api: Option<Arc<dyn AdminUserApi>>,

    /// The theme and budget chosen by the user.
    pub preferences: SharedPreferences,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize local storage and load the saved
    /// transactions. `local_timezone` should be a valid, canonical timezone
    /// name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or read.
    pub fn new(
        db_connection: Connection,
        local_timezone: &str,
        integrations: Integrations,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let db_connection = Arc::new(Mutex::new(db_connection));
        let sync = SyncPolicy::new(db_connection.clone(), integrations.transactions)?;

        Ok(Self {
            db_connection,
            sync,
            auth: integrations.auth,
            admin_api: integrations.admin_api,
            preferences: SharedPreferences::default(),
            local_timezone: local_timezone.to_owned(),
        })
    }

    /// Reload the transaction list every time the user signs in or out.
    ///
    /// Returns `None` when no sign in provider is configured.
    pub fn subscribe_to_auth(&self) -> Option<AuthSubscription> {
        let auth = self.auth.as_ref()?;
        let sync = self.sync.clone();
        let db_connection = self.db_connection.clone();

        let subscription = AuthSubscription::subscribe(auth.watch(), move |session| {
            let sync = sync.clone();
            let db_connection = db_connection.clone();

            async move {
                let household_id = match db_connection.lock() {
                    Ok(connection) => load_household_context(&connection)
                        .map(|context| context.household_id)
                        .unwrap_or_else(|error| {
                            tracing::error!("could not read household: {error}");
                            None
                        }),
                    Err(error) => {
                        tracing::error!("could not acquire database lock: {error}");
                        None
                    }
                };

                let mode = PersistenceMode::resolve(
                    sync.is_remote_configured(),
                    session.as_ref(),
                    household_id.as_deref(),
                );

                if let Err(error) = sync.switch_to(&mode).await {
                    tracing::error!("could not reload transactions after sign in change: {error}");
                }
            }
        });

        Some(subscription)
    }
}
