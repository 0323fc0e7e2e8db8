//! crew-persistence
//!
//! Backend Postgres (Diesel) de la frontera de datos: una tabla `records` con
//! el payload JSONB de cada colección y una tabla `blobs` para imágenes.
//!
//! Módulos:
//! - `pg`: pool, reintentos y backends `PgRecordBackend` / `PgBlobStorage`.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, pg_backends, ConnectionProvider, PgBlobStorage, PgPool,
             PgRecordBackend, PoolProvider};
