//! Implementaciones Postgres (Diesel) de la frontera de datos.
//!
//! - Cada colección vive en la tabla `records`, discriminada por `collection`;
//!   la entidad completa va serializada en `payload` (JSONB) y `owner_id`
//!   replica la clave usada para acotar listados.
//! - Las llamadas Diesel son bloqueantes: se ejecutan en `spawn_blocking` con
//!   reintento/backoff para errores transitorios.
//! - El hub de cambios es local al proceso: sólo ve las escrituras hechas a
//!   través de este backend.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crew_core::{Backends, BlobFile, BlobStorage, ChangeEvent, ChangeFeed, ChangeHub, Clock, CoreError,
                MailDispatcher, RecordBackend, SystemClock};
use crew_domain::{Record, Scope, StoredImage};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{debug, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{blobs, records};

/// Pool r2d2 de conexiones Postgres. Al construirlo se corren las migraciones
/// pendientes.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones (pool real o sustituto en tests).
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError>;
}

#[derive(Clone)]
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = records)]
struct NewRecordRow<'a> {
    id: Uuid,
    collection: &'a str,
    owner_id: Option<Uuid>,
    payload: &'a Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = blobs)]
struct NewBlobRow<'a> {
    path: &'a str,
    folder: &'a str,
    content_type: Option<&'a str>,
    bytes: &'a [u8],
    created_at: DateTime<Utc>,
}

/// Determina si un error es transitorio (conviene reintentar).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        // best-effort por texto, sin acoplar a SQLSTATE
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("could not serialize access due to concurrent update")
            || m.contains("terminating connection due to administrator command")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Hasta 3 reintentos con backoff de 15ms, 30ms, 45ms.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms",
                      attempts + 1,
                      e,
                      delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

/// Ejecuta `f` con una conexión del provider en un hilo bloqueante.
async fn blocking<P, T, F>(provider: Arc<P>, mut f: F) -> Result<T, CoreError>
    where P: ConnectionProvider,
          T: Send + 'static,
          F: FnMut(&mut PgConnection) -> Result<T, PersistenceError> + Send + 'static
{
    tokio::task::spawn_blocking(move || {
        with_retry(|| {
            let mut conn = provider.connection()?;
            f(&mut conn)
        })
    }).await
      .map_err(|e| CoreError::remote(format!("blocking task failed: {e}")))?
      .map_err(CoreError::from)
}

fn decode<R: Record>(payload: Value) -> Result<R, PersistenceError> {
    Ok(serde_json::from_value(payload)?)
}

/// Colección `R::COLLECTION` sobre la tabla `records`.
pub struct PgRecordBackend<R: Record, P: ConnectionProvider = PoolProvider> {
    provider: Arc<P>,
    hub: ChangeHub<R>,
    clock: Arc<dyn Clock>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record, P: ConnectionProvider> PgRecordBackend<R, P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self::with_clock(provider, Arc::new(SystemClock))
    }

    pub fn with_clock(provider: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self { provider,
               hub: ChangeHub::default(),
               clock,
               _record: PhantomData }
    }
}

#[async_trait]
impl<R: Record, P: ConnectionProvider> RecordBackend<R> for PgRecordBackend<R, P> {
    async fn list(&self, scope: &Scope) -> Result<Vec<R>, CoreError> {
        let scope = *scope;
        blocking(self.provider.clone(), move |conn| {
            let mut query = records::table.select(records::payload)
                                          .filter(records::collection.eq(R::COLLECTION))
                                          .into_boxed();
            if let Scope::Owner(owner) = scope {
                query = query.filter(records::owner_id.eq(owner));
            }
            let payloads: Vec<Value> = query.order(records::created_at.desc()).load(conn)?;
            payloads.into_iter().map(decode::<R>).collect()
        }).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<R>, CoreError> {
        blocking(self.provider.clone(), move |conn| {
            let payload: Option<Value> = records::table.find(id)
                                                       .filter(records::collection.eq(R::COLLECTION))
                                                       .select(records::payload)
                                                       .first(conn)
                                                       .optional()?;
            payload.map(decode::<R>).transpose()
        }).await
    }

    async fn create(&self, draft: R::Draft) -> Result<R, CoreError> {
        let row = R::from_draft(Uuid::new_v4(), draft, self.clock.now());
        let payload = serde_json::to_value(&row).map_err(PersistenceError::from)?;
        let (id, owner_id, created_at, updated_at) = (row.id(), row.owner_id(), row.created_at(), row.updated_at());
        blocking(self.provider.clone(), move |conn| {
            diesel::insert_into(records::table).values(NewRecordRow { id,
                                                                      collection: R::COLLECTION,
                                                                      owner_id,
                                                                      payload: &payload,
                                                                      created_at,
                                                                      updated_at })
                                               .execute(conn)?;
            Ok(())
        }).await?;
        debug!("inserted {} {}", R::COLLECTION, id);
        self.hub.publish(ChangeEvent::insert(row.clone()));
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: R::Patch) -> Result<R, CoreError> {
        let now = self.clock.now();
        let outcome = blocking(self.provider.clone(), move |conn| {
            let patch = patch.clone();
            let result = conn.build_transaction()
                             .read_write()
                             .run(|tx| -> Result<(R, R), PersistenceError> {
                                 let payload: Value = records::table.find(id)
                                                                    .filter(records::collection.eq(R::COLLECTION))
                                                                    .select(records::payload)
                                                                    .for_update()
                                                                    .first(tx)?;
                                 let old: R = decode(payload)?;
                                 let mut new = old.clone();
                                 new.apply_patch(patch, now);
                                 let new_payload = serde_json::to_value(&new)?;
                                 diesel::update(records::table.find(id))
                                     .set((records::payload.eq(&new_payload),
                                           records::owner_id.eq(new.owner_id()),
                                           records::updated_at.eq(new.updated_at())))
                                     .execute(tx)?;
                                 Ok((old, new))
                             });
            // fila inexistente: no se reintenta y se reporta aparte
            match result {
                Err(PersistenceError::NotFound) => Ok(None),
                other => other.map(Some),
            }
        }).await?;
        let (old, new) = outcome.ok_or_else(|| CoreError::remote(format!("{} {id} not found", R::LABEL)))?;
        self.hub.publish(ChangeEvent::update(Some(old), new.clone()));
        Ok(new)
    }

    async fn delete(&self, id: Uuid) -> Result<(), CoreError> {
        let removed = blocking(self.provider.clone(), move |conn| {
            let payload: Option<Value> = diesel::delete(records::table.filter(records::id.eq(id))
                                                                      .filter(records::collection.eq(R::COLLECTION)))
                                                                      .returning(records::payload)
                                                                      .get_result(conn)
                                                                      .optional()?;
            payload.map(decode::<R>).transpose()
        }).await?;
        if let Some(old) = removed {
            self.hub.publish(ChangeEvent::delete(old));
        }
        Ok(())
    }

    async fn subscribe(&self, scope: Scope) -> Result<ChangeFeed<R>, CoreError> {
        Ok(self.hub.feed(scope))
    }
}

/// Blobs en la tabla `blobs`, servidos bajo `public_url/<folder>/<path>`.
pub struct PgBlobStorage<P: ConnectionProvider = PoolProvider> {
    provider: Arc<P>,
    public_url: String,
}

impl<P: ConnectionProvider> PgBlobStorage<P> {
    pub fn new(provider: Arc<P>, public_url: &str) -> Self {
        Self { provider,
               public_url: public_url.trim_end_matches('/').to_string() }
    }
}

#[async_trait]
impl<P: ConnectionProvider> BlobStorage for PgBlobStorage<P> {
    async fn upload_blob(&self, folder: &str, path: &str, file: &BlobFile) -> Result<StoredImage, CoreError> {
        let (folder_owned, path_owned, file_owned) = (folder.to_string(), path.to_string(), file.clone());
        blocking(self.provider.clone(), move |conn| {
            let row = NewBlobRow { path: &path_owned,
                                   folder: &folder_owned,
                                   content_type: file_owned.content_type.as_deref(),
                                   bytes: &file_owned.bytes,
                                   created_at: Utc::now() };
            diesel::insert_into(blobs::table).values(&row)
                                             .on_conflict(blobs::path)
                                             .do_update()
                                             .set((blobs::folder.eq(row.folder),
                                                   blobs::content_type.eq(row.content_type),
                                                   blobs::bytes.eq(row.bytes)))
                                             .execute(conn)?;
            Ok(())
        }).await?;
        Ok(StoredImage { url: format!("{}/{folder}/{path}", self.public_url),
                         path: path.to_string() })
    }

    async fn delete_blob(&self, folder: &str, path: &str) -> Result<(), CoreError> {
        let (folder, path) = (folder.to_string(), path.to_string());
        blocking(self.provider.clone(), move |conn| {
            diesel::delete(blobs::table.filter(blobs::path.eq(&path)).filter(blobs::folder.eq(&folder))).execute(conn)?;
            Ok(())
        }).await
    }
}

/// Juego completo de backends Postgres compartiendo un provider.
pub fn pg_backends<P: ConnectionProvider>(provider: Arc<P>,
                                          storage_public_url: &str,
                                          clock: Arc<dyn Clock>,
                                          mailer: Arc<dyn MailDispatcher>)
                                          -> Backends {
    fn backend<R: Record, P: ConnectionProvider>(provider: &Arc<P>, clock: &Arc<dyn Clock>) -> Arc<PgRecordBackend<R, P>> {
        Arc::new(PgRecordBackend::with_clock(provider.clone(), clock.clone()))
    }
    Backends { applicants: backend(&provider, &clock),
               applicant_history: backend(&provider, &clock),
               employees: backend(&provider, &clock),
               stations: backend(&provider, &clock),
               station_history: backend(&provider, &clock),
               products: backend(&provider, &clock),
               categories: backend(&provider, &clock),
               notes: backend(&provider, &clock),
               accounts: backend(&provider, &clock),
               passcodes: backend(&provider, &clock),
               blobs: Arc::new(PgBlobStorage::new(provider, storage_public_url)),
               mailer }
}

/// Construye el pool y corre las migraciones pendientes.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = min_size.max(1);
    let validated_max = max_size.max(1);
    if validated_min > validated_max {
        warn!("min_size > max_size ({validated_min} > {validated_max}), ajustando min=max");
    }
    let final_min = validated_min.min(validated_max);
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(final_min))
                                    .max_size(validated_max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Carga `.env`, lee `DbConfig` y construye un pool ya migrado.
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = crate::config::DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}
