use crew_persistence::{build_pool, DbConfig};
use diesel::prelude::*;
use diesel::sql_types::BigInt;

#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

#[test]
fn migrations_create_records_and_blobs() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    let cfg = DbConfig::from_env().expect("config");
    let pool = build_pool(&cfg.url, 1, 1).expect("pool");
    let mut conn = pool.get().expect("conn");
    let found: Count = diesel::sql_query("SELECT count(*) AS n FROM information_schema.tables \
                                          WHERE table_name IN ('records', 'blobs')").get_result(&mut conn)
                                                                                      .expect("query");
    assert_eq!(found.n, 2);
}

#[test]
fn unknown_collections_are_rejected() {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return;
    }
    let cfg = DbConfig::from_env().expect("config");
    let pool = build_pool(&cfg.url, 1, 1).expect("pool");
    let mut conn = pool.get().expect("conn");
    let res = diesel::sql_query("INSERT INTO records (id, collection, payload, created_at, updated_at) \
                                 VALUES (gen_random_uuid(), 'bogus', '{}'::jsonb, now(), now())").execute(&mut conn);
    assert!(res.is_err());
}
