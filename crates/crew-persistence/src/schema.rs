//! Esquema Diesel escrito a mano; reemplazable con `diesel print-schema`.

diesel::table! {
    records (id) {
        id -> Uuid,
        collection -> Text,
        owner_id -> Nullable<Uuid>,
        payload -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    blobs (path) {
        path -> Text,
        folder -> Text,
        content_type -> Nullable<Text>,
        bytes -> Bytea,
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(records, blobs);
