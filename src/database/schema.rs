//! Tenant schema. Every statement is create-if-absent so the whole list can be
//! replayed against an already provisioned database.

pub const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        first_name VARCHAR(256) NOT NULL,
        last_name VARCHAR(256) NOT NULL,
        email_address VARCHAR(256) NOT NULL UNIQUE,
        password_hash VARCHAR(256) NOT NULL,
        password_reset_token VARCHAR(1024),
        is_disabled BOOLEAN NOT NULL DEFAULT FALSE,
        created TIMESTAMPTZ NOT NULL,
        updated TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS animals (
        id BIGSERIAL PRIMARY KEY,
        name VARCHAR(256) NOT NULL,
        is_deactivated BOOLEAN NOT NULL DEFAULT FALSE,
        created TIMESTAMPTZ NOT NULL,
        created_by_user_id BIGINT NOT NULL REFERENCES users (id),
        updated TIMESTAMPTZ NOT NULL,
        updated_by_user_id BIGINT NOT NULL REFERENCES users (id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS animal_event_types (
        animal_id BIGINT NOT NULL REFERENCES animals (id) ON DELETE CASCADE,
        event_type VARCHAR(256) NOT NULL,
        created TIMESTAMPTZ NOT NULL,
        created_by_user_id BIGINT NOT NULL REFERENCES users (id),
        updated TIMESTAMPTZ NOT NULL,
        updated_by_user_id BIGINT NOT NULL REFERENCES users (id),
        PRIMARY KEY (animal_id, event_type)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS animal_condition_types (
        animal_id BIGINT NOT NULL REFERENCES animals (id) ON DELETE CASCADE,
        condition_type VARCHAR(256) NOT NULL,
        created TIMESTAMPTZ NOT NULL,
        created_by_user_id BIGINT NOT NULL REFERENCES users (id),
        updated TIMESTAMPTZ NOT NULL,
        updated_by_user_id BIGINT NOT NULL REFERENCES users (id),
        PRIMARY KEY (animal_id, condition_type)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS trips (
        id BIGSERIAL PRIMARY KEY,
        created TIMESTAMPTZ NOT NULL,
        created_by_user_id BIGINT NOT NULL REFERENCES users (id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS events (
        id BIGSERIAL PRIMARY KEY,
        latitude DOUBLE PRECISION NOT NULL,
        longitude DOUBLE PRECISION NOT NULL,
        event_type VARCHAR(256) NOT NULL,
        animal_id BIGINT NOT NULL REFERENCES animals (id) ON DELETE CASCADE,
        trip_id BIGINT REFERENCES trips (id) ON DELETE SET NULL,
        created TIMESTAMPTZ NOT NULL,
        created_by_user_id BIGINT REFERENCES users (id),
        updated TIMESTAMPTZ NOT NULL,
        updated_by_user_id BIGINT REFERENCES users (id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS notes (
        id BIGSERIAL PRIMARY KEY,
        animal_id BIGINT NOT NULL REFERENCES animals (id) ON DELETE CASCADE,
        text TEXT NOT NULL,
        created TIMESTAMPTZ NOT NULL,
        created_by_user_id BIGINT NOT NULL REFERENCES users (id),
        updated TIMESTAMPTZ NOT NULL,
        updated_by_user_id BIGINT NOT NULL REFERENCES users (id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS conditions (
        id BIGSERIAL PRIMARY KEY,
        animal_id BIGINT NOT NULL REFERENCES animals (id) ON DELETE CASCADE,
        condition_type VARCHAR(256) NOT NULL,
        is_enabled BOOLEAN NOT NULL,
        created TIMESTAMPTZ NOT NULL,
        created_by_user_id BIGINT NOT NULL REFERENCES users (id),
        updated TIMESTAMPTZ NOT NULL,
        updated_by_user_id BIGINT NOT NULL REFERENCES users (id),
        UNIQUE (animal_id, condition_type)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS notifications (
        id BIGSERIAL PRIMARY KEY,
        title VARCHAR(256) NOT NULL,
        message TEXT NOT NULL,
        created TIMESTAMPTZ NOT NULL,
        created_by_user_id BIGINT NOT NULL REFERENCES users (id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS notification_subscriptions (
        id BIGSERIAL PRIMARY KEY,
        endpoint TEXT NOT NULL UNIQUE,
        public_key TEXT NOT NULL,
        authentication_secret TEXT NOT NULL,
        created TIMESTAMPTZ NOT NULL,
        created_by_user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        updated TIMESTAMPTZ NOT NULL,
        updated_by_user_id BIGINT NOT NULL REFERENCES users (id) ON DELETE CASCADE
    )"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_replayable() {
        for statement in SCHEMA {
            assert!(statement.starts_with("CREATE TABLE IF NOT EXISTS"), "{}", statement);
        }
    }

    #[test]
    fn referenced_tables_are_created_first() {
        let position = |table: &str| {
            SCHEMA
                .iter()
                .position(|s| s.starts_with(&format!("CREATE TABLE IF NOT EXISTS {} (", table)))
                .unwrap()
        };
        assert!(position("users") < position("animals"));
        assert!(position("trips") < position("events"));
        assert!(position("animals") < position("conditions"));
    }
}
