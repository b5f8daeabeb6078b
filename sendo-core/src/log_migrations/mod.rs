//! Event log schema, embedded at compile time
//!
//! Each entry is `(file name, sql)`. They are applied in order and recorded
//! in `sys_migrations`; `000_migrations.sql` bootstraps that table itself.
//! New migrations go at the end as `NNN_description.sql`.

pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
