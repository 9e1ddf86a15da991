//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_config_table;
mod m20250101_000003_create_activity_table;
mod m20250101_000004_create_question_table;
mod m20250101_000005_create_answer_table;
mod m20250101_000006_create_comment_table;
mod m20250101_000007_create_tag_tables;
mod m20250101_000008_create_follow_table;
mod m20250101_000009_create_report_table;
mod m20250101_000010_create_site_info_table;
mod m20250101_000011_create_notification_tables;

/// Reference rows seeded into the config table.
pub use m20250101_000002_create_config_table::{ACTIVITY_TYPES, REASONS};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_config_table::Migration),
            Box::new(m20250101_000003_create_activity_table::Migration),
            Box::new(m20250101_000004_create_question_table::Migration),
            Box::new(m20250101_000005_create_answer_table::Migration),
            Box::new(m20250101_000006_create_comment_table::Migration),
            Box::new(m20250101_000007_create_tag_tables::Migration),
            Box::new(m20250101_000008_create_follow_table::Migration),
            Box::new(m20250101_000009_create_report_table::Migration),
            Box::new(m20250101_000010_create_site_info_table::Migration),
            Box::new(m20250101_000011_create_notification_tables::Migration),
        ]
    }
}
