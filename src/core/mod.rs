/*
 * This module consolidates the platform-agnostic logic of the application:
 * configuration and settings, file system scanning, bundle assembly, the
 * bundling run itself, token estimates and the thumbnail backfill. Traits such
 * as `FileSystemScannerOperations`, `ConfigManagerOperations`,
 * `TokenCounterOperations` and `VideoRepository` keep the seams swappable for
 * tests.
 */
pub mod archiver;
pub mod backfill;
pub mod bundler;
pub mod config;
pub mod file_system;
pub mod models;
pub mod path_utils;
pub mod settings;
pub mod tokenizer_utils;


pub use models::RunSummary;

pub use bundler::bundle;

pub use config::{APP_NAME, AppConfig, ConfigManagerOperations, CoreConfigManager};

pub use backfill::{JsonFileVideoRepository, backfill_thumbnails};
