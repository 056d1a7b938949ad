pub mod create;
pub mod delete;
pub mod import;
pub mod read;
pub mod show;
pub mod update;
