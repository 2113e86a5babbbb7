pub mod history;
pub mod setup;
pub mod sync;
pub mod track;
pub mod ui;
