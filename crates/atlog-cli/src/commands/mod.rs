pub mod diff;
pub mod dispatch;
pub mod extract;
pub mod flows;
pub mod records;
pub mod rules;
