pub mod add;
pub mod common;
pub mod conflicts;
pub mod delete;
pub mod done;
pub mod edit;
pub mod list;
pub mod resolve;
pub mod status;
pub mod sync;
