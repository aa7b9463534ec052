//! Command implementations

mod install;
mod list;
mod purge;
mod show;
mod status;

pub use install::execute as install;
pub use list::execute as list;
pub use purge::execute as purge;
pub use show::execute as show;
pub use status::execute as status;
