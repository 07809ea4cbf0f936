mod account;
mod ledger;
mod money;
mod movement;

pub use account::*;
pub use ledger::*;
pub use money::*;
pub use movement::*;
