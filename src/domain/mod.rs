mod buyer;
mod ledger;
mod money;
mod sale;

pub use buyer::*;
pub use ledger::*;
pub use money::*;
pub use sale::*;
