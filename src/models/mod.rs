pub mod auth;
pub mod envelope;
pub mod inventory;
pub mod product;
pub mod reference;

pub use auth::*;
pub use envelope::*;
pub use inventory::*;
pub use product::*;
pub use reference::*;
