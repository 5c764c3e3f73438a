// Re-export all model types
pub use self::category::*;
pub use self::enums::*;
pub use self::errors::*;
pub use self::item::*;
pub use self::menu::*;
pub use self::ordering::*;
pub use self::validation::*;

mod category;
mod enums;
mod errors;
mod item;
mod menu;
mod ordering;
mod validation;
