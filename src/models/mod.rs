pub mod activity;
pub mod attachment;
pub mod basket;
pub mod case;
pub mod condition;
pub mod enums;
pub mod medicine;
pub mod patient;
pub mod referral;

pub use activity::*;
pub use attachment::*;
pub use basket::*;
pub use case::*;
pub use condition::*;
pub use medicine::*;
pub use patient::*;
pub use referral::*;
