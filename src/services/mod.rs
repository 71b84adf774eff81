pub mod api;
pub mod payment;

pub use api::{FoodApi, HttpFoodApi};
pub use payment::{PaymentRedirect, RedirectError};
