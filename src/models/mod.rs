pub mod address;
pub mod cart;
pub mod meal;
pub mod order;
pub mod restaurant;
pub mod user;

pub use address::{AddressForm, AddressItem};
pub use cart::{Ack, CartItem};
pub use meal::MealItem;
pub use order::{Order, PaymentRequest, PaymentSession};
pub use restaurant::{Restaurant, RestaurantDetail};
pub use user::{AuthUserItem, LoginRequest, RegisterRequest};
