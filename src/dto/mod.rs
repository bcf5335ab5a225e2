pub mod auth;
pub mod bookings;
pub mod checkout;
pub mod guides;
pub mod tours;
