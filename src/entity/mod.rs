pub mod audit_logs;
pub mod bookings;
pub mod guides;
pub mod tour_guides;
pub mod tours;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use guides::Entity as Guides;
pub use tour_guides::Entity as TourGuides;
pub use tours::Entity as Tours;
pub use users::Entity as Users;
