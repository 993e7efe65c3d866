//! Domain models shared between the server and its clients

pub mod booking;
pub mod offer;
pub mod payment;
pub mod service;
pub mod staff;
pub mod store;
pub mod user;

pub use booking::{
    Booking, BookingCancel, BookingCreate, BookingCreated, BookingKind, BookingReschedule,
    BookingStatus, CompletionMethod, PaymentPayload,
};
pub use offer::{Offer, OfferStatus};
pub use payment::{Payment, PaymentStatus};
pub use service::Service;
pub use staff::Staff;
pub use store::{Branch, Store};
pub use user::User;
