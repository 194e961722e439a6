// ドメインモデル（エンティティと値オブジェクト）

mod booking;
mod concert;
mod seat;
mod user;
mod value_objects;

pub use value_objects::{
    parse_concert_date, BookingId, ConcertId, Genre, Money, PerformerId, SeatAvailability,
    SeatLabel, SeatStatusFilter,
};

pub use booking::{Booking, BookingRequest};
pub use concert::{Concert, ConcertSummary, Performer};
pub use seat::Seat;
pub use user::User;
