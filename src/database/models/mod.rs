pub mod animal;
pub mod condition;
pub mod event;
pub mod note;
pub mod notification;
pub mod trip;
pub mod user;

pub use animal::{Animal, AnimalWrite};
pub use condition::Condition;
pub use event::{Event, EventCreate, EventType};
pub use note::{Note, NoteWrite};
pub use notification::{Notification, NotificationCreate, NotificationSubscription, NotificationSubscriptionWrite};
pub use trip::{Trip, TripCreate};
pub use user::{User, UserCreate};
