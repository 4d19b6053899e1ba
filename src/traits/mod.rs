mod channels;
mod history;
mod provider;

pub use channels::{CalendarBackend, CalendarEvent, PushChannel, SmsChannel};
pub use history::{
    ContactStore, DeviceToken, Goal, HealthEntry, HistoryStore, KnownLocation, MoodEntry,
    SignalStore, TriggerFireRecord, TriggerLogStore, UserMessage, VipContact, Workout,
};
pub use provider::CompletionBackend;
