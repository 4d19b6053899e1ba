mod apns;
mod sms;

pub use apns::ApnsChannel;
pub use sms::TwilioChannel;
