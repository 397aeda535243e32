//! sea-orm entities for the OTP service.

pub mod otp_records;
pub mod users;
