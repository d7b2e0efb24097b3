pub mod certificate;
pub mod welfare;
