pub mod pause;
pub mod record;
pub mod resume;
pub mod stats;
pub mod status;
pub mod verify;
