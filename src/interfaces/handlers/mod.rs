pub mod console;
pub mod home;
pub mod images;
pub mod system;
