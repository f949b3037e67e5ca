pub mod hash;
pub mod html;
pub mod session;
