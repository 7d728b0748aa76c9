pub mod admin;
pub mod invitation;
