pub mod pages;
pub mod slug;
