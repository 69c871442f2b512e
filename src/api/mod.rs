pub mod admin;
pub mod blog;
pub mod certifications;
pub mod feed;
pub mod health;
pub mod jobs;
pub mod pages;
pub mod profile;
