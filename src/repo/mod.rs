pub mod blog;
pub mod certifications;
pub mod jobs;
pub mod profile;
pub mod schema;
