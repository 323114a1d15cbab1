//! Host collaborator abstractions

mod client_directory;

pub use client_directory::ClientDirectory;
