pub mod fixture;
pub mod movies;
