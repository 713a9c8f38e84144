pub mod movies;
pub mod persons;
