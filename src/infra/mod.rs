pub mod doctor;
pub mod process;
