pub mod cli;
pub mod copy_object;
pub mod delete_object;
