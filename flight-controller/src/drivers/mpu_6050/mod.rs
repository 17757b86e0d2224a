pub mod device;
pub mod registers;
