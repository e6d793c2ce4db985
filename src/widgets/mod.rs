//! User interface components which are commonly reused between different
//! parts of the user interface.

pub mod alert;
