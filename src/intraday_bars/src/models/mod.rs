pub mod bar;
pub mod bar_table;
pub mod interval;
pub mod request_params;
pub mod window;
