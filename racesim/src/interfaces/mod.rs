pub mod ui_interface;
