pub mod pretty_formatter;
