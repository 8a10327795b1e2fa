/// reading and writing comma separated tables: a quote-aware splitter, header-keyed records
/// for uploads and field escaping for exports
pub mod csv_io;
